/// Image serving endpoint
///
/// Streams stored renditions for deployments without a presigning
/// backend (the disk backend's presigned URLs point here).
use crate::{
    access::can_access,
    api::extract::MaybeUser,
    context::AppContext,
    error::{GalleryError, GalleryResult},
};
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};

pub fn routes() -> Router<AppContext> {
    Router::new().route("/api/image/*key", get(serve_image))
}

/// GET /api/image/{key} - serve a rendition by blob key
///
/// Only keys that belong to a photo record are served, gated by the
/// owning album's access rules. An out-of-reach image answers exactly
/// like a missing one.
async fn serve_image(
    State(ctx): State<AppContext>,
    Path(key): Path<String>,
    requester: MaybeUser,
) -> GalleryResult<impl IntoResponse> {
    let not_found = || GalleryError::NotFound("Image not found".to_string());

    let photo = ctx
        .gallery
        .photo_by_blob_key(&key)
        .await?
        .ok_or_else(not_found)?;

    let accessible = ctx
        .gallery
        .album_by_id(&photo.album_id)
        .await?
        .map(|album| can_access(&album, requester.id()))
        .unwrap_or(false);
    if !accessible {
        return Err(not_found());
    }

    let bytes = ctx.gallery.image_bytes(&key).await?.ok_or_else(not_found)?;

    let headers = [
        (header::CONTENT_TYPE, photo.mime_type.clone()),
        (
            header::CACHE_CONTROL,
            "public, max-age=31536000, immutable".to_string(),
        ),
    ];

    Ok((headers, bytes))
}
