/// Photo endpoints
use crate::{
    access::can_access,
    api::extract::{AdminUser, MaybeUser},
    context::AppContext,
    error::{GalleryError, GalleryResult},
    gallery::PhotoPatch,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/photos", get(list_photos))
        .route(
            "/api/photos/:id",
            get(get_photo).patch(update_photo).delete(delete_photo),
        )
        .route("/api/photos/reorder", post(reorder_photos))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPhotosQuery {
    album_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReorderRequest {
    album_id: String,
    photo_ids: Vec<String>,
}

/// Check the requester may see the album, answering like a missing
/// resource otherwise
async fn require_album_access(
    ctx: &AppContext,
    album_id: &str,
    requester_id: Option<&str>,
) -> GalleryResult<()> {
    let accessible = ctx
        .gallery
        .album_by_id(album_id)
        .await?
        .map(|album| can_access(&album, requester_id))
        .unwrap_or(false);

    if accessible {
        Ok(())
    } else {
        Err(GalleryError::NotFound("Album not found".to_string()))
    }
}

/// GET /api/photos?albumId= - photos of an album in display order
async fn list_photos(
    State(ctx): State<AppContext>,
    Query(query): Query<ListPhotosQuery>,
    requester: MaybeUser,
) -> GalleryResult<impl IntoResponse> {
    let album_id = query.album_id.ok_or_else(|| {
        GalleryError::Validation("albumId parameter is required".to_string())
    })?;

    require_album_access(&ctx, &album_id, requester.id()).await?;

    let photos = ctx.gallery.photos_in_album(&album_id).await?;
    Ok(Json(json!({ "success": true, "data": { "photos": photos } })))
}

/// GET /api/photos/:id - a single photo with presigned rendition URLs
async fn get_photo(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    requester: MaybeUser,
) -> GalleryResult<impl IntoResponse> {
    let photo = ctx
        .gallery
        .photo_by_id(&id)
        .await?
        .ok_or_else(|| GalleryError::NotFound("Photo not found".to_string()))?;

    require_album_access(&ctx, &photo.album_id, requester.id())
        .await
        // Same answer whether the photo or its album is out of reach
        .map_err(|_| GalleryError::NotFound("Photo not found".to_string()))?;

    let (full_url, thumbnail_url) = ctx.gallery.photo_urls(&photo).await?;

    let mut body = serde_json::to_value(&photo)
        .map_err(|e| GalleryError::Internal(format!("Failed to encode photo: {}", e)))?;
    if let Some(obj) = body.as_object_mut() {
        obj.insert("fullUrl".to_string(), json!(full_url));
        obj.insert("thumbnailUrl".to_string(), json!(thumbnail_url));
    }

    Ok(Json(json!({ "success": true, "data": { "photo": body } })))
}

/// PATCH /api/photos/:id - update caption/sort order (admin only)
async fn update_photo(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    _admin: AdminUser,
    Json(patch): Json<PhotoPatch>,
) -> GalleryResult<impl IntoResponse> {
    let photo = ctx
        .gallery
        .update_photo(&id, patch)
        .await?
        .ok_or_else(|| GalleryError::NotFound("Photo not found".to_string()))?;

    Ok(Json(json!({ "success": true, "data": { "photo": photo } })))
}

/// DELETE /api/photos/:id - delete a photo (admin only)
async fn delete_photo(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    _admin: AdminUser,
) -> GalleryResult<impl IntoResponse> {
    ctx.gallery.delete_photo(&id).await?;
    Ok(Json(
        json!({ "success": true, "data": { "message": "Photo deleted successfully" } }),
    ))
}

/// POST /api/photos/reorder - rewrite an album's display order (admin only)
async fn reorder_photos(
    State(ctx): State<AppContext>,
    _admin: AdminUser,
    Json(req): Json<ReorderRequest>,
) -> GalleryResult<impl IntoResponse> {
    ctx.gallery
        .reorder_photos(&req.album_id, &req.photo_ids)
        .await?;
    Ok(Json(
        json!({ "success": true, "data": { "message": "Photos reordered" } }),
    ))
}
