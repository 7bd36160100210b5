/// Album CRUD endpoints
use crate::{
    access::can_access,
    api::extract::{AdminUser, MaybeUser},
    context::AppContext,
    error::{GalleryError, GalleryResult},
    gallery::AlbumPatch,
    models::Album,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/albums", get(list_albums).post(create_album))
        .route(
            "/api/albums/:id",
            get(get_album).patch(update_album).delete(delete_album),
        )
        .route("/api/albums/slug/:slug", get(get_album_by_slug))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAlbumRequest {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    is_public: bool,
    #[serde(default)]
    allowed_users: Vec<String>,
}

/// Load an album gated by access control
///
/// A private album the requester may not see answers exactly like a
/// missing one.
async fn accessible_album(
    ctx: &AppContext,
    id: &str,
    requester_id: Option<&str>,
) -> GalleryResult<Album> {
    ctx.gallery
        .album_by_id(id)
        .await?
        .filter(|album| can_access(album, requester_id))
        .ok_or_else(|| GalleryError::NotFound("Album not found".to_string()))
}

/// GET /api/albums - albums visible to the requester
async fn list_albums(
    State(ctx): State<AppContext>,
    requester: MaybeUser,
) -> GalleryResult<impl IntoResponse> {
    let albums = ctx.gallery.albums_for_user(requester.id()).await?;
    Ok(Json(json!({ "success": true, "data": { "albums": albums } })))
}

/// POST /api/albums - create an album (admin only)
async fn create_album(
    State(ctx): State<AppContext>,
    _admin: AdminUser,
    Json(req): Json<CreateAlbumRequest>,
) -> GalleryResult<impl IntoResponse> {
    let album = ctx
        .gallery
        .create_album(req.title, req.description, req.is_public, req.allowed_users)
        .await?;

    Ok(Json(json!({ "success": true, "data": { "album": album } })))
}

/// GET /api/albums/:id - a single album
async fn get_album(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    requester: MaybeUser,
) -> GalleryResult<impl IntoResponse> {
    let album = accessible_album(&ctx, &id, requester.id()).await?;
    Ok(Json(json!({ "success": true, "data": { "album": album } })))
}

/// GET /api/albums/slug/:slug - resolve an album by its slug
async fn get_album_by_slug(
    State(ctx): State<AppContext>,
    Path(slug): Path<String>,
    requester: MaybeUser,
) -> GalleryResult<impl IntoResponse> {
    let album = ctx
        .gallery
        .album_by_slug(&slug)
        .await?
        .filter(|album| can_access(album, requester.id()))
        .ok_or_else(|| GalleryError::NotFound("Album not found".to_string()))?;

    Ok(Json(json!({ "success": true, "data": { "album": album } })))
}

/// PATCH /api/albums/:id - partial update (admin only)
async fn update_album(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    _admin: AdminUser,
    Json(patch): Json<AlbumPatch>,
) -> GalleryResult<impl IntoResponse> {
    let album = ctx
        .gallery
        .update_album(&id, patch)
        .await?
        .ok_or_else(|| GalleryError::NotFound("Album not found".to_string()))?;

    Ok(Json(json!({ "success": true, "data": { "album": album } })))
}

/// DELETE /api/albums/:id - delete with cascade (admin only)
async fn delete_album(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    _admin: AdminUser,
) -> GalleryResult<impl IntoResponse> {
    ctx.gallery.delete_album(&id).await?;
    Ok(Json(
        json!({ "success": true, "data": { "message": "Album deleted successfully" } }),
    ))
}
