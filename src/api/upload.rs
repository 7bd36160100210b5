/// Photo upload endpoint
use crate::{
    api::extract::AdminUser,
    context::AppContext,
    error::{GalleryError, GalleryResult},
};
use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::json;

pub fn routes() -> Router<AppContext> {
    Router::new().route("/api/upload", post(upload))
}

/// POST /api/upload - multipart upload of one photo (admin only)
///
/// Fields: `file` (the image), `albumId`, optional `caption`.
async fn upload(
    State(ctx): State<AppContext>,
    _admin: AdminUser,
    mut multipart: Multipart,
) -> GalleryResult<impl IntoResponse> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut album_id: Option<String> = None;
    let mut caption = String::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        GalleryError::Validation(format!("Malformed multipart body: {}", e))
    })? {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = field.bytes().await.map_err(|e| {
                    GalleryError::Validation(format!("Failed to read upload: {}", e))
                })?;
                file = Some((filename, data.to_vec()));
            }
            Some("albumId") => {
                album_id = Some(field.text().await.map_err(|e| {
                    GalleryError::Validation(format!("Malformed albumId field: {}", e))
                })?);
            }
            Some("caption") => {
                caption = field.text().await.map_err(|e| {
                    GalleryError::Validation(format!("Malformed caption field: {}", e))
                })?;
            }
            _ => {}
        }
    }

    let (original_filename, data) =
        file.ok_or_else(|| GalleryError::Validation("No file provided".to_string()))?;
    let album_id =
        album_id.ok_or_else(|| GalleryError::Validation("albumId is required".to_string()))?;

    let photo = ctx
        .gallery
        .upload_photo(&album_id, original_filename, caption, data)
        .await?;

    Ok(Json(json!({ "success": true, "data": { "photo": photo } })))
}
