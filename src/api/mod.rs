/// API routes and handlers
pub mod albums;
pub mod auth;
pub mod extract;
pub mod image;
pub mod photos;
pub mod upload;

use crate::{context::AppContext, models::User};
use axum::Router;
use serde::Serialize;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(auth::routes())
        .merge(albums::routes())
        .merge(photos::routes())
        .merge(upload::routes())
        .merge(image::routes())
}

/// User representation safe for responses (no password hash)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub role: crate::models::Role,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
        }
    }
}
