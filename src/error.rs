/// Unified error types for the gallery server
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the gallery
#[derive(Error, Debug)]
pub enum GalleryError {
    /// Authentication errors (missing or invalid credentials)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Authorization errors (authenticated but insufficient role)
    #[error("Not authorized: {0}")]
    Forbidden(String),

    /// Validation errors (malformed input)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    ///
    /// Also returned for resources the requester may not see, so a
    /// private album is indistinguishable from a missing one.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (uniqueness violation, e.g. duplicate username)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upload buffer is not a decodable image in an allowed format,
    /// or a transform on it failed
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Blob storage errors
    #[error("Blob storage error: {0}")]
    BlobStorage(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// JSON error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert GalleryError to HTTP response
impl IntoResponse for GalleryError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            GalleryError::Authentication(_) => (
                StatusCode::UNAUTHORIZED,
                "AuthenticationRequired",
                self.to_string(),
            ),
            GalleryError::Forbidden(_) => {
                (StatusCode::FORBIDDEN, "Forbidden", self.to_string())
            }
            GalleryError::Validation(_) => {
                (StatusCode::BAD_REQUEST, "InvalidRequest", self.to_string())
            }
            GalleryError::InvalidImage(_) => {
                (StatusCode::BAD_REQUEST, "InvalidImage", self.to_string())
            }
            GalleryError::NotFound(_) => {
                (StatusCode::NOT_FOUND, "NotFound", self.to_string())
            }
            GalleryError::Conflict(_) => {
                (StatusCode::CONFLICT, "Conflict", self.to_string())
            }
            GalleryError::BlobStorage(_) | GalleryError::Internal(_) | GalleryError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error".to_string(), // Don't leak details
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for gallery operations
pub type GalleryResult<T> = Result<T, GalleryError>;
