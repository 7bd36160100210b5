/// Configuration management for the gallery server
use crate::error::{GalleryError, GalleryResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
    /// Maximum accepted upload size in bytes
    pub upload_limit: usize,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub blobstore: BlobstoreConfig,
    /// Presigned download URL lifetime in seconds
    pub presign_ttl_secs: u64,
}

/// Blob storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BlobstoreConfig {
    Disk {
        location: PathBuf,
    },
    S3 {
        bucket: String,
        region: String,
        access_key_id: String,
        secret_access_key: String,
        endpoint: Option<String>,
    },
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Process-wide token signing key, loaded once at startup
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> GalleryResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("GALLERY_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("GALLERY_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| GalleryError::Validation("Invalid port number".to_string()))?;
        let version = env::var("GALLERY_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let upload_limit = env::var("GALLERY_UPLOAD_LIMIT")
            .unwrap_or_else(|_| "20971520".to_string()) // 20MB
            .parse()
            .unwrap_or(20 * 1024 * 1024);

        // S3 when a bucket is configured, disk otherwise
        let blobstore = if let Ok(bucket) = env::var("GALLERY_S3_BUCKET") {
            BlobstoreConfig::S3 {
                bucket,
                region: env::var("GALLERY_S3_REGION").unwrap_or_else(|_| "fr-par".to_string()),
                access_key_id: env::var("GALLERY_S3_ACCESS_KEY_ID").map_err(|_| {
                    GalleryError::Validation("S3 access key required".to_string())
                })?,
                secret_access_key: env::var("GALLERY_S3_SECRET_ACCESS_KEY").map_err(|_| {
                    GalleryError::Validation("S3 secret key required".to_string())
                })?,
                endpoint: env::var("GALLERY_S3_ENDPOINT").ok(),
            }
        } else {
            BlobstoreConfig::Disk {
                location: env::var("GALLERY_BLOBSTORE_DISK_LOCATION")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("./data/blobs")),
            }
        };

        let presign_ttl_secs = env::var("GALLERY_PRESIGN_TTL")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .unwrap_or(3600);

        let jwt_secret = env::var("GALLERY_JWT_SECRET")
            .map_err(|_| GalleryError::Validation("JWT secret required".to_string()))?;
        let token_ttl_days = env::var("GALLERY_TOKEN_TTL_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse()
            .unwrap_or(7);

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
                upload_limit,
            },
            storage: StorageConfig {
                blobstore,
                presign_ttl_secs,
            },
            authentication: AuthConfig {
                jwt_secret,
                token_ttl_days,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> GalleryResult<()> {
        if self.service.hostname.is_empty() {
            return Err(GalleryError::Validation(
                "Hostname cannot be empty".to_string(),
            ));
        }

        if self.authentication.jwt_secret.len() < 32 {
            return Err(GalleryError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        Ok(())
    }
}
