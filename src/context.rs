/// Application context and dependency injection
use crate::{
    blob_store::{BlobBackend, DiskBlobBackend, S3BlobBackend},
    config::{BlobstoreConfig, ServerConfig},
    error::GalleryResult,
    gallery::GalleryService,
    store::collections,
};
use std::sync::Arc;
use std::time::Duration;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub gallery: Arc<GalleryService>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> GalleryResult<Self> {
        config.validate()?;

        let backend: Arc<dyn BlobBackend> = match &config.storage.blobstore {
            BlobstoreConfig::Disk { location } => {
                tokio::fs::create_dir_all(location).await?;
                Arc::new(DiskBlobBackend::new(location.clone()))
            }
            BlobstoreConfig::S3 {
                bucket,
                region,
                access_key_id,
                secret_access_key,
                endpoint,
            } => Arc::new(
                S3BlobBackend::new(crate::blob_store::s3::S3Config {
                    bucket: bucket.clone(),
                    region: region.clone(),
                    endpoint: endpoint.clone(),
                    access_key_id: access_key_id.clone(),
                    secret_access_key: secret_access_key.clone(),
                })
                .await?,
            ),
        };

        let gallery = Arc::new(GalleryService::new(
            backend,
            config.service.upload_limit,
            Duration::from_secs(config.storage.presign_ttl_secs),
        ));

        // Pre-create empty collection documents; idempotent
        collections::init_collections(gallery.store()).await?;

        Ok(Self {
            config: Arc::new(config),
            gallery,
        })
    }
}
