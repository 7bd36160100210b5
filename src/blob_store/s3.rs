/// S3-compatible blob storage backend
use crate::blob_store::BlobBackend;
use crate::error::{GalleryError, GalleryResult};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// S3 blob storage backend
///
/// Supports AWS S3 and S3-compatible storage providers (Scaleway,
/// MinIO, DigitalOcean Spaces, etc.)
#[derive(Clone)]
pub struct S3BlobBackend {
    client: Arc<Client>,
    bucket: String,
}

/// Configuration for S3 storage
#[derive(Debug, Clone)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,

    /// Region (e.g., "fr-par", "us-east-1")
    pub region: String,

    /// Custom endpoint for S3-compatible services
    /// Example: "https://s3.fr-par.scw.cloud" or "http://localhost:9000"
    pub endpoint: Option<String>,

    /// Access key ID
    pub access_key_id: String,

    /// Secret access key
    pub secret_access_key: String,
}

impl S3BlobBackend {
    /// Create a new S3 blob backend
    pub async fn new(config: S3Config) -> GalleryResult<Self> {
        info!(
            "Initializing S3 blob storage (bucket: {}, region: {})",
            config.bucket, config.region
        );

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None, // session token
            None, // expiration
            "aperture-gallery",
        );

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let mut s3_config_builder = S3ConfigBuilder::from(&aws_config);

        if let Some(endpoint) = &config.endpoint {
            debug!("Using custom S3 endpoint: {}", endpoint);
            s3_config_builder = s3_config_builder
                .endpoint_url(endpoint)
                .force_path_style(true); // Required for MinIO and some S3-compatible services
        }

        let s3_config = s3_config_builder.build();
        let client = Client::from_conf(s3_config);

        info!("S3 blob storage initialized");

        Ok(Self {
            client: Arc::new(client),
            bucket: config.bucket,
        })
    }
}

#[async_trait]
impl BlobBackend for S3BlobBackend {
    async fn put(&self, key: &str, data: Vec<u8>, mime_type: &str) -> GalleryResult<()> {
        debug!(
            "Uploading blob to S3: {} ({} bytes, type: {})",
            key,
            data.len(),
            mime_type
        );

        let body = ByteStream::from(data);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(mime_type)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to upload blob to S3: {}", e);
                GalleryError::BlobStorage(format!("S3 upload failed: {}", e))
            })?;

        Ok(())
    }

    async fn get(&self, key: &str) -> GalleryResult<Option<Vec<u8>>> {
        match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(response) => {
                let data = response
                    .body
                    .collect()
                    .await
                    .map_err(|e| {
                        error!("Failed to read S3 object body: {}", e);
                        GalleryError::BlobStorage(format!("Failed to read S3 object: {}", e))
                    })?
                    .into_bytes()
                    .to_vec();

                debug!("Blob downloaded from S3: {} ({} bytes)", key, data.len());
                Ok(Some(data))
            }
            Err(e) => {
                // Check if it's a "not found" error
                let error_msg = format!("{:?}", e);
                if error_msg.contains("NoSuchKey") || error_msg.contains("NotFound") {
                    debug!("Blob not found in S3: {}", key);
                    Ok(None)
                } else {
                    error!("Failed to download blob from S3: {}", e);
                    Err(GalleryError::BlobStorage(format!(
                        "S3 download failed: {}",
                        e
                    )))
                }
            }
        }
    }

    async fn delete(&self, key: &str) -> GalleryResult<()> {
        debug!("Deleting blob from S3: {}", key);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to delete blob from S3: {}", e);
                GalleryError::BlobStorage(format!("S3 delete failed: {}", e))
            })?;

        Ok(())
    }

    async fn list(&self, prefix: &str) -> GalleryResult<Vec<String>> {
        let response = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to list S3 objects: {}", e);
                GalleryError::BlobStorage(format!("S3 list failed: {}", e))
            })?;

        Ok(response
            .contents()
            .iter()
            .filter_map(|obj| obj.key().map(String::from))
            .collect())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> GalleryResult<String> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| GalleryError::Internal(format!("Invalid presign expiry: {}", e)))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| {
                error!("Failed to presign S3 URL for {}: {}", key, e);
                GalleryError::BlobStorage(format!("S3 presign failed: {}", e))
            })?;

        Ok(request.uri().to_string())
    }
}
