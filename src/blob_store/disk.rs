/// Disk-based blob storage backend
///
/// Mirrors the bucket key layout on the local filesystem. Used for
/// local development and tests; production deployments use S3.
use crate::{
    blob_store::BlobBackend,
    error::{GalleryError, GalleryResult},
};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

#[derive(Clone)]
pub struct DiskBlobBackend {
    base_path: PathBuf,
}

impl DiskBlobBackend {
    /// Create a new disk storage backend
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Get the file path for a key
    ///
    /// Keys contain `/` separators (e.g. `photos/{albumId}/{file}`),
    /// which map directly onto subdirectories.
    fn blob_path(&self, key: &str) -> GalleryResult<PathBuf> {
        if key.split('/').any(|part| part == "..") {
            return Err(GalleryError::Validation(format!(
                "Invalid blob key: {}",
                key
            )));
        }
        Ok(self.base_path.join(key))
    }

    /// Ensure the directory for a blob exists
    async fn ensure_blob_dir(&self, key: &str) -> GalleryResult<PathBuf> {
        let blob_path = self.blob_path(key)?;
        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                GalleryError::BlobStorage(format!("Failed to create blob directory: {}", e))
            })?;
        }
        Ok(blob_path)
    }

    fn collect_keys<'a>(
        &'a self,
        dir: PathBuf,
        keys: &'a mut Vec<String>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = GalleryResult<()>> + Send + 'a>> {
        Box::pin(async move {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
                Err(e) => {
                    return Err(GalleryError::BlobStorage(format!(
                        "Failed to list blobs: {}",
                        e
                    )))
                }
            };

            while let Some(entry) = entries.next_entry().await.map_err(|e| {
                GalleryError::BlobStorage(format!("Failed to list blobs: {}", e))
            })? {
                let path = entry.path();
                if path.is_dir() {
                    self.collect_keys(path, keys).await?;
                } else if let Ok(rel) = path.strip_prefix(&self.base_path) {
                    keys.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }

            Ok(())
        })
    }
}

#[async_trait]
impl BlobBackend for DiskBlobBackend {
    async fn put(&self, key: &str, data: Vec<u8>, _mime_type: &str) -> GalleryResult<()> {
        let blob_path = self.ensure_blob_dir(key).await?;

        fs::write(&blob_path, data).await.map_err(|e| {
            GalleryError::BlobStorage(format!("Failed to write blob {}: {}", key, e))
        })?;

        Ok(())
    }

    async fn get(&self, key: &str) -> GalleryResult<Option<Vec<u8>>> {
        let blob_path = self.blob_path(key)?;

        match fs::read(&blob_path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GalleryError::BlobStorage(format!(
                "Failed to read blob {}: {}",
                key, e
            ))),
        }
    }

    async fn delete(&self, key: &str) -> GalleryResult<()> {
        let blob_path = self.blob_path(key)?;

        match fs::remove_file(&blob_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(GalleryError::BlobStorage(format!(
                "Failed to delete blob {}: {}",
                key, e
            ))),
        }
    }

    async fn list(&self, prefix: &str) -> GalleryResult<Vec<String>> {
        let mut keys = Vec::new();
        self.collect_keys(self.base_path.clone(), &mut keys).await?;
        keys.retain(|k| k.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }

    /// Disk blobs have no signed URLs; point at the access-gated
    /// serving route instead. The expiry is advisory only.
    async fn presign_get(&self, key: &str, _expires_in: Duration) -> GalleryResult<String> {
        Ok(format!("/api/image/{}", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_and_get_blob() {
        let dir = tempdir().unwrap();
        let backend = DiskBlobBackend::new(dir.path().to_path_buf());

        let key = "photos/album-1/photo-1.jpg";
        let data = b"test blob data".to_vec();

        backend.put(key, data.clone(), "image/jpeg").await.unwrap();

        let retrieved = backend.get(key).await.unwrap();
        assert_eq!(retrieved, Some(data));
    }

    #[tokio::test]
    async fn test_get_nonexistent_blob() {
        let dir = tempdir().unwrap();
        let backend = DiskBlobBackend::new(dir.path().to_path_buf());

        let result = backend.get("data/missing.json").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_delete_blob_is_idempotent() {
        let dir = tempdir().unwrap();
        let backend = DiskBlobBackend::new(dir.path().to_path_buf());

        let key = "thumbnails/album-1/photo-1.jpg";
        backend.put(key, b"bytes".to_vec(), "image/jpeg").await.unwrap();

        backend.delete(key).await.unwrap();
        assert_eq!(backend.get(key).await.unwrap(), None);

        // Deleting again is not an error
        backend.delete(key).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_by_prefix() {
        let dir = tempdir().unwrap();
        let backend = DiskBlobBackend::new(dir.path().to_path_buf());

        backend
            .put("photos/a/1.jpg", b"1".to_vec(), "image/jpeg")
            .await
            .unwrap();
        backend
            .put("photos/a/2.jpg", b"2".to_vec(), "image/jpeg")
            .await
            .unwrap();
        backend
            .put("thumbnails/a/1.jpg", b"t".to_vec(), "image/jpeg")
            .await
            .unwrap();

        let keys = backend.list("photos/").await.unwrap();
        assert_eq!(keys, vec!["photos/a/1.jpg", "photos/a/2.jpg"]);
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = tempdir().unwrap();
        let backend = DiskBlobBackend::new(dir.path().to_path_buf());

        let result = backend.get("../outside").await;
        assert!(result.is_err());
    }
}
