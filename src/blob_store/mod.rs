/// Blob storage adapter
///
/// Key -> bytes I/O against an S3-compatible backend, with a disk
/// backend for local development and tests. No semantics beyond byte
/// I/O: no transactions, no compare-and-swap.

pub mod disk;
pub mod s3;

pub use disk::DiskBlobBackend;
pub use s3::S3BlobBackend;

use crate::error::GalleryResult;
use async_trait::async_trait;
use std::time::Duration;

/// Prefix for the JSON collection documents
pub const DATA_PREFIX: &str = "data/";
/// Prefix for full-size photo renditions
pub const PHOTOS_PREFIX: &str = "photos/";
/// Prefix for thumbnail renditions
pub const THUMBNAILS_PREFIX: &str = "thumbnails/";

/// Key for a JSON collection document, e.g. `data/albums.json`
pub fn data_key(filename: &str) -> String {
    format!("{}{}", DATA_PREFIX, filename)
}

/// Key for a full-size photo, e.g. `photos/{albumId}/{photoId}.jpg`
pub fn photo_key(album_id: &str, filename: &str) -> String {
    format!("{}{}/{}", PHOTOS_PREFIX, album_id, filename)
}

/// Key for a thumbnail, e.g. `thumbnails/{albumId}/{photoId}.jpg`
pub fn thumbnail_key(album_id: &str, filename: &str) -> String {
    format!("{}{}/{}", THUMBNAILS_PREFIX, album_id, filename)
}

/// Blob storage backend trait
///
/// Implementations handle the actual storage and retrieval of blob data.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Store a blob under a key
    async fn put(&self, key: &str, data: Vec<u8>, mime_type: &str) -> GalleryResult<()>;

    /// Retrieve a blob by key, `None` when absent
    async fn get(&self, key: &str) -> GalleryResult<Option<Vec<u8>>>;

    /// Delete a blob by key (absent keys are not an error)
    async fn delete(&self, key: &str) -> GalleryResult<()>;

    /// List keys under a prefix
    async fn list(&self, prefix: &str) -> GalleryResult<Vec<String>>;

    /// Issue a time-limited download URL for a key
    async fn presign_get(&self, key: &str, expires_in: Duration) -> GalleryResult<String>;
}
