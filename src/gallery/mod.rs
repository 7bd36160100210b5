/// Gallery service
///
/// Domain operations over the collection store and blob backend:
/// album/photo/user CRUD, the upload pipeline orchestration, and the
/// cascade/cleanup paths. Mutation authorization (admin role) is
/// enforced at the API boundary, not here.
use crate::{
    auth::hash_password,
    blob_store::{photo_key, thumbnail_key, BlobBackend},
    error::{GalleryError, GalleryResult},
    images,
    models::{Album, Photo, Role, User},
    store::{AlbumCollection, CollectionStore, PhotoCollection, UserCollection},
};
use chrono::Utc;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

/// Partial album update; absent fields are preserved
///
/// `cover_photo_id` is doubly optional so `null` (clear the cover) and
/// "absent" (leave it alone) stay distinguishable.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
    pub allowed_users: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub cover_photo_id: Option<Option<String>>,
}

/// Partial photo update; absent fields are preserved
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoPatch {
    pub caption: Option<String>,
    pub sort_order: Option<i64>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Clone)]
pub struct GalleryService {
    store: CollectionStore,
    blobs: Arc<dyn BlobBackend>,
    upload_limit: usize,
    presign_ttl: Duration,
}

impl GalleryService {
    pub fn new(
        blobs: Arc<dyn BlobBackend>,
        upload_limit: usize,
        presign_ttl: Duration,
    ) -> Self {
        Self {
            store: CollectionStore::new(Arc::clone(&blobs)),
            blobs,
            upload_limit,
            presign_ttl,
        }
    }

    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    // ==================== Albums ====================

    /// Albums visible to a requester: public ones, plus private ones
    /// the requester is allowed into
    pub async fn albums_for_user(&self, requester_id: Option<&str>) -> GalleryResult<Vec<Album>> {
        let albums = self.store.list::<AlbumCollection>().await?;
        Ok(albums
            .into_iter()
            .filter(|a| crate::access::can_access(a, requester_id))
            .collect())
    }

    pub async fn album_by_id(&self, id: &str) -> GalleryResult<Option<Album>> {
        self.store.find_by_id::<AlbumCollection>(id).await
    }

    pub async fn album_by_slug(&self, slug: &str) -> GalleryResult<Option<Album>> {
        self.store.find::<AlbumCollection, _>(|a| a.slug == slug).await
    }

    /// Create an album with a slug derived from its title
    ///
    /// Slug uniqueness is checked against the same collection read the
    /// append is applied to; collisions resolve by numeric suffix
    /// rather than surfacing a conflict.
    pub async fn create_album(
        &self,
        title: String,
        description: String,
        is_public: bool,
        allowed_users: Vec<String>,
    ) -> GalleryResult<Album> {
        if title.trim().is_empty() {
            return Err(GalleryError::Validation("Title is required".to_string()));
        }

        self.store
            .insert_with::<AlbumCollection, _>(move |albums| {
                let base = slugify(&title);
                let mut slug = base.clone();
                let mut counter = 1;
                while albums.iter().any(|a| a.slug == slug) {
                    slug = format!("{}-{}", base, counter);
                    counter += 1;
                }
                Ok(Album::new(title, description, slug, is_public, allowed_users))
            })
            .await
    }

    /// Apply a partial update; returns `None` when the album is absent
    pub async fn update_album(
        &self,
        id: &str,
        patch: AlbumPatch,
    ) -> GalleryResult<Option<Album>> {
        self.store
            .update::<AlbumCollection, _>(id, move |album| {
                if let Some(title) = patch.title {
                    album.title = title;
                }
                if let Some(description) = patch.description {
                    album.description = description;
                }
                if let Some(is_public) = patch.is_public {
                    album.is_public = is_public;
                }
                if let Some(allowed_users) = patch.allowed_users {
                    album.allowed_users = allowed_users;
                }
                if let Some(cover) = patch.cover_photo_id {
                    album.cover_photo_id = cover;
                }
            })
            .await
    }

    /// Delete an album and cascade to its photos and their blobs
    ///
    /// Sequenced, not transactional: photo records go first, then each
    /// owned blob best-effort, then the album entry. A crash midway can
    /// leave orphaned blobs; that is accepted leaked storage, never a
    /// visible-data correctness violation.
    pub async fn delete_album(&self, id: &str) -> GalleryResult<()> {
        let album = self
            .album_by_id(id)
            .await?
            .ok_or_else(|| GalleryError::NotFound("Album not found".to_string()))?;

        let removed = self
            .store
            .delete_where::<PhotoCollection, _>(|p| p.album_id == album.id)
            .await?;

        for photo in &removed {
            self.delete_photo_blobs(photo).await;
        }

        self.store.delete::<AlbumCollection>(&album.id).await?;

        // Covers in other albums should never reference these photos,
        // but the shared cleanup must not be skipped on that assumption.
        let removed_ids: Vec<String> = removed.into_iter().map(|p| p.id).collect();
        self.clear_cover_references(&removed_ids).await?;

        Ok(())
    }

    // ==================== Photos ====================

    /// Photos in an album, in display order
    pub async fn photos_in_album(&self, album_id: &str) -> GalleryResult<Vec<Photo>> {
        let mut photos: Vec<Photo> = self
            .store
            .list::<PhotoCollection>()
            .await?
            .into_iter()
            .filter(|p| p.album_id == album_id)
            .collect();
        photos.sort_by_key(|p| p.sort_order);
        Ok(photos)
    }

    pub async fn photo_by_id(&self, id: &str) -> GalleryResult<Option<Photo>> {
        self.store.find_by_id::<PhotoCollection>(id).await
    }

    /// Ingest an upload: validate, derive renditions, write both
    /// blobs, append the photo record, and point the album cover at it
    /// when the album has none
    pub async fn upload_photo(
        &self,
        album_id: &str,
        original_filename: String,
        caption: String,
        data: Vec<u8>,
    ) -> GalleryResult<Photo> {
        let album = self
            .album_by_id(album_id)
            .await?
            .ok_or_else(|| GalleryError::NotFound("Album not found".to_string()))?;

        if data.len() > self.upload_limit {
            return Err(GalleryError::Validation(format!(
                "File size exceeds {} byte limit",
                self.upload_limit
            )));
        }

        // Hard gate: any decode/transform failure aborts before any
        // blob is written
        let processed = images::process_image(&data)?;

        let photo_id = Uuid::new_v4().to_string();
        let filename = format!("{}.{}", photo_id, images::OUTPUT_EXTENSION);
        let full_key = photo_key(&album.id, &filename);
        let thumb_key = thumbnail_key(&album.id, &filename);
        let full_size = processed.full.len() as u64;

        self.blobs
            .put(&full_key, processed.full, images::OUTPUT_MIME_TYPE)
            .await?;
        if let Err(e) = self
            .blobs
            .put(&thumb_key, processed.thumbnail, images::OUTPUT_MIME_TYPE)
            .await
        {
            // Roll back the first write so no thumbnail-less full
            // rendition is left behind; a failed rollback downgrades
            // to a logged leak
            if let Err(cleanup_err) = self.blobs.delete(&full_key).await {
                warn!(
                    "Leaked blob {} after failed thumbnail write: {}",
                    full_key, cleanup_err
                );
            }
            return Err(e);
        }

        let album_id_owned = album.id.clone();
        let photo = self
            .store
            .insert_with::<PhotoCollection, _>(move |photos| {
                // max+1 within the same read that appends
                let max_sort = photos
                    .iter()
                    .filter(|p| p.album_id == album_id_owned)
                    .map(|p| p.sort_order)
                    .max()
                    .unwrap_or(-1);

                Ok(Photo {
                    id: photo_id.clone(),
                    album_id: album_id_owned.clone(),
                    filename: filename.clone(),
                    original_filename,
                    mime_type: images::OUTPUT_MIME_TYPE.to_string(),
                    size: full_size,
                    width: processed.width,
                    height: processed.height,
                    thumbnail_key: thumb_key.clone(),
                    full_key: full_key.clone(),
                    caption,
                    sort_order: max_sort + 1,
                    uploaded_at: Utc::now(),
                })
            })
            .await?;

        // First photo becomes the cover when none is set
        if album.cover_photo_id.is_none() {
            let cover_id = photo.id.clone();
            self.store
                .update::<AlbumCollection, _>(&album.id, move |a| {
                    if a.cover_photo_id.is_none() {
                        a.cover_photo_id = Some(cover_id);
                    }
                })
                .await?;
        }

        Ok(photo)
    }

    /// Apply a partial update; returns `None` when the photo is absent
    pub async fn update_photo(
        &self,
        id: &str,
        patch: PhotoPatch,
    ) -> GalleryResult<Option<Photo>> {
        self.store
            .update::<PhotoCollection, _>(id, move |photo| {
                if let Some(caption) = patch.caption {
                    photo.caption = caption;
                }
                if let Some(sort_order) = patch.sort_order {
                    photo.sort_order = sort_order;
                }
            })
            .await
    }

    /// Delete a photo record, null any cover pointing at it, and
    /// best-effort delete its two owned blobs
    pub async fn delete_photo(&self, id: &str) -> GalleryResult<()> {
        let photo = self
            .photo_by_id(id)
            .await?
            .ok_or_else(|| GalleryError::NotFound("Photo not found".to_string()))?;

        self.store.delete::<PhotoCollection>(&photo.id).await?;
        self.clear_cover_references(std::slice::from_ref(&photo.id))
            .await?;
        self.delete_photo_blobs(&photo).await;

        Ok(())
    }

    /// Rewrite the sort order of an album's photos to match the given
    /// id sequence; photos not listed keep their order
    pub async fn reorder_photos(
        &self,
        album_id: &str,
        photo_ids: &[String],
    ) -> GalleryResult<()> {
        let mut photos = self.store.list::<PhotoCollection>().await?;
        for photo in photos.iter_mut().filter(|p| p.album_id == album_id) {
            if let Some(pos) = photo_ids.iter().position(|id| *id == photo.id) {
                photo.sort_order = pos as i64;
            }
        }
        self.store.overwrite::<PhotoCollection>(photos).await
    }

    /// Presigned download URLs for a photo's renditions
    pub async fn photo_urls(&self, photo: &Photo) -> GalleryResult<(String, String)> {
        let full = self
            .blobs
            .presign_get(&photo.full_key, self.presign_ttl)
            .await?;
        let thumbnail = self
            .blobs
            .presign_get(&photo.thumbnail_key, self.presign_ttl)
            .await?;
        Ok((full, thumbnail))
    }

    /// Look up the photo owning a blob key (full or thumbnail rendition)
    pub async fn photo_by_blob_key(&self, key: &str) -> GalleryResult<Option<Photo>> {
        self.store
            .find::<PhotoCollection, _>(|p| p.full_key == key || p.thumbnail_key == key)
            .await
    }

    /// Raw bytes of a stored rendition
    pub async fn image_bytes(&self, key: &str) -> GalleryResult<Option<Vec<u8>>> {
        self.blobs.get(key).await
    }

    /// Null every album cover that references one of the given photos
    ///
    /// The single cleanup routine behind both the photo-delete and
    /// album-delete paths; covers referencing other photos are left
    /// untouched.
    async fn clear_cover_references(&self, photo_ids: &[String]) -> GalleryResult<()> {
        if photo_ids.is_empty() {
            return Ok(());
        }
        let albums = self.store.list::<AlbumCollection>().await?;
        for album in albums {
            if let Some(cover) = &album.cover_photo_id {
                if photo_ids.contains(cover) {
                    self.store
                        .update::<AlbumCollection, _>(&album.id, |a| {
                            a.cover_photo_id = None;
                        })
                        .await?;
                }
            }
        }
        Ok(())
    }

    /// Best-effort deletion of a photo's two owned blobs; failures are
    /// logged, not surfaced, since the record delete already succeeded
    /// from the caller's perspective
    async fn delete_photo_blobs(&self, photo: &Photo) {
        for key in [&photo.full_key, &photo.thumbnail_key] {
            if let Err(e) = self.blobs.delete(key).await {
                warn!("Failed to delete blob {} (leaked): {}", key, e);
            }
        }
    }

    // ==================== Users ====================

    /// Register a user
    ///
    /// The first-ever user is promoted to admin regardless of the
    /// requested role; both the promotion decision and the username
    /// uniqueness check run against the same collection read that
    /// appends the record.
    pub async fn register_user(
        &self,
        username: String,
        password: &str,
        requested_role: Role,
    ) -> GalleryResult<User> {
        let password_hash = hash_password(password)?;

        self.store
            .insert_with::<UserCollection, _>(move |users| {
                if users.iter().any(|u| u.username == username) {
                    return Err(GalleryError::Conflict(
                        "Username already exists".to_string(),
                    ));
                }
                let role = if users.is_empty() {
                    Role::Admin
                } else {
                    requested_role
                };
                Ok(User::new(username, password_hash, role))
            })
            .await
    }

    /// Verify credentials; `None` on unknown user or wrong password
    pub async fn authenticate_user(
        &self,
        username: &str,
        password: &str,
    ) -> GalleryResult<Option<User>> {
        let user = self
            .store
            .find::<UserCollection, _>(|u| u.username == username)
            .await?;

        Ok(user.filter(|u| crate::auth::verify_password(password, &u.password_hash)))
    }

    pub async fn user_by_id(&self, id: &str) -> GalleryResult<Option<User>> {
        self.store.find_by_id::<UserCollection>(id).await
    }

    pub async fn list_users(&self) -> GalleryResult<Vec<User>> {
        self.store.list::<UserCollection>().await
    }

    pub async fn has_users(&self) -> GalleryResult<bool> {
        Ok(!self.list_users().await?.is_empty())
    }
}

/// Lowercase, non-alphanumeric runs collapsed to single hyphens,
/// leading/trailing hyphens trimmed
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true; // suppress a leading hyphen
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
