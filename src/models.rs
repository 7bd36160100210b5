/// Entity types persisted in the JSON collection documents
///
/// Field names serialize as camelCase to match the on-disk documents
/// (`data/albums.json` etc.), which predate this server.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Viewer,
}

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            password_hash,
            role,
            created_at: Utc::now(),
        }
    }
}

/// An album of photos
///
/// `cover_photo_id` is a weak reference: it points at a photo in this
/// album but does not own it, and must be nulled by whichever delete
/// path removes the referenced photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Globally unique, derived from the title (numeric suffix on collision)
    pub slug: String,
    pub cover_photo_id: Option<String>,
    pub is_public: bool,
    /// User ids who can view this album when it is private
    pub allowed_users: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Album {
    pub fn new(
        title: String,
        description: String,
        slug: String,
        is_public: bool,
        allowed_users: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            slug,
            cover_photo_id: None,
            is_public,
            allowed_users,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A photo belonging to exactly one album
///
/// The record exclusively owns its two blob keys; deleting the record
/// deletes both blobs (or leaves them orphaned on partial failure).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    pub album_id: String,
    /// Derived storage filename, always `{id}.jpg`
    pub filename: String,
    /// What the uploader called the file, display only
    pub original_filename: String,
    pub mime_type: String,
    /// Byte size of the full rendition
    pub size: u64,
    /// Pixel dimensions of the full rendition
    pub width: u32,
    pub height: u32,
    pub thumbnail_key: String,
    pub full_key: String,
    pub caption: String,
    /// Display ordering within the album; gaps tolerated, not compacted
    pub sort_order: i64,
    pub uploaded_at: DateTime<Utc>,
}
