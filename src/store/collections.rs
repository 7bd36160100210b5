/// The three persisted collection documents
///
/// Wire format matches the historical layout exactly:
/// `data/albums.json` holds `{ "albums": [...] }` and so on.
use crate::{
    error::GalleryResult,
    models::{Album, Photo, User},
    store::{Collection, CollectionStore},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AlbumCollection {
    pub albums: Vec<Album>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PhotoCollection {
    pub photos: Vec<Photo>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UserCollection {
    pub users: Vec<User>,
}

impl Collection for AlbumCollection {
    type Entity = Album;
    const KEY: &'static str = "data/albums.json";

    fn into_items(self) -> Vec<Album> {
        self.albums
    }

    fn from_items(items: Vec<Album>) -> Self {
        Self { albums: items }
    }

    fn id(entity: &Album) -> &str {
        &entity.id
    }

    fn touch(entity: &mut Album) {
        entity.updated_at = Utc::now();
    }
}

impl Collection for PhotoCollection {
    type Entity = Photo;
    const KEY: &'static str = "data/photos.json";

    fn into_items(self) -> Vec<Photo> {
        self.photos
    }

    fn from_items(items: Vec<Photo>) -> Self {
        Self { photos: items }
    }

    fn id(entity: &Photo) -> &str {
        &entity.id
    }
}

impl Collection for UserCollection {
    type Entity = User;
    const KEY: &'static str = "data/users.json";

    fn into_items(self) -> Vec<User> {
        self.users
    }

    fn from_items(items: Vec<User>) -> Self {
        Self { users: items }
    }

    fn id(entity: &User) -> &str {
        &entity.id
    }
}

/// Pre-create empty collection documents so startup is idempotent
pub async fn init_collections(store: &CollectionStore) -> GalleryResult<()> {
    store.ensure::<AlbumCollection>().await?;
    store.ensure::<PhotoCollection>().await?;
    store.ensure::<UserCollection>().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob_store::data_key;

    #[test]
    fn test_doc_keys_match_layout() {
        assert_eq!(AlbumCollection::KEY, data_key("albums.json"));
        assert_eq!(PhotoCollection::KEY, data_key("photos.json"));
        assert_eq!(UserCollection::KEY, data_key("users.json"));
    }

    #[test]
    fn test_album_document_wire_format() {
        let doc: AlbumCollection = serde_json::from_str(
            r#"{
                "albums": [{
                    "id": "a1",
                    "title": "Trip",
                    "description": "",
                    "slug": "trip",
                    "coverPhotoId": null,
                    "isPublic": true,
                    "allowedUsers": [],
                    "createdAt": "2024-01-01T00:00:00Z",
                    "updatedAt": "2024-01-01T00:00:00Z"
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(doc.albums.len(), 1);
        assert_eq!(doc.albums[0].slug, "trip");
        assert!(doc.albums[0].cover_photo_id.is_none());

        // Round-trips with camelCase field names
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("coverPhotoId"));
        assert!(json.contains("isPublic"));
    }
}
