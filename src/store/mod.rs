/// JSON collection store
///
/// Each collection (albums, photos, users) is one JSON document in the
/// blob store, mutated under whole-document read-modify-write. The
/// backing store offers no transactions and no compare-and-swap, so two
/// concurrent cycles on the same collection race: the later overwrite
/// silently discards the earlier writer's changes (lost update). At the
/// expected cardinality (tens of albums, low thousands of photos) this
/// is an accepted trade-off, documented here and locked in by a test
/// below; a deployment needing strict consistency must replace this
/// with a versioned or single-writer scheme.

pub mod collections;

pub use collections::{AlbumCollection, PhotoCollection, UserCollection};

use crate::{
    blob_store::BlobBackend,
    error::{GalleryError, GalleryResult},
};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

/// A collection of one entity type, persisted as a single JSON document
pub trait Collection: Default + Serialize + DeserializeOwned + Send {
    type Entity: Clone + Serialize + DeserializeOwned + Send + Sync;

    /// Blob key of the backing document, e.g. `data/albums.json`
    const KEY: &'static str;

    fn into_items(self) -> Vec<Self::Entity>;
    fn from_items(items: Vec<Self::Entity>) -> Self;

    fn id(entity: &Self::Entity) -> &str;

    /// Stamp the update time, for entities that track one
    fn touch(_entity: &mut Self::Entity) {}
}

/// Store for the JSON collection documents
#[derive(Clone)]
pub struct CollectionStore {
    backend: Arc<dyn BlobBackend>,
}

impl CollectionStore {
    pub fn new(backend: Arc<dyn BlobBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn BlobBackend> {
        &self.backend
    }

    /// Read the entire collection; absent documents read as empty
    /// (collections are lazily materialized)
    pub async fn list<C: Collection>(&self) -> GalleryResult<Vec<C::Entity>> {
        match self.backend.get(C::KEY).await? {
            Some(bytes) => {
                let doc: C = serde_json::from_slice(&bytes).map_err(|e| {
                    GalleryError::Internal(format!(
                        "Corrupt collection document {}: {}",
                        C::KEY,
                        e
                    ))
                })?;
                Ok(doc.into_items())
            }
            None => Ok(Vec::new()),
        }
    }

    /// Overwrite the entire collection
    pub async fn overwrite<C: Collection>(&self, items: Vec<C::Entity>) -> GalleryResult<()> {
        let doc = C::from_items(items);
        let bytes = serde_json::to_vec_pretty(&doc)
            .map_err(|e| GalleryError::Internal(format!("Failed to encode {}: {}", C::KEY, e)))?;
        self.backend.put(C::KEY, bytes, "application/json").await
    }

    /// Pre-create the backing document if absent; idempotent
    pub async fn ensure<C: Collection>(&self) -> GalleryResult<()> {
        if self.backend.get(C::KEY).await?.is_none() {
            self.overwrite::<C>(Vec::new()).await?;
        }
        Ok(())
    }

    /// Find the first entity matching a predicate
    pub async fn find<C, P>(&self, predicate: P) -> GalleryResult<Option<C::Entity>>
    where
        C: Collection,
        P: Fn(&C::Entity) -> bool,
    {
        Ok(self.list::<C>().await?.into_iter().find(|e| predicate(e)))
    }

    /// Find an entity by id
    pub async fn find_by_id<C: Collection>(&self, id: &str) -> GalleryResult<Option<C::Entity>> {
        self.find::<C, _>(|e| C::id(e) == id).await
    }

    /// Append an entity: read, push, persist
    pub async fn insert<C: Collection>(&self, entity: C::Entity) -> GalleryResult<C::Entity> {
        self.insert_with::<C, _>(move |_| Ok(entity)).await
    }

    /// Append an entity built from the freshly-read collection
    ///
    /// The builder sees the same read the append is applied to, so
    /// uniqueness checks (username, slug) and derived fields (sort
    /// order) are computed against current state rather than a stale
    /// cache. This narrows the race window; it does not close it.
    pub async fn insert_with<C, F>(&self, build: F) -> GalleryResult<C::Entity>
    where
        C: Collection,
        F: FnOnce(&[C::Entity]) -> GalleryResult<C::Entity>,
    {
        let mut items = self.list::<C>().await?;
        let entity = build(&items)?;
        items.push(entity.clone());
        self.overwrite::<C>(items).await?;
        Ok(entity)
    }

    /// Partial update: locate by id, apply the mutation, stamp the
    /// update time, persist. Fields the mutation does not touch are
    /// preserved. Returns `None` when the id is absent.
    pub async fn update<C, F>(&self, id: &str, apply: F) -> GalleryResult<Option<C::Entity>>
    where
        C: Collection,
        F: FnOnce(&mut C::Entity),
    {
        let mut items = self.list::<C>().await?;
        let Some(entity) = items.iter_mut().find(|e| C::id(e) == id) else {
            return Ok(None);
        };
        apply(entity);
        C::touch(entity);
        let updated = entity.clone();
        self.overwrite::<C>(items).await?;
        Ok(Some(updated))
    }

    /// Remove an entity by id; returns whether one was removed
    pub async fn delete<C: Collection>(&self, id: &str) -> GalleryResult<bool> {
        let items = self.list::<C>().await?;
        let before = items.len();
        let remaining: Vec<_> = items.into_iter().filter(|e| C::id(e) != id).collect();
        if remaining.len() == before {
            return Ok(false);
        }
        self.overwrite::<C>(remaining).await?;
        Ok(true)
    }

    /// Remove every entity matching a predicate, returning the removed
    /// entities so the caller can clean up owned blobs
    pub async fn delete_where<C, P>(&self, predicate: P) -> GalleryResult<Vec<C::Entity>>
    where
        C: Collection,
        P: Fn(&C::Entity) -> bool,
    {
        let items = self.list::<C>().await?;
        let (removed, remaining): (Vec<_>, Vec<_>) =
            items.into_iter().partition(|e| predicate(e));
        if !removed.is_empty() {
            self.overwrite::<C>(remaining).await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        blob_store::DiskBlobBackend,
        models::{Role, User},
        store::collections::UserCollection,
    };
    use tempfile::tempdir;

    fn test_user(username: &str) -> User {
        User::new(username.to_string(), "hash".to_string(), Role::Viewer)
    }

    async fn create_test_store() -> (CollectionStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let backend = Arc::new(DiskBlobBackend::new(dir.path().to_path_buf()));
        (CollectionStore::new(backend), dir)
    }

    #[tokio::test]
    async fn test_absent_collection_reads_empty() {
        let (store, _dir) = create_test_store().await;
        let users = store.list::<UserCollection>().await.unwrap();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let (store, _dir) = create_test_store().await;

        store.ensure::<UserCollection>().await.unwrap();
        store.insert::<UserCollection>(test_user("alice")).await.unwrap();

        // A second ensure must not clobber existing data
        store.ensure::<UserCollection>().await.unwrap();
        assert_eq!(store.list::<UserCollection>().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_find_round_trip() {
        let (store, _dir) = create_test_store().await;

        let user = test_user("alice");
        let inserted = store.insert::<UserCollection>(user.clone()).await.unwrap();

        let found = store
            .find_by_id::<UserCollection>(&inserted.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.username, "alice");
        assert_eq!(found.password_hash, "hash");
    }

    #[tokio::test]
    async fn test_update_merges_and_preserves() {
        let (store, _dir) = create_test_store().await;

        let user = store.insert::<UserCollection>(test_user("bob")).await.unwrap();

        let updated = store
            .update::<UserCollection, _>(&user.id, |u| u.role = Role::Admin)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.role, Role::Admin);
        // Untouched fields preserved
        assert_eq!(updated.username, "bob");
        assert_eq!(updated.password_hash, "hash");
    }

    #[tokio::test]
    async fn test_update_absent_id_returns_none() {
        let (store, _dir) = create_test_store().await;

        let result = store
            .update::<UserCollection, _>("no-such-id", |u| u.role = Role::Admin)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_twice_removes_once() {
        let (store, _dir) = create_test_store().await;

        let user = store.insert::<UserCollection>(test_user("carol")).await.unwrap();
        store.insert::<UserCollection>(test_user("dave")).await.unwrap();

        assert!(store.delete::<UserCollection>(&user.id).await.unwrap());
        assert!(!store.delete::<UserCollection>(&user.id).await.unwrap());
        assert_eq!(store.list::<UserCollection>().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_where_returns_removed() {
        let (store, _dir) = create_test_store().await;

        store.insert::<UserCollection>(test_user("erin")).await.unwrap();
        store.insert::<UserCollection>(test_user("frank")).await.unwrap();
        store.insert::<UserCollection>(test_user("grace")).await.unwrap();

        let removed = store
            .delete_where::<UserCollection, _>(|u| u.username.starts_with('f'))
            .await
            .unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].username, "frank");
        assert_eq!(store.list::<UserCollection>().await.unwrap().len(), 2);
    }

    /// Documented hazard, not a bug: two read-modify-write cycles whose
    /// reads both precede either write end with only the later writer's
    /// change surviving. This test locks in the trade-off; if it starts
    /// failing, the store has grown consistency guarantees and the
    /// contract docs need updating.
    #[tokio::test]
    async fn test_concurrent_writers_lose_updates() {
        let (store, _dir) = create_test_store().await;

        // Both writers read the (empty) collection
        let snapshot_a = store.list::<UserCollection>().await.unwrap();
        let snapshot_b = store.list::<UserCollection>().await.unwrap();

        // Writer A appends and persists
        let mut items_a = snapshot_a;
        items_a.push(test_user("first-writer"));
        store.overwrite::<UserCollection>(items_a).await.unwrap();

        // Writer B appends to its stale read and persists
        let mut items_b = snapshot_b;
        items_b.push(test_user("second-writer"));
        store.overwrite::<UserCollection>(items_b).await.unwrap();

        let users = store.list::<UserCollection>().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "second-writer");
    }
}
