//! Collaborator seams for collection and file metadata.
//!
//! Durable storage lives outside this service; the in-memory stores back
//! the binary and the tests.

use async_trait::async_trait;
use safchat_types::{Collection, FileRecord};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Collection not found: {0}")]
    CollectionNotFound(Uuid),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait CollectionStore: Send + Sync {
    async fn create(&self, name: &str) -> StoreResult<Collection>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<Collection>>;

    /// Returns the previous value
    async fn set_thread_id(&self, id: Uuid, thread_id: Option<String>)
        -> StoreResult<Option<String>>;

    /// Returns the previous value
    async fn set_vector_store_id(
        &self,
        id: Uuid,
        vector_store_id: Option<String>,
    ) -> StoreResult<Option<String>>;
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Files of one collection, oldest upload first
    async fn list(&self, collection_id: Uuid) -> StoreResult<Vec<FileRecord>>;

    async fn get(&self, collection_id: Uuid, file_id: Uuid) -> StoreResult<Option<FileRecord>>;

    async fn insert(&self, record: FileRecord) -> StoreResult<()>;

    async fn remove(&self, collection_id: Uuid, file_id: Uuid)
        -> StoreResult<Option<FileRecord>>;
}

#[derive(Default)]
pub struct InMemoryCollectionStore {
    collections: RwLock<HashMap<Uuid, Collection>>,
}

impl InMemoryCollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, collection: Collection) {
        self.collections
            .write()
            .await
            .insert(collection.id, collection);
    }
}

#[async_trait]
impl CollectionStore for InMemoryCollectionStore {
    async fn create(&self, name: &str) -> StoreResult<Collection> {
        let collection = Collection::new(name);
        self.insert(collection.clone()).await;
        Ok(collection)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Collection>> {
        Ok(self.collections.read().await.get(&id).cloned())
    }

    async fn set_thread_id(
        &self,
        id: Uuid,
        thread_id: Option<String>,
    ) -> StoreResult<Option<String>> {
        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(&id)
            .ok_or(StoreError::CollectionNotFound(id))?;
        Ok(std::mem::replace(&mut collection.thread_id, thread_id))
    }

    async fn set_vector_store_id(
        &self,
        id: Uuid,
        vector_store_id: Option<String>,
    ) -> StoreResult<Option<String>> {
        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(&id)
            .ok_or(StoreError::CollectionNotFound(id))?;
        Ok(std::mem::replace(
            &mut collection.vector_store_id,
            vector_store_id,
        ))
    }
}

#[derive(Default)]
pub struct InMemoryFileStore {
    files: RwLock<HashMap<Uuid, Vec<FileRecord>>>,
}

impl InMemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn list(&self, collection_id: Uuid) -> StoreResult<Vec<FileRecord>> {
        Ok(self
            .files
            .read()
            .await
            .get(&collection_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get(&self, collection_id: Uuid, file_id: Uuid) -> StoreResult<Option<FileRecord>> {
        Ok(self
            .files
            .read()
            .await
            .get(&collection_id)
            .and_then(|files| files.iter().find(|f| f.id == file_id).cloned()))
    }

    async fn insert(&self, record: FileRecord) -> StoreResult<()> {
        self.files
            .write()
            .await
            .entry(record.collection_id)
            .or_default()
            .push(record);
        Ok(())
    }

    async fn remove(
        &self,
        collection_id: Uuid,
        file_id: Uuid,
    ) -> StoreResult<Option<FileRecord>> {
        let mut files = self.files.write().await;
        let Some(records) = files.get_mut(&collection_id) else {
            return Ok(None);
        };
        Ok(records
            .iter()
            .position(|f| f.id == file_id)
            .map(|index| records.remove(index)))
    }
}
