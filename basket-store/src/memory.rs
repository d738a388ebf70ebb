use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use basket_blob::SourceRef;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::{File, FileStore, StoreError, StoreResult};

/// In-memory store for testing and development
#[derive(Clone, Default)]
pub struct MemoryFileStore {
    files: Arc<RwLock<HashMap<Uuid, File>>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.files.read().contains_key(&id)
    }

    /// Number of records pointing at `source_ref`
    pub fn ref_count(&self, source_ref: &SourceRef) -> usize {
        self.files
            .read()
            .values()
            .filter(|f| &f.source_ref == source_ref)
            .count()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn create(&self, file: &File) -> StoreResult<()> {
        let mut files = self.files.write();
        if files.contains_key(&file.id) {
            return Err(StoreError::Conflict(file.id));
        }
        files.insert(file.id, file.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<File> {
        self.files
            .read()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, file: &File) -> StoreResult<()> {
        let mut files = self.files.write();
        let stored = files.get_mut(&file.id).ok_or(StoreError::NotFound(file.id))?;
        stored.apply_mutable(file);
        Ok(())
    }

    async fn record_download(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<File> {
        let mut files = self.files.write();
        let stored = files.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        stored.download_count += 1;
        stored.updated_at = at;
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        self.files.write().remove(&id);
        Ok(())
    }

    async fn exists_by_ref(&self, source_ref: &SourceRef) -> StoreResult<bool> {
        Ok(self
            .files
            .read()
            .values()
            .any(|f| &f.source_ref == source_ref))
    }

    // One write lock for both steps.
    async fn remove_and_check_ref(&self, file: &File) -> StoreResult<bool> {
        let mut files = self.files.write();
        files.remove(&file.id);
        Ok(files.values().any(|f| f.source_ref == file.source_ref))
    }
}
