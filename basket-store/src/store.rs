use async_trait::async_trait;
use basket_blob::SourceRef;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{File, StoreResult};

/// Persistence for [`File`] records.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Insert a new record. Fails with `Conflict` if the id is taken.
    async fn create(&self, file: &File) -> StoreResult<()>;

    /// Fetch by id. Fails with `NotFound` if absent.
    async fn get(&self, id: Uuid) -> StoreResult<File>;

    /// Overwrite title, name, description and updated_at.
    /// `source_ref`, `size`, `download_count` and `created_at` are never
    /// rewritten.
    async fn update(&self, file: &File) -> StoreResult<()>;

    /// Add one to `download_count` and set `updated_at`, atomically with
    /// respect to other writers. Returns the record as stored.
    async fn record_download(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<File>;

    /// Remove by id. Removing a missing id is not an error.
    async fn delete(&self, id: Uuid) -> StoreResult<()>;

    /// Whether any record references `source_ref`.
    async fn exists_by_ref(&self, source_ref: &SourceRef) -> StoreResult<bool>;

    /// Remove `file` and report whether any remaining record still
    /// references its `source_ref`.
    ///
    /// The default runs the two steps separately, so two concurrent calls
    /// for the last two records of a blob can both see the other's row.
    /// Stores that can do better override it.
    async fn remove_and_check_ref(&self, file: &File) -> StoreResult<bool> {
        self.delete(file.id).await?;
        self.exists_by_ref(&file.source_ref).await
    }
}
