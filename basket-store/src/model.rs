use basket_blob::SourceRef;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Metadata for one uploaded file.
///
/// `source_ref` points at the blob holding the bytes. It is fixed at
/// creation, may be shared with other records, and is never shown to API
/// clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct File {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub source_ref: SourceRef,
    pub title: String,
    pub name: String,
    pub description: String,
    /// Byte length declared by the uploader
    pub size: u64,
    pub download_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl File {
    /// Copy the fields `FileStore::update` is allowed to overwrite.
    pub(crate) fn apply_mutable(&mut self, from: &File) {
        self.title = from.title.clone();
        self.name = from.name.clone();
        self.description = from.description.clone();
        self.updated_at = from.updated_at;
    }
}
