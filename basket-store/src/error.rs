use thiserror::Error;
use uuid::Uuid;

/// Result type for metadata store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Metadata store failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("File not found: {0}")]
    NotFound(Uuid),

    #[error("File already exists: {0}")]
    Conflict(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
