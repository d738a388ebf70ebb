use async_trait::async_trait;

use crate::{BlobResult, ByteStream, SourceRef};

/// The remote blob backend, as seen by the file service.
///
/// Implementations own nothing but the transport: they never look at file
/// metadata and never decide whether a blob should be deleted.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Client-streaming upload. Chunks are sent in stream order; the backend
    /// answers with a fresh reference once the stream ends.
    ///
    /// An `Err` item aborts the call and no reference is returned.
    async fn upload(&self, body: ByteStream) -> BlobResult<SourceRef>;

    /// Server-streaming download of the blob behind `source_ref`.
    async fn download(&self, source_ref: &SourceRef) -> BlobResult<ByteStream>;

    /// Delete the blob behind `source_ref`.
    ///
    /// Idempotent: an unknown or already-deleted reference is not an error.
    async fn delete(&self, source_ref: &SourceRef) -> BlobResult<()>;
}
