use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::types::{split_chunks, stream_from_chunks};
use crate::{BlobBackend, BlobError, BlobResult, ByteStream, SourceRef, DEFAULT_CHUNK_SIZE};

/// In-memory blob backend for testing and development.
///
/// Clones share the same storage.
#[derive(Clone)]
pub struct MemoryBlobBackend {
    blobs: Arc<RwLock<HashMap<SourceRef, Bytes>>>,
    upload_calls: Arc<AtomicUsize>,
    delete_calls: Arc<AtomicUsize>,
    chunk_size: usize,
}

impl MemoryBlobBackend {
    pub fn new() -> Self {
        Self {
            blobs: Arc::new(RwLock::new(HashMap::new())),
            upload_calls: Arc::new(AtomicUsize::new(0)),
            delete_calls: Arc::new(AtomicUsize::new(0)),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Size of the chunks handed out by `download`
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Store `data` directly, bypassing `upload`.
    pub fn insert(&self, data: impl Into<Bytes>) -> SourceRef {
        let source_ref = Self::next_ref();
        self.blobs.write().insert(source_ref.clone(), data.into());
        source_ref
    }

    pub fn get(&self, source_ref: &SourceRef) -> Option<Bytes> {
        self.blobs.read().get(source_ref).cloned()
    }

    pub fn contains(&self, source_ref: &SourceRef) -> bool {
        self.blobs.read().contains_key(source_ref)
    }

    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    /// Number of `upload` calls received, successful or not
    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    /// Number of `delete` calls received
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    fn next_ref() -> SourceRef {
        SourceRef::new(format!("mem_{}", Uuid::new_v4().simple()))
    }
}

impl Default for MemoryBlobBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobBackend for MemoryBlobBackend {
    async fn upload(&self, mut body: ByteStream) -> BlobResult<SourceRef> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);

        let mut buffer = BytesMut::new();
        while let Some(chunk) = body.next().await {
            buffer.extend_from_slice(&chunk?);
        }

        let source_ref = Self::next_ref();
        self.blobs
            .write()
            .insert(source_ref.clone(), buffer.freeze());

        tracing::debug!(%source_ref, "stored blob in memory");
        Ok(source_ref)
    }

    async fn download(&self, source_ref: &SourceRef) -> BlobResult<ByteStream> {
        let data = self
            .get(source_ref)
            .ok_or_else(|| BlobError::not_found(source_ref.as_str()))?;

        Ok(stream_from_chunks(split_chunks(&data, self.chunk_size)))
    }

    async fn delete(&self, source_ref: &SourceRef) -> BlobResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.blobs.write().remove(source_ref);
        Ok(())
    }
}
