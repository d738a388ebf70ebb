use bytes::Bytes;
use futures_core::Stream;
use std::pin::Pin;

/// Stream of bytes for blob content.
///
/// Finite and not restartable. Producers are only polled when the consumer
/// asks for the next chunk.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Opaque reference to a blob, issued by the backend on upload
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceRef(pub String);

impl SourceRef {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SourceRef {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SourceRef {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Wrap already-split chunks as a [`ByteStream`].
pub fn stream_from_chunks<I>(chunks: I) -> ByteStream
where
    I: IntoIterator<Item = Bytes>,
    I::IntoIter: Send + 'static,
{
    Box::pin(futures_util::stream::iter(chunks.into_iter().map(Ok)))
}

/// Split `data` into `chunk_size` pieces without copying.
pub fn split_chunks(data: &Bytes, chunk_size: usize) -> Vec<Bytes> {
    let chunk_size = chunk_size.max(1);
    (0..data.len())
        .step_by(chunk_size)
        .map(|start| data.slice(start..(start + chunk_size).min(data.len())))
        .collect()
}
