use std::fmt;

use serde::Deserialize;
use tokio::io::AsyncRead;

/// Partial update of a file's descriptive fields.
///
/// An empty string means "leave unchanged", so a field cannot be cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpdateFileRequest {
    pub title: String,
    pub name: String,
    pub description: String,
}

/// Readable byte source of an uploaded file
pub type FileSource = Box<dyn AsyncRead + Send + Unpin>;

/// One file as received from the client
pub struct FilePayload {
    pub filename: String,
    /// Size declared by the client. Trusted as-is.
    pub size: u64,
    pub source: FileSource,
}

impl FilePayload {
    pub fn new(filename: impl Into<String>, size: u64, source: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            filename: filename.into(),
            size,
            source: Box::new(source),
        }
    }

    /// Payload backed by an in-memory buffer; the declared size is its length.
    pub fn from_bytes(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        let size = data.len() as u64;
        Self::new(filename, size, std::io::Cursor::new(data))
    }
}

impl fmt::Debug for FilePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePayload")
            .field("filename", &self.filename)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct UploadFileRequest {
    pub file: Option<FilePayload>,
}

impl UploadFileRequest {
    pub fn new(file: FilePayload) -> Self {
        Self { file: Some(file) }
    }

    /// A request without a file part
    pub fn empty() -> Self {
        Self::default()
    }
}
