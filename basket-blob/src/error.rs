use thiserror::Error;

/// Result type for blob backend operations
pub type BlobResult<T> = Result<T, BlobError>;

/// Errors returned by a blob backend client
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Blob not found: {source_ref}")]
    NotFound { source_ref: String },

    #[error("Upload failed: {reason}")]
    UploadFailed { reason: String },

    #[error("Blob backend call failed: {status}")]
    Rpc { status: Box<tonic::Status> },

    #[error("Blob backend transport error: {source}")]
    Transport {
        #[from]
        source: tonic::transport::Error,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl BlobError {
    /// Create a not found error
    pub fn not_found<S: Into<String>>(source_ref: S) -> Self {
        Self::NotFound {
            source_ref: source_ref.into(),
        }
    }

    /// Create an upload failed error
    pub fn upload_failed<S: Into<String>>(reason: S) -> Self {
        Self::UploadFailed {
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<tonic::Status> for BlobError {
    fn from(status: tonic::Status) -> Self {
        Self::Rpc {
            status: Box::new(status),
        }
    }
}
