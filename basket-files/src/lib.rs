//! # basket-files: the file domain service
//!
//! [`FileService`] ties a metadata [`basket_store::FileStore`] to a
//! [`basket_blob::BlobBackend`]:
//!
//! - `upload` streams bytes to the backend, then records metadata
//! - `download` streams bytes into a [`DownloadSink`] and counts the download
//! - `update` edits title, name and description
//! - `delete` removes the record, and the blob once nothing references it
//!
//! ```rust
//! use std::sync::Arc;
//! use basket_blob::MemoryBlobBackend;
//! use basket_files::{BufferSink, FilePayload, FileService, FileServiceConfig, UploadFileRequest};
//! use basket_store::MemoryFileStore;
//!
//! # #[tokio::main]
//! # async fn main() -> basket_core::BasketResult<()> {
//! let service = FileService::new(
//!     Arc::new(MemoryFileStore::new()),
//!     Arc::new(MemoryBlobBackend::new()),
//!     FileServiceConfig::default(),
//! );
//!
//! let file = service
//!     .upload(UploadFileRequest::new(FilePayload::from_bytes("notes.txt", b"hi".to_vec())))
//!     .await?;
//! assert_eq!(file.title, "notes");
//!
//! let mut sink = BufferSink::new();
//! service.download(file.id, &mut sink).await?;
//! assert_eq!(sink.body, b"hi");
//! # Ok(())
//! # }
//! ```

mod config;
mod dto;
mod reader;
mod service;
mod sink;

pub use config::{FileServiceConfig, DEFAULT_MAX_FILE_SIZE};
pub use dto::{FilePayload, FileSource, UpdateFileRequest, UploadFileRequest};
pub use reader::read_chunks;
pub use service::{title_from_filename, FileService};
pub use sink::{BufferSink, DownloadHead, DownloadSink, OCTET_STREAM};
