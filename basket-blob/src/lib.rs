//! # basket-blob: client side of the blob backend
//!
//! File bytes never live in the metadata store. They live in a separate
//! blob backend reached over gRPC, which knows three calls:
//!
//! - **upload**: client-streaming, answers with a fresh [`SourceRef`]
//! - **download**: server-streaming, ordered chunks until end-of-stream
//! - **delete**: unary and idempotent
//!
//! ## Quick Start
//!
//! ```rust
//! use basket_blob::prelude::*;
//! use bytes::Bytes;
//!
//! # #[tokio::main]
//! # async fn main() -> BlobResult<()> {
//! let backend = MemoryBlobBackend::new();
//!
//! let body = basket_blob::stream_from_chunks(vec![Bytes::from_static(b"Hello, world!")]);
//! let source_ref = backend.upload(body).await?;
//!
//! let _content = backend.download(&source_ref).await?;
//! backend.delete(&source_ref).await?;
//! # Ok(())
//! # }
//! ```
//!
//! In production the backend is [`GrpcBlobBackend`]:
//!
//! ```rust,no_run
//! use basket_blob::{GrpcBackendConfig, GrpcBlobBackend};
//!
//! # async fn example() -> basket_blob::BlobResult<()> {
//! let backend = GrpcBlobBackend::connect_lazy(GrpcBackendConfig::new("http://blobs:50051"))?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod config;
mod error;
pub mod grpc;
pub mod memory;
mod types;

/// Chunk size used when splitting payloads for transfer (32 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;

pub use backend::BlobBackend;
pub use config::GrpcBackendConfig;
pub use error::{BlobError, BlobResult};
pub use grpc::GrpcBlobBackend;
pub use memory::MemoryBlobBackend;
pub use types::{split_chunks, stream_from_chunks, ByteStream, SourceRef};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BlobBackend, BlobError, BlobResult, ByteStream, GrpcBlobBackend, MemoryBlobBackend, SourceRef,
    };
}
