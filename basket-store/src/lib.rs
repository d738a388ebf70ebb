//! # basket-store: file metadata persistence
//!
//! [`FileStore`] is the contract the file service talks to. Two
//! implementations ship here:
//!
//! - [`PgFileStore`] for Postgres, with embedded migrations
//! - [`MemoryFileStore`] for tests and local development
//!
//! ```rust
//! use basket_store::{FileStore, MemoryFileStore};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = MemoryFileStore::new();
//! assert!(store.get(uuid::Uuid::new_v4()).await.unwrap_err().is_not_found());
//! # }
//! ```

mod error;
pub mod memory;
mod model;
pub mod postgres;
mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryFileStore;
pub use model::File;
pub use postgres::PgFileStore;
pub use store::FileStore;
