//! basket-axum: HTTP surface for the file service.
//!
//! Routes under `/api/v1/file`:
//!
//! | Method | Path | Answer |
//! |---|---|---|
//! | `GET` | `/{file_id}` | `{"response": File}` |
//! | `PATCH` | `/{file_id}` | `{"response": File}` |
//! | `DELETE` | `/{file_id}` | `{"response": 1}` |
//! | `POST` | `/upload` | `{"response": File}` |
//! | `GET` | `/{file_id}/download` | raw bytes |
//!
//! plus `GET /health`. Errors use the `{name, message, code, className}`
//! shape.

pub mod app;
mod error;
pub mod handlers;
pub mod sink;
mod state;

pub use app::{router, BasketApp, FILE_ROUTES};
pub use axum;
pub use error::ApiError;
pub use handlers::DataResponse;
pub use sink::ChannelSink;
pub use state::AppState;
