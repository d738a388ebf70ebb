//! basket-core: error taxonomy and configuration shared by every basket crate.

pub mod config;
pub mod errors;

pub use config::{BasketConfig, ConfigError, LogFormat, Settings, ENV_PREFIX};
pub use errors::{BasketError, BasketResult, ErrorKind, INTERNAL_MESSAGE};
