//! # Configuration
//!
//! basket keeps configuration as a flat string key/value store, layered
//! from defaults and the environment, and reads it through a typed
//! [`Settings`] view once at startup.
//!
//! ## Setting and reading values
//! ```rust
//! use basket_core::BasketConfig;
//! let mut config = BasketConfig::new();
//!
//! config.set("server.addr", "127.0.0.1:9000");
//! assert_eq!(config.get("server.addr"), Some("127.0.0.1:9000"));
//! ```
//!
//! ## Environment overrides
//! Variables carrying the prefix are folded in, lowercased, with `__`
//! turned into `.`:
//!
//! ```bash
//! export BASKET__FILE_SERVICE__MAX_FILE_SIZE=1048576   # file_service.max_file_size
//! export BASKET__GRPC__ADDR=http://blobs:50051         # grpc.addr
//! ```

use std::collections::HashMap;

use thiserror::Error;

/// Prefix used by the server binary.
pub const ENV_PREFIX: &str = "BASKET__";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for `{key}`: {value:?} ({reason})")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Default, Clone)]
pub struct BasketConfig {
    values: HashMap<String, String>,
}

impl BasketConfig {
    /// Create an empty config store.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Defaults for every recognized key.
    pub fn with_defaults() -> Self {
        let mut config = Self::new();
        config.set("server.addr", "0.0.0.0:8080");
        config.set("grpc.addr", "http://127.0.0.1:50051");
        config.set("postgres.host", "localhost");
        config.set("postgres.port", "5432");
        config.set("postgres.user", "postgres");
        config.set("postgres.password", "");
        config.set("postgres.db", "basket");
        config.set("postgres.max_connections", "10");
        config.set("file_service.max_file_size", (100u64 * 1024 * 1024).to_string());
        config.set("logger.level", "debug");
        config.set("logger.format", "json");
        config
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env(prefix: &str) -> Self {
        let mut config = Self::with_defaults();
        config.merge_vars(prefix, std::env::vars());
        config
    }

    /// Fold `PREFIX` + `SECTION__KEY` pairs into the store.
    ///
    /// `BASKET__POSTGRES__HOST` → `postgres.host`
    pub fn merge_vars<I>(&mut self, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                self.set(normalized, value);
            }
        }
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Check whether a key is present.
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                key: key.to_string(),
                value: raw.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Typed view over the store.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let format = match self.get_or("logger.format", "json").to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "text" | "pretty" => LogFormat::Text,
            other => {
                return Err(ConfigError::Invalid {
                    key: "logger.format".to_string(),
                    value: other.to_string(),
                    reason: "expected `json` or `text`".to_string(),
                })
            }
        };

        Ok(Settings {
            server: ServerSettings {
                addr: self.get_or("server.addr", "0.0.0.0:8080"),
            },
            grpc: GrpcSettings {
                addr: self.get_or("grpc.addr", "http://127.0.0.1:50051"),
            },
            postgres: PostgresSettings {
                host: self.get_or("postgres.host", "localhost"),
                port: self.parse("postgres.port", 5432)?,
                user: self.get_or("postgres.user", "postgres"),
                password: self.get_or("postgres.password", ""),
                db: self.get_or("postgres.db", "basket"),
                max_connections: self.parse("postgres.max_connections", 10)?,
            },
            file_service: FileServiceSettings {
                max_file_size: self.parse("file_service.max_file_size", 100 * 1024 * 1024)?,
            },
            logger: LoggerSettings {
                level: self.get_or("logger.level", "debug"),
                format,
            },
        })
    }
}

/// Everything the server binary needs, parsed.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub grpc: GrpcSettings,
    pub postgres: PostgresSettings,
    pub file_service: FileServiceSettings,
    pub logger: LoggerSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// HTTP listen address
    pub addr: String,
}

#[derive(Debug, Clone)]
pub struct GrpcSettings {
    /// Blob backend endpoint
    pub addr: String,
}

#[derive(Clone)]
pub struct PostgresSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub db: String,
    pub max_connections: u32,
}

impl std::fmt::Debug for PostgresSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("db", &self.db)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct FileServiceSettings {
    /// Upper bound on the declared size of an upload, in bytes
    pub max_file_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

#[derive(Debug, Clone)]
pub struct LoggerSettings {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}
