//! Wiring for the basket server binary.

use std::sync::Arc;

use anyhow::Context;
use basket_axum::BasketApp;
use basket_blob::{GrpcBackendConfig, GrpcBlobBackend};
use basket_core::config::{LoggerSettings, PostgresSettings};
use basket_core::{LogFormat, Settings};
use basket_files::{FileService, FileServiceConfig};
use basket_store::PgFileStore;
use sqlx::postgres::PgConnectOptions;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `logger.level`.
pub fn init_tracing(logger: &LoggerSettings) {
    let filter = env_filter(logger);
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match logger.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn env_filter(logger: &LoggerSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logger.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn pg_options(pg: &PostgresSettings) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&pg.host)
        .port(pg.port)
        .username(&pg.user)
        .password(&pg.password)
        .database(&pg.db)
}

/// Connect the stores, run migrations and build the HTTP app.
pub async fn build(settings: &Settings) -> anyhow::Result<BasketApp> {
    let store = PgFileStore::connect(pg_options(&settings.postgres), settings.postgres.max_connections)
        .await
        .context("connect to postgres")?;
    store.migrate().await.context("run migrations")?;
    tracing::info!(host = %settings.postgres.host, db = %settings.postgres.db, "metadata store ready");

    let blobs = GrpcBlobBackend::connect_lazy(GrpcBackendConfig::new(settings.grpc.addr.clone()))
        .context("configure blob backend")?;
    tracing::info!(addr = %settings.grpc.addr, "blob backend configured");

    let service = FileService::new(
        Arc::new(store),
        Arc::new(blobs),
        FileServiceConfig::new(settings.file_service.max_file_size),
    );
    Ok(BasketApp::new(service))
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use basket_core::BasketConfig;

    #[test]
    fn pg_options_follow_settings() {
        let mut config = BasketConfig::with_defaults();
        config.set("postgres.host", "db.internal");
        config.set("postgres.port", "6432");
        config.set("postgres.db", "files");
        let settings = config.settings().unwrap();

        let options = pg_options(&settings.postgres);
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6432);
        assert_eq!(options.get_database(), Some("files"));
        assert_eq!(options.get_username(), "postgres");
    }

    #[test]
    fn invalid_level_falls_back() {
        let logger = LoggerSettings {
            level: "not a level ===".to_string(),
            format: LogFormat::Text,
        };
        // Must not panic whatever RUST_LOG holds.
        let _ = env_filter(&logger);
    }
}
