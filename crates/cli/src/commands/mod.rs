//! CLI command implementations.

pub mod migrate;
pub mod orders;
pub mod seed;

use std::sync::Arc;

use atelier_storefront::config::{ConfigError, OrderSettings, database_url_from_env};
use atelier_storefront::db::{self, PgOrderStore};
use atelier_storefront::services::{LogNotifier, OrderError, OrderNotifications, OrderService};
use sqlx::PgPool;
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("session store migration failed: {0}")]
    SessionStore(String),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("{0}")]
    Usage(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Connect to the storefront database.
async fn connect() -> Result<PgPool, CliError> {
    let database_url = database_url_from_env()?;
    tracing::debug!("Connecting to storefront database...");
    Ok(db::create_pool(&database_url).await?)
}

/// Order service over Postgres. Emails are only logged.
async fn order_service() -> Result<OrderService, CliError> {
    let pool = connect().await?;
    let settings = OrderSettings::from_env()?;
    let notifications =
        OrderNotifications::new(Arc::new(LogNotifier), settings.currency, None);
    Ok(OrderService::new(
        Arc::new(PgOrderStore::new(pool)),
        notifications,
        settings,
    ))
}
