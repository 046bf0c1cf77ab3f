//! Order persistence.
//!
//! # Database: `atelier_storefront`
//!
//! ## Tables
//!
//! - `storefront.orders` - Orders with embedded customer and item snapshots
//! - `tower_sessions.session` - Session storage (cart snapshots)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p atelier-cli -- migrate
//! ```
//!
//! Handlers and services only see the [`OrderStore`] trait. [`PgOrderStore`]
//! is used in production, [`InMemoryOrderStore`] in tests.

pub mod memory;
pub mod orders;

use std::time::Duration;

use async_trait::async_trait;
use atelier_core::{NewOrder, Order, OrderId, StatusPatch};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use memory::InMemoryOrderStore;
pub use orders::PgOrderStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., duplicate order id).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The store cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A collection of orders keyed by their business id.
///
/// Every method is a single-document operation; no call spans two orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new order, stamping `created_at` and `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the `order_id` already exists.
    async fn insert(&self, order: NewOrder) -> Result<Order, RepositoryError>;

    /// Fetch one order by business id.
    async fn find_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, RepositoryError>;

    /// All orders, newest first.
    async fn list_recent(&self) -> Result<Vec<Order>, RepositoryError>;

    /// Apply a partial status update. Returns `None` if no order has that id.
    async fn update_status(
        &self,
        order_id: &OrderId,
        patch: StatusPatch,
    ) -> Result<Option<Order>, RepositoryError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
