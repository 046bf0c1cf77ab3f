//! In-memory order store.
//!
//! Mirrors [`PgOrderStore`](super::PgOrderStore) semantics, including the
//! unique constraint on `order_id` and newest-first listing, so handlers can
//! be exercised without a database.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use atelier_core::{NewOrder, Order, OrderId, StatusPatch};
use chrono::Utc;
use tokio::sync::RwLock;

use super::{OrderStore, RepositoryError};

/// Order store holding everything in a `Vec`, in insertion order.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<Vec<Order>>,
    unavailable: AtomicBool,
}

impl InMemoryOrderStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every call fails with `RepositoryError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored orders.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Whether the store holds no orders.
    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "in-memory store switched off".to_owned(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        self.check_available()?;
        let mut orders = self.orders.write().await;

        if orders.iter().any(|o| o.order_id == order.order_id) {
            return Err(RepositoryError::Conflict(format!(
                "order id {} already exists",
                order.order_id
            )));
        }

        let order = order.into_order(Utc::now());
        orders.push(order.clone());
        Ok(order)
    }

    async fn find_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        self.check_available()?;
        let orders = self.orders.read().await;
        Ok(orders.iter().find(|o| &o.order_id == order_id).cloned())
    }

    async fn list_recent(&self) -> Result<Vec<Order>, RepositoryError> {
        self.check_available()?;
        let orders = self.orders.read().await;

        // Reverse insertion order first so equal timestamps stay newest-first.
        let mut recent: Vec<Order> = orders.iter().rev().cloned().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(recent)
    }

    async fn update_status(
        &self,
        order_id: &OrderId,
        patch: StatusPatch,
    ) -> Result<Option<Order>, RepositoryError> {
        self.check_available()?;
        let mut orders = self.orders.write().await;

        let Some(order) = orders.iter_mut().find(|o| &o.order_id == order_id) else {
            return Ok(None);
        };
        patch.apply(order, Utc::now());
        Ok(Some(order.clone()))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.check_available()
    }
}
