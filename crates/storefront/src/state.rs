//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::db::OrderStore;
use crate::services::{Notifier, OrderNotifications, OrderService};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    orders: OrderService,
}

impl AppState {
    /// Wire the order service from its store and mail transport.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        store: Arc<dyn OrderStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let settings = config.orders.clone();
        let notifications = OrderNotifications::new(
            notifier,
            settings.currency,
            settings.notification_email.clone(),
        );
        let orders = OrderService::new(store, notifications, settings);

        Self {
            inner: Arc::new(AppStateInner { config, orders }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the order service.
    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }
}
