//! Order lifecycle: creation at checkout, admin status transitions, lookups.
//!
//! Validation happens before any side effect. Persistence failures abort the
//! operation. Notifications run only after the order is stored and cannot
//! fail the request that created it.

use std::sync::Arc;

use atelier_core::order_id::generate_order_id;
use atelier_core::query::{OrderListQuery, OrderPage};
use atelier_core::validation::{CreateOrderRequest, UpdateStatusRequest, ValidationError};
use atelier_core::{Order, OrderId, StatusParseError};
use thiserror::Error;
use tracing::instrument;

use crate::config::OrderSettings;
use crate::db::{OrderStore, RepositoryError};
use crate::services::notifications::OrderNotifications;

/// Errors surfaced by [`OrderService`].
#[derive(Debug, Error)]
pub enum OrderError {
    /// Missing or malformed required fields.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A status value outside its enum.
    #[error(transparent)]
    InvalidStatus(#[from] StatusParseError),

    /// No order with this id.
    #[error("order not found: {0}")]
    NotFound(String),

    /// The store failed or is unreachable.
    #[error("persistence error: {0}")]
    Persistence(#[from] RepositoryError),
}

/// Creates, updates and reads orders.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    notifications: OrderNotifications,
    settings: OrderSettings,
}

impl OrderService {
    #[must_use]
    pub fn new(
        store: Arc<dyn OrderStore>,
        notifications: OrderNotifications,
        settings: OrderSettings,
    ) -> Self {
        Self {
            store,
            notifications,
            settings,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &OrderSettings {
        &self.settings
    }

    /// Validate and store a new order, then send notifications in the background.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Validation` before anything is written, or
    /// `OrderError::Persistence` if the order could not be stored.
    #[instrument(skip(self, request))]
    pub async fn create(&self, request: CreateOrderRequest) -> Result<Order, OrderError> {
        let order = self.place(request).await?;
        self.notifications.dispatch(order.clone());
        Ok(order)
    }

    /// Validate and store a new order without sending any email.
    ///
    /// # Errors
    ///
    /// Same as [`OrderService::create`].
    #[instrument(skip(self, request))]
    pub async fn place(&self, request: CreateOrderRequest) -> Result<Order, OrderError> {
        let valid = request.validate(&self.settings.default_country)?;

        let items_sum = valid.items_sum();
        if items_sum != valid.subtotal {
            tracing::warn!(
                subtotal = %valid.subtotal,
                items_sum = %items_sum,
                "Submitted subtotal does not match item lines"
            );
        }

        // The unique constraint on order_id is the only collision check.
        let order_id = generate_order_id(&self.settings.id_prefix);
        let order = self
            .store
            .insert(valid.into_new_order(order_id))
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to store order"))?;

        tracing::info!(
            order_id = %order.order_id,
            total = %order.total,
            items = order.items.len(),
            "Order created"
        );
        Ok(order)
    }

    /// Apply a partial status update. Absent fields keep their values.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::InvalidStatus` for an unknown value,
    /// `OrderError::NotFound` for an unknown id, or `OrderError::Persistence`.
    #[instrument(skip(self, request), fields(order_id = %order_id))]
    pub async fn update_status(
        &self,
        order_id: &OrderId,
        request: UpdateStatusRequest,
    ) -> Result<Order, OrderError> {
        let patch = request.into_patch()?;
        if patch.is_empty() {
            return self.get(order_id).await;
        }

        let order = self
            .store
            .update_status(order_id, patch)
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;

        tracing::info!(
            status = %order.status,
            payment_status = %order.payment_status,
            "Order status updated"
        );
        Ok(order)
    }

    /// Fetch one order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` or `OrderError::Persistence`.
    pub async fn get(&self, order_id: &OrderId) -> Result<Order, OrderError> {
        self.store
            .find_by_order_id(order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))
    }

    /// Newest-first list narrowed by `query`.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Persistence` if the store fails.
    pub async fn list(&self, query: &OrderListQuery) -> Result<OrderPage, OrderError> {
        let orders = self.store.list_recent().await?;
        Ok(query.apply(orders))
    }

    /// Check that the store answers.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Persistence` if it does not.
    pub async fn ping(&self) -> Result<(), OrderError> {
        Ok(self.store.ping().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use async_trait::async_trait;
    use atelier_core::order_id::is_well_formed;
    use atelier_core::validation::{AddressInput, CustomerInput, OrderItemInput};
    use atelier_core::{CurrencyCode, OrderStatus, PaymentStatus};
    use rust_decimal::Decimal;
    use tokio::sync::Mutex;

    use super::*;
    use crate::db::InMemoryOrderStore;
    use crate::services::email::{EmailError, Notifier, OutgoingEmail};

    #[derive(Default)]
    struct Outbox {
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    #[async_trait]
    impl Notifier for Outbox {
        async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
            self.sent.lock().await.push(email);
            Ok(())
        }
    }

    struct Refusing;

    #[async_trait]
    impl Notifier for Refusing {
        async fn send(&self, _email: OutgoingEmail) -> Result<(), EmailError> {
            Err(EmailError::Delivery("relay refused".to_owned()))
        }
    }

    fn service_with(notifier: Arc<dyn Notifier>) -> (OrderService, Arc<InMemoryOrderStore>) {
        let store = Arc::new(InMemoryOrderStore::new());
        let notifications = OrderNotifications::new(notifier, CurrencyCode::JPY, None);
        let service = OrderService::new(store.clone(), notifications, OrderSettings::default());
        (service, store)
    }

    fn item(id: &str, price: i64, quantity: i64) -> OrderItemInput {
        OrderItemInput {
            product_id: Some(id.to_owned()),
            title: Some(format!("Work {id}")),
            price: Some(Decimal::new(price, 0)),
            quantity: Some(quantity),
            image: None,
        }
    }

    fn request() -> CreateOrderRequest {
        CreateOrderRequest {
            customer: Some(CustomerInput {
                name: Some("Ren Ito".to_owned()),
                email: Some("ren@example.com".to_owned()),
                phone: Some("090-1111-2222".to_owned()),
                address: Some(AddressInput {
                    street: Some("7-8 Kitano".to_owned()),
                    city: Some("Kobe".to_owned()),
                    postal_code: Some("650-0002".to_owned()),
                    country: None,
                }),
            }),
            items: Some(vec![item("p1", 1000, 2), item("p2", 500, 1)]),
            subtotal: Some(Decimal::new(2500, 0)),
            shipping: Some(Decimal::new(800, 0)),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_stores_pending_order() {
        let (service, store) = service_with(Arc::new(Outbox::default()));
        let order = service.create(request()).await.unwrap();

        assert!(is_well_formed(order.order_id.as_str(), "ART"));
        assert_eq!(order.total, Decimal::new(3300, 0));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.customer.address.country, "Japan");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_before_writing() {
        let (service, store) = service_with(Arc::new(Outbox::default()));
        let mut bad = request();
        bad.items = Some(Vec::new());

        let err = service.create(bad).await.unwrap_err();
        assert!(matches!(err, OrderError::Validation(ref v) if v.has_field("items")));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_survives_notification_failure() {
        let (service, store) = service_with(Arc::new(Refusing));
        service.create(request()).await.unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_sends_confirmation() {
        let outbox = Arc::new(Outbox::default());
        let (service, _store) = service_with(outbox.clone());
        let order = service.create(request()).await.unwrap();

        // dispatch is spawned; give it a chance to run
        for _ in 0..50 {
            if !outbox.sent.lock().await.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let sent = outbox.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].subject.contains(order.order_id.as_str()));
    }

    #[tokio::test]
    async fn test_place_sends_nothing() {
        let outbox = Arc::new(Outbox::default());
        let (service, _store) = service_with(outbox.clone());
        service.place(request()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(outbox.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_reports_store_outage() {
        let (service, store) = service_with(Arc::new(Outbox::default()));
        store.set_unavailable(true);
        let err = service.create(request()).await.unwrap_err();
        assert!(matches!(err, OrderError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_update_status_is_partial() {
        let (service, _store) = service_with(Arc::new(Outbox::default()));
        let order = service.create(request()).await.unwrap();

        let paid = service
            .update_status(
                &order.order_id,
                UpdateStatusRequest {
                    status: None,
                    payment_status: Some("paid".to_owned()),
                },
            )
            .await
            .unwrap();
        assert_eq!(paid.status, OrderStatus::Pending);
        assert_eq!(paid.payment_status, PaymentStatus::Paid);

        let shipped = service
            .update_status(
                &order.order_id,
                UpdateStatusRequest {
                    status: Some("shipped".to_owned()),
                    payment_status: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(shipped.status, OrderStatus::Shipped);
        assert_eq!(shipped.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_update_status_allows_any_transition() {
        let (service, _store) = service_with(Arc::new(Outbox::default()));
        let order = service.create(request()).await.unwrap();

        for status in ["delivered", "pending", "cancelled", "confirmed"] {
            let updated = service
                .update_status(
                    &order.order_id,
                    UpdateStatusRequest {
                        status: Some(status.to_owned()),
                        payment_status: None,
                    },
                )
                .await
                .unwrap();
            assert_eq!(updated.status.as_str(), status);
        }
    }

    #[tokio::test]
    async fn test_update_status_rejects_unknown_value() {
        let (service, _store) = service_with(Arc::new(Outbox::default()));
        let order = service.create(request()).await.unwrap();

        let err = service
            .update_status(
                &order.order_id,
                UpdateStatusRequest {
                    status: Some("lost".to_owned()),
                    payment_status: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidStatus(_)));
        assert_eq!(
            service.get(&order.order_id).await.unwrap().status,
            OrderStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_update_status_unknown_order() {
        let (service, _store) = service_with(Arc::new(Outbox::default()));
        let err = service
            .update_status(
                &OrderId::new("ART-NOPE-0000"),
                UpdateStatusRequest {
                    status: Some("shipped".to_owned()),
                    payment_status: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_patch_returns_order_unchanged() {
        let (service, _store) = service_with(Arc::new(Outbox::default()));
        let order = service.create(request()).await.unwrap();
        let same = service
            .update_status(&order.order_id, UpdateStatusRequest::default())
            .await
            .unwrap();
        assert_eq!(same, order);
    }

    #[tokio::test]
    async fn test_list_filters_and_pages() {
        let (service, _store) = service_with(Arc::new(Outbox::default()));
        for _ in 0..3 {
            service.place(request()).await.unwrap();
        }
        let mut other = request();
        other.customer.as_mut().unwrap().name = Some("Aiko Mori".to_owned());
        service.place(other).await.unwrap();

        let all = service.list(&OrderListQuery::default()).await.unwrap();
        assert_eq!(all.total, 4);
        assert!(!all.has_more);

        let aiko = service
            .list(&OrderListQuery {
                q: Some("aiko".to_owned()),
                shown: None,
            })
            .await
            .unwrap();
        assert_eq!(aiko.total, 1);
        assert_eq!(aiko.orders[0].customer.name, "Aiko Mori");

        let first_two = service
            .list(&OrderListQuery {
                q: None,
                shown: Some(2),
            })
            .await
            .unwrap();
        assert_eq!(first_two.orders.len(), 2);
        assert!(first_two.has_more);
    }
}
