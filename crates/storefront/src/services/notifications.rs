//! Order notification emails.
//!
//! After an order is durably stored the customer gets a confirmation and the
//! shop gets a new-order alert. Delivery runs on a spawned task: the HTTP
//! response never waits for it, and a failed send is logged, never returned.

use std::sync::Arc;

use askama::Template;
use atelier_core::{CurrencyCode, Order, Price};
use rust_decimal::Decimal;
use tracing::Instrument;

use super::email::{EmailError, Notifier, OutgoingEmail};

/// One line of the item table in an order email.
#[derive(Debug, Clone)]
pub struct EmailLineView {
    pub title: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

/// Order data pre-formatted for the email templates.
#[derive(Debug, Clone)]
pub struct OrderEmailView {
    pub order_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub lines: Vec<EmailLineView>,
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub notes: String,
}

impl OrderEmailView {
    /// Format `order` for display in `currency`.
    #[must_use]
    pub fn new(order: &Order, currency: CurrencyCode) -> Self {
        let money = |amount: Decimal| Price::new(amount, currency).display();
        let address = &order.customer.address;

        Self {
            order_id: order.order_id.to_string(),
            customer_name: order.customer.name.clone(),
            customer_email: order.customer.email.clone(),
            customer_phone: order.customer.phone.clone(),
            lines: order
                .items
                .iter()
                .map(|item| EmailLineView {
                    title: item.title.clone(),
                    quantity: item.quantity,
                    unit_price: money(item.price),
                    line_total: money(item.line_total()),
                })
                .collect(),
            subtotal: money(order.subtotal),
            shipping: money(order.shipping),
            total: money(order.total),
            street: address.street.clone(),
            city: address.city.clone(),
            postal_code: address.postal_code.clone(),
            country: address.country.clone(),
            notes: order.notes.clone().unwrap_or_default(),
        }
    }
}

#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    view: &'a OrderEmailView,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    view: &'a OrderEmailView,
}

#[derive(Template)]
#[template(path = "email/new_order_alert.html")]
struct NewOrderAlertHtml<'a> {
    view: &'a OrderEmailView,
}

#[derive(Template)]
#[template(path = "email/new_order_alert.txt")]
struct NewOrderAlertText<'a> {
    view: &'a OrderEmailView,
}

/// Builds and sends the emails that follow a successful checkout.
#[derive(Clone)]
pub struct OrderNotifications {
    notifier: Arc<dyn Notifier>,
    currency: CurrencyCode,
    admin_email: Option<String>,
}

impl OrderNotifications {
    /// Create the notification service.
    ///
    /// `admin_email` is the recipient of new-order alerts; `None` disables them.
    #[must_use]
    pub fn new(
        notifier: Arc<dyn Notifier>,
        currency: CurrencyCode,
        admin_email: Option<String>,
    ) -> Self {
        Self {
            notifier,
            currency,
            admin_email,
        }
    }

    /// Render the customer's order confirmation.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::Template` if rendering fails.
    pub fn customer_confirmation(&self, order: &Order) -> Result<OutgoingEmail, EmailError> {
        let view = OrderEmailView::new(order, self.currency);
        Ok(OutgoingEmail {
            to: order.customer.email.clone(),
            subject: format!("Thank you for your order {}", view.order_id),
            html: OrderConfirmationHtml { view: &view }.render()?,
            text: OrderConfirmationText { view: &view }.render()?,
        })
    }

    /// Render the shop's new-order alert addressed to `to`.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::Template` if rendering fails.
    pub fn admin_alert(&self, order: &Order, to: &str) -> Result<OutgoingEmail, EmailError> {
        let view = OrderEmailView::new(order, self.currency);
        Ok(OutgoingEmail {
            to: to.to_owned(),
            subject: format!("New order {} ({})", view.order_id, view.total),
            html: NewOrderAlertHtml { view: &view }.render()?,
            text: NewOrderAlertText { view: &view }.render()?,
        })
    }

    /// Send both emails for `order`, logging any failure.
    pub async fn notify_order_placed(&self, order: &Order) {
        let confirmation = self.customer_confirmation(order);
        self.deliver("customer confirmation", order, confirmation)
            .await;

        if let Some(admin_email) = &self.admin_email {
            let alert = self.admin_alert(order, admin_email);
            self.deliver("admin alert", order, alert).await;
        }
    }

    /// Fire-and-forget: send the emails for `order` on a background task.
    pub fn dispatch(&self, order: Order) -> tokio::task::JoinHandle<()> {
        let notifications = self.clone();
        let span = tracing::info_span!("order_notifications", order_id = %order.order_id);
        tokio::spawn(
            async move {
                notifications.notify_order_placed(&order).await;
            }
            .instrument(span),
        )
    }

    async fn deliver(
        &self,
        kind: &'static str,
        order: &Order,
        email: Result<OutgoingEmail, EmailError>,
    ) {
        let result = match email {
            Ok(email) => self.notifier.send(email).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            tracing::warn!(
                order_id = %order.order_id,
                kind,
                error = %e,
                "Order notification failed"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use atelier_core::{Address, Customer, NewOrder, OrderId, OrderItem, OrderStatus, PaymentStatus};
    use chrono::Utc;
    use tokio::sync::Mutex;

    use super::*;

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

    fn order() -> Order {
        NewOrder {
            order_id: OrderId::new("ART-LX1-ABCD"),
            customer: Customer {
                name: "Mia <Kobayashi>".to_owned(),
                email: "mia@example.com".to_owned(),
                phone: "080-0000-1111".to_owned(),
                address: Address {
                    street: "4-5-6 Nakameguro".to_owned(),
                    city: "Tokyo".to_owned(),
                    postal_code: "153-0061".to_owned(),
                    country: "Japan".to_owned(),
                },
            },
            items: vec![
                OrderItem {
                    product_id: "p1".to_owned(),
                    title: "Morning Tide".to_owned(),
                    price: Decimal::new(12_000, 0),
                    quantity: 2,
                    image: None,
                },
                OrderItem {
                    product_id: "p2-framed".to_owned(),
                    title: "Harbour Study (framed)".to_owned(),
                    price: Decimal::new(5_000, 0),
                    quantity: 1,
                    image: None,
                },
            ],
            subtotal: Decimal::new(29_000, 0),
            shipping: Decimal::new(1_000, 0),
            total: Decimal::new(30_000, 0),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            notes: Some("Gift wrap please".to_owned()),
        }
        .into_order(Utc::now())
    }

    #[test]
    fn test_confirmation_lists_items_and_totals() {
        let notifications =
            OrderNotifications::new(Arc::new(Outbox::default()), CurrencyCode::JPY, None);
        let email = notifications.customer_confirmation(&order()).unwrap();

        assert_eq!(email.to, "mia@example.com");
        assert!(email.subject.contains("ART-LX1-ABCD"));
        assert!(email.text.contains("Morning Tide"));
        assert!(email.text.contains("¥24,000"));
        assert!(email.text.contains("¥30,000"));
        assert!(email.text.contains("153-0061"));
        assert!(email.text.contains("Gift wrap please"));
        assert!(email.html.contains("Harbour Study (framed)"));
    }

    #[test]
    fn test_html_escapes_customer_input() {
        let notifications =
            OrderNotifications::new(Arc::new(Outbox::default()), CurrencyCode::JPY, None);
        let email = notifications.customer_confirmation(&order()).unwrap();
        assert!(!email.html.contains("<Kobayashi>"));
        assert!(email.text.contains("Mia <Kobayashi>"));
    }

    #[tokio::test]
    async fn test_notify_sends_alert_only_when_configured() {
        let outbox = Arc::new(Outbox::default());
        OrderNotifications::new(outbox.clone(), CurrencyCode::JPY, None)
            .notify_order_placed(&order())
            .await;
        assert_eq!(outbox.sent.lock().await.len(), 1);

        let outbox = Arc::new(Outbox::default());
        OrderNotifications::new(
            outbox.clone(),
            CurrencyCode::JPY,
            Some("studio@atelier.gallery".to_owned()),
        )
        .notify_order_placed(&order())
        .await;
        let sent = outbox.sent.lock().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].to, "studio@atelier.gallery");
        assert!(sent[1].subject.contains("¥30,000"));
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let notifications = OrderNotifications::new(
            Arc::new(Refusing),
            CurrencyCode::JPY,
            Some("studio@atelier.gallery".to_owned()),
        );
        notifications.dispatch(order()).await.unwrap();
    }
}
