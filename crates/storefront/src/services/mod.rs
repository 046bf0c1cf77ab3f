//! Business logic services for the storefront.
//!
//! - `email` - Mail transport (`Notifier`, SMTP and log-only implementations)
//! - `notifications` - Order confirmation and new-order alert emails
//! - `orders` - Order creation, status transitions and queries

pub mod email;
pub mod notifications;
pub mod orders;

pub use email::{EmailError, LogNotifier, Notifier, OutgoingEmail, SmtpNotifier};
pub use notifications::OrderNotifications;
pub use orders::{OrderError, OrderService};
