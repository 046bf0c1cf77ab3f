//! Order data model.
//!
//! An [`Order`] embeds a snapshot of the customer's cart at checkout time.
//! Items are never linked to live catalog products, so later catalog edits do
//! not change historical titles or prices. After creation only `status` and
//! `payment_status` change, through a [`StatusPatch`].

use core::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::status::{OrderStatus, PaymentStatus};

/// Human-readable business identifier of an order (e.g. `ART-MC1X2Y3Z-4F9Q`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Wrap an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `OrderId` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// Customer contact details captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Address,
}

/// One line of an order. Immutable once the order exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl OrderItem {
    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: OrderId,
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order ready to be inserted. Timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
}

impl NewOrder {
    /// Materialise the record as a store would, stamping both timestamps.
    #[must_use]
    pub fn into_order(self, now: DateTime<Utc>) -> Order {
        Order {
            order_id: self.order_id,
            customer: self.customer,
            items: self.items,
            subtotal: self.subtotal,
            shipping: self.shipping,
            total: self.total,
            status: self.status,
            payment_status: self.payment_status,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of an order's status fields. `None` keeps the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusPatch {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

impl StatusPatch {
    /// True when neither field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none() && self.payment_status.is_none()
    }

    /// Apply the supplied fields to `order` and bump `updated_at`.
    pub fn apply(&self, order: &mut Order, now: DateTime<Utc>) {
        if let Some(status) = self.status {
            order.status = status;
        }
        if let Some(payment_status) = self.payment_status {
            order.payment_status = payment_status;
        }
        order.updated_at = now;
    }
}
