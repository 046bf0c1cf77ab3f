//! Structural validation of order payloads.
//!
//! Request types mirror the JSON bodies accepted at the HTTP boundary. Every
//! field is optional at the serde level so that a missing or blank field is
//! reported as a [`FieldError`] rather than a deserialization failure, and all
//! problems in a payload are reported together in one [`ValidationError`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{
    Address, Customer, NewOrder, OrderId, OrderItem, OrderStatus, PaymentStatus, StatusParseError,
    StatusPatch,
};

/// Country used when the address omits one.
pub const DEFAULT_COUNTRY: &str = "Japan";

/// Largest amount a price, subtotal, shipping fee or total may hold.
/// Matches the `NUMERIC(12, 2)` money columns.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Decimal places allowed in an amount.
pub const AMOUNT_SCALE: u32 = 2;

/// Largest quantity of a single line, in the cart or in an order.
pub const MAX_QUANTITY: u32 = 999;

/// Check an amount against the money bounds, returning the reason it is out of range.
///
/// # Errors
///
/// Returns a message for negative, oversized or over-precise amounts.
pub fn check_amount(value: Decimal) -> Result<Decimal, &'static str> {
    if value.is_sign_negative() && !value.is_zero() {
        Err("must not be negative")
    } else if value > MAX_AMOUNT {
        Err("must not exceed 9999999999.99")
    } else if value.normalize().scale() > AMOUNT_SCALE {
        Err("must have at most 2 decimal places")
    } else {
        Ok(value)
    }
}

/// Check a line quantity against `1..=MAX_QUANTITY`.
///
/// # Errors
///
/// Returns a message when the quantity is out of range.
pub fn check_quantity(value: i64) -> Result<u32, &'static str> {
    if value < 1 {
        return Err("must be at least 1");
    }
    u32::try_from(value)
        .ok()
        .filter(|q| *q <= MAX_QUANTITY)
        .ok_or("must be at most 999")
}

/// A single invalid field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted path of the field, e.g. `customer.address.city` or `items[0].quantity`.
    pub field: String,
    /// Human-readable reason.
    pub message: String,
}

/// All field errors found in one payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("validation failed: {}", describe(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    /// A validation error for a single field.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            fields: vec![FieldError {
                field: field.into(),
                message: message.into(),
            }],
        }
    }

    /// Whether `field` is among the reported fields.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }
}

fn describe(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|err| format!("{} {}", err.field, err.message))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Accumulates field errors while pulling values out of a payload.
#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn fail(&mut self, field: impl Into<String>, message: &str) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.to_owned(),
        });
    }

    /// Trimmed non-blank string, or records `field is required`.
    fn required(&mut self, field: &str, value: Option<String>) -> String {
        match non_blank(value) {
            Some(v) => v,
            None => {
                self.fail(field, "is required");
                String::new()
            }
        }
    }

    fn amount(&mut self, field: &str, value: Option<Decimal>) -> Decimal {
        match value.map(check_amount) {
            Some(Ok(v)) => v,
            Some(Err(message)) => {
                self.fail(field, message);
                Decimal::ZERO
            }
            None => {
                self.fail(field, "is required");
                Decimal::ZERO
            }
        }
    }

    fn finish<T>(self, value: T) -> Result<T, ValidationError> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(ValidationError {
                fields: self.errors,
            })
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Order creation
// =============================================================================

/// Address as submitted at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Customer details as submitted at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<AddressInput>,
}

/// One submitted line item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderItemInput>>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub subtotal: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub shipping: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A creation request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidOrderRequest {
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub notes: Option<String>,
}

impl ValidOrderRequest {
    /// `subtotal + shipping`.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.subtotal.saturating_add(self.shipping)
    }

    /// Sum of the item lines. The submitted subtotal is not required to match.
    #[must_use]
    pub fn items_sum(&self) -> Decimal {
        self.items
            .iter()
            .map(OrderItem::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Build the record to persist: both statuses start as `pending`.
    #[must_use]
    pub fn into_new_order(self, order_id: OrderId) -> NewOrder {
        let total = self.total();
        NewOrder {
            order_id,
            customer: self.customer,
            items: self.items,
            subtotal: self.subtotal,
            shipping: self.shipping,
            total,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            notes: self.notes,
        }
    }
}

impl CreateOrderRequest {
    /// Validate the payload, filling `country` with `default_country` if omitted.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] listing every missing or invalid field.
    pub fn validate(self, default_country: &str) -> Result<ValidOrderRequest, ValidationError> {
        let mut check = Checker::default();

        let customer_in = self.customer.unwrap_or_default();
        let name = check.required("customer.name", customer_in.name);
        let email = check.required("customer.email", customer_in.email);
        let phone = check.required("customer.phone", customer_in.phone);

        let address_in = customer_in.address.unwrap_or_default();
        let street = check.required("customer.address.street", address_in.street);
        let city = check.required("customer.address.city", address_in.city);
        let postal_code = check.required("customer.address.postalCode", address_in.postal_code);
        let country = non_blank(address_in.country).unwrap_or_else(|| default_country.to_owned());

        let items_in = self.items.unwrap_or_default();
        if items_in.is_empty() {
            check.fail("items", "must not be empty");
        }
        let items = items_in
            .into_iter()
            .enumerate()
            .map(|(i, item)| validate_item(&mut check, i, item))
            .collect();

        let subtotal = check.amount("subtotal", self.subtotal);
        let shipping = check.amount("shipping", Some(self.shipping.unwrap_or_default()));
        if subtotal.saturating_add(shipping) > MAX_AMOUNT {
            check.fail("total", "must not exceed 9999999999.99");
        }

        check.finish(ValidOrderRequest {
            customer: Customer {
                name,
                email,
                phone,
                address: Address {
                    street,
                    city,
                    postal_code,
                    country,
                },
            },
            items,
            subtotal,
            shipping,
            notes: non_blank(self.notes),
        })
    }
}

fn validate_item(check: &mut Checker, index: usize, item: OrderItemInput) -> OrderItem {
    let product_id = check.required(&format!("items[{index}].productId"), item.product_id);
    let title = check.required(&format!("items[{index}].title"), item.title);
    let price = check.amount(&format!("items[{index}].price"), item.price);

    let quantity = match item.quantity.map(check_quantity) {
        Some(Ok(q)) => q,
        Some(Err(message)) => {
            check.fail(format!("items[{index}].quantity"), message);
            0
        }
        None => {
            check.fail(format!("items[{index}].quantity"), "is required");
            0
        }
    };

    OrderItem {
        product_id,
        title,
        price,
        quantity,
        image: non_blank(item.image),
    }
}

// =============================================================================
// Status transitions
// =============================================================================

/// Body of `PATCH /orders/{orderId}`. Values arrive as raw strings so an
/// unknown value is reported as an invalid status, not a malformed body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,
}

impl UpdateStatusRequest {
    /// Parse into a [`StatusPatch`]. Absent fields stay `None`.
    ///
    /// # Errors
    ///
    /// Returns [`StatusParseError`] for the first value outside its enum.
    pub fn into_patch(self) -> Result<StatusPatch, StatusParseError> {
        Ok(StatusPatch {
            status: self.status.as_deref().map(str::parse).transpose()?,
            payment_status: self.payment_status.as_deref().map(str::parse).transpose()?,
        })
    }
}
