//! Shopping cart store.
//!
//! A [`CartStore`] is the single authority over one shopper's cart. It keeps
//! the line items in memory and writes a JSON snapshot through a
//! [`CartStorage`] port after every change, rehydrating from that snapshot on
//! construction. Storage failures never surface to the shopper: an unreadable
//! snapshot yields an empty cart, a failed write is logged.
//!
//! Invariant: at most one [`CartItem`] per `id`, each with a quantity in
//! `1..=MAX_QUANTITY` and a price within the money bounds.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::validation::{
    FieldError, MAX_QUANTITY, ValidationError, check_amount, check_quantity,
};

/// One line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product id, or `productId-variant` for variant lines.
    pub id: String,
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    pub quantity: u32,
}

impl CartItem {
    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }

    fn is_within_bounds(&self) -> bool {
        (1..=MAX_QUANTITY).contains(&self.quantity) && check_amount(self.price).is_ok()
    }
}

/// Payload for adding a product to the cart. Quantity always starts at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
    pub id: String,
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    /// Variant type, e.g. `framed`. Variant lines get their own cart line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl NewCartItem {
    /// Check the fields a line item needs to be sellable.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if `id` or `title` is blank or `price` is
    /// negative, above the money limit or finer than two decimal places.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut fields = Vec::new();
        if self.id.trim().is_empty() {
            fields.push(FieldError {
                field: "id".to_owned(),
                message: "is required".to_owned(),
            });
        }
        if self.title.trim().is_empty() {
            fields.push(FieldError {
                field: "title".to_owned(),
                message: "is required".to_owned(),
            });
        }
        if let Err(message) = check_amount(self.price) {
            fields.push(FieldError {
                field: "price".to_owned(),
                message: message.to_owned(),
            });
        }
        if fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { fields })
        }
    }
}

/// Cart line id for a product, optionally qualified by a variant type.
#[must_use]
pub fn line_id(product_id: &str, variant: Option<&str>) -> String {
    match variant {
        Some(variant) if !variant.is_empty() => format!("{product_id}-{variant}"),
        _ => product_id.to_owned(),
    }
}

/// Failure reported by a [`CartStorage`] backend.
#[derive(Debug, thiserror::Error)]
pub enum CartStorageError {
    #[error("cart storage unavailable: {0}")]
    Unavailable(String),
}

/// Where cart snapshots are kept between requests or page loads.
pub trait CartStorage {
    /// Read the last saved snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CartStorageError`] if the backend cannot be read.
    fn load(&self) -> Result<Option<String>, CartStorageError>;

    /// Replace the saved snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CartStorageError`] if the backend cannot be written.
    fn save(&mut self, snapshot: &str) -> Result<(), CartStorageError>;
}

/// In-memory storage holding a single snapshot string.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartStorage {
    snapshot: Option<String>,
}

impl MemoryCartStorage {
    /// Empty storage.
    #[must_use]
    pub const fn new() -> Self {
        Self { snapshot: None }
    }

    /// Storage pre-loaded with a snapshot taken elsewhere.
    #[must_use]
    pub const fn with_snapshot(snapshot: Option<String>) -> Self {
        Self { snapshot }
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Option<&str> {
        self.snapshot.as_deref()
    }

    /// Consume the storage, returning the snapshot.
    #[must_use]
    pub fn into_snapshot(self) -> Option<String> {
        self.snapshot
    }
}

impl CartStorage for MemoryCartStorage {
    fn load(&self) -> Result<Option<String>, CartStorageError> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, snapshot: &str) -> Result<(), CartStorageError> {
        self.snapshot = Some(snapshot.to_owned());
        Ok(())
    }
}

/// The cart for one shopper.
#[derive(Debug)]
pub struct CartStore<S: CartStorage> {
    items: Vec<CartItem>,
    is_open: bool,
    storage: S,
}

impl<S: CartStorage> CartStore<S> {
    /// Create a store, rehydrating items from `storage`.
    pub fn new(storage: S) -> Self {
        let items = match storage.load() {
            Ok(Some(snapshot)) => parse_snapshot(&snapshot),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load cart, starting empty");
                Vec::new()
            }
        };

        Self {
            items,
            is_open: false,
            storage,
        }
    }

    /// Current line items, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `Σ quantity`.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |sum, item| sum.saturating_add(item.quantity))
    }

    /// `Σ price × quantity`.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items
            .iter()
            .map(CartItem::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Whether the cart drawer should be shown.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    pub const fn open(&mut self) {
        self.is_open = true;
    }

    pub const fn close(&mut self) {
        self.is_open = false;
    }

    /// Add one unit of `item`. An existing line with the same id only has its
    /// quantity incremented, up to [`MAX_QUANTITY`]; its title, price and image
    /// are left as they were. Opens the cart.
    pub fn add_item(&mut self, item: NewCartItem) {
        let id = line_id(&item.id, item.variant.as_deref());
        if let Some(existing) = self.items.iter_mut().find(|line| line.id == id) {
            existing.quantity = existing.quantity.saturating_add(1).min(MAX_QUANTITY);
        } else {
            self.items.push(CartItem {
                id,
                title: item.title,
                price: item.price,
                image: item.image,
                quantity: 1,
            });
        }
        self.is_open = true;
        self.persist();
    }

    /// Remove the line with `id`. Absent ids are ignored.
    pub fn remove_item(&mut self, id: &str) {
        self.items.retain(|line| line.id != id);
        self.persist();
    }

    /// Set the quantity of the line with `id`; anything below 1 removes it.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] on `quantity` above [`MAX_QUANTITY`]; the
    /// cart is left unchanged.
    pub fn update_quantity(&mut self, id: &str, quantity: i64) -> Result<(), ValidationError> {
        if quantity < 1 {
            self.remove_item(id);
            return Ok(());
        }
        let quantity =
            check_quantity(quantity).map_err(|message| ValidationError::single("quantity", message))?;
        if let Some(line) = self.items.iter_mut().find(|line| line.id == id) {
            line.quantity = quantity;
            self.persist();
        }
        Ok(())
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    /// The storage backend.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Consume the store, returning the storage backend.
    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }

    fn persist(&mut self) {
        match serde_json::to_string(&self.items) {
            Ok(snapshot) => {
                if let Err(e) = self.storage.save(&snapshot) {
                    tracing::warn!(error = %e, "Failed to save cart");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize cart"),
        }
    }
}

/// Decode a snapshot, dropping it entirely if it is not a valid item list.
/// Lines outside the quantity or money bounds are dropped one by one.
fn parse_snapshot(snapshot: &str) -> Vec<CartItem> {
    match serde_json::from_str::<Vec<CartItem>>(snapshot) {
        Ok(items) => items.into_iter().filter(CartItem::is_within_bounds).collect(),
        Err(e) => {
            tracing::debug!(error = %e, "Discarding unreadable cart snapshot");
            Vec::new()
        }
    }
}
