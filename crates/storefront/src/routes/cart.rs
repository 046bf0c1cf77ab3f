//! Cart and checkout route handlers.
//!
//! Each visitor's cart lives in their session as the JSON snapshot written by
//! [`CartStore`]. A handler loads the snapshot into a [`SessionCart`], applies
//! one operation and writes the snapshot back.

use atelier_core::cart::{CartItem, CartStore, MemoryCartStorage, NewCartItem};
use atelier_core::validation::{CreateOrderRequest, CustomerInput, OrderItemInput};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::routes::orders::{OrderCreated, created_response};
use crate::state::AppState;

/// Session keys used by the cart.
pub mod session_keys {
    /// JSON snapshot of the cart lines.
    pub const CART: &str = "cart";
    /// Whether the cart drawer is open.
    pub const CART_OPEN: &str = "cart_open";
}

/// Cart as returned to the browser.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<CartItem>,
    pub total_items: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub is_open: bool,
}

/// Body of `PATCH /cart/items/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// Body of `POST /checkout`. Items and subtotal come from the session cart.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub customer: Option<CustomerInput>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub shipping: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// A cart loaded from the visitor's session.
pub struct SessionCart {
    session: Session,
    cart: CartStore<MemoryCartStorage>,
}

impl SessionCart {
    /// Load the cart from `session`. Unreadable session data yields an empty cart.
    pub async fn load(session: Session) -> Self {
        let snapshot = session
            .get::<String>(session_keys::CART)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to read cart from session");
                None
            });
        let is_open = session
            .get::<bool>(session_keys::CART_OPEN)
            .await
            .ok()
            .flatten()
            .unwrap_or(false);

        let mut cart = CartStore::new(MemoryCartStorage::with_snapshot(snapshot));
        if is_open {
            cart.open();
        }
        Self { session, cart }
    }

    pub const fn cart(&self) -> &CartStore<MemoryCartStorage> {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut CartStore<MemoryCartStorage> {
        &mut self.cart
    }

    /// Write the cart back to the session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the session store rejects the write.
    pub async fn save(&self) -> Result<()> {
        let snapshot = self.cart.storage().snapshot().unwrap_or("[]");
        self.session
            .insert(session_keys::CART, snapshot)
            .await
            .map_err(|e| AppError::Internal(format!("session write failed: {e}")))?;
        self.session
            .insert(session_keys::CART_OPEN, self.cart.is_open())
            .await
            .map_err(|e| AppError::Internal(format!("session write failed: {e}")))?;
        Ok(())
    }

    #[must_use]
    pub fn to_response(&self) -> CartResponse {
        CartResponse {
            items: self.cart.items().to_vec(),
            total_items: self.cart.total_items(),
            total_price: self.cart.total_price(),
            is_open: self.cart.is_open(),
        }
    }

    /// Order creation payload for the current cart contents.
    fn to_order_request(&self, checkout: CheckoutRequest) -> CreateOrderRequest {
        CreateOrderRequest {
            customer: checkout.customer,
            items: Some(
                self.cart
                    .items()
                    .iter()
                    .map(|item| OrderItemInput {
                        product_id: Some(item.id.clone()),
                        title: Some(item.title.clone()),
                        price: Some(item.price),
                        quantity: Some(i64::from(item.quantity)),
                        image: Some(item.image.clone()).filter(|i| !i.is_empty()),
                    })
                    .collect(),
            ),
            subtotal: Some(self.cart.total_price()),
            shipping: checkout.shipping,
            notes: checkout.notes,
        }
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Show the cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Json<CartResponse> {
    Json(SessionCart::load(session).await.to_response())
}

/// Add one unit of a product (or one of its variants) and open the cart.
#[instrument(skip(session, payload))]
pub async fn add(
    session: Session,
    payload: std::result::Result<Json<NewCartItem>, JsonRejection>,
) -> Result<Json<CartResponse>> {
    let Json(item) = payload?;
    item.validate()?;

    let mut cart = SessionCart::load(session).await;
    tracing::debug!(item_id = %item.id, "Adding item to cart");
    cart.cart_mut().add_item(item);
    cart.save().await?;
    Ok(Json(cart.to_response()))
}

/// Set a line's quantity; below 1 removes the line, above the cap is a 400.
#[instrument(skip(session, payload))]
pub async fn update(
    session: Session,
    Path(id): Path<String>,
    payload: std::result::Result<Json<UpdateQuantityRequest>, JsonRejection>,
) -> Result<Json<CartResponse>> {
    let Json(UpdateQuantityRequest { quantity }) = payload?;

    let mut cart = SessionCart::load(session).await;
    cart.cart_mut().update_quantity(&id, quantity)?;
    cart.save().await?;
    Ok(Json(cart.to_response()))
}

/// Remove a line. Unknown ids are ignored.
#[instrument(skip(session))]
pub async fn remove(session: Session, Path(id): Path<String>) -> Result<Json<CartResponse>> {
    let mut cart = SessionCart::load(session).await;
    cart.cart_mut().remove_item(&id);
    cart.save().await?;
    Ok(Json(cart.to_response()))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartResponse>> {
    let mut cart = SessionCart::load(session).await;
    cart.cart_mut().clear();
    cart.save().await?;
    Ok(Json(cart.to_response()))
}

/// Place an order for the session cart. The cart is cleared only on success.
#[instrument(skip(state, session, payload))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    payload: std::result::Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderCreated>)> {
    let Json(checkout) = payload?;

    let mut cart = SessionCart::load(session).await;
    let request = cart.to_order_request(checkout);
    let order = state.orders().create(request).await?;

    cart.cart_mut().clear();
    cart.cart_mut().close();
    if let Err(e) = cart.save().await {
        // The order is already stored; a stale cart is only logged.
        tracing::warn!(order_id = %order.order_id, error = %e, "Failed to clear cart after checkout");
    }

    Ok(created_response(&order))
}
