//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Liveness
//! GET    /health/ready            - Readiness (order store ping)
//!
//! # Cart (session)
//! GET    /cart                    - Cart contents and totals
//! POST   /cart/items              - Add one unit of a product
//! PATCH  /cart/items/{id}         - Set quantity (<1 removes)
//! DELETE /cart/items/{id}         - Remove a line
//! DELETE /cart                    - Empty the cart
//!
//! # Orders
//! POST   /checkout                - Place an order for the session cart
//! POST   /orders                  - Place an order from a full payload
//! GET    /orders                  - List orders (admin)
//! GET    /orders/{orderId}        - Order detail (admin)
//! PATCH  /orders/{orderId}        - Update status / payment status (admin)
//! ```

pub mod cart;
pub mod health;
pub mod orders;

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, patch, post},
};
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::middleware::{
    checkout_rate_limiter, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route("/items/{id}", patch(cart::update).delete(cart::remove))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(orders::index)
                .merge(post(orders::create).route_layer(checkout_rate_limiter())),
        )
        .route(
            "/{order_id}",
            get(orders::show).patch(orders::update_status),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/cart", cart_routes())
        .route(
            "/checkout",
            post(cart::checkout).route_layer(checkout_rate_limiter()),
        )
        .nest("/orders", order_routes())
}

/// Build the full application with middleware and state.
///
/// The session store is a parameter so tests can run with `MemoryStore`.
pub fn app<S>(state: AppState, sessions: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    routes()
        .layer(sessions)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &axum::extract::Request| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
