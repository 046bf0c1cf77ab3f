//! Order route handlers.
//!
//! `POST /orders` is public; listing, detail and status changes require the
//! admin bearer token.

use atelier_core::query::{OrderListQuery, OrderPage};
use atelier_core::validation::{CreateOrderRequest, UpdateStatusRequest};
use atelier_core::{Order, OrderId, OrderStatus};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Order summary returned after creation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub order_id: OrderId,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub status: OrderStatus,
}

/// Body of a successful `POST /orders` or `POST /checkout`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub success: bool,
    pub order_id: OrderId,
    pub order: OrderSummary,
}

/// Body of a successful `PATCH /orders/{orderId}`.
#[derive(Debug, Serialize)]
pub struct OrderUpdated {
    pub success: bool,
    pub order: Order,
}

pub(crate) fn created_response(order: &Order) -> (StatusCode, Json<OrderCreated>) {
    (
        StatusCode::CREATED,
        Json(OrderCreated {
            success: true,
            order_id: order.order_id.clone(),
            order: OrderSummary {
                order_id: order.order_id.clone(),
                total: order.total,
                status: order.status,
            },
        }),
    )
}

/// Create an order from a full checkout payload.
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderCreated>)> {
    let Json(request) = payload?;
    let order = state.orders().create(request).await?;
    Ok(created_response(&order))
}

/// List orders newest first, optionally filtered and windowed.
#[instrument(skip(state))]
pub async fn index(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<OrderPage>> {
    Ok(Json(state.orders().list(&query).await?))
}

/// Fetch one order by its business id.
#[instrument(skip(state))]
pub async fn show(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<Order>> {
    Ok(Json(state.orders().get(&OrderId::new(order_id)).await?))
}

/// Change `status` and/or `paymentStatus`.
#[instrument(skip(state, payload))]
pub async fn update_status(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    payload: std::result::Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<OrderUpdated>> {
    let Json(request) = payload?;
    let order = state
        .orders()
        .update_status(&OrderId::new(order_id), request)
        .await?;
    Ok(Json(OrderUpdated {
        success: true,
        order,
    }))
}
