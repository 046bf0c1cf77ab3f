//! `PostgreSQL` order repository.

use async_trait::async_trait;
use atelier_core::{
    Customer, NewOrder, Order, OrderId, OrderItem, OrderStatus, PaymentStatus, StatusPatch,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use super::{OrderStore, RepositoryError};

/// Row shape shared by every `SELECT`/`RETURNING` below.
#[derive(sqlx::FromRow)]
struct OrderRow {
    order_id: String,
    customer: Json<Customer>,
    items: Json<Vec<OrderItem>>,
    subtotal: Decimal,
    shipping: Decimal,
    total: Decimal,
    status: OrderStatus,
    payment_status: PaymentStatus,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        if row.items.0.is_empty() {
            return Err(RepositoryError::DataCorruption(format!(
                "order {} has no items",
                row.order_id
            )));
        }

        Ok(Self {
            order_id: OrderId::new(row.order_id),
            customer: row.customer.0,
            items: row.items.0,
            subtotal: row.subtotal,
            shipping: row.shipping,
            total: row.total,
            status: row.status,
            payment_status: row.payment_status,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Order repository backed by `storefront.orders`.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO storefront.orders
                (order_id, customer, items, subtotal, shipping, total, status, payment_status, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING order_id, customer, items, subtotal, shipping, total,
                      status, payment_status, notes, created_at, updated_at
            ",
        )
        .bind(order.order_id.as_str())
        .bind(Json(&order.customer))
        .bind(Json(&order.items))
        .bind(order.subtotal)
        .bind(order.shipping)
        .bind(order.total)
        .bind(order.status)
        .bind(order.payment_status)
        .bind(order.notes.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(format!(
                    "order id {} already exists",
                    order.order_id
                ));
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }

    async fn find_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT order_id, customer, items, subtotal, shipping, total,
                   status, payment_status, notes, created_at, updated_at
            FROM storefront.orders
            WHERE order_id = $1
            ",
        )
        .bind(order_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    async fn list_recent(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT order_id, customer, items, subtotal, shipping, total,
                   status, payment_status, notes, created_at, updated_at
            FROM storefront.orders
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn update_status(
        &self,
        order_id: &OrderId,
        patch: StatusPatch,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            UPDATE storefront.orders
            SET status = COALESCE($2, status),
                payment_status = COALESCE($3, payment_status),
                updated_at = NOW()
            WHERE order_id = $1
            RETURNING order_id, customer, items, subtotal, shipping, total,
                      status, payment_status, notes, created_at, updated_at
            ",
        )
        .bind(order_id.as_str())
        .bind(patch.status)
        .bind(patch.payment_status)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
