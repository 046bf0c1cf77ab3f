//! Admin order list: text filter and an optional "load more" window.
//!
//! The full list is fetched newest-first and narrowed here. Without `shown`
//! every matching order is returned. This is sized for
//! a single-artist shop; it is not meant to scale to large order volumes.

use serde::{Deserialize, Serialize};

use crate::types::Order;

/// Number of orders added by each "load more".
pub const PAGE_SIZE: usize = 20;

/// Query string of `GET /orders`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderListQuery {
    /// Case-insensitive substring of order id, customer name or email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    /// How many matching orders to return; absent or zero returns all of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shown: Option<usize>,
}

/// One window of the filtered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub orders: Vec<Order>,
    /// Number of orders matching the filter.
    pub total: usize,
    pub has_more: bool,
    pub page_size: usize,
}

impl OrderListQuery {
    /// Size of the displayed window, if one was requested.
    #[must_use]
    pub fn window(&self) -> Option<usize> {
        self.shown.filter(|n| *n > 0)
    }

    /// Whether `order` passes the text filter.
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        let Some(needle) = self
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
        else {
            return true;
        };

        [
            order.order_id.as_str(),
            order.customer.name.as_str(),
            order.customer.email.as_str(),
        ]
        .iter()
        .any(|haystack| haystack.to_lowercase().contains(&needle))
    }

    /// Filter `orders` (already sorted) and cut the displayed window.
    #[must_use]
    pub fn apply(&self, orders: Vec<Order>) -> OrderPage {
        let matching: Vec<Order> = orders.into_iter().filter(|o| self.matches(o)).collect();
        let total = matching.len();
        let shown = self.window().unwrap_or(total);

        OrderPage {
            orders: matching.into_iter().take(shown).collect(),
            total,
            has_more: total > shown,
            page_size: PAGE_SIZE,
        }
    }
}
