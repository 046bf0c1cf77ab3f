//! Order inspection and status commands.
//!
//! # Usage
//!
//! ```bash
//! atelier orders list --query tanaka --limit 10
//! atelier orders show ART-LX2K9Q1A-7F3Z
//! atelier orders set-status ART-LX2K9Q1A-7F3Z --status shipped
//! ```

use atelier_core::OrderId;
use atelier_core::query::OrderListQuery;
use atelier_core::validation::UpdateStatusRequest;

use super::{CliError, order_service};

/// Print a table of orders, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list(query: Option<String>, limit: usize) -> Result<(), CliError> {
    let service = order_service().await?;
    let page = service
        .list(&OrderListQuery {
            q: query,
            shown: Some(limit),
        })
        .await?;

    #[allow(clippy::print_stdout)]
    {
        println!(
            "{:<22} {:<19} {:<24} {:>12} {:<11} {:<9}",
            "ORDER", "CREATED", "CUSTOMER", "TOTAL", "STATUS", "PAYMENT"
        );
        for order in &page.orders {
            println!(
                "{:<22} {:<19} {:<24} {:>12} {:<11} {:<9}",
                order.order_id,
                order.created_at.format("%Y-%m-%d %H:%M"),
                truncate(&order.customer.name, 24),
                order.total,
                order.status,
                order.payment_status,
            );
        }
        println!("{} of {} orders", page.orders.len(), page.total);
    }
    Ok(())
}

/// Print one order as pretty JSON.
///
/// # Errors
///
/// Returns an error if the order does not exist or the query fails.
pub async fn show(order_id: &str) -> Result<(), CliError> {
    let service = order_service().await?;
    let order = service.get(&OrderId::new(order_id)).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&order)?);
    }
    Ok(())
}

/// Change an order's status and/or payment status.
///
/// # Errors
///
/// Returns `CliError::Usage` when neither flag is given, or the order
/// service error for unknown values and unknown orders.
pub async fn set_status(
    order_id: &str,
    status: Option<String>,
    payment_status: Option<String>,
) -> Result<(), CliError> {
    if status.is_none() && payment_status.is_none() {
        return Err(CliError::Usage(
            "pass --status and/or --payment-status".to_owned(),
        ));
    }

    let service = order_service().await?;
    let order = service
        .update_status(
            &OrderId::new(order_id),
            UpdateStatusRequest {
                status,
                payment_status,
            },
        )
        .await?;

    tracing::info!(
        order_id = %order.order_id,
        status = %order.status,
        payment_status = %order.payment_status,
        "Order updated"
    );
    Ok(())
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_owned();
    }
    let mut out: String = value.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
