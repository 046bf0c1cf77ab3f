//! Seed the database with demo orders.
//!
//! Reads a YAML file of checkout payloads and places each one through the
//! order service, so ids, totals and validation match real orders. No email
//! is sent. An entry may carry `status`/`paymentStatus` to be applied after
//! creation.
//!
//! ```yaml
//! orders:
//!   - customer:
//!       name: Hana Sato
//!       email: hana@example.com
//!       phone: 090-1234-5678
//!       address: { street: 1-2-3 Jingumae, city: Tokyo, postalCode: 150-0001 }
//!     items:
//!       - { productId: wave-01, title: Wave Study, price: 48000, quantity: 1 }
//!     subtotal: 48000
//!     shipping: 1500
//!     status: shipped
//! ```

use std::path::Path;

use atelier_core::validation::{CreateOrderRequest, UpdateStatusRequest};
use serde::Deserialize;
use tracing::{error, info};

use super::{CliError, order_service};

/// Top-level shape of the seed file.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub orders: Vec<SeedOrder>,
}

/// One demo order.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedOrder {
    #[serde(flatten)]
    pub request: CreateOrderRequest,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
}

/// Parse a seed file's contents.
///
/// # Errors
///
/// Returns `CliError::Yaml` if the document does not match [`SeedFile`].
pub fn parse(content: &str) -> Result<SeedFile, CliError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Insert every order in `path`.
///
/// Invalid entries are reported and skipped; the rest are still inserted.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or the database
/// is unreachable.
pub async fn orders(path: &Path) -> Result<(), CliError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let seed = parse(&content)?;
    info!(path = %path.display(), orders = seed.orders.len(), "Loaded seed file");

    let service = order_service().await?;
    let mut inserted = 0usize;
    let mut failed = 0usize;

    for (index, entry) in seed.orders.into_iter().enumerate() {
        let order = match service.place(entry.request).await {
            Ok(order) => order,
            Err(e) => {
                error!(index, error = %e, "Skipping seed order");
                failed += 1;
                continue;
            }
        };

        if entry.status.is_some() || entry.payment_status.is_some() {
            let patch = UpdateStatusRequest {
                status: entry.status,
                payment_status: entry.payment_status,
            };
            if let Err(e) = service.update_status(&order.order_id, patch).await {
                error!(order_id = %order.order_id, error = %e, "Failed to apply seed status");
            }
        }

        info!(order_id = %order.order_id, total = %order.total, "Seeded order");
        inserted += 1;
    }

    info!("Seeding complete!");
    info!("  Orders inserted: {inserted}");
    if failed > 0 {
        error!("  Orders skipped: {failed}");
    }
    Ok(())
}
