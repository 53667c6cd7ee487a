//! # Workflow Services
//!
//! Each public function here is one user-visible workflow. A workflow
//! opens a single database transaction, does all of its reads and writes
//! through the `tally_db` repository functions on that transaction, and
//! commits only at the end; any error drops the transaction and rolls
//! everything back.
//!
//! Handlers in `routes` only translate between wire formats and these
//! functions.

pub mod refund_service;
pub mod replace_service;
pub mod rma_service;
pub mod sales_service;

use sqlx::SqliteConnection;
use tally_core::ledger::StockDelta;
use tally_core::CoreError;
use tally_db::repository::product::{self, StockAdjustment};
use tally_db::DbError;
use tracing::debug;

use crate::error::ApiResult;

/// Applies stock deltas in order, failing on the first product that would
/// go negative or does not exist.
pub(crate) async fn apply_stock(conn: &mut SqliteConnection, deltas: &[StockDelta]) -> ApiResult<()> {
    for StockDelta { product_id, delta } in deltas {
        match product::adjust_stock(conn, product_id, *delta).await {
            Ok(StockAdjustment::Applied { current_stock }) => {
                debug!(product_id = %product_id, delta, current_stock, "Stock adjusted");
            }
            Ok(StockAdjustment::Insufficient { available }) => {
                return Err(CoreError::InsufficientStock {
                    product_id: product_id.clone(),
                    available,
                    requested: -delta,
                }
                .into());
            }
            Err(DbError::NotFound { .. }) => {
                return Err(CoreError::ProductNotFound(product_id.clone()).into());
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
