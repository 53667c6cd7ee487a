//! # RMA Workflows
//!
//! Return merchandise authorizations with positional items. Each item keeps
//! an array of proof-of-image references that can be replaced as a whole.

use serde::Deserialize;
use tally_core::validation::{
    validate_name, validate_proof_images, validate_rma_items, RmaItemInput,
};
use tally_core::{CoreError, KeyKind, RmaItem, ValidationError};
use tally_db::repository::rma::{self, ImageUpdate, NewRma, NewRmaItem, RmaRecord};
use tally_db::repository::sequence;
use tally_db::Database;
use tracing::{info, instrument};

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRma {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub items: Vec<RmaItemInput>,
}

/// Creates an RMA in status `pending`.
#[instrument(skip(db, request), fields(items = request.items.len()))]
pub async fn create_rma(db: &Database, request: CreateRma) -> ApiResult<RmaRecord> {
    let new = validate_rma(request)?;

    let mut tx = db.begin_write().await?;
    let rma_id = sequence::next_key(&mut tx, KeyKind::Rma).await?;
    let record = rma::insert(&mut tx, &rma_id, &new).await?;
    tx.commit().await?;

    info!(rma_id = %rma_id, items = record.items.len(), "RMA created");
    Ok(record)
}

pub async fn get_rma(db: &Database, rma_id: &str) -> ApiResult<RmaRecord> {
    db.rmas()
        .get(rma_id)
        .await?
        .ok_or_else(|| ApiError::not_found("RMA", rma_id))
}

/// Replaces the proof images of the item at `item_index`.
///
/// ## Errors
/// - 404 when the RMA does not exist
/// - 400 when the index is past the last item
#[instrument(skip(db, images), fields(count = images.len()))]
pub async fn set_item_images(
    db: &Database,
    rma_id: &str,
    item_index: usize,
    images: Vec<String>,
) -> ApiResult<RmaItem> {
    validate_proof_images(&images).map_err(CoreError::from)?;

    let position = i64::try_from(item_index).map_err(|_| index_error(item_index, 0))?;

    match db.rmas().set_item_images(rma_id, position, &images).await? {
        ImageUpdate::Updated(item) => {
            info!(rma_id = %rma_id, item_index, "RMA item images replaced");
            Ok(item)
        }
        ImageUpdate::NoSuchItem { len } => Err(index_error(item_index, len)),
    }
}

fn index_error(index: usize, len: usize) -> ApiError {
    CoreError::from(ValidationError::IndexOutOfRange {
        field: "itemIndex".to_string(),
        index,
        len,
    })
    .into()
}

fn validate_rma(request: CreateRma) -> Result<NewRma, CoreError> {
    let reason = request.reason.unwrap_or_default();
    validate_name("reason", &reason)?;

    let items = validate_rma_items(&request.items)?
        .into_iter()
        .map(|line| NewRmaItem {
            product_id: line.product_id,
            product_name: line.product_name,
            quantity: line.quantity,
            reason: line.reason,
            proof_of_images: line.proof_of_images,
        })
        .collect();

    Ok(NewRma {
        transaction_id: request.transaction_id,
        customer_name: request.customer_name,
        reason: reason.trim().to_string(),
        items,
    })
}
