//! Replacement routes.

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::validation::ReplaceLineInput;
use tally_core::ReplacedItem;

use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::services::replace_service::{self, CreateReplace, ReplaceRecord};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/createReplaceTransaction/{transaction_id}", put(create))
        .route("/getReplace/{transaction_id}", get(read))
}

#[derive(Debug, Deserialize)]
pub struct ReplaceBody {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub items: Vec<ReplaceLineInput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacedItemView {
    pub replaced_item_id: String,
    pub transaction_item_id: Option<String>,
    #[serde(rename = "product_id")]
    pub product_id: String,
    pub quantity: i64,
    pub product_name: Option<String>,
    pub product_category: Option<String>,
}

impl From<ReplacedItem> for ReplacedItemView {
    fn from(item: ReplacedItem) -> Self {
        ReplacedItemView {
            replaced_item_id: item.replaced_item_id,
            transaction_item_id: item.transaction_item_id,
            product_id: item.product_id,
            quantity: item.quantity,
            product_name: item.product_name,
            product_category: item.product_category,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceView {
    pub replace_id: String,
    pub transaction_id: Option<String>,
    pub reason: String,
    pub replace_date: DateTime<Utc>,
    pub items: Vec<ReplacedItemView>,
}

impl From<ReplaceRecord> for ReplaceView {
    fn from(record: ReplaceRecord) -> Self {
        let ReplaceRecord { replace, items } = record;
        ReplaceView {
            replace_id: replace.replace_id,
            transaction_id: replace.transaction_id,
            reason: replace.reason,
            replace_date: replace.replace_date,
            items: items.into_iter().map(ReplacedItemView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedReplace {
    pub success: bool,
    pub replace_id: String,
    pub replace: ReplaceView,
}

async fn create(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
    ApiJson(body): ApiJson<ReplaceBody>,
) -> ApiResult<Json<SavedReplace>> {
    let record = replace_service::create_replace(
        &state.db,
        &transaction_id,
        CreateReplace {
            reason: body.reason,
            items: body.items,
        },
    )
    .await?;

    Ok(Json(SavedReplace {
        success: true,
        replace_id: record.replace.replace_id.clone(),
        replace: record.into(),
    }))
}

async fn read(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> ApiResult<Json<Vec<ReplaceView>>> {
    let records = replace_service::get_replaces(&state.db, &transaction_id).await?;
    Ok(Json(records.into_iter().map(ReplaceView::from).collect()))
}
