//! RMA routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::RmaItem;
use tally_db::repository::rma::RmaRecord;

use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::services::rma_service::{self, CreateRma};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rma", post(create))
        .route("/rma/{rma_id}", get(read))
        .route("/rma/{rma_id}/items/{item_index}/images", patch(set_images))
}

#[derive(Debug, Deserialize)]
pub struct ImagesBody {
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RmaItemView {
    pub item_index: i64,
    #[serde(rename = "product_id")]
    pub product_id: String,
    pub product_name: Option<String>,
    pub quantity: i64,
    pub reason: Option<String>,
    pub proof_of_images: Vec<String>,
}

impl From<RmaItem> for RmaItemView {
    fn from(item: RmaItem) -> Self {
        RmaItemView {
            item_index: item.position,
            product_id: item.product_id,
            product_name: item.product_name,
            quantity: item.quantity,
            reason: item.reason,
            proof_of_images: item.proof_of_images,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RmaView {
    pub rma_id: String,
    pub transaction_id: Option<String>,
    pub customer_name: Option<String>,
    pub reason: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<RmaItemView>,
}

impl From<RmaRecord> for RmaView {
    fn from(record: RmaRecord) -> Self {
        let RmaRecord { rma, items } = record;
        RmaView {
            rma_id: rma.rma_id,
            transaction_id: rma.transaction_id,
            customer_name: rma.customer_name,
            reason: rma.reason,
            status: rma.status,
            created_at: rma.created_at,
            updated_at: rma.updated_at,
            items: items.into_iter().map(RmaItemView::from).collect(),
        }
    }
}

async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateRma>,
) -> ApiResult<(StatusCode, Json<RmaView>)> {
    let record = rma_service::create_rma(&state.db, body).await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

async fn read(
    State(state): State<AppState>,
    Path(rma_id): Path<String>,
) -> ApiResult<Json<RmaView>> {
    let record = rma_service::get_rma(&state.db, &rma_id).await?;
    Ok(Json(record.into()))
}

async fn set_images(
    State(state): State<AppState>,
    Path((rma_id, item_index)): Path<(String, usize)>,
    ApiJson(body): ApiJson<ImagesBody>,
) -> ApiResult<Json<RmaItemView>> {
    let item = rma_service::set_item_images(&state.db, &rma_id, item_index, body.images).await?;
    Ok(Json(item.into()))
}
