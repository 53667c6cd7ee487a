//! Refund routes.
//!
//! `GET /getRefund/{transactionId}` renders money as two-decimal strings
//! (`"20.00"`); every other refund response uses JSON numbers.

use axum::extract::{Path, State};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::money::decimal;
use tally_core::validation::RefundLineInput;
use tally_core::{Money, Refund, RefundedItem};

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::routes::sales::Message;
use crate::services::refund_service::{
    self, CreateRefund, DescribedRefundItem, RefundDetails, RefundListing, RefundRecord,
};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/createRefundTransaction/{transaction_id}", put(create))
        .route("/getRefund/{transaction_id}", get(read))
        .route("/findrefund", post(find))
        .route("/deleteRefund", delete(remove))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundBody {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default, with = "decimal::option")]
    pub grand_total: Option<Money>,
    #[serde(default)]
    pub items: Vec<RefundLineInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRefundBody {
    #[serde(default)]
    pub refund_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundedItemView {
    pub refunded_item_id: String,
    pub transaction_item_id: String,
    #[serde(rename = "product_id")]
    pub product_id: String,
    pub refunded_quantity: i64,
    #[serde(with = "decimal")]
    pub refunded_amount: Money,
    pub product_name: Option<String>,
    pub product_category: Option<String>,
}

impl From<RefundedItem> for RefundedItemView {
    fn from(item: RefundedItem) -> Self {
        RefundedItemView {
            refunded_amount: item.refunded_amount(),
            refunded_item_id: item.refunded_item_id,
            transaction_item_id: item.transaction_item_id,
            product_id: item.product_id,
            refunded_quantity: item.refunded_quantity,
            product_name: item.product_name,
            product_category: item.product_category,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundView {
    pub refund_id: String,
    pub transaction_id: Option<String>,
    pub reason: String,
    #[serde(with = "decimal")]
    pub total_refund_amount: Money,
    pub refund_date: DateTime<Utc>,
    pub items: Vec<RefundedItemView>,
}

impl RefundView {
    fn new(refund: Refund, items: Vec<RefundedItem>) -> Self {
        RefundView {
            total_refund_amount: refund.total_refund(),
            refund_id: refund.refund_id,
            transaction_id: refund.transaction_id,
            reason: refund.reason,
            refund_date: refund.refund_date,
            items: items.into_iter().map(RefundedItemView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRefund {
    pub success: bool,
    pub refund_id: String,
    #[serde(with = "decimal")]
    pub transaction_total: Money,
    pub refund: RefundView,
}

impl From<RefundDetails> for SavedRefund {
    fn from(details: RefundDetails) -> Self {
        SavedRefund {
            success: true,
            refund_id: details.refund.refund_id.clone(),
            transaction_total: details.transaction.total_sales(),
            refund: RefundView::new(details.refund, details.items),
        }
    }
}

/// Refunded item with amounts as two-decimal strings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundedItemText {
    pub refunded_item_id: String,
    pub transaction_item_id: String,
    #[serde(rename = "product_id")]
    pub product_id: String,
    pub refunded_quantity: i64,
    pub refunded_amount: String,
    pub product_name: Option<String>,
    pub product_category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundText {
    pub refund_id: String,
    pub transaction_id: Option<String>,
    pub reason: String,
    pub total_refund_amount: String,
    pub refund_date: DateTime<Utc>,
    pub refunded_items: Vec<RefundedItemText>,
}

impl From<RefundRecord> for RefundText {
    fn from(record: RefundRecord) -> Self {
        let RefundRecord { refund, items } = record;
        RefundText {
            total_refund_amount: refund.total_refund().to_decimal_string(),
            refund_id: refund.refund_id,
            transaction_id: refund.transaction_id,
            reason: refund.reason,
            refund_date: refund.refund_date,
            refunded_items: items
                .into_iter()
                .map(|item| RefundedItemText {
                    refunded_amount: item.refunded_amount().to_decimal_string(),
                    refunded_item_id: item.refunded_item_id,
                    transaction_item_id: item.transaction_item_id,
                    product_id: item.product_id,
                    refunded_quantity: item.refunded_quantity,
                    product_name: item.product_name,
                    product_category: item.product_category,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedRefundItem {
    #[serde(flatten)]
    pub item: RefundedItemView,
    pub description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedRefund {
    pub refund_id: String,
    pub transaction_id: Option<String>,
    pub reason: String,
    #[serde(with = "decimal")]
    pub total_refund_amount: Money,
    pub refund_date: DateTime<Utc>,
    pub items: Vec<ListedRefundItem>,
}

impl From<RefundListing> for ListedRefund {
    fn from(listing: RefundListing) -> Self {
        let RefundListing { refund, items } = listing;
        ListedRefund {
            total_refund_amount: refund.total_refund(),
            refund_id: refund.refund_id,
            transaction_id: refund.transaction_id,
            reason: refund.reason,
            refund_date: refund.refund_date,
            items: items
                .into_iter()
                .map(|DescribedRefundItem { item, description }| ListedRefundItem {
                    item: item.into(),
                    description,
                })
                .collect(),
        }
    }
}

async fn create(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
    ApiJson(body): ApiJson<RefundBody>,
) -> ApiResult<Json<SavedRefund>> {
    let details = refund_service::create_refund(
        &state.db,
        &transaction_id,
        CreateRefund {
            reason: body.reason,
            grand_total: body.grand_total,
            items: body.items,
        },
    )
    .await?;

    Ok(Json(details.into()))
}

async fn read(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> ApiResult<Json<Vec<RefundText>>> {
    let records = refund_service::get_refunds(&state.db, &transaction_id).await?;
    Ok(Json(records.into_iter().map(RefundText::from).collect()))
}

async fn find(State(state): State<AppState>) -> ApiResult<Json<Vec<ListedRefund>>> {
    let listing = refund_service::list_refunds(&state.db).await?;
    Ok(Json(listing.into_iter().map(ListedRefund::from).collect()))
}

async fn remove(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<DeleteRefundBody>,
) -> ApiResult<Json<Message>> {
    let refund_id = body
        .refund_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::validation("refundId is required"))?;

    refund_service::delete_refund(&state.db, &refund_id).await?;
    Ok(Json(Message::ok(format!("Refund {refund_id} deleted"))))
}
