//! Sales transaction routes.
//!
//! | Method | Path                                        | Workflow            |
//! |--------|---------------------------------------------|---------------------|
//! | POST   | `/createSalesTransaction`                   | create              |
//! | PUT    | `/updateSalesTransaction/{transactionId}`   | edit / empty-delete |
//! | DELETE | `/deleteTransaction/{transactionId}`        | delete              |
//! | GET    | `/getTransaction/{transactionId}`           | read one            |
//! | POST   | `/findsalestransaction`                     | list                |

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::money::decimal;
use tally_core::validation::LineItemInput;
use tally_core::{ItemStatus, Money, SalesTransaction, TransactionItem};
use tally_db::repository::sale::Page;

use crate::error::ApiResult;
use crate::extract::{optional_json, ApiJson};
use crate::services::sales_service::{
    self, CreateTransaction, TransactionDetails, TransactionListing, UpdateOutcome,
    UpdateTransaction,
};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/createSalesTransaction", post(create))
        .route("/updateSalesTransaction/{transaction_id}", put(update))
        .route("/deleteTransaction/{transaction_id}", delete(remove))
        .route("/getTransaction/{transaction_id}", get(read))
        .route("/findsalestransaction", post(find))
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SalesTransactionBody {
    #[serde(default, rename = "orNumber")]
    pub or_number: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default, rename = "total_Sales", with = "decimal::option")]
    pub total_sales: Option<Money>,
    #[serde(default, with = "decimal::option")]
    pub profit: Option<Money>,
    #[serde(default, rename = "transaction_Date")]
    pub transaction_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<LineItemInput>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageBody {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    pub item_id: String,
    #[serde(rename = "product_id")]
    pub product_id: String,
    pub quantity: i64,
    #[serde(with = "decimal")]
    pub unit_price: Money,
    #[serde(with = "decimal")]
    pub total_price: Money,
    pub description: String,
    pub product_category: Option<String>,
    pub status: ItemStatus,
}

impl From<TransactionItem> for ItemView {
    fn from(item: TransactionItem) -> Self {
        ItemView {
            unit_price: item.unit_price(),
            total_price: item.total_price(),
            item_id: item.item_id,
            product_id: item.product_id,
            quantity: item.quantity,
            description: item.product_name,
            product_category: item.product_category,
            status: item.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionView {
    #[serde(rename = "transactionId")]
    pub transaction_id: String,
    pub user_id: Option<i64>,
    #[serde(rename = "total_Sales", with = "decimal")]
    pub total_sales: Money,
    #[serde(with = "decimal")]
    pub profit: Money,
    #[serde(rename = "transaction_Date")]
    pub transaction_date: DateTime<Utc>,
    #[serde(rename = "orNumber")]
    pub or_number: String,
    pub items: Vec<ItemView>,
}

impl TransactionView {
    fn new(transaction: SalesTransaction, items: Vec<TransactionItem>) -> Self {
        TransactionView {
            total_sales: transaction.total_sales(),
            profit: transaction.profit(),
            transaction_id: transaction.transaction_id,
            user_id: transaction.user_id,
            transaction_date: transaction.transaction_date,
            or_number: transaction.or_number,
            items: items.into_iter().map(ItemView::from).collect(),
        }
    }
}

impl From<TransactionDetails> for TransactionView {
    fn from(details: TransactionDetails) -> Self {
        TransactionView::new(details.transaction, details.items)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTransaction {
    pub success: bool,
    pub transaction_id: String,
    pub transaction: TransactionView,
}

impl From<TransactionDetails> for SavedTransaction {
    fn from(details: TransactionDetails) -> Self {
        SavedTransaction {
            success: true,
            transaction_id: details.transaction.transaction_id.clone(),
            transaction: details.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub success: bool,
    pub message: String,
}

impl Message {
    pub fn ok(message: impl Into<String>) -> Self {
        Message {
            success: true,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionWithCashier {
    pub success: bool,
    pub cashier_name: String,
    pub transaction: TransactionView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingView {
    pub transaction_id: String,
    pub cashier_name: String,
    #[serde(with = "decimal")]
    pub total_sales: Money,
    #[serde(with = "decimal")]
    pub profit: Money,
    pub or_number: String,
    pub transaction_date: DateTime<Utc>,
    pub transaction_items: Vec<ItemView>,
}

impl From<TransactionListing> for ListingView {
    fn from(listing: TransactionListing) -> Self {
        let TransactionListing {
            transaction,
            cashier_name,
            items,
        } = listing;
        ListingView {
            total_sales: transaction.total_sales(),
            profit: transaction.profit(),
            transaction_id: transaction.transaction_id,
            cashier_name,
            or_number: transaction.or_number,
            transaction_date: transaction.transaction_date,
            transaction_items: items.into_iter().map(ItemView::from).collect(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SalesTransactionBody>,
) -> ApiResult<(StatusCode, Json<SavedTransaction>)> {
    let details = sales_service::create_transaction(
        &state.db,
        CreateTransaction {
            or_number: body.or_number,
            user_id: body.user_id,
            total_sales: body.total_sales,
            profit: body.profit,
            transaction_date: body.transaction_date,
            items: body.items,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(details.into())))
}

async fn update(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
    ApiJson(body): ApiJson<SalesTransactionBody>,
) -> ApiResult<Response> {
    let outcome = sales_service::update_transaction(
        &state.db,
        &transaction_id,
        UpdateTransaction {
            user_id: body.user_id,
            total_sales: body.total_sales,
            profit: body.profit,
            transaction_date: body.transaction_date,
            items: body.items,
        },
    )
    .await?;

    Ok(match outcome {
        UpdateOutcome::Updated(details) => Json(SavedTransaction::from(details)).into_response(),
        UpdateOutcome::Deleted => Json(Message::ok(format!(
            "Transaction {transaction_id} deleted and stock restored"
        )))
        .into_response(),
    })
}

async fn remove(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> ApiResult<Json<Message>> {
    sales_service::delete_transaction(&state.db, &transaction_id).await?;
    Ok(Json(Message::ok(format!("Transaction {transaction_id} deleted"))))
}

async fn read(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> ApiResult<Json<TransactionWithCashier>> {
    let (details, cashier_name) = sales_service::get_transaction(&state.db, &transaction_id).await?;
    Ok(Json(TransactionWithCashier {
        success: true,
        cashier_name,
        transaction: details.into(),
    }))
}

async fn find(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Vec<ListingView>>> {
    let paging: PageBody = optional_json(&body)?;
    let page = Page {
        limit: paging.limit.filter(|limit| *limit >= 0),
        offset: paging.offset.unwrap_or(0).max(0),
    };

    let listing = sales_service::list_transactions(&state.db, page).await?;
    Ok(Json(listing.into_iter().map(ListingView::from).collect()))
}
