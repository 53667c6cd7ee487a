//! # Sales Transaction Workflows
//!
//! ## Lifecycle
//! ```text
//! (nonexistent) ──create──► active ──update(items)──► active
//!                             │  │
//!                             │  └──update([]), no refunds──► deleted (stock restored)
//!                             └─────delete────────────────► deleted (stock kept)
//! ```
//!
//! Each workflow is one SQLite transaction: header, items and stock either
//! all change or none do.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tally_core::ledger::{lines_total, restore_deltas, sale_deltas, update_deltas};
use tally_core::validation::{
    validate_amount, validate_line_items, validate_or_number, validate_signed_amount, LineItem,
    LineItemInput,
};
use tally_core::{
    CoreError, ItemStatus, KeyKind, Money, SalesTransaction, TransactionItem, UNKNOWN_LABEL,
};
use tally_db::repository::sale::{self, HeaderUpdate, Page};
use tally_db::repository::{new_id, refund, sequence};
use tally_db::{Database, DbError};
use tracing::{info, instrument};

use crate::error::{ApiError, ApiResult};
use crate::services::apply_stock;

/// Input of [`create_transaction`].
#[derive(Debug, Clone, Default)]
pub struct CreateTransaction {
    pub or_number: Option<String>,
    pub user_id: Option<i64>,
    pub total_sales: Option<Money>,
    pub profit: Option<Money>,
    pub transaction_date: Option<DateTime<Utc>>,
    pub items: Vec<LineItemInput>,
}

/// Input of [`update_transaction`]. Header fields left `None` keep their
/// stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateTransaction {
    pub user_id: Option<i64>,
    pub total_sales: Option<Money>,
    pub profit: Option<Money>,
    pub transaction_date: Option<DateTime<Utc>>,
    pub items: Vec<LineItemInput>,
}

/// A transaction header with its items.
#[derive(Debug, Clone)]
pub struct TransactionDetails {
    pub transaction: SalesTransaction,
    pub items: Vec<TransactionItem>,
}

#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    Updated(TransactionDetails),
    /// An empty item list deleted the transaction and restored its stock.
    Deleted,
}

/// One row of the transaction listing.
#[derive(Debug, Clone)]
pub struct TransactionListing {
    pub transaction: SalesTransaction,
    pub cashier_name: String,
    pub items: Vec<TransactionItem>,
}

/// Records a sale.
///
/// Mints `ST-S…` and `TI-…` keys, inserts header and items, then takes the
/// sold quantities out of stock.
///
/// ## Errors
/// - 400 when `items` is empty or any line is malformed
/// - 409 when the receipt number is taken or stock would go negative
#[instrument(skip(db, request), fields(items = request.items.len()))]
pub async fn create_transaction(
    db: &Database,
    request: CreateTransaction,
) -> ApiResult<TransactionDetails> {
    let or_number = validate_or_number(request.or_number.as_deref()).map_err(CoreError::from)?;
    validate_header_amounts(request.total_sales, request.profit)?;
    let lines = validate_line_items(&request.items)?;

    let mut tx = db.begin_write().await?;

    if sale::or_number_exists(&mut tx, &or_number).await? {
        return Err(CoreError::DuplicateReceipt(or_number).into());
    }

    let now = Utc::now();
    let transaction = SalesTransaction {
        id: new_id(),
        transaction_id: sequence::next_key(&mut tx, KeyKind::SalesTransaction).await?,
        user_id: request.user_id,
        total_sales_cents: request.total_sales.unwrap_or_else(|| lines_total(&lines)).cents(),
        profit_cents: request.profit.unwrap_or_default().cents(),
        transaction_date: request.transaction_date.unwrap_or(now),
        or_number,
        created_at: now,
        updated_at: now,
    };

    sale::insert_transaction(&mut tx, &transaction)
        .await
        .map_err(|e| receipt_conflict(e, &transaction.or_number))?;

    let items = insert_lines(&mut tx, &transaction.transaction_id, &lines).await?;
    apply_stock(&mut tx, &sale_deltas(&lines)).await?;

    tx.commit().await?;

    info!(
        transaction_id = %transaction.transaction_id,
        or_number = %transaction.or_number,
        total = %transaction.total_sales(),
        "Sales transaction created"
    );

    Ok(TransactionDetails { transaction, items })
}

/// Edits a transaction, or deletes it when `items` is empty.
///
/// A non-empty edit moves stock by the per-product quantity difference,
/// updates the supplied header fields and replaces the whole item set with
/// freshly keyed items.
///
/// An empty edit is a deletion request: stock of every item is restored and
/// header and items are removed. A transaction with refunds on record is
/// left untouched and the request fails with 409.
#[instrument(skip(db, request), fields(items = request.items.len()))]
pub async fn update_transaction(
    db: &Database,
    transaction_id: &str,
    request: UpdateTransaction,
) -> ApiResult<UpdateOutcome> {
    let mut tx = db.begin_write().await?;

    if sale::get_transaction(&mut tx, transaction_id).await?.is_none() {
        return Err(CoreError::TransactionNotFound(transaction_id.to_string()).into());
    }

    let previous = sale::items_for(&mut tx, transaction_id).await?;

    if request.items.is_empty() {
        if refund::exists_for_transaction(&mut tx, transaction_id).await? {
            return Err(CoreError::TransactionHasRefunds(transaction_id.to_string()).into());
        }

        apply_stock(&mut tx, &restore_deltas(&previous)).await?;
        sale::delete_transaction(&mut tx, transaction_id).await?;
        tx.commit().await?;

        info!(
            transaction_id = %transaction_id,
            restored_items = previous.len(),
            "Emptied sales transaction deleted"
        );
        return Ok(UpdateOutcome::Deleted);
    }

    validate_header_amounts(request.total_sales, request.profit)?;
    let lines = validate_line_items(&request.items)?;

    apply_stock(&mut tx, &update_deltas(&previous, &lines)).await?;

    let update = HeaderUpdate {
        transaction_date: request.transaction_date,
        total_sales_cents: request.total_sales.map(|m| m.cents()),
        profit_cents: request.profit.map(|m| m.cents()),
        user_id: request.user_id,
    };
    let transaction = sale::update_header(&mut tx, transaction_id, &update).await?;

    sale::delete_items(&mut tx, transaction_id).await?;
    let items = insert_lines(&mut tx, transaction_id, &lines).await?;

    tx.commit().await?;

    info!(
        transaction_id = %transaction_id,
        previous_items = previous.len(),
        items = items.len(),
        "Sales transaction updated"
    );

    Ok(UpdateOutcome::Updated(TransactionDetails { transaction, items }))
}

/// Deletes a transaction and its items. Stock is not restored; refunds and
/// replaces stay on record detached from the transaction.
#[instrument(skip(db))]
pub async fn delete_transaction(db: &Database, transaction_id: &str) -> ApiResult<()> {
    let mut tx = db.begin_write().await?;

    if !sale::delete_transaction(&mut tx, transaction_id).await? {
        return Err(CoreError::TransactionNotFound(transaction_id.to_string()).into());
    }

    tx.commit().await?;

    info!(transaction_id = %transaction_id, "Sales transaction deleted");
    Ok(())
}

/// Reads one transaction with its items and the cashier's display name.
///
/// Fails with 404 when either the transaction or its cashier is missing.
pub async fn get_transaction(
    db: &Database,
    transaction_id: &str,
) -> ApiResult<(TransactionDetails, String)> {
    let transaction = db
        .sales()
        .get(transaction_id)
        .await?
        .ok_or_else(|| CoreError::TransactionNotFound(transaction_id.to_string()))?;

    let items = db.sales().items(transaction_id).await?;

    let cashier = match transaction.user_id {
        Some(user_id) => db.users().get(user_id).await?,
        None => None,
    };
    let cashier = cashier.ok_or_else(|| {
        ApiError::not_found(
            "Cashier",
            &transaction
                .user_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        )
    })?;

    Ok((TransactionDetails { transaction, items }, cashier.display_name()))
}

/// Lists transactions newest first, each with its cashier and items.
pub async fn list_transactions(db: &Database, page: Page) -> ApiResult<Vec<TransactionListing>> {
    let (summaries, items) = db.sales().list_with_items(page).await?;

    let mut by_transaction: HashMap<String, Vec<TransactionItem>> = HashMap::new();
    for item in items {
        by_transaction
            .entry(item.transaction_id.clone())
            .or_default()
            .push(item);
    }

    let listing = summaries
        .into_iter()
        .map(|summary| {
            let items = by_transaction
                .remove(&summary.transaction.transaction_id)
                .unwrap_or_default();
            TransactionListing {
                cashier_name: summary
                    .cashier_name
                    .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
                transaction: summary.transaction,
                items,
            }
        })
        .collect();

    Ok(listing)
}

/// Mints item keys for `lines` and bulk-inserts them.
async fn insert_lines(
    conn: &mut SqliteConnection,
    transaction_id: &str,
    lines: &[LineItem],
) -> ApiResult<Vec<TransactionItem>> {
    let keys = sequence::next_keys(conn, KeyKind::TransactionItem, lines.len()).await?;
    let now = Utc::now();

    let items: Vec<TransactionItem> = lines
        .iter()
        .zip(keys)
        .map(|(line, item_id)| TransactionItem {
            id: new_id(),
            item_id,
            transaction_id: transaction_id.to_string(),
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price.cents(),
            total_price_cents: line.total_price.cents(),
            product_name: line.description.clone(),
            product_category: line.product_category.clone(),
            status: ItemStatus::Sold,
            created_at: now,
        })
        .collect();

    sale::insert_items(conn, &items).await?;
    Ok(items)
}

fn validate_header_amounts(total_sales: Option<Money>, profit: Option<Money>) -> Result<(), CoreError> {
    if let Some(total) = total_sales {
        validate_amount("total_Sales", total)?;
    }
    if let Some(profit) = profit {
        validate_signed_amount("profit", profit)?;
    }
    Ok(())
}

/// A unique-index hit on the receipt number is the same conflict as the
/// existence check losing a race.
fn receipt_conflict(err: DbError, or_number: &str) -> ApiError {
    match err {
        DbError::UniqueViolation { ref field, .. } if field == "or_number" => {
            CoreError::DuplicateReceipt(or_number.to_string()).into()
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tally_db::repository::product::NewProduct;
    use tally_db::DbConfig;

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_pen(&db, 10).await;
        db
    }

    async fn seed_pen(db: &Database, current_stock: i64) {
        db.products()
            .insert(&NewProduct {
                product_id: "P1".to_string(),
                name: "Pen".to_string(),
                category: Some("Office".to_string()),
                supplier_id: None,
                unit_price: Money::from_cents(1000),
                current_stock,
                min_stock: 0,
                max_stock: 1000,
                allow_negative_stock: false,
            })
            .await
            .unwrap();
    }

    fn line(product_id: &str, quantity: i64, unit_cents: i64) -> LineItemInput {
        LineItemInput {
            product_id: Some(product_id.to_string()),
            quantity: Some(quantity),
            unit_price: Some(Money::from_cents(unit_cents)),
            total_price: Some(Money::from_cents(unit_cents * quantity)),
            description: Some("Pen".to_string()),
            product_category: None,
        }
    }

    fn sale(or_number: &str, items: Vec<LineItemInput>) -> CreateTransaction {
        CreateTransaction {
            or_number: Some(or_number.to_string()),
            user_id: Some(1),
            items,
            ..Default::default()
        }
    }

    async fn stock(db: &Database) -> i64 {
        db.products().get("P1").await.unwrap().unwrap().current_stock
    }

    #[tokio::test]
    async fn test_create_defaults_and_stock() {
        let db = setup().await;

        let created = create_transaction(&db, sale("OR1", vec![line("P1", 5, 1000)]))
            .await
            .unwrap();

        assert_eq!(created.transaction.transaction_id, "ST-S00001");
        assert_eq!(created.transaction.total_sales_cents, 5000);
        assert_eq!(created.transaction.profit_cents, 0);
        assert_eq!(created.items.len(), 1);
        assert_eq!(created.items[0].item_id, "TI-00001");
        assert_eq!(stock(&db).await, 5);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back() {
        let db = setup().await;

        let err = create_transaction(&db, sale("OR1", vec![line("P1", 11, 1000)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        assert_eq!(stock(&db).await, 10);
        assert!(db.sales().get("ST-S00001").await.unwrap().is_none());
        assert!(list_transactions(&db, Page::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product_rolls_back() {
        let db = setup().await;

        let err = create_transaction(
            &db,
            sale("OR1", vec![line("P1", 1, 1000), line("NOPE", 1, 100)]),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(stock(&db).await, 10);
    }

    #[tokio::test]
    async fn test_update_moves_stock_by_difference() {
        let db = setup().await;
        let created = create_transaction(&db, sale("OR1", vec![line("P1", 5, 1000)]))
            .await
            .unwrap();
        let id = created.transaction.transaction_id;

        let outcome = update_transaction(
            &db,
            &id,
            UpdateTransaction {
                items: vec![line("P1", 2, 1000)],
                total_sales: Some(Money::from_cents(2000)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let UpdateOutcome::Updated(details) = outcome else {
            panic!("expected an update");
        };
        assert_eq!(details.transaction.total_sales_cents, 2000);
        assert_eq!(details.items.len(), 1);
        assert_eq!(details.items[0].item_id, "TI-00002");
        assert_eq!(stock(&db).await, 8);
    }

    #[tokio::test]
    async fn test_empty_update_restores_stock() {
        let db = setup().await;
        let created = create_transaction(&db, sale("OR1", vec![line("P1", 5, 1000)]))
            .await
            .unwrap();
        let id = created.transaction.transaction_id;

        let outcome = update_transaction(&db, &id, UpdateTransaction::default())
            .await
            .unwrap();
        assert!(matches!(outcome, UpdateOutcome::Deleted));
        assert_eq!(stock(&db).await, 10);
        assert!(db.sales().get(&id).await.unwrap().is_none());
        assert!(db.sales().items(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_keeps_stock() {
        let db = setup().await;
        let created = create_transaction(&db, sale("OR1", vec![line("P1", 5, 1000)]))
            .await
            .unwrap();
        let id = created.transaction.transaction_id;

        delete_transaction(&db, &id).await.unwrap();
        assert_eq!(stock(&db).await, 5);

        let err = delete_transaction(&db, &id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_listing_falls_back_to_unknown_cashier() {
        let db = setup().await;
        create_transaction(&db, sale("OR1", vec![line("P1", 1, 1000)]))
            .await
            .unwrap();

        let listing = list_transactions(&db, Page::default()).await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].cashier_name, "Unknown");
        assert_eq!(listing[0].items.len(), 1);

        let err = get_transaction(&db, "ST-S00001").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_concurrent_workflows_serialize_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("sales.db")).max_connections(4);
        let db = Database::new(config).await.unwrap();
        seed_pen(&db, 500).await;

        let mut handles = Vec::new();
        for task in 0..8 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                let mut ids = Vec::new();
                for n in 0..5 {
                    let or_number = format!("OR-{task}-{n}");
                    let created = create_transaction(&db, sale(&or_number, vec![line("P1", 2, 1000)]))
                        .await
                        .unwrap();
                    ids.push(created.transaction.transaction_id);
                }
                ids
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.extend(handle.await.unwrap());
        }
        assert_eq!(ids.len(), 40);
        assert_eq!(stock(&db).await, 420);

        let mut handles = Vec::new();
        for id in ids.into_iter().take(8) {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                let edit = UpdateTransaction {
                    items: vec![line("P1", 3, 1000)],
                    ..Default::default()
                };
                update_transaction(&db, &id, edit).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(stock(&db).await, 412);
    }
}
