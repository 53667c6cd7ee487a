//! # Refund Workflows
//!
//! A refund gives money and goods back against an existing transaction:
//!
//! ```text
//! refund P1 x2, total 20 against TI-00001 (P1 x5, total 50)
//!
//!   refunds          + RF-00001 (total 20)
//!   refunded_items   + RI-00001 (P1 x2, 20)
//!   products         P1 stock +2
//!   transaction_items TI-00001 → x3, total 30, partially_refunded
//!   sales_transactions total_sales -20
//! ```
//!
//! All five effects commit together. Deleting a refund later removes only
//! the audit record; its effects are not reversed.

use std::collections::HashMap;

use chrono::Utc;
use tally_core::ledger::{plan_refund, ItemAdjustment, RefundPlan};
use tally_core::validation::{validate_amount, validate_refund_lines, RefundLineInput};
use tally_core::{
    CoreError, KeyKind, Money, Refund, RefundedItem, SalesTransaction, UNKNOWN_LABEL,
};
use tally_db::repository::{new_id, refund, sale, sequence};
use tally_db::Database;
use tracing::{info, instrument};

use crate::error::{ApiError, ApiResult};
use crate::services::apply_stock;

/// Input of [`create_refund`].
#[derive(Debug, Clone, Default)]
pub struct CreateRefund {
    pub reason: Option<String>,
    /// Amount taken off the transaction total; defaults to the sum of line
    /// totals.
    pub grand_total: Option<Money>,
    pub items: Vec<RefundLineInput>,
}

#[derive(Debug, Clone)]
pub struct RefundDetails {
    pub refund: Refund,
    pub items: Vec<RefundedItem>,
    pub transaction: SalesTransaction,
}

/// A refund with its items, as read back for one transaction.
#[derive(Debug, Clone)]
pub struct RefundRecord {
    pub refund: Refund,
    pub items: Vec<RefundedItem>,
}

/// A refunded item with the description resolved for display.
#[derive(Debug, Clone)]
pub struct DescribedRefundItem {
    pub item: RefundedItem,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct RefundListing {
    pub refund: Refund,
    pub items: Vec<DescribedRefundItem>,
}

/// Records a refund against `transaction_id`.
///
/// ## Errors
/// - 404 when the transaction does not exist
/// - 400 when `items` is empty, a line is malformed, matches no remaining
///   item or asks for more than remains
#[instrument(skip(db, request), fields(items = request.items.len()))]
pub async fn create_refund(
    db: &Database,
    transaction_id: &str,
    request: CreateRefund,
) -> ApiResult<RefundDetails> {
    let mut tx = db.begin_write().await?;

    if sale::get_transaction(&mut tx, transaction_id).await?.is_none() {
        return Err(CoreError::TransactionNotFound(transaction_id.to_string()).into());
    }

    let lines = validate_refund_lines(&request.items)?;
    if let Some(grand_total) = request.grand_total {
        validate_amount("grandTotal", grand_total).map_err(CoreError::from)?;
    }
    let items = sale::items_for(&mut tx, transaction_id).await?;
    let RefundPlan {
        lines: matched,
        stock,
        adjustments,
        grand_total,
    } = plan_refund(&items, &lines, request.grand_total)?;

    let refund = Refund {
        id: new_id(),
        refund_id: sequence::next_key(&mut tx, KeyKind::Refund).await?,
        transaction_id: Some(transaction_id.to_string()),
        reason: request.reason.unwrap_or_default(),
        total_refund_cents: grand_total.cents(),
        refund_date: Utc::now(),
    };
    refund::insert_refund(&mut tx, &refund).await?;

    let keys = sequence::next_keys(&mut tx, KeyKind::RefundedItem, matched.len()).await?;
    let refunded: Vec<RefundedItem> = matched
        .into_iter()
        .zip(keys)
        .map(|(line, refunded_item_id)| RefundedItem {
            id: new_id(),
            refunded_item_id,
            refund_id: refund.refund_id.clone(),
            transaction_item_id: line.transaction_item_id,
            product_id: line.product_id,
            refunded_quantity: line.quantity,
            refunded_amount_cents: line.amount.cents(),
            product_name: Some(line.product_name),
            product_category: line.product_category,
        })
        .collect();
    refund::insert_items(&mut tx, &refunded).await?;

    apply_stock(&mut tx, &stock).await?;

    for adjustment in &adjustments {
        match adjustment {
            ItemAdjustment::Reduce {
                item_id,
                quantity,
                total_price,
            } => sale::reduce_item(&mut tx, item_id, *quantity, total_price.cents()).await?,
            ItemAdjustment::Remove { item_id } => sale::remove_item(&mut tx, item_id).await?,
        }
    }

    let transaction = sale::adjust_total_sales(&mut tx, transaction_id, -grand_total.cents()).await?;

    tx.commit().await?;

    info!(
        refund_id = %refund.refund_id,
        transaction_id = %transaction_id,
        total = %grand_total,
        "Refund recorded"
    );

    Ok(RefundDetails {
        refund,
        items: refunded,
        transaction,
    })
}

/// Refunds recorded against one transaction, oldest first.
pub async fn get_refunds(db: &Database, transaction_id: &str) -> ApiResult<Vec<RefundRecord>> {
    if db.sales().get(transaction_id).await?.is_none() {
        return Err(CoreError::TransactionNotFound(transaction_id.to_string()).into());
    }

    let (refunds, items) = db.refunds().for_transaction_with_items(transaction_id).await?;

    let mut by_refund: HashMap<String, Vec<RefundedItem>> = HashMap::new();
    for item in items {
        by_refund.entry(item.refund_id.clone()).or_default().push(item);
    }

    let records = refunds
        .into_iter()
        .map(|refund| {
            let items = by_refund.remove(&refund.refund_id).unwrap_or_default();
            RefundRecord { refund, items }
        })
        .collect();

    Ok(records)
}

/// Every refund, newest first, with item descriptions resolved.
///
/// The description is the product name of the transaction item the refund
/// came from while that item still exists, otherwise the name stored on the
/// refunded item, otherwise `"Unknown"`.
pub async fn list_refunds(db: &Database) -> ApiResult<Vec<RefundListing>> {
    let (refunds, items) = db.refunds().list_with_descriptions().await?;

    let mut by_refund: HashMap<String, Vec<DescribedRefundItem>> = HashMap::new();
    for row in items {
        let description = row
            .item_description
            .or_else(|| row.item.product_name.clone())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string());

        by_refund
            .entry(row.item.refund_id.clone())
            .or_default()
            .push(DescribedRefundItem {
                item: row.item,
                description,
            });
    }

    let listing = refunds
        .into_iter()
        .map(|refund| RefundListing {
            items: by_refund.remove(&refund.refund_id).unwrap_or_default(),
            refund,
        })
        .collect();

    Ok(listing)
}

/// Deletes a refund record and its items.
#[instrument(skip(db))]
pub async fn delete_refund(db: &Database, refund_id: &str) -> ApiResult<()> {
    let mut tx = db.begin_write().await?;

    if !refund::delete_refund(&mut tx, refund_id).await? {
        return Err(ApiError::not_found("Refund", refund_id));
    }

    tx.commit().await?;

    info!(refund_id = %refund_id, "Refund deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::sales_service::{create_transaction, CreateTransaction};
    use tally_core::validation::LineItemInput;
    use tally_db::repository::product::NewProduct;
    use tally_db::DbConfig;

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
            .insert(&NewProduct {
                product_id: "P1".to_string(),
                name: "Pen".to_string(),
                category: None,
                supplier_id: None,
                unit_price: Money::from_cents(1000),
                current_stock: 10,
                min_stock: 0,
                max_stock: 100,
                allow_negative_stock: false,
            })
            .await
            .unwrap();

        let created = create_transaction(
            &db,
            CreateTransaction {
                or_number: Some("OR1".to_string()),
                items: vec![LineItemInput {
                    product_id: Some("P1".to_string()),
                    quantity: Some(5),
                    unit_price: Some(Money::from_cents(1000)),
                    total_price: Some(Money::from_cents(5000)),
                    description: Some("Pen".to_string()),
                    product_category: None,
                }],
                ..Default::default()
            },
        )
        .await
        .unwrap();

        (db, created.transaction.transaction_id)
    }

    fn refund_line(quantity: i64, total_cents: i64) -> RefundLineInput {
        RefundLineInput {
            product_id: Some("P1".to_string()),
            quantity: Some(quantity),
            total_price: Some(Money::from_cents(total_cents)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_partial_refund_effects() {
        let (db, id) = setup().await;

        let details = create_refund(
            &db,
            &id,
            CreateRefund {
                reason: Some("damaged".to_string()),
                grand_total: Some(Money::from_cents(2000)),
                items: vec![refund_line(2, 2000)],
            },
        )
        .await
        .unwrap();

        assert_eq!(details.refund.refund_id, "RF-00001");
        assert_eq!(details.items[0].refunded_item_id, "RI-00001");
        assert_eq!(details.items[0].transaction_item_id, "TI-00001");
        assert_eq!(details.transaction.total_sales_cents, 3000);

        let product = db.products().get("P1").await.unwrap().unwrap();
        assert_eq!(product.current_stock, 7);

        let items = db.sales().items(&id).await.unwrap();
        assert_eq!(items[0].quantity, 3);
        assert_eq!(items[0].total_price_cents, 3000);
    }

    #[tokio::test]
    async fn test_over_refund_changes_nothing() {
        let (db, id) = setup().await;

        let err = create_refund(
            &db,
            &id,
            CreateRefund {
                items: vec![refund_line(6, 6000)],
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        assert!(get_refunds(&db, &id).await.unwrap().is_empty());
        let product = db.products().get("P1").await.unwrap().unwrap();
        assert_eq!(product.current_stock, 5);
    }

    #[tokio::test]
    async fn test_full_refund_removes_item_and_listing_keeps_name() {
        let (db, id) = setup().await;

        create_refund(
            &db,
            &id,
            CreateRefund {
                items: vec![refund_line(5, 5000)],
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(db.sales().items(&id).await.unwrap().is_empty());
        let transaction = db.sales().get(&id).await.unwrap().unwrap();
        assert_eq!(transaction.total_sales_cents, 0);

        let listing = list_refunds(&db).await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].items[0].description, "Pen");
    }

    #[tokio::test]
    async fn test_delete_refund() {
        let (db, id) = setup().await;
        let details = create_refund(
            &db,
            &id,
            CreateRefund {
                items: vec![refund_line(1, 1000)],
                ..Default::default()
            },
        )
        .await
        .unwrap();

        delete_refund(&db, &details.refund.refund_id).await.unwrap();
        assert!(get_refunds(&db, &id).await.unwrap().is_empty());

        let err = delete_refund(&db, &details.refund.refund_id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = get_refunds(&db, "ST-S09999").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_items_are_grouped_under_their_refund() {
        let (db, id) = setup().await;
        for lines in [
            vec![refund_line(1, 1000)],
            vec![refund_line(1, 1000), refund_line(1, 1000)],
            vec![refund_line(2, 2000)],
        ] {
            create_refund(
                &db,
                &id,
                CreateRefund {
                    items: lines,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }

        let listing = list_refunds(&db).await.unwrap();
        let counts: HashMap<String, usize> = listing
            .iter()
            .map(|entry| (entry.refund.refund_id.clone(), entry.items.len()))
            .collect();
        assert_eq!(counts["RF-00001"], 1);
        assert_eq!(counts["RF-00002"], 2);
        assert_eq!(counts["RF-00003"], 1);
        for entry in &listing {
            assert!(entry
                .items
                .iter()
                .all(|i| i.item.refund_id == entry.refund.refund_id));
        }

        let records = get_refunds(&db, &id).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records.iter().map(|r| r.items.len()).sum::<usize>(), 4);
        assert!(records
            .iter()
            .all(|r| r.items.iter().all(|i| i.refund_id == r.refund.refund_id)));
    }
}
