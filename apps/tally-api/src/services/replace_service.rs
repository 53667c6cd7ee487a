//! # Replacement Workflows
//!
//! A replacement records goods swapped one-for-one against a transaction.
//! It has no stock or money effect; it is an audit trail only.

use chrono::Utc;
use tally_core::ledger::resolve_replace_lines;
use tally_core::validation::{validate_replace_lines, ReplaceLineInput};
use tally_core::{CoreError, KeyKind, Replace, ReplacedItem};
use tally_db::repository::{new_id, replace, sale, sequence};
use tally_db::Database;
use tracing::{info, instrument};

use crate::error::ApiResult;

#[derive(Debug, Clone, Default)]
pub struct CreateReplace {
    pub reason: Option<String>,
    pub items: Vec<ReplaceLineInput>,
}

#[derive(Debug, Clone)]
pub struct ReplaceRecord {
    pub replace: Replace,
    pub items: Vec<ReplacedItem>,
}

/// Records a replacement against `transaction_id`.
#[instrument(skip(db, request), fields(items = request.items.len()))]
pub async fn create_replace(
    db: &Database,
    transaction_id: &str,
    request: CreateReplace,
) -> ApiResult<ReplaceRecord> {
    let mut tx = db.begin_write().await?;

    if sale::get_transaction(&mut tx, transaction_id).await?.is_none() {
        return Err(CoreError::TransactionNotFound(transaction_id.to_string()).into());
    }

    let lines = validate_replace_lines(&request.items)?;
    let items = sale::items_for(&mut tx, transaction_id).await?;
    let resolved = resolve_replace_lines(&items, &lines)?;

    let record = Replace {
        id: new_id(),
        replace_id: sequence::next_key(&mut tx, KeyKind::Replace).await?,
        transaction_id: Some(transaction_id.to_string()),
        reason: request.reason.unwrap_or_default(),
        replace_date: Utc::now(),
    };
    replace::insert_replace(&mut tx, &record).await?;

    let keys = sequence::next_keys(&mut tx, KeyKind::ReplacedItem, resolved.len()).await?;
    let replaced: Vec<ReplacedItem> = resolved
        .into_iter()
        .zip(keys)
        .map(|(line, replaced_item_id)| ReplacedItem {
            id: new_id(),
            replaced_item_id,
            replace_id: record.replace_id.clone(),
            transaction_item_id: line.transaction_item_id,
            product_id: line.product_id,
            quantity: line.quantity,
            product_name: line.product_name,
            product_category: line.product_category,
        })
        .collect();
    replace::insert_items(&mut tx, &replaced).await?;

    tx.commit().await?;

    info!(
        replace_id = %record.replace_id,
        transaction_id = %transaction_id,
        items = replaced.len(),
        "Replacement recorded"
    );

    Ok(ReplaceRecord {
        replace: record,
        items: replaced,
    })
}

/// Replacements recorded against one transaction, oldest first.
pub async fn get_replaces(db: &Database, transaction_id: &str) -> ApiResult<Vec<ReplaceRecord>> {
    if db.sales().get(transaction_id).await?.is_none() {
        return Err(CoreError::TransactionNotFound(transaction_id.to_string()).into());
    }

    let (replaces, items) = db.replaces().for_transaction_with_items(transaction_id).await?;

    Ok(replaces
        .into_iter()
        .map(|replace| {
            let items = items
                .iter()
                .filter(|item| item.replace_id == replace.replace_id)
                .cloned()
                .collect();
            ReplaceRecord { replace, items }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::sales_service::{create_transaction, CreateTransaction};
    use tally_core::validation::LineItemInput;
    use tally_core::Money;
    use tally_db::repository::product::NewProduct;
    use tally_db::DbConfig;

    #[tokio::test]
    async fn test_replace_links_items_and_keeps_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
            .insert(&NewProduct {
                product_id: "P1".to_string(),
                name: "Pen".to_string(),
                category: Some("Office".to_string()),
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
                    quantity: Some(2),
                    unit_price: Some(Money::from_cents(1000)),
                    total_price: Some(Money::from_cents(2000)),
                    description: Some("Pen".to_string()),
                    product_category: Some("Office".to_string()),
                }],
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let id = created.transaction.transaction_id;

        let record = create_replace(
            &db,
            &id,
            CreateReplace {
                reason: Some("defective".to_string()),
                items: vec![ReplaceLineInput {
                    product_id: Some("P1".to_string()),
                    quantity: Some(1),
                    ..Default::default()
                }],
            },
        )
        .await
        .unwrap();

        assert_eq!(record.replace.replace_id, "RP-00001");
        assert_eq!(record.items[0].replaced_item_id, "RPI-00001");
        assert_eq!(record.items[0].transaction_item_id.as_deref(), Some("TI-00001"));
        assert_eq!(record.items[0].product_name.as_deref(), Some("Pen"));

        let product = db.products().get("P1").await.unwrap().unwrap();
        assert_eq!(product.current_stock, 8);

        let records = get_replaces(&db, &id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].items.len(), 1);

        let err = create_replace(&db, "ST-S09999", CreateReplace::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
