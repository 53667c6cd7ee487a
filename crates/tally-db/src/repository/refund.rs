//! # Refund Repository
//!
//! Refund headers and their refunded items.
//!
//! Refund rows are audit records: deleting a refund removes the record and
//! its items only, and deleting the parent transaction detaches the refund
//! (`transaction_id` becomes NULL) instead of removing it.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tally_core::{Refund, RefundedItem};
use tracing::debug;

use crate::error::DbResult;

/// A refunded item joined to the description of the item it came from.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefundedItemWithDescription {
    #[sqlx(flatten)]
    pub item: RefundedItem,
    /// Product name of the transaction item, if that item still exists.
    pub item_description: Option<String>,
}

pub async fn insert_refund(conn: &mut SqliteConnection, refund: &Refund) -> DbResult<()> {
    debug!(refund_id = %refund.refund_id, "Inserting refund");

    sqlx::query(
        r#"
        INSERT INTO refunds (
            id, refund_id, transaction_id, reason, total_refund_cents, refund_date
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&refund.id)
    .bind(&refund.refund_id)
    .bind(&refund.transaction_id)
    .bind(&refund.reason)
    .bind(refund.total_refund_cents)
    .bind(refund.refund_date)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Bulk-inserts refunded items in one multi-row statement.
pub async fn insert_items(conn: &mut SqliteConnection, items: &[RefundedItem]) -> DbResult<()> {
    if items.is_empty() {
        return Ok(());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"INSERT INTO refunded_items (
            id, refunded_item_id, refund_id, transaction_item_id, product_id,
            refunded_quantity, refunded_amount_cents, product_name, product_category
        ) "#,
    );
    builder.push_values(items, |mut row, item| {
        row.push_bind(&item.id)
            .push_bind(&item.refunded_item_id)
            .push_bind(&item.refund_id)
            .push_bind(&item.transaction_item_id)
            .push_bind(&item.product_id)
            .push_bind(item.refunded_quantity)
            .push_bind(item.refunded_amount_cents)
            .push_bind(&item.product_name)
            .push_bind(&item.product_category);
    });

    builder.build().execute(&mut *conn).await?;
    Ok(())
}

/// Checks whether any refund references the transaction.
pub async fn exists_for_transaction(
    conn: &mut SqliteConnection,
    transaction_id: &str,
) -> DbResult<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM refunds WHERE transaction_id = ?1)")
            .bind(transaction_id)
            .fetch_one(&mut *conn)
            .await?;
    Ok(exists)
}

/// Refunds of one transaction, oldest first.
pub async fn for_transaction(
    conn: &mut SqliteConnection,
    transaction_id: &str,
) -> DbResult<Vec<Refund>> {
    let refunds = sqlx::query_as::<_, Refund>(
        "SELECT * FROM refunds WHERE transaction_id = ?1 ORDER BY refund_date, refund_id",
    )
    .bind(transaction_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(refunds)
}

/// Every refund, newest first.
pub async fn list_all(conn: &mut SqliteConnection) -> DbResult<Vec<Refund>> {
    let refunds =
        sqlx::query_as::<_, Refund>("SELECT * FROM refunds ORDER BY refund_date DESC, refund_id DESC")
            .fetch_all(&mut *conn)
            .await?;
    Ok(refunds)
}

/// Refunded items of every refund recorded against one transaction.
pub async fn items_for_transaction(
    conn: &mut SqliteConnection,
    transaction_id: &str,
) -> DbResult<Vec<RefundedItem>> {
    let items = sqlx::query_as::<_, RefundedItem>(
        r#"
        SELECT * FROM refunded_items
        WHERE refund_id IN (SELECT refund_id FROM refunds WHERE transaction_id = ?1)
        ORDER BY rowid
        "#,
    )
    .bind(transaction_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(items)
}

/// Every refunded item with the description of its transaction item.
pub async fn all_items_with_description(
    conn: &mut SqliteConnection,
) -> DbResult<Vec<RefundedItemWithDescription>> {
    let rows = sqlx::query_as::<_, RefundedItemWithDescription>(
        r#"
        SELECT ri.*, ti.product_name AS item_description
        FROM refunded_items ri
        LEFT JOIN transaction_items ti ON ti.item_id = ri.transaction_item_id
        ORDER BY ri.rowid
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// Deletes a refund and its items. Returns `false` if it did not exist.
pub async fn delete_refund(conn: &mut SqliteConnection, refund_id: &str) -> DbResult<bool> {
    debug!(refund_id = %refund_id, "Deleting refund");

    sqlx::query("DELETE FROM refunded_items WHERE refund_id = ?1")
        .bind(refund_id)
        .execute(&mut *conn)
        .await?;

    let result = sqlx::query("DELETE FROM refunds WHERE refund_id = ?1")
        .bind(refund_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Repository for refund reads outside a workflow.
#[derive(Debug, Clone)]
pub struct RefundRepository {
    pool: SqlitePool,
}

impl RefundRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RefundRepository { pool }
    }

    /// Refunds of a transaction together with their items.
    pub async fn for_transaction_with_items(
        &self,
        transaction_id: &str,
    ) -> DbResult<(Vec<Refund>, Vec<RefundedItem>)> {
        let mut tx = self.pool.begin().await?;
        let refunds = for_transaction(&mut tx, transaction_id).await?;
        let items = items_for_transaction(&mut tx, transaction_id).await?;
        tx.commit().await?;
        Ok((refunds, items))
    }

    /// Every refund together with every refunded item and its description.
    pub async fn list_with_descriptions(
        &self,
    ) -> DbResult<(Vec<Refund>, Vec<RefundedItemWithDescription>)> {
        let mut tx = self.pool.begin().await?;
        let refunds = list_all(&mut tx).await?;
        let items = all_items_with_description(&mut tx).await?;
        tx.commit().await?;
        Ok((refunds, items))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
