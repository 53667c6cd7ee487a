//! # Replace Repository
//!
//! Replacement headers and replaced items. A pure log: no stock or money
//! columns are touched by anything in this module.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tally_core::{Replace, ReplacedItem};
use tracing::debug;

use crate::error::DbResult;

pub async fn insert_replace(conn: &mut SqliteConnection, replace: &Replace) -> DbResult<()> {
    debug!(replace_id = %replace.replace_id, "Inserting replace");

    sqlx::query(
        r#"
        INSERT INTO replaces (id, replace_id, transaction_id, reason, replace_date)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&replace.id)
    .bind(&replace.replace_id)
    .bind(&replace.transaction_id)
    .bind(&replace.reason)
    .bind(replace.replace_date)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn insert_items(conn: &mut SqliteConnection, items: &[ReplacedItem]) -> DbResult<()> {
    if items.is_empty() {
        return Ok(());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"INSERT INTO replaced_items (
            id, replaced_item_id, replace_id, transaction_item_id,
            product_id, quantity, product_name, product_category
        ) "#,
    );
    builder.push_values(items, |mut row, item| {
        row.push_bind(&item.id)
            .push_bind(&item.replaced_item_id)
            .push_bind(&item.replace_id)
            .push_bind(&item.transaction_item_id)
            .push_bind(&item.product_id)
            .push_bind(item.quantity)
            .push_bind(&item.product_name)
            .push_bind(&item.product_category);
    });

    builder.build().execute(&mut *conn).await?;
    Ok(())
}

pub async fn for_transaction(
    conn: &mut SqliteConnection,
    transaction_id: &str,
) -> DbResult<Vec<Replace>> {
    let replaces = sqlx::query_as::<_, Replace>(
        "SELECT * FROM replaces WHERE transaction_id = ?1 ORDER BY replace_date, replace_id",
    )
    .bind(transaction_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(replaces)
}

/// Replaced items of every replace recorded against one transaction.
pub async fn items_for_transaction(
    conn: &mut SqliteConnection,
    transaction_id: &str,
) -> DbResult<Vec<ReplacedItem>> {
    let items = sqlx::query_as::<_, ReplacedItem>(
        r#"
        SELECT * FROM replaced_items
        WHERE replace_id IN (SELECT replace_id FROM replaces WHERE transaction_id = ?1)
        ORDER BY rowid
        "#,
    )
    .bind(transaction_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(items)
}

#[derive(Debug, Clone)]
pub struct ReplaceRepository {
    pool: SqlitePool,
}

impl ReplaceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReplaceRepository { pool }
    }

    /// Replaces of a transaction together with their items.
    pub async fn for_transaction_with_items(
        &self,
        transaction_id: &str,
    ) -> DbResult<(Vec<Replace>, Vec<ReplacedItem>)> {
        let mut tx = self.pool.begin().await?;
        let replaces = for_transaction(&mut tx, transaction_id).await?;
        let items = items_for_transaction(&mut tx, transaction_id).await?;
        tx.commit().await?;
        Ok((replaces, items))
    }
}
