//! # Sale Repository
//!
//! Database operations for sales transactions and their items.
//!
//! ## Transaction Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Transaction Lifecycle                             │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── insert_transaction() + insert_items() (one multi-row INSERT)   │
//! │                                                                         │
//! │  2. EDIT (any number of times)                                         │
//! │     └── update_header()                                                │
//! │     └── delete_items() + insert_items()  ← items replaced wholesale    │
//! │                                                                         │
//! │  3. REFUND (partial)                                                   │
//! │     └── reduce_item() / remove_item()                                  │
//! │     └── adjust_total_sales(-grand_total)                               │
//! │                                                                         │
//! │  4. DELETE                                                             │
//! │     └── delete_transaction() (items go with it)                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tally_core::{ItemStatus, SalesTransaction, TransactionItem};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Header fields an edit may change. `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct HeaderUpdate {
    pub transaction_date: Option<DateTime<Utc>>,
    pub total_sales_cents: Option<i64>,
    pub profit_cents: Option<i64>,
    pub user_id: Option<i64>,
}

/// A transaction header with its cashier's display name resolved.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionSummary {
    #[sqlx(flatten)]
    pub transaction: SalesTransaction,
    /// `None` when the cashier is unknown.
    pub cashier_name: Option<String>,
}

/// Page of a listing. `limit: None` means no limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct Page {
    pub limit: Option<i64>,
    pub offset: i64,
}

// =============================================================================
// Headers
// =============================================================================

/// Inserts a transaction header.
///
/// ## Returns
/// * `Err(DbError::UniqueViolation { field: "or_number", .. })` - receipt reused
pub async fn insert_transaction(
    conn: &mut SqliteConnection,
    transaction: &SalesTransaction,
) -> DbResult<()> {
    debug!(
        transaction_id = %transaction.transaction_id,
        or_number = %transaction.or_number,
        "Inserting sales transaction"
    );

    sqlx::query(
        r#"
        INSERT INTO sales_transactions (
            id, transaction_id, user_id,
            total_sales_cents, profit_cents, transaction_date,
            or_number, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&transaction.id)
    .bind(&transaction.transaction_id)
    .bind(transaction.user_id)
    .bind(transaction.total_sales_cents)
    .bind(transaction.profit_cents)
    .bind(transaction.transaction_date)
    .bind(&transaction.or_number)
    .bind(transaction.created_at)
    .bind(transaction.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        err if err.is_unique_violation_on("or_number") => {
            DbError::duplicate("or_number", &transaction.or_number)
        }
        err => err,
    })?;

    Ok(())
}

/// Gets a transaction by business key.
pub async fn get_transaction(
    conn: &mut SqliteConnection,
    transaction_id: &str,
) -> DbResult<Option<SalesTransaction>> {
    let transaction = sqlx::query_as::<_, SalesTransaction>(
        "SELECT * FROM sales_transactions WHERE transaction_id = ?1",
    )
    .bind(transaction_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(transaction)
}

/// Checks whether a receipt number is already taken.
pub async fn or_number_exists(conn: &mut SqliteConnection, or_number: &str) -> DbResult<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sales_transactions WHERE or_number = ?1)",
    )
    .bind(or_number)
    .fetch_one(&mut *conn)
    .await?;
    Ok(exists)
}

/// Updates the supplied header fields and returns the new header.
pub async fn update_header(
    conn: &mut SqliteConnection,
    transaction_id: &str,
    update: &HeaderUpdate,
) -> DbResult<SalesTransaction> {
    debug!(transaction_id = %transaction_id, "Updating transaction header");

    let transaction = sqlx::query_as::<_, SalesTransaction>(
        r#"
        UPDATE sales_transactions
        SET transaction_date = COALESCE(?2, transaction_date),
            total_sales_cents = COALESCE(?3, total_sales_cents),
            profit_cents = COALESCE(?4, profit_cents),
            user_id = COALESCE(?5, user_id),
            updated_at = ?6
        WHERE transaction_id = ?1
        RETURNING *
        "#,
    )
    .bind(transaction_id)
    .bind(update.transaction_date)
    .bind(update.total_sales_cents)
    .bind(update.profit_cents)
    .bind(update.user_id)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    transaction.ok_or_else(|| DbError::not_found("Sales transaction", transaction_id))
}

/// Adds a signed amount to the transaction's total sales.
pub async fn adjust_total_sales(
    conn: &mut SqliteConnection,
    transaction_id: &str,
    delta_cents: i64,
) -> DbResult<SalesTransaction> {
    let transaction = sqlx::query_as::<_, SalesTransaction>(
        r#"
        UPDATE sales_transactions
        SET total_sales_cents = total_sales_cents + ?2,
            updated_at = ?3
        WHERE transaction_id = ?1
        RETURNING *
        "#,
    )
    .bind(transaction_id)
    .bind(delta_cents)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    transaction.ok_or_else(|| DbError::not_found("Sales transaction", transaction_id))
}

/// Deletes a transaction header and its items.
///
/// Refunds and replaces keep their rows; their `transaction_id` is set to
/// NULL by the foreign key.
///
/// ## Returns
/// `false` when there was no such transaction.
pub async fn delete_transaction(conn: &mut SqliteConnection, transaction_id: &str) -> DbResult<bool> {
    debug!(transaction_id = %transaction_id, "Deleting sales transaction");

    delete_items(conn, transaction_id).await?;

    let result = sqlx::query("DELETE FROM sales_transactions WHERE transaction_id = ?1")
        .bind(transaction_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Lists transactions newest first with cashier names resolved in SQL.
pub async fn list_summaries(
    conn: &mut SqliteConnection,
    page: Page,
) -> DbResult<Vec<TransactionSummary>> {
    let rows = sqlx::query_as::<_, TransactionSummary>(
        r#"
        SELECT t.*,
               CASE WHEN u.user_id IS NULL THEN NULL
                    ELSE TRIM(u.first_name || ' ' || u.last_name)
               END AS cashier_name
        FROM sales_transactions t
        LEFT JOIN users u ON u.user_id = t.user_id
        ORDER BY t.transaction_date DESC, t.transaction_id DESC
        LIMIT ?1 OFFSET ?2
        "#,
    )
    // SQLite treats a negative LIMIT as "no limit".
    .bind(page.limit.unwrap_or(-1))
    .bind(page.offset.max(0))
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

// =============================================================================
// Items
// =============================================================================

/// Bulk-inserts items in one multi-row statement.
pub async fn insert_items(conn: &mut SqliteConnection, items: &[TransactionItem]) -> DbResult<()> {
    if items.is_empty() {
        return Ok(());
    }

    debug!(count = items.len(), "Inserting transaction items");

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"INSERT INTO transaction_items (
            id, item_id, transaction_id, product_id, quantity,
            unit_price_cents, total_price_cents, product_name,
            product_category, status, created_at
        ) "#,
    );
    builder.push_values(items, |mut row, item| {
        row.push_bind(&item.id)
            .push_bind(&item.item_id)
            .push_bind(&item.transaction_id)
            .push_bind(&item.product_id)
            .push_bind(item.quantity)
            .push_bind(item.unit_price_cents)
            .push_bind(item.total_price_cents)
            .push_bind(&item.product_name)
            .push_bind(&item.product_category)
            .push_bind(item.status)
            .push_bind(item.created_at);
    });

    builder.build().execute(&mut *conn).await?;
    Ok(())
}

/// Gets the items of one transaction in insertion order.
pub async fn items_for(
    conn: &mut SqliteConnection,
    transaction_id: &str,
) -> DbResult<Vec<TransactionItem>> {
    let items = sqlx::query_as::<_, TransactionItem>(
        "SELECT * FROM transaction_items WHERE transaction_id = ?1 ORDER BY rowid",
    )
    .bind(transaction_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(items)
}

/// Gets the items of every transaction on one listing page.
///
/// The page is selected again in a subquery with the same ordering as
/// [`list_summaries`], so no id list is bound.
pub async fn items_for_page(
    conn: &mut SqliteConnection,
    page: Page,
) -> DbResult<Vec<TransactionItem>> {
    let items = sqlx::query_as::<_, TransactionItem>(
        r#"
        SELECT * FROM transaction_items
        WHERE transaction_id IN (
            SELECT transaction_id FROM sales_transactions
            ORDER BY transaction_date DESC, transaction_id DESC
            LIMIT ?1 OFFSET ?2
        )
        ORDER BY rowid
        "#,
    )
    .bind(page.limit.unwrap_or(-1))
    .bind(page.offset.max(0))
    .fetch_all(&mut *conn)
    .await?;
    Ok(items)
}

/// Deletes all items of a transaction; returns how many were removed.
pub async fn delete_items(conn: &mut SqliteConnection, transaction_id: &str) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM transaction_items WHERE transaction_id = ?1")
        .bind(transaction_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Sets an item's remaining quantity and total after a partial refund.
pub async fn reduce_item(
    conn: &mut SqliteConnection,
    item_id: &str,
    quantity: i64,
    total_price_cents: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE transaction_items
        SET quantity = ?2, total_price_cents = ?3, status = ?4
        WHERE item_id = ?1
        "#,
    )
    .bind(item_id)
    .bind(quantity)
    .bind(total_price_cents)
    .bind(ItemStatus::PartiallyRefunded)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Transaction item", item_id));
    }
    Ok(())
}

/// Removes a fully refunded item.
pub async fn remove_item(conn: &mut SqliteConnection, item_id: &str) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM transaction_items WHERE item_id = ?1")
        .bind(item_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Transaction item", item_id));
    }
    Ok(())
}

/// Repository for sales transaction reads outside a workflow.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    pub async fn get(&self, transaction_id: &str) -> DbResult<Option<SalesTransaction>> {
        let mut conn = self.pool.acquire().await?;
        get_transaction(&mut conn, transaction_id).await
    }

    pub async fn items(&self, transaction_id: &str) -> DbResult<Vec<TransactionItem>> {
        let mut conn = self.pool.acquire().await?;
        items_for(&mut conn, transaction_id).await
    }

    /// Lists a page of transactions together with all their items.
    pub async fn list_with_items(
        &self,
        page: Page,
    ) -> DbResult<(Vec<TransactionSummary>, Vec<TransactionItem>)> {
        // One read transaction so both queries see the same snapshot.
        let mut tx = self.pool.begin().await?;
        let summaries = list_summaries(&mut tx, page).await?;
        let items = items_for_page(&mut tx, page).await?;
        tx.commit().await?;
        Ok((summaries, items))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
