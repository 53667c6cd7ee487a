//! # Sequence Repository
//!
//! Named counters behind the business keys (`ST-S00001`, `TI-00001`, ...).
//!
//! ## Find-Or-Create-And-Increment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  INSERT INTO sequences (name, value) VALUES ('refund', 1)              │
//! │  ON CONFLICT (name) DO UPDATE SET value = value + 1                    │
//! │  RETURNING value                                                       │
//! │                                                                         │
//! │  first call  ──► row created, returns 1                                │
//! │  later calls ──► row incremented, returns the new value                │
//! │                                                                         │
//! │  One statement, so two callers can never read the same value.         │
//! │  Inside a workflow transaction the increment rolls back with it.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tally_core::KeyKind;
use tracing::trace;

use crate::error::DbResult;

/// Increments the counter `name` and returns its new value.
pub async fn next_value(conn: &mut SqliteConnection, name: &str) -> DbResult<i64> {
    let value: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO sequences (name, value) VALUES (?1, 1)
        ON CONFLICT (name) DO UPDATE SET value = value + 1
        RETURNING value
        "#,
    )
    .bind(name)
    .fetch_one(&mut *conn)
    .await?;

    trace!(name = %name, value, "Sequence advanced");
    Ok(value)
}

/// Mints the next business key of the given kind.
pub async fn next_key(conn: &mut SqliteConnection, kind: KeyKind) -> DbResult<String> {
    let value = next_value(conn, kind.sequence_name()).await?;
    Ok(kind.format(value))
}

/// Mints `count` consecutive keys of one kind.
pub async fn next_keys(
    conn: &mut SqliteConnection,
    kind: KeyKind,
    count: usize,
) -> DbResult<Vec<String>> {
    let mut keys = Vec::with_capacity(count);
    for _ in 0..count {
        keys.push(next_key(conn, kind).await?);
    }
    Ok(keys)
}

/// Reads a counter without advancing it.
pub async fn current_value(conn: &mut SqliteConnection, name: &str) -> DbResult<Option<i64>> {
    let value = sqlx::query_scalar("SELECT value FROM sequences WHERE name = ?1")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(value)
}

/// Repository for sequence operations outside a workflow transaction.
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    pool: SqlitePool,
}

impl SequenceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SequenceRepository { pool }
    }

    /// Increments and returns the counter `name`.
    pub async fn next(&self, name: &str) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        next_value(&mut conn, name).await
    }

    pub async fn next_key(&self, kind: KeyKind) -> DbResult<String> {
        let mut conn = self.pool.acquire().await?;
        next_key(&mut conn, kind).await
    }

    pub async fn current(&self, name: &str) -> DbResult<Option<i64>> {
        let mut conn = self.pool.acquire().await?;
        current_value(&mut conn, name).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;
    use crate::{Database, DbConfig};
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_first_value_is_one() {
        let db = memory_db().await;
        let seq = db.sequences();

        assert_eq!(seq.current("refund").await.unwrap(), None);
        assert_eq!(seq.next("refund").await.unwrap(), 1);
        assert_eq!(seq.next("refund").await.unwrap(), 2);
        assert_eq!(seq.next("replace").await.unwrap(), 1);
        assert_eq!(seq.current("refund").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_next_key_formats() {
        let db = memory_db().await;
        let seq = db.sequences();

        assert_eq!(
            seq.next_key(KeyKind::SalesTransaction).await.unwrap(),
            "ST-S00001"
        );
        assert_eq!(
            seq.next_key(KeyKind::SalesTransaction).await.unwrap(),
            "ST-S00002"
        );
        assert_eq!(seq.next_key(KeyKind::TransactionItem).await.unwrap(), "TI-00001");
    }

    #[tokio::test]
    async fn test_next_keys_in_transaction() {
        let db = memory_db().await;

        let mut tx = db.begin_write().await.unwrap();
        let keys = next_keys(&mut tx, KeyKind::RefundedItem, 3).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(keys, vec!["RI-00001", "RI-00002", "RI-00003"]);
    }

    #[tokio::test]
    async fn test_concurrent_callers_get_distinct_values() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("seq.db")).max_connections(4);
        let db = Database::new(config).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let seq = db.sequences();
            handles.push(tokio::spawn(async move {
                let mut values = Vec::new();
                for _ in 0..25 {
                    values.push(seq.next("sales_transaction").await.unwrap());
                }
                values
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for value in handle.await.unwrap() {
                assert!(seen.insert(value), "value {value} handed out twice");
            }
        }

        let stored = db.sequences().current("sales_transaction").await.unwrap();
        assert_eq!(seen.len(), 200);
        assert_eq!(stored, Some(200));
        assert!(seen.iter().all(|v| *v <= 200));
    }

    #[tokio::test]
    async fn test_concurrent_read_then_write_transactions_all_commit() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("tx.db")).max_connections(4);
        let db = Database::new(config).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..10 {
                    let mut tx = db.begin_write().await.unwrap();
                    let before = current_value(&mut tx, "refund").await.unwrap().unwrap_or(0);
                    tokio::task::yield_now().await;
                    let after = next_value(&mut tx, "refund").await.unwrap();
                    assert_eq!(after, before + 1);
                    tx.commit().await.unwrap();
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(db.sequences().current("refund").await.unwrap(), Some(80));
    }
}
