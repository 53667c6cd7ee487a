//! # RMA Repository
//!
//! Returned-goods records. Items are addressed by position inside their RMA
//! and carry a JSON array of proof-of-image references.
//!
//! ```text
//! rmas       : RMA-00001 │ ST-S00001 │ "cracked screen" │ pending
//! rma_items  : RMA-00001 │ 0 │ P1 │ ["img/a.jpg", "img/b.jpg"]
//!              RMA-00001 │ 1 │ P2 │ []
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tally_core::{Rma, RmaItem};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;

/// An RMA with its items in position order.
#[derive(Debug, Clone)]
pub struct RmaRecord {
    pub rma: Rma,
    pub items: Vec<RmaItem>,
}

/// Fields needed to create an RMA.
#[derive(Debug, Clone)]
pub struct NewRma {
    pub transaction_id: Option<String>,
    pub customer_name: Option<String>,
    pub reason: String,
    pub items: Vec<NewRmaItem>,
}

#[derive(Debug, Clone)]
pub struct NewRmaItem {
    pub product_id: String,
    pub product_name: Option<String>,
    pub quantity: i64,
    pub reason: Option<String>,
    pub proof_of_images: Vec<String>,
}

/// Outcome of [`set_item_images`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageUpdate {
    Updated(RmaItem),
    /// The RMA exists but has no item at that position.
    NoSuchItem { len: usize },
}

#[derive(sqlx::FromRow)]
struct RmaItemRow {
    position: i64,
    product_id: String,
    product_name: Option<String>,
    quantity: i64,
    reason: Option<String>,
    proof_of_images: String,
}

impl RmaItemRow {
    fn into_item(self, rma_id: &str) -> DbResult<RmaItem> {
        let proof_of_images =
            serde_json::from_str(&self.proof_of_images).map_err(|e| DbError::Corrupt {
                entity: format!("RMA {rma_id} item {}", self.position),
                message: e.to_string(),
            })?;
        Ok(RmaItem {
            position: self.position,
            product_id: self.product_id,
            product_name: self.product_name,
            quantity: self.quantity,
            reason: self.reason,
            proof_of_images,
        })
    }
}

fn images_json(images: &[String]) -> DbResult<String> {
    serde_json::to_string(images).map_err(|e| DbError::Internal(e.to_string()))
}

/// Inserts an RMA and its items. `rma_id` is minted by the caller.
pub async fn insert(conn: &mut SqliteConnection, rma_id: &str, new: &NewRma) -> DbResult<RmaRecord> {
    debug!(rma_id = %rma_id, items = new.items.len(), "Inserting RMA");

    let now: DateTime<Utc> = Utc::now();
    let rma = Rma {
        id: new_id(),
        rma_id: rma_id.to_string(),
        transaction_id: new.transaction_id.clone(),
        customer_name: new.customer_name.clone(),
        reason: new.reason.clone(),
        status: "pending".to_string(),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO rmas (
            id, rma_id, transaction_id, customer_name, reason, status, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&rma.id)
    .bind(&rma.rma_id)
    .bind(&rma.transaction_id)
    .bind(&rma.customer_name)
    .bind(&rma.reason)
    .bind(&rma.status)
    .bind(rma.created_at)
    .bind(rma.updated_at)
    .execute(&mut *conn)
    .await?;

    let items: Vec<RmaItem> = new
        .items
        .iter()
        .enumerate()
        .map(|(position, item)| RmaItem {
            position: position as i64,
            product_id: item.product_id.clone(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            reason: item.reason.clone(),
            proof_of_images: item.proof_of_images.clone(),
        })
        .collect();

    if !items.is_empty() {
        let encoded = items
            .iter()
            .map(|item| images_json(&item.proof_of_images))
            .collect::<DbResult<Vec<_>>>()?;

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO rma_items (rma_id, position, product_id, product_name, quantity, reason, proof_of_images) ",
        );
        builder.push_values(items.iter().zip(&encoded), |mut row, (item, images)| {
            row.push_bind(rma_id)
                .push_bind(item.position)
                .push_bind(&item.product_id)
                .push_bind(&item.product_name)
                .push_bind(item.quantity)
                .push_bind(&item.reason)
                .push_bind(images);
        });
        builder.build().execute(&mut *conn).await?;
    }

    Ok(RmaRecord { rma, items })
}

/// Gets an RMA with its items.
pub async fn get(conn: &mut SqliteConnection, rma_id: &str) -> DbResult<Option<RmaRecord>> {
    let Some(rma) = sqlx::query_as::<_, Rma>("SELECT * FROM rmas WHERE rma_id = ?1")
        .bind(rma_id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let rows = sqlx::query_as::<_, RmaItemRow>(
        r#"
        SELECT position, product_id, product_name, quantity, reason, proof_of_images
        FROM rma_items WHERE rma_id = ?1 ORDER BY position
        "#,
    )
    .bind(rma_id)
    .fetch_all(&mut *conn)
    .await?;

    let items = rows
        .into_iter()
        .map(|row| row.into_item(rma_id))
        .collect::<DbResult<Vec<_>>>()?;

    Ok(Some(RmaRecord { rma, items }))
}

/// Replaces the proof-of-image array of the item at `position`.
///
/// ## Returns
/// * `Err(DbError::NotFound)` - no such RMA
/// * `Ok(NoSuchItem)` - RMA exists, position is out of range
pub async fn set_item_images(
    conn: &mut SqliteConnection,
    rma_id: &str,
    position: i64,
    images: &[String],
) -> DbResult<ImageUpdate> {
    debug!(rma_id = %rma_id, position, count = images.len(), "Setting RMA item images");

    let row = sqlx::query_as::<_, RmaItemRow>(
        r#"
        UPDATE rma_items SET proof_of_images = ?3
        WHERE rma_id = ?1 AND position = ?2
        RETURNING position, product_id, product_name, quantity, reason, proof_of_images
        "#,
    )
    .bind(rma_id)
    .bind(position)
    .bind(images_json(images)?)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(row) = row {
        sqlx::query("UPDATE rmas SET updated_at = ?2 WHERE rma_id = ?1")
            .bind(rma_id)
            .bind(Utc::now())
            .execute(&mut *conn)
            .await?;
        return Ok(ImageUpdate::Updated(row.into_item(rma_id)?));
    }

    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM rmas WHERE rma_id = ?1)")
        .bind(rma_id)
        .fetch_one(&mut *conn)
        .await?;
    if !exists {
        return Err(DbError::not_found("RMA", rma_id));
    }

    let len: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rma_items WHERE rma_id = ?1")
        .bind(rma_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(ImageUpdate::NoSuchItem { len: len as usize })
}

#[derive(Debug, Clone)]
pub struct RmaRepository {
    pool: SqlitePool,
}

impl RmaRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RmaRepository { pool }
    }

    pub async fn get(&self, rma_id: &str) -> DbResult<Option<RmaRecord>> {
        let mut conn = self.pool.acquire().await?;
        get(&mut conn, rma_id).await
    }

    pub async fn set_item_images(
        &self,
        rma_id: &str,
        position: i64,
        images: &[String],
    ) -> DbResult<ImageUpdate> {
        let mut conn = self.pool.acquire().await?;
        set_item_images(&mut conn, rma_id, position, images).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;

    fn new_rma() -> NewRma {
        NewRma {
            transaction_id: None,
            customer_name: Some("Juan".to_string()),
            reason: "cracked".to_string(),
            items: vec![
                NewRmaItem {
                    product_id: "P1".to_string(),
                    product_name: Some("Phone".to_string()),
                    quantity: 1,
                    reason: None,
                    proof_of_images: vec!["img/a.jpg".to_string()],
                },
                NewRmaItem {
                    product_id: "P2".to_string(),
                    product_name: None,
                    quantity: 2,
                    reason: Some("scratched".to_string()),
                    proof_of_images: Vec::new(),
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = memory_db().await;
        {
            let mut conn = db.pool().acquire().await.unwrap();
            insert(&mut conn, "RMA-00001", &new_rma()).await.unwrap();
        }

        let record = db.rmas().get("RMA-00001").await.unwrap().unwrap();
        assert_eq!(record.rma.status, "pending");
        assert_eq!(record.items.len(), 2);
        assert_eq!(record.items[0].proof_of_images, vec!["img/a.jpg"]);
        assert_eq!(record.items[1].position, 1);
        assert!(db.rmas().get("RMA-09999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_item_images() {
        let db = memory_db().await;
        {
            let mut conn = db.pool().acquire().await.unwrap();
            insert(&mut conn, "RMA-00001", &new_rma()).await.unwrap();
        }
        let repo = db.rmas();
        let images = vec!["img/x.jpg".to_string(), "img/y.jpg".to_string()];

        match repo.set_item_images("RMA-00001", 1, &images).await.unwrap() {
            ImageUpdate::Updated(item) => assert_eq!(item.proof_of_images, images),
            other => panic!("unexpected {other:?}"),
        }
        let record = repo.get("RMA-00001").await.unwrap().unwrap();
        assert_eq!(record.items[1].proof_of_images, images);
        assert_eq!(record.items[0].proof_of_images, vec!["img/a.jpg"]);

        assert_eq!(
            repo.set_item_images("RMA-00001", 2, &images).await.unwrap(),
            ImageUpdate::NoSuchItem { len: 2 }
        );
        assert!(matches!(
            repo.set_item_images("RMA-09999", 0, &images).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
