//! # Supplier Repository
//!
//! Suppliers get minted `SUP-…` keys. Deleting a supplier detaches its
//! products (`products.supplier_id` becomes NULL).

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tally_core::{KeyKind, Supplier};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{new_id, sequence};

#[derive(Debug, Clone, Default)]
pub struct NewSupplier {
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Mints a supplier key and inserts the supplier.
pub async fn insert(conn: &mut SqliteConnection, new: &NewSupplier) -> DbResult<Supplier> {
    let supplier_id = sequence::next_key(conn, KeyKind::Supplier).await?;
    debug!(supplier_id = %supplier_id, "Inserting supplier");

    let supplier = Supplier {
        id: new_id(),
        supplier_id,
        name: new.name.clone(),
        contact_person: new.contact_person.clone(),
        phone: new.phone.clone(),
        email: new.email.clone(),
        address: new.address.clone(),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO suppliers (
            id, supplier_id, name, contact_person, phone, email, address, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&supplier.id)
    .bind(&supplier.supplier_id)
    .bind(&supplier.name)
    .bind(&supplier.contact_person)
    .bind(&supplier.phone)
    .bind(&supplier.email)
    .bind(&supplier.address)
    .bind(supplier.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(supplier)
}

pub async fn get(conn: &mut SqliteConnection, supplier_id: &str) -> DbResult<Option<Supplier>> {
    let supplier = sqlx::query_as::<_, Supplier>("SELECT * FROM suppliers WHERE supplier_id = ?1")
        .bind(supplier_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(supplier)
}

pub async fn list(conn: &mut SqliteConnection) -> DbResult<Vec<Supplier>> {
    let suppliers = sqlx::query_as::<_, Supplier>("SELECT * FROM suppliers ORDER BY name")
        .fetch_all(&mut *conn)
        .await?;
    Ok(suppliers)
}

/// Returns `false` if there was no such supplier.
pub async fn delete(conn: &mut SqliteConnection, supplier_id: &str) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM suppliers WHERE supplier_id = ?1")
        .bind(supplier_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Key minting and insert run in one transaction.
    pub async fn insert(&self, new: &NewSupplier) -> DbResult<Supplier> {
        let mut tx = crate::pool::begin_immediate(&self.pool).await?;
        let supplier = insert(&mut tx, new).await?;
        tx.commit().await?;
        Ok(supplier)
    }

    pub async fn get(&self, supplier_id: &str) -> DbResult<Option<Supplier>> {
        let mut conn = self.pool.acquire().await?;
        get(&mut conn, supplier_id).await
    }

    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let mut conn = self.pool.acquire().await?;
        list(&mut conn).await
    }

    pub async fn delete(&self, supplier_id: &str) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        delete(&mut conn, supplier_id).await
    }
}
