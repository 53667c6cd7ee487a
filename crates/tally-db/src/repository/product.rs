//! # Product Repository
//!
//! Products and the stock ledger.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                            │
//! │                                                                     │
//! │  ❌ WRONG: read, compute, write back                               │
//! │     SELECT current_stock ...; UPDATE ... SET current_stock = 7     │
//! │                                                                     │
//! │  ✅ CORRECT: one conditional delta statement                       │
//! │     UPDATE products SET current_stock = current_stock + ?delta     │
//! │     WHERE product_id = ?                                            │
//! │       AND (allow_negative_stock = 1 OR current_stock + ?delta >= 0)│
//! │                                                                     │
//! │  Two checkouts selling the last units: the second UPDATE sees the  │
//! │  first one's result and matches no row → Insufficient.             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tally_core::{Money, Product};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;

/// Fields needed to create a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub product_id: String,
    pub name: String,
    pub category: Option<String>,
    pub supplier_id: Option<String>,
    pub unit_price: Money,
    pub current_stock: i64,
    pub min_stock: i64,
    pub max_stock: i64,
    pub allow_negative_stock: bool,
}

/// Outcome of [`adjust_stock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAdjustment {
    /// Delta applied; carries the new stock level.
    Applied { current_stock: i64 },
    /// Rejected: stock would drop below zero. Nothing was changed.
    Insufficient { available: i64 },
}

/// Inserts a new product.
///
/// ## Returns
/// * `Err(DbError::UniqueViolation)` - product id already exists
pub async fn insert(conn: &mut SqliteConnection, new: &NewProduct) -> DbResult<Product> {
    debug!(product_id = %new.product_id, "Inserting product");

    let now = Utc::now();
    let product = Product {
        id: new_id(),
        product_id: new.product_id.clone(),
        name: new.name.clone(),
        category: new.category.clone(),
        supplier_id: new.supplier_id.clone(),
        unit_price_cents: new.unit_price.cents(),
        current_stock: new.current_stock,
        min_stock: new.min_stock,
        max_stock: new.max_stock,
        allow_negative_stock: new.allow_negative_stock,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO products (
            id, product_id, name, category, supplier_id,
            unit_price_cents, current_stock, min_stock, max_stock,
            allow_negative_stock, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&product.id)
    .bind(&product.product_id)
    .bind(&product.name)
    .bind(&product.category)
    .bind(&product.supplier_id)
    .bind(product.unit_price_cents)
    .bind(product.current_stock)
    .bind(product.min_stock)
    .bind(product.max_stock)
    .bind(product.allow_negative_stock)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        err if err.is_unique_violation_on("product_id") => {
            DbError::duplicate("product_id", &new.product_id)
        }
        err => err,
    })?;

    Ok(product)
}

/// Gets a product by its business key.
pub async fn get(conn: &mut SqliteConnection, product_id: &str) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE product_id = ?1")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(product)
}

/// Lists all products by name.
pub async fn list(conn: &mut SqliteConnection) -> DbResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY name, product_id")
        .fetch_all(&mut *conn)
        .await?;
    Ok(products)
}

/// Lists products whose stock is under their reorder threshold.
pub async fn list_low_stock(conn: &mut SqliteConnection) -> DbResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        r#"
        SELECT * FROM products
        WHERE current_stock < min_stock
        ORDER BY current_stock - min_stock, product_id
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;
    Ok(products)
}

/// Applies a signed delta to a product's stock.
///
/// ## Arguments
/// * `delta` - Change in stock (negative for sales, positive for refunds)
///
/// ## Returns
/// * `Ok(Applied)` - new stock level
/// * `Ok(Insufficient)` - the floor would be crossed; row untouched
/// * `Err(DbError::NotFound)` - no such product
pub async fn adjust_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    delta: i64,
) -> DbResult<StockAdjustment> {
    debug!(product_id = %product_id, delta, "Adjusting stock");

    let applied: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET current_stock = current_stock + ?2,
            updated_at = ?3
        WHERE product_id = ?1
          AND (allow_negative_stock = 1 OR current_stock + ?2 >= 0)
        RETURNING current_stock
        "#,
    )
    .bind(product_id)
    .bind(delta)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(current_stock) = applied {
        return Ok(StockAdjustment::Applied { current_stock });
    }

    let available: Option<i64> =
        sqlx::query_scalar("SELECT current_stock FROM products WHERE product_id = ?1")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;

    match available {
        Some(available) => Ok(StockAdjustment::Insufficient { available }),
        None => Err(DbError::not_found("Product", product_id)),
    }
}

/// Sets absolute stock counts (restock / stock take).
pub async fn set_stock_levels(
    conn: &mut SqliteConnection,
    product_id: &str,
    current_stock: i64,
    min_stock: i64,
    max_stock: i64,
) -> DbResult<Product> {
    debug!(product_id = %product_id, current_stock, "Setting stock levels");

    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET current_stock = ?2,
            min_stock = ?3,
            max_stock = ?4,
            updated_at = ?5
        WHERE product_id = ?1
        RETURNING *
        "#,
    )
    .bind(product_id)
    .bind(current_stock)
    .bind(min_stock)
    .bind(max_stock)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    product.ok_or_else(|| DbError::not_found("Product", product_id))
}

/// Counts all products.
pub async fn count(conn: &mut SqliteConnection) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let product = repo.get("P1").await?;
/// let low = repo.list_low_stock().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    pub async fn insert(&self, new: &NewProduct) -> DbResult<Product> {
        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, new).await
    }

    pub async fn get(&self, product_id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        get(&mut conn, product_id).await
    }

    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let mut conn = self.pool.acquire().await?;
        list(&mut conn).await
    }

    pub async fn list_low_stock(&self) -> DbResult<Vec<Product>> {
        let mut conn = self.pool.acquire().await?;
        list_low_stock(&mut conn).await
    }

    pub async fn adjust_stock(&self, product_id: &str, delta: i64) -> DbResult<StockAdjustment> {
        let mut conn = self.pool.acquire().await?;
        adjust_stock(&mut conn, product_id, delta).await
    }

    pub async fn set_stock_levels(
        &self,
        product_id: &str,
        current_stock: i64,
        min_stock: i64,
        max_stock: i64,
    ) -> DbResult<Product> {
        let mut conn = self.pool.acquire().await?;
        set_stock_levels(&mut conn, product_id, current_stock, min_stock, max_stock).await
    }

    /// Counts total products (for diagnostics and the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        count(&mut conn).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
