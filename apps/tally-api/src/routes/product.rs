//! Product master data and stock counts.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::money::decimal;
use tally_core::validation::{
    validate_amount, validate_name, validate_product_id, validate_stock_levels,
};
use tally_core::{CoreError, Money, Product, ValidationError};
use tally_db::repository::product::{self, NewProduct};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", post(create).get(list))
        .route("/products/low-stock", get(low_stock))
        .route("/products/{product_id}", get(read))
        .route("/products/{product_id}/stock", put(set_stock))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductBody {
    #[serde(default, alias = "product_id")]
    pub product_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub supplier_id: Option<String>,
    #[serde(default, with = "decimal::option")]
    pub unit_price: Option<Money>,
    #[serde(default)]
    pub current_stock: Option<i64>,
    #[serde(default)]
    pub min_stock: Option<i64>,
    #[serde(default)]
    pub max_stock: Option<i64>,
    #[serde(default)]
    pub allow_negative_stock: bool,
}

/// Absolute stock counts; `minStock` / `maxStock` keep their value when
/// omitted.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockBody {
    #[serde(default)]
    pub current_stock: Option<i64>,
    #[serde(default)]
    pub min_stock: Option<i64>,
    #[serde(default)]
    pub max_stock: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub product_id: String,
    pub name: String,
    pub category: Option<String>,
    pub supplier_id: Option<String>,
    #[serde(with = "decimal")]
    pub unit_price: Money,
    pub current_stock: i64,
    pub min_stock: i64,
    pub max_stock: i64,
    pub allow_negative_stock: bool,
    pub low_stock: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        ProductView {
            unit_price: product.unit_price(),
            low_stock: product.is_low_stock(),
            product_id: product.product_id,
            name: product.name,
            category: product.category,
            supplier_id: product.supplier_id,
            current_stock: product.current_stock,
            min_stock: product.min_stock,
            max_stock: product.max_stock,
            allow_negative_stock: product.allow_negative_stock,
            updated_at: product.updated_at,
        }
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, CoreError> {
    value.ok_or_else(|| {
        ValidationError::Required {
            field: field.to_string(),
        }
        .into()
    })
}

fn validate_product(body: ProductBody) -> Result<NewProduct, CoreError> {
    let product_id = required(body.product_id, "productId")?.trim().to_string();
    validate_product_id(&product_id)?;

    let name = required(body.name, "name")?.trim().to_string();
    validate_name("name", &name)?;

    let unit_price = required(body.unit_price, "unitPrice")?;
    validate_amount("unitPrice", unit_price)?;

    let current_stock = body.current_stock.unwrap_or(0);
    let min_stock = body.min_stock.unwrap_or(0);
    let max_stock = body.max_stock.unwrap_or(0);
    validate_stock_levels(current_stock, min_stock, max_stock, body.allow_negative_stock)?;

    Ok(NewProduct {
        product_id,
        name,
        category: body.category.filter(|c| !c.trim().is_empty()),
        supplier_id: body.supplier_id.filter(|s| !s.trim().is_empty()),
        unit_price,
        current_stock,
        min_stock,
        max_stock,
        allow_negative_stock: body.allow_negative_stock,
    })
}

async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ProductBody>,
) -> ApiResult<(StatusCode, Json<ProductView>)> {
    let new = validate_product(body)?;
    let product = state.db.products().insert(&new).await?;

    info!(product_id = %product.product_id, stock = product.current_stock, "Product created");
    Ok((StatusCode::CREATED, Json(product.into())))
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<ProductView>>> {
    let products = state.db.products().list().await?;
    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}

async fn low_stock(State(state): State<AppState>) -> ApiResult<Json<Vec<ProductView>>> {
    let products = state.db.products().list_low_stock().await?;
    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}

async fn read(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> ApiResult<Json<ProductView>> {
    let product = state
        .db
        .products()
        .get(&product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &product_id))?;
    Ok(Json(product.into()))
}

async fn set_stock(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    ApiJson(body): ApiJson<StockBody>,
) -> ApiResult<Json<ProductView>> {
    let current_stock = required(body.current_stock, "currentStock")?;

    let mut tx = state.db.begin_write().await?;

    let existing = product::get(&mut tx, &product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &product_id))?;

    let min_stock = body.min_stock.unwrap_or(existing.min_stock);
    let max_stock = body.max_stock.unwrap_or(existing.max_stock);
    validate_stock_levels(
        current_stock,
        min_stock,
        max_stock,
        existing.allow_negative_stock,
    )
    .map_err(CoreError::from)?;

    let product =
        product::set_stock_levels(&mut tx, &product_id, current_stock, min_stock, max_stock)
            .await?;
    tx.commit().await?;

    info!(
        product_id = %product_id,
        from = existing.current_stock,
        to = product.current_stock,
        "Stock levels set"
    );
    Ok(Json(product.into()))
}
