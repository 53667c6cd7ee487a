//! Supplier master data. Keys (`SUP-…`) are minted by the server.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tally_core::validation::validate_name;
use tally_core::{CoreError, Supplier};
use tally_db::repository::supplier::NewSupplier;

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::routes::sales::Message;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/suppliers", post(create).get(list))
        .route("/suppliers/{supplier_id}", get(read).delete(remove))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierView {
    pub supplier_id: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl From<Supplier> for SupplierView {
    fn from(supplier: Supplier) -> Self {
        SupplierView {
            supplier_id: supplier.supplier_id,
            name: supplier.name,
            contact_person: supplier.contact_person,
            phone: supplier.phone,
            email: supplier.email,
            address: supplier.address,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SupplierBody>,
) -> ApiResult<(StatusCode, Json<SupplierView>)> {
    let name = body.name.unwrap_or_default().trim().to_string();
    validate_name("name", &name).map_err(CoreError::from)?;

    let supplier = state
        .db
        .suppliers()
        .insert(&NewSupplier {
            name,
            contact_person: non_blank(body.contact_person),
            phone: non_blank(body.phone),
            email: non_blank(body.email),
            address: non_blank(body.address),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(supplier.into())))
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<SupplierView>>> {
    let suppliers = state.db.suppliers().list().await?;
    Ok(Json(suppliers.into_iter().map(SupplierView::from).collect()))
}

async fn read(
    State(state): State<AppState>,
    Path(supplier_id): Path<String>,
) -> ApiResult<Json<SupplierView>> {
    let supplier = state
        .db
        .suppliers()
        .get(&supplier_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Supplier", &supplier_id))?;
    Ok(Json(supplier.into()))
}

async fn remove(
    State(state): State<AppState>,
    Path(supplier_id): Path<String>,
) -> ApiResult<Json<Message>> {
    if !state.db.suppliers().delete(&supplier_id).await? {
        return Err(ApiError::not_found("Supplier", &supplier_id));
    }
    Ok(Json(Message::ok(format!("Supplier {supplier_id} deleted"))))
}
