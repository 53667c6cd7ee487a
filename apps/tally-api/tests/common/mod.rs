//! Shared harness: an in-memory database behind the full router, driven
//! request by request with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tally_api::{build_router, ApiConfig, AppState};
use tally_core::Money;
use tally_db::repository::product::NewProduct;
use tally_db::repository::user::NewUser;
use tally_db::{Database, DbConfig};
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub db: Database,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let router = build_router(AppState::new(db.clone(), ApiConfig::default()));
        TestApp { router, db }
    }

    /// Sends one request and returns the status and the parsed JSON body
    /// (`Value::Null` for an empty body).
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn seed_product(&self, product_id: &str, name: &str, stock: i64, price_cents: i64) {
        self.db
            .products()
            .insert(&NewProduct {
                product_id: product_id.to_string(),
                name: name.to_string(),
                category: Some("Office".to_string()),
                supplier_id: None,
                unit_price: Money::from_cents(price_cents),
                current_stock: stock,
                min_stock: 0,
                max_stock: 100,
                allow_negative_stock: false,
            })
            .await
            .unwrap();
    }

    pub async fn seed_cashier(&self, user_id: i64, first: &str, last: &str) {
        self.db
            .users()
            .insert(&NewUser {
                user_id,
                first_name: first.to_string(),
                last_name: last.to_string(),
                role: "cashier".to_string(),
            })
            .await
            .unwrap();
    }

    pub async fn stock(&self, product_id: &str) -> i64 {
        self.db
            .products()
            .get(product_id)
            .await
            .unwrap()
            .unwrap()
            .current_stock
    }

    /// Creates a sale of `quantity` units of `product_id` at `unit_price`
    /// and returns its transaction id.
    pub async fn sell(&self, or_number: &str, product_id: &str, quantity: i64, unit_price: f64) -> String {
        let (status, body) = self
            .post(
                "/createSalesTransaction",
                json!({
                    "orNumber": or_number,
                    "user_id": 1,
                    "items": [line(product_id, quantity, unit_price)],
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["transactionId"].as_str().unwrap().to_string()
    }
}

pub fn line(product_id: &str, quantity: i64, unit_price: f64) -> Value {
    json!({
        "product_id": product_id,
        "quantity": quantity,
        "unitPrice": unit_price,
        "totalPrice": unit_price * quantity as f64,
        "description": "Pen",
        "productCategory": "Office",
    })
}
