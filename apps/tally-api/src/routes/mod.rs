//! HTTP routes.
//!
//! Paths and JSON field names follow what the single-page front end sends,
//! so some handlers expose mixed-case keys such as `total_Sales`.

use axum::Router;

use crate::AppState;

pub mod health;
pub mod product;
pub mod refund;
pub mod replace;
pub mod rma;
pub mod sales;
pub mod supplier;
pub mod user;

/// Every route, without middleware or state.
pub fn router() -> Router<AppState> {
    Router::new()
        // Sales transactions
        .merge(sales::router())
        // Refunds
        .merge(refund::router())
        // Replacements
        .merge(replace::router())
        // RMA proof images
        .merge(rma::router())
        // Master data
        .merge(product::router())
        .merge(user::router())
        .merge(supplier::router())
        // Health - liveness and migration status
        .merge(health::router())
}
