//! # Tally API
//!
//! REST server for sales bookkeeping: sales transactions, refunds,
//! replacements and RMA records over a SQLite stock ledger.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Tally API                                     │
//! │                                                                         │
//! │  SPA ──► axum Router ──► routes::* ──► services::* ──► tally-db        │
//! │           (CORS, trace)   (wire DTOs)   (one DB tx)     (SQLite)        │
//! │                                            │                            │
//! │                                            ▼                            │
//! │                                       tally-core                        │
//! │                              (validation, stock ledger)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]: `tally.toml` plus `TALLY_*` environment
//! variables.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use tally_db::Database;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }
}

/// Builds the application with every route, middleware and state.
pub fn build_router(state: AppState) -> Router {
    routes::router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
