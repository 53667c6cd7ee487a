//! Health check route (public).

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tally_db::MigrationStatus;
use tracing::warn;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    database: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    migrations: Option<MigrationStatus>,
    server_time: DateTime<Utc>,
}

/// 200 when the database answers and migrations are current, 503 otherwise.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;

    let migrations = match state.db.migration_status().await {
        Ok(status) => Some(status),
        Err(e) => {
            warn!("Migration status unavailable: {}", e);
            None
        }
    };

    let healthy = database && migrations.as_ref().is_some_and(MigrationStatus::is_current);
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if healthy { "ok" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            database,
            migrations,
            server_time: Utc::now(),
        }),
    )
}
