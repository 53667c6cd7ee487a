//! # API Error Type
//!
//! Unified error type for every HTTP handler.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tally                                  │
//! │                                                                         │
//! │  Handler / workflow service: Result<T, ApiError>                       │
//! │         │                                                               │
//! │         ├── CoreError (rules)  ─────┐                                   │
//! │         ├── DbError (storage)  ─────┼──► ApiError { code, message }    │
//! │         └── JSON rejection     ─────┘          │                        │
//! │                                                ▼                        │
//! │                           IntoResponse: status + JSON body             │
//! │                                                                         │
//! │  {                                                                      │
//! │    "success": false,                                                    │
//! │    "code": "VALIDATION_ERROR",                                          │
//! │    "message": "2 invalid item(s)",                                      │
//! │    "details": [{ "index": 0, "problems": ["quantity is required"] }]    │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage failures are logged in full and answered with a generic message;
//! request bodies are never echoed back.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tally_core::CoreError;
use tally_db::DbError;
use tracing::{error, warn};

/// API error returned from every handler.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Structured context (e.g. every offending line item)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Resource not found (404)
    NotFound,

    /// Request conflicts with current state (409)
    Conflict,

    /// Stock would go below zero (409)
    InsufficientStock,

    /// Database operation failed (500)
    DatabaseError,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict | ErrorCode::InsufficientStock => StatusCode::CONFLICT,
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Conflict, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    #[serde(flatten)]
    error: &'a ApiError,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = ?self.code, message = %self.message, "Request failed");
        } else {
            warn!(code = ?self.code, status = status.as_u16(), message = %self.message, "Request rejected");
        }

        let body = ErrorBody {
            success: false,
            error: &self,
        };
        (status, Json(body)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                ApiError::conflict(format!("{} '{}' already exists", field, value))
            }
            DbError::ForeignKeyViolation { message } => {
                warn!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::ConnectionFailed(e) => {
                error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::QueryFailed(e) | DbError::Internal(e) => {
                // Log the actual error but return a generic message
                error!("Database operation failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::Corrupt { entity, message } => {
                error!(entity = %entity, "Corrupt stored data: {}", message);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        DbError::from(err).into()
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::TransactionNotFound(id) => ApiError::not_found("Transaction", &id),
            CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            CoreError::DuplicateReceipt(_) | CoreError::TransactionHasRefunds(_) => {
                ApiError::conflict(err.to_string())
            }
            CoreError::InvalidItems(ref items) => {
                let details = serde_json::to_value(items).ok();
                ApiError {
                    code: ErrorCode::ValidationError,
                    message: err.to_string(),
                    details,
                }
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

/// Result type for handlers and workflow services.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{ItemError, ValidationError};

    #[test]
    fn test_core_error_mapping() {
        let err: ApiError = CoreError::DuplicateReceipt("OR1".into()).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.message, "Receipt number 'OR1' already exists");

        let err: ApiError = CoreError::TransactionNotFound("ST-S00009".into()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = CoreError::InsufficientStock {
            product_id: "P1".into(),
            available: 1,
            requested: 5,
        }
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = CoreError::Validation(ValidationError::Required {
            field: "orNumber".into(),
        })
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_invalid_items_carry_details() {
        let err: ApiError =
            CoreError::InvalidItems(vec![ItemError::new(2, vec!["quantity is required".into()])])
                .into();
        let details = err.details.unwrap();
        assert_eq!(details[0]["index"], 2);
        assert_eq!(details[0]["problems"][0], "quantity is required");
    }

    #[test]
    fn test_storage_errors_are_generic() {
        let err: ApiError = DbError::QueryFailed("no such table: secrets".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("secrets"));

        let err: ApiError = DbError::Internal("pool state".into()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);

        let err: ApiError = DbError::duplicate("product_id", "P1").into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }
}
