//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  ├── ValidationError  - Single-field input failures                    │
//! │  └── ItemError        - One offending line item (index + reasons)      │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  tally-api errors                                                      │
//! │  └── ApiError         - What the HTTP client sees                      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → JSON + status code     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found in the stock ledger.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Applying a stock delta would take a product below zero.
    ///
    /// ## When This Occurs
    /// - Selling more than is on hand
    /// - Editing a transaction to a larger quantity than remains
    /// - Product has `allow_negative_stock = false`
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Sales transaction cannot be found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Receipt (OR) number is already used by another transaction.
    #[error("Receipt number '{0}' already exists")]
    DuplicateReceipt(String),

    /// A transaction with refunds on record cannot be emptied.
    #[error("Transaction {0} has refunds and cannot be emptied")]
    TransactionHasRefunds(String),

    /// One or more submitted line items are invalid.
    ///
    /// Carries every offending item so the client can highlight all of them
    /// at once instead of failing on the first.
    #[error("{} invalid item(s)", .0.len())]
    InvalidItems(Vec<ItemError>),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., malformed decimal amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Collection has more entries than allowed.
    #[error("{field} cannot have more than {max} entries")]
    TooMany { field: String, max: usize },

    /// Positional index does not exist.
    #[error("{field} index {index} is out of range (len {len})")]
    IndexOutOfRange {
        field: String,
        index: usize,
        len: usize,
    },
}

// =============================================================================
// Item Error
// =============================================================================

/// A single invalid line item, identified by its position in the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemError {
    /// Zero-based position of the item in the submitted list.
    pub index: usize,
    /// Human-readable reasons, one per failed rule.
    pub problems: Vec<String>,
}

impl ItemError {
    pub fn new(index: usize, problems: Vec<String>) -> Self {
        ItemError { index, problems }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
