//! # Domain Types
//!
//! Core domain types used throughout Tally.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐      ┌──────────────────┐                        │
//! │  │ SalesTransaction │ 1──* │ TransactionItem  │──► Product (stock)     │
//! │  │  transaction_id  │      │  item_id         │                        │
//! │  │  or_number       │      │  quantity        │                        │
//! │  │  total_sales     │      │  total_price     │                        │
//! │  └───┬──────────┬───┘      └──────────────────┘                        │
//! │      │1         │1                                                      │
//! │      │*         │*                                                      │
//! │  ┌───▼──────┐ ┌─▼────────┐                                             │
//! │  │  Refund  │ │ Replace  │      User ── cashier display name           │
//! │  │  1──*    │ │  1──*    │      Supplier ── product source             │
//! │  │ Refunded │ │ Replaced │      Rma ── proof-of-image items            │
//! │  │  Item    │ │  Item    │                                              │
//! │  └──────────┘ └──────────┘                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable storage identity
//! - Business key: (`ST-S00001`, `TI-00001`, ...) - human-readable, minted
//!   from a named sequence and used for every cross-entity reference

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Business Keys
// =============================================================================

/// The kinds of business key minted from the sequence table.
///
/// Each kind owns one named counter; the counter value is zero-padded to
/// five digits behind the kind's prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    SalesTransaction,
    TransactionItem,
    Refund,
    RefundedItem,
    Replace,
    ReplacedItem,
    Rma,
    Supplier,
}

impl KeyKind {
    /// Name of the counter row in the sequence table.
    pub const fn sequence_name(&self) -> &'static str {
        match self {
            KeyKind::SalesTransaction => "sales_transaction",
            KeyKind::TransactionItem => "transaction_item",
            KeyKind::Refund => "refund",
            KeyKind::RefundedItem => "refunded_item",
            KeyKind::Replace => "replace",
            KeyKind::ReplacedItem => "replaced_item",
            KeyKind::Rma => "rma",
            KeyKind::Supplier => "supplier",
        }
    }

    pub const fn prefix(&self) -> &'static str {
        match self {
            KeyKind::SalesTransaction => "ST-S",
            KeyKind::TransactionItem => "TI-",
            KeyKind::Refund => "RF-",
            KeyKind::RefundedItem => "RI-",
            KeyKind::Replace => "RP-",
            KeyKind::ReplacedItem => "RPI-",
            KeyKind::Rma => "RMA-",
            KeyKind::Supplier => "SUP-",
        }
    }

    /// Formats a sequence value as a business key.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::KeyKind;
    ///
    /// assert_eq!(KeyKind::SalesTransaction.format(1), "ST-S00001");
    /// assert_eq!(KeyKind::TransactionItem.format(123456), "TI-123456");
    /// ```
    pub fn format(&self, value: i64) -> String {
        format!("{}{:05}", self.prefix(), value)
    }
}

// =============================================================================
// Product (Stock Ledger Record)
// =============================================================================

/// A product and its stock counts.
///
/// `current_stock` is only ever changed through signed deltas, never by
/// read-modify-write, so concurrent sales cannot lose updates.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    /// Business key chosen by the operator (e.g. `P1`).
    pub product_id: String,
    pub name: String,
    pub category: Option<String>,
    pub supplier_id: Option<String>,
    pub unit_price_cents: i64,
    pub current_stock: i64,
    pub min_stock: i64,
    pub max_stock: i64,
    /// Allow sales to take stock below zero (backorder signal).
    pub allow_negative_stock: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Checks if current stock has fallen under the reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.current_stock < self.min_stock
    }

    /// Checks whether a signed delta may be applied.
    pub fn accepts_delta(&self, delta: i64) -> bool {
        self.allow_negative_stock || self.current_stock + delta >= 0
    }
}

// =============================================================================
// Supplier
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub supplier_id: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// User
// =============================================================================

/// A user of the system. Cashiers are referenced by numeric `user_id`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name shown as "cashier" on transactions.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

// =============================================================================
// Sales Transaction
// =============================================================================

/// A sales transaction header.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalesTransaction {
    pub id: String,
    /// Business key (`ST-S00001`).
    pub transaction_id: String,
    /// Cashier.
    pub user_id: Option<i64>,
    pub total_sales_cents: i64,
    pub profit_cents: i64,
    #[ts(as = "String")]
    pub transaction_date: DateTime<Utc>,
    /// Official receipt number, unique across transactions.
    pub or_number: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl SalesTransaction {
    #[inline]
    pub fn total_sales(&self) -> Money {
        Money::from_cents(self.total_sales_cents)
    }

    #[inline]
    pub fn profit(&self) -> Money {
        Money::from_cents(self.profit_cents)
    }
}

// =============================================================================
// Transaction Item
// =============================================================================

/// Status of a transaction line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Sold and untouched by refunds.
    Sold,
    /// Part of the quantity has been refunded.
    PartiallyRefunded,
}

impl Default for ItemStatus {
    fn default() -> Self {
        ItemStatus::Sold
    }
}

/// A line item of a sales transaction.
/// Product name and category are snapshots taken at the time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransactionItem {
    pub id: String,
    /// Business key (`TI-00001`).
    pub item_id: String,
    /// Parent transaction business key.
    pub transaction_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
    pub product_name: String,
    pub product_category: Option<String>,
    pub status: ItemStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl TransactionItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }
}

// =============================================================================
// Refund
// =============================================================================

/// A refund event against a transaction.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Refund {
    pub id: String,
    /// Business key (`RF-00001`).
    pub refund_id: String,
    /// `None` once the parent transaction has been deleted.
    pub transaction_id: Option<String>,
    pub reason: String,
    pub total_refund_cents: i64,
    #[ts(as = "String")]
    pub refund_date: DateTime<Utc>,
}

impl Refund {
    #[inline]
    pub fn total_refund(&self) -> Money {
        Money::from_cents(self.total_refund_cents)
    }
}

/// One refunded line of a refund.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RefundedItem {
    pub id: String,
    pub refunded_item_id: String,
    pub refund_id: String,
    /// Item key the refund was applied to (the item may since be gone).
    pub transaction_item_id: String,
    pub product_id: String,
    pub refunded_quantity: i64,
    pub refunded_amount_cents: i64,
    pub product_name: Option<String>,
    pub product_category: Option<String>,
}

impl RefundedItem {
    #[inline]
    pub fn refunded_amount(&self) -> Money {
        Money::from_cents(self.refunded_amount_cents)
    }
}

// =============================================================================
// Replace
// =============================================================================

/// A replacement event. Purely a log: no stock or money effects.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Replace {
    pub id: String,
    pub replace_id: String,
    pub transaction_id: Option<String>,
    pub reason: String,
    #[ts(as = "String")]
    pub replace_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ReplacedItem {
    pub id: String,
    pub replaced_item_id: String,
    pub replace_id: String,
    pub transaction_item_id: Option<String>,
    pub product_id: String,
    pub quantity: i64,
    pub product_name: Option<String>,
    pub product_category: Option<String>,
}

// =============================================================================
// RMA (Return Merchandise Authorization)
// =============================================================================

/// A returned-goods record with positional items.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Rma {
    pub id: String,
    pub rma_id: String,
    pub transaction_id: Option<String>,
    pub customer_name: Option<String>,
    pub reason: String,
    pub status: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// An RMA line, addressed by its position inside the RMA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RmaItem {
    pub position: i64,
    pub product_id: String,
    pub product_name: Option<String>,
    pub quantity: i64,
    pub reason: Option<String>,
    /// URLs or storage keys of proof photos.
    pub proof_of_images: Vec<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================
