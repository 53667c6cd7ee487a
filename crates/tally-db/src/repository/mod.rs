//! # Repository Module
//!
//! Database repository implementations for Tally.
//!
//! ## Two Ways In
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Free functions: fn(conn: &mut SqliteConnection, ...)                  │
//! │  ├── Own every SQL statement                                           │
//! │  └── Composable: a workflow passes the same transaction to each        │
//! │                                                                         │
//! │       let mut tx = db.begin_write().await?;                            │
//! │       sale::insert_transaction(&mut tx, &header).await?;               │
//! │       product::adjust_stock(&mut tx, "P1", -5).await?;                 │
//! │       tx.commit().await?;                                              │
//! │                                                                         │
//! │  Repository structs: { pool }                                          │
//! │  ├── Acquire a connection and delegate to the free functions           │
//! │  └── For single-statement reads and writes                             │
//! │                                                                         │
//! │       db.products().list_low_stock().await?                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SequenceRepository`] - Business key counters
//! - [`ProductRepository`] - Products and the stock ledger
//! - [`SaleRepository`] - Sales transactions and their items
//! - [`RefundRepository`] - Refunds and refunded items
//! - [`ReplaceRepository`] - Replacements and replaced items
//! - [`RmaRepository`] - RMA records and proof-of-image items
//! - [`UserRepository`] - Cashiers
//! - [`SupplierRepository`] - Suppliers

pub mod product;
pub mod refund;
pub mod replace;
pub mod rma;
pub mod sale;
pub mod sequence;
pub mod supplier;
pub mod user;

pub use product::ProductRepository;
pub use refund::RefundRepository;
pub use replace::ReplaceRepository;
pub use rma::RmaRepository;
pub use sale::SaleRepository;
pub use sequence::SequenceRepository;
pub use supplier::SupplierRepository;
pub use user::UserRepository;

/// Generates a new internal UUID.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
