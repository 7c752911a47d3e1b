//! Domain models and types for txn-export.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Shard identifiers** ([`ShardTable`]) derived from calendar dates
//! - **Transaction records** ([`TransactionRecord`], [`ActionKind`])
//! - **Error types** ([`TxnExportError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, TxnExportError>`]:
//!
//! ```rust
//! use txn_export::domain::{Result, ShardTable};
//! use chrono::NaiveDate;
//!
//! fn example() -> Result<ShardTable> {
//!     let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
//!     ShardTable::new("transaction_", date)
//! }
//! ```

pub mod errors;
pub mod record;
pub mod result;
pub mod shard;

// Re-export commonly used types for convenience
pub use errors::TxnExportError;
pub use record::{map_action, ActionKind, TransactionRecord};
pub use result::Result;
pub use shard::ShardTable;
