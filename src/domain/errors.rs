//! Domain error types
//!
//! This module defines the error hierarchy for txn-export.
//! Errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main txn-export error type
///
/// Every fallible operation in the crate returns this type. Variants that
/// abort a run (catalog, connection, invalid run parameters) are distinguished
/// from the ones the coordinator downgrades to non-fatal summary entries.
#[derive(Debug, Error)]
pub enum TxnExportError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Database query errors
    #[error("Database error: {0}")]
    Database(String),

    /// Network/connection errors (pool exhausted, server unreachable)
    #[error("Connection error: {0}")]
    Connection(String),

    /// The storage catalog could not be queried
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// Sequence bounds of a shard are inverted or missing
    #[error("Invalid bounds: low {low} is greater than high {high}")]
    InvalidBounds { low: i64, high: i64 },

    /// Invalid export run parameters
    #[error("Invalid export run: {0}")]
    InvalidRun(String),

    /// Date outside the shard encoding or unparsable date input
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Output sink errors
    #[error("Sink error: {0}")]
    Sink(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for TxnExportError {
    fn from(err: std::io::Error) -> Self {
        TxnExportError::Io(err.to_string())
    }
}

// Conversion from csv::Error
impl From<csv::Error> for TxnExportError {
    fn from(err: csv::Error) -> Self {
        TxnExportError::Sink(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for TxnExportError {
    fn from(err: serde_json::Error) -> Self {
        TxnExportError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for TxnExportError {
    fn from(err: toml::de::Error) -> Self {
        TxnExportError::Configuration(format!("TOML parse error: {err}"))
    }
}
