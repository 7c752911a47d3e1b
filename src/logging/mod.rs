//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Configurable log levels, overridable through `RUST_LOG`
//! - Local JSON file logging with daily or hourly rotation
//!
//! # Example
//!
//! ```no_run
//! use txn_export::logging::init_logging;
//! use txn_export::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(shard = "transaction_20240102", "Exporting shard");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of a partition task
///
/// # Example
///
/// ```no_run
/// use txn_export::log_partition_start;
///
/// log_partition_start!("transaction_20240102", "[0, 10000)");
/// ```
#[macro_export]
macro_rules! log_partition_start {
    ($shard:expr, $range:expr) => {
        tracing::debug!(
            shard = %$shard,
            range = %$range,
            "Starting partition"
        );
    };
}

/// Log the completion of a partition task
///
/// # Example
///
/// ```no_run
/// use txn_export::log_partition_complete;
/// use std::time::Duration;
///
/// log_partition_complete!("transaction_20240102", "[0, 10000)", 42, Duration::from_millis(85));
/// ```
#[macro_export]
macro_rules! log_partition_complete {
    ($shard:expr, $range:expr, $records:expr, $duration:expr) => {
        tracing::debug!(
            shard = %$shard,
            range = %$range,
            records = $records,
            duration_ms = $duration.as_millis() as u64,
            "Partition completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use txn_export::log_error_with_context;
/// use txn_export::domain::TxnExportError;
///
/// let error = TxnExportError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
