//! CLI command implementations

pub mod export;
pub mod init;
pub mod list_shards;
pub mod validate;

use crate::adapters::postgresql::{PostgreSQLClient, PostgreSQLStore};
use crate::adapters::store::TransactionStore;
use crate::config::TxnExportConfig;
use crate::domain::{Result, TxnExportError};
use std::sync::Arc;

/// Exit code: success
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code: completed with non-fatal errors
pub const EXIT_PARTIAL: i32 = 1;
/// Exit code: configuration or usage error
pub const EXIT_CONFIG: i32 = 2;
/// Exit code: database unreachable
pub const EXIT_CONNECTION: i32 = 4;
/// Exit code: any other fatal error
pub const EXIT_FATAL: i32 = 5;

/// Exit code for a fatal error
pub fn exit_code_for(error: &TxnExportError) -> i32 {
    match error {
        TxnExportError::Configuration(_)
        | TxnExportError::InvalidRun(_)
        | TxnExportError::InvalidDate(_) => EXIT_CONFIG,
        TxnExportError::Connection(_) => EXIT_CONNECTION,
        _ => EXIT_FATAL,
    }
}

/// Build the PostgreSQL-backed store from configuration
pub(crate) fn connect_store(config: &TxnExportConfig) -> Result<Arc<dyn TransactionStore>> {
    let client = PostgreSQLClient::new(&config.postgresql)?;
    Ok(Arc::new(PostgreSQLStore::new(
        client,
        config.shards.schema.clone(),
    )))
}
