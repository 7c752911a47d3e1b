//! Result type alias for txn-export

use super::errors::TxnExportError;

/// Result type alias for txn-export operations
///
/// # Examples
///
/// ```
/// use txn_export::domain::result::Result;
/// use txn_export::domain::errors::TxnExportError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(TxnExportError::InvalidRun("from is after to".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, TxnExportError>;
