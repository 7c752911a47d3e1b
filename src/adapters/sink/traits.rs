//! Row sink abstraction
//!
//! The export writer renders rows as string fields; a sink decides where they
//! go. Rows arrive one at a time and in a single order per destination.

use crate::domain::Result;

/// Destination for delimited rows
pub trait RowSink: Send {
    /// Append one row
    ///
    /// # Errors
    ///
    /// Returns a `Sink` or `Io` error when the row cannot be written.
    fn write_row(&mut self, fields: &[String]) -> Result<()>;

    /// Flush buffered rows to the underlying medium
    fn flush(&mut self) -> Result<()>;

    /// Location for logs and summaries
    fn location(&self) -> String;
}
