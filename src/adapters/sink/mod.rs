//! Output sinks for exported rows

pub mod csv;
pub mod traits;

pub use self::csv::{CsvSink, NullSink};
pub use traits::RowSink;
