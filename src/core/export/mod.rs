//! Export orchestration
//!
//! This module provides the core export logic for txn-export, including:
//! - Run parameters and labels
//! - Shared running totals
//! - Row rendering and serialised writes
//! - Export coordination and summary reporting

pub mod coordinator;
pub mod counters;
pub mod run;
pub mod summary;
pub mod writer;

pub use coordinator::{ExportCoordinator, ShardWork};
pub use counters::AggregateCounters;
pub use run::{parse_date, parse_datetime, ExportRun, RunScope};
pub use summary::{ExportError, ExportErrorType, ExportPhase, ExportSummary, ExportedFile};
pub use writer::{format_record, trailer_fields, ExportWriter, HEADER_FIELDS};
