//! Export summary and reporting
//!
//! This module defines structures for tracking and reporting export results.

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Lifecycle phase of an export run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportPhase {
    /// Not started
    Idle,
    /// Turning the run parameters into a list of shards
    ResolvingScope,
    /// Reading shard bounds and cutting partitions
    Partitioning,
    /// Partition tasks running
    Exporting,
    /// Writing trailers and flushing destinations
    Finalizing,
    /// Finished, possibly with non-fatal errors
    Done,
    /// Aborted before any partition was attempted
    Failed,
}

impl fmt::Display for ExportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportPhase::Idle => "idle",
            ExportPhase::ResolvingScope => "resolving_scope",
            ExportPhase::Partitioning => "partitioning",
            ExportPhase::Exporting => "exporting",
            ExportPhase::Finalizing => "finalizing",
            ExportPhase::Done => "done",
            ExportPhase::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// One output destination written by a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedFile {
    /// Path, or `dry-run:<label>` for a dry run
    pub location: String,
    /// Data rows written
    pub records: u64,
    /// Sum of rescaled amounts written
    pub amount: i64,
}

/// Summary of an export operation
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    /// Run identifier, also recorded on the tracing span
    pub run_id: Uuid,

    /// Human-readable run label
    pub label: String,

    /// Final phase reached
    pub phase: ExportPhase,

    /// Data rows written across all destinations
    pub total_records: u64,

    /// Sum of rescaled amounts written across all destinations
    pub total_amount: i64,

    /// Shards covered by the run scope
    pub shards_in_scope: usize,

    /// Shards that had at least one partition dispatched
    pub shards_exported: usize,

    /// Shards skipped as empty, missing or with undeterminable bounds
    pub shards_skipped: usize,

    /// Partition tasks dispatched
    pub partitions_dispatched: usize,

    /// Partition tasks that contributed nothing because of a failure
    pub partitions_failed: usize,

    /// Rows that failed to write and were skipped
    pub rows_failed: u64,

    /// Output destinations
    pub files: Vec<ExportedFile>,

    /// Duration of the export
    #[serde(with = "duration_millis")]
    pub duration: Duration,

    /// Non-fatal errors encountered during export
    pub errors: Vec<ExportError>,
}

impl ExportSummary {
    /// Create a new empty export summary
    pub fn new(run_id: Uuid, label: impl Into<String>) -> Self {
        Self {
            run_id,
            label: label.into(),
            phase: ExportPhase::Idle,
            total_records: 0,
            total_amount: 0,
            shards_in_scope: 0,
            shards_exported: 0,
            shards_skipped: 0,
            partitions_dispatched: 0,
            partitions_failed: 0,
            rows_failed: 0,
            files: Vec::new(),
            duration: Duration::from_secs(0),
            errors: Vec::new(),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Add an error
    pub fn add_error(&mut self, error: ExportError) {
        self.errors.push(error);
    }

    /// Check if the export was successful (no non-fatal errors)
    pub fn is_successful(&self) -> bool {
        self.phase == ExportPhase::Done && self.errors.is_empty()
    }

    /// The `(total_records, total_amount, non_fatal_errors)` triple
    pub fn outcome(&self) -> (u64, i64, &[ExportError]) {
        (self.total_records, self.total_amount, &self.errors)
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            label = %self.label,
            phase = %self.phase,
            total_records = self.total_records,
            total_amount = self.total_amount,
            shards_in_scope = self.shards_in_scope,
            shards_exported = self.shards_exported,
            shards_skipped = self.shards_skipped,
            partitions = self.partitions_dispatched,
            partitions_failed = self.partitions_failed,
            rows_failed = self.rows_failed,
            files = self.files.len(),
            duration_ms = self.duration.as_millis() as u64,
            "Export completed"
        );

        if !self.errors.is_empty() {
            tracing::warn!(
                error_count = self.errors.len(),
                "Export completed with errors"
            );
            for error in &self.errors {
                tracing::warn!(
                    error_type = ?error.error_type,
                    message = %error.message,
                    context = ?error.context,
                    "Export error"
                );
            }
        }
    }
}

/// Type of export error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportErrorType {
    /// Partition range query failed
    Query,
    /// Shard bounds could not be determined
    Bounds,
    /// Rows failed to write
    Write,
    /// Destination could not be opened, finalised or flushed
    Storage,
    /// Partition task panicked or was aborted
    Task,
}

/// Export error with context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportError {
    /// Type of error
    pub error_type: ExportErrorType,

    /// Error message
    pub message: String,

    /// Optional context (shard, range)
    pub context: Option<String>,
}

impl ExportError {
    /// Create a new export error
    pub fn new(error_type: ExportErrorType, message: String) -> Self {
        Self {
            error_type,
            message,
            context: None,
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: String) -> Self {
        self.context = Some(context);
        self
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(context) => write!(f, "{:?}: {} ({context})", self.error_type, self.message),
            None => write!(f, "{:?}: {}", self.error_type, self.message),
        }
    }
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}
