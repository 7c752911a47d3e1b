//! Export run parameters
//!
//! An [`ExportRun`] says which days to export and where the rows go. It is
//! built from the `[export]` section plus a [`RunScope`] chosen on the command
//! line or by a scheduler.

use crate::config::{ExportConfig, OutputLayout};
use crate::domain::{Result, TxnExportError};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::path::PathBuf;

/// Compact date-time layout used in labels and accepted on the command line
pub const COMPACT_DATETIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Compact date layout used in labels and accepted on the command line
pub const COMPACT_DATE_FORMAT: &str = "%Y%m%d";

/// Which part of the history a run covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RunScope {
    /// One whole day
    SingleDate {
        /// Day to export
        date: NaiveDate,
    },
    /// Every record with `from <= timestamp < to`
    Range {
        /// Inclusive start
        from: NaiveDateTime,
        /// Exclusive end
        to: NaiveDateTime,
    },
    /// Every shard in the catalog, optionally up to and including `until`
    FromBeginning {
        /// Last day to include
        until: Option<NaiveDate>,
    },
}

/// A single export invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRun {
    /// Days covered
    pub scope: RunScope,
    /// Block numbers per partition
    pub partition_size: i64,
    /// Directory receiving the output files
    pub output_dir: PathBuf,
    /// File name prefix
    pub file_prefix: String,
    /// File extension, without the dot
    pub file_extension: String,
    /// Destination layout
    pub layout: OutputLayout,
    /// Count and sum without writing files
    pub dry_run: bool,
}

impl ExportRun {
    /// Build a run for a scope using the `[export]` settings
    pub fn new(scope: RunScope, config: &ExportConfig) -> Self {
        Self {
            scope,
            partition_size: config.partition_size,
            output_dir: PathBuf::from(&config.output_dir),
            file_prefix: config.file_prefix.clone(),
            file_extension: config.file_extension.clone(),
            layout: config.layout,
            dry_run: config.dry_run,
        }
    }

    /// Export one whole day
    pub fn single_date(date: NaiveDate, config: &ExportConfig) -> Self {
        Self::new(RunScope::SingleDate { date }, config)
    }

    /// Export a date-time window
    pub fn range(from: NaiveDateTime, to: NaiveDateTime, config: &ExportConfig) -> Self {
        Self::new(RunScope::Range { from, to }, config)
    }

    /// Export the whole history
    pub fn from_beginning(until: Option<NaiveDate>, config: &ExportConfig) -> Self {
        Self::new(RunScope::FromBeginning { until }, config)
    }

    /// Daily job: export the day before `today`
    pub fn previous_day(today: NaiveDate, config: &ExportConfig) -> Result<Self> {
        let date = today
            .pred_opt()
            .ok_or_else(|| TxnExportError::InvalidDate(format!("no day before {today}")))?;
        Ok(Self::single_date(date, config))
    }

    /// Reject parameters that cannot describe a run
    ///
    /// # Errors
    ///
    /// Returns `InvalidRun` for a start after the end or a non-positive
    /// partition size.
    pub fn validate(&self) -> Result<()> {
        if let RunScope::Range { from, to } = self.scope {
            if from > to {
                return Err(TxnExportError::InvalidRun(format!(
                    "start {from} is after end {to}"
                )));
            }
        }
        if self.partition_size <= 0 {
            return Err(TxnExportError::InvalidRun(format!(
                "partition size must be positive, got {}",
                self.partition_size
            )));
        }
        if self.file_extension.is_empty() {
            return Err(TxnExportError::InvalidRun(
                "file extension cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Label naming the run and its single-layout file
    pub fn label(&self) -> String {
        match self.scope {
            RunScope::SingleDate { date } => date.format(COMPACT_DATE_FORMAT).to_string(),
            RunScope::Range { from, to } => format!(
                "{}_to_{}",
                from.format(COMPACT_DATETIME_FORMAT),
                to.format(COMPACT_DATETIME_FORMAT)
            ),
            RunScope::FromBeginning { until: Some(until) } => {
                format!("all_to_{}", until.format(COMPACT_DATE_FORMAT))
            }
            RunScope::FromBeginning { until: None } => "all".to_string(),
        }
    }

    /// Output path for a destination label
    pub fn file_path(&self, label: &str) -> PathBuf {
        self.output_dir.join(format!(
            "{}_{}.{}",
            self.file_prefix, label, self.file_extension
        ))
    }
}

/// Parse a `--date` value: `YYYYMMDD` or `YYYY-MM-DD`
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, COMPACT_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .map_err(|_| {
            TxnExportError::InvalidDate(format!(
                "'{value}' is not a date (expected YYYYMMDD or YYYY-MM-DD)"
            ))
        })
}

/// Parse a `--from`/`--to` value
///
/// Accepts `YYYYMMDDHHMMSS`, `YYYY-MM-DD HH:MM:SS`, or a bare date meaning
/// midnight.
pub fn parse_datetime(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, COMPACT_DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| {
            parse_date(value).map(|date| date.and_time(NaiveTime::MIN))
        })
        .map_err(|_| {
            TxnExportError::InvalidDate(format!(
                "'{value}' is not a date-time (expected YYYYMMDDHHMMSS or YYYY-MM-DD HH:MM:SS)"
            ))
        })
}
