//! Storage abstraction traits
//!
//! The export engine never talks SQL directly. It consumes a
//! table-scoped range query, a sequence bounds lookup and a catalog listing
//! through [`TransactionStore`], so any backend that can answer those three
//! questions can be exported from.

use crate::core::partition::BlockRange;
use crate::domain::{Result, ShardTable, TransactionRecord};
use async_trait::async_trait;
use chrono::NaiveDateTime;

/// Sequence number column used for partitioning and ordering
pub const SEQUENCE_COLUMN: &str = "block_num";

/// Event timestamp column used for time windows and secondary ordering
pub const TIMESTAMP_COLUMN: &str = "system_date";

/// Column projection every record query must return, in this order
pub const RECORD_COLUMNS: [&str; 8] = [
    SEQUENCE_COLUMN,
    "txhash",
    "trace_no",
    "action",
    "amount",
    "sender_id",
    "receiver_id",
    TIMESTAMP_COLUMN,
];

/// Minimum and maximum sequence number present in a shard (both inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceBounds {
    /// Smallest sequence number
    pub low: i64,
    /// Largest sequence number
    pub high: i64,
}

/// Optional event-time filter applied on top of the sequence range
///
/// `start` is inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeWindow {
    /// Keep records at or after this instant
    pub start: Option<NaiveDateTime>,
    /// Keep records strictly before this instant
    pub end: Option<NaiveDateTime>,
}

impl TimeWindow {
    /// A window that keeps every record
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Whether the window filters anything
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Whether a timestamp falls inside the window
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start.map_or(true, |start| at >= start) && self.end.map_or(true, |end| at < end)
    }
}

/// One bounded range query against one shard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeQuery {
    /// Shard to read
    pub shard: ShardTable,
    /// Sequence range; its `inclusive_end` flag selects `<=` over `<`
    pub range: BlockRange,
    /// Event-time filter
    pub window: TimeWindow,
}

impl RangeQuery {
    /// Build a query for a shard partition
    pub fn new(shard: ShardTable, range: BlockRange, window: TimeWindow) -> Self {
        Self {
            shard,
            range,
            window,
        }
    }

    /// Projection requested from the store
    pub fn columns(&self) -> &'static [&'static str] {
        &RECORD_COLUMNS
    }
}

/// Records returned by a range query
///
/// `skipped` counts rows the store returned but could not map onto a
/// [`TransactionRecord`]; they are not in `records`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedRange {
    /// Mapped records in query order
    pub records: Vec<TransactionRecord>,
    /// Rows dropped because they could not be read
    pub skipped: u64,
}

/// Read-only access to the sharded transaction store
///
/// Implementations must be safe to share between concurrently running
/// partition tasks and must never mutate shard data.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Check that the store is reachable
    ///
    /// # Errors
    ///
    /// Returns a `Connection` error when no connection can be established.
    async fn ping(&self) -> Result<()>;

    /// List table names in the shard schema that start with `prefix`
    ///
    /// # Errors
    ///
    /// Returns `CatalogUnavailable` when the catalog query fails.
    async fn list_shard_tables(&self, prefix: &str) -> Result<Vec<String>>;

    /// Read the sequence bounds of a shard
    ///
    /// Returns `Ok(None)` for an empty shard or a shard table that does not
    /// exist yet.
    async fn sequence_bounds(&self, shard: &ShardTable) -> Result<Option<SequenceBounds>>;

    /// Execute a bounded range query
    ///
    /// Records come back ordered by sequence number, then timestamp, ascending.
    /// Unreadable rows are counted in [`FetchedRange::skipped`] instead of
    /// failing the query.
    async fn fetch_range(&self, query: &RangeQuery) -> Result<FetchedRange>;

    /// Human-readable description of the backend for logs
    fn describe(&self) -> String;
}
