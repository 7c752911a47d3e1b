//! Record fetching
//!
//! One bounded range query per (shard, partition). A failed query comes back
//! as a non-fatal [`ExportError`] and the partition contributes nothing.

use crate::adapters::store::{FetchedRange, RangeQuery, TimeWindow, TransactionStore};
use crate::core::export::summary::{ExportError, ExportErrorType};
use crate::core::partition::BlockRange;
use crate::domain::ShardTable;
use std::sync::Arc;

/// Fetches the records of one partition
#[derive(Clone)]
pub struct RecordFetcher {
    store: Arc<dyn TransactionStore>,
}

impl RecordFetcher {
    /// Create a fetcher over a shared store
    pub fn new(store: Arc<dyn TransactionStore>) -> Self {
        Self { store }
    }

    /// Fetch the records of `range` in `shard`
    ///
    /// The upper bound is inclusive when `range.inclusive_end` is set (the last
    /// partition of a shard). Records are ordered by sequence number, then
    /// timestamp. Rows the store could not read are reported in
    /// [`FetchedRange::skipped`].
    pub async fn fetch(
        &self,
        shard: &ShardTable,
        range: BlockRange,
        window: TimeWindow,
    ) -> std::result::Result<FetchedRange, ExportError> {
        let query = RangeQuery::new(shard.clone(), range, window);

        match self.store.fetch_range(&query).await {
            Ok(fetched) => Ok(fetched),
            Err(e) => {
                tracing::error!(
                    shard = %shard,
                    range = %range,
                    error = %e,
                    "Partition fetch failed"
                );
                Err(ExportError::new(
                    ExportErrorType::Query,
                    format!("Failed to fetch partition: {e}"),
                )
                .with_context(format!("shard={shard} range={range}")))
            }
        }
    }
}

impl std::fmt::Debug for RecordFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordFetcher")
            .field("store", &self.store.describe())
            .finish()
    }
}
