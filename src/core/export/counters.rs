//! Running export totals
//!
//! Count and amount are guarded by separate locks so a worker folding its
//! partial count never waits on another worker folding an amount. Totals are
//! only meaningful once every worker has been joined.

use tokio::sync::Mutex;

/// Record count and amount sum shared between partition tasks
#[derive(Debug, Default)]
pub struct AggregateCounters {
    record_count: Mutex<u64>,
    amount_sum: Mutex<i64>,
}

impl AggregateCounters {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Add to the record count
    pub async fn increment_count(&self, by: u64) {
        *self.record_count.lock().await += by;
    }

    /// Add to the amount sum
    pub async fn increment_amount(&self, by: i64) {
        *self.amount_sum.lock().await += by;
    }

    /// Fold a partition's partial totals in
    pub async fn add(&self, records: u64, amount: i64) {
        self.increment_count(records).await;
        self.increment_amount(amount).await;
    }

    /// Current record count
    pub async fn record_count(&self) -> u64 {
        *self.record_count.lock().await
    }

    /// Current amount sum
    pub async fn amount_sum(&self) -> i64 {
        *self.amount_sum.lock().await
    }

    /// Both totals
    pub async fn snapshot(&self) -> (u64, i64) {
        (self.record_count().await, self.amount_sum().await)
    }
}
