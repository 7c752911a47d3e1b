//! Shard resolution
//!
//! Maps calendar days onto shard tables and discovers the shards that exist
//! for full-history scans.

use crate::adapters::store::TransactionStore;
use crate::config::ShardConfig;
use crate::domain::{Result, ShardTable, TxnExportError};
use chrono::NaiveDate;

/// Resolves dates and date ranges into shard tables
#[derive(Debug, Clone)]
pub struct ShardResolver {
    prefix: String,
    history_start: NaiveDate,
}

impl ShardResolver {
    /// Create a resolver for a table prefix
    pub fn new(prefix: impl Into<String>, history_start: NaiveDate) -> Self {
        Self {
            prefix: prefix.into(),
            history_start,
        }
    }

    /// Create a resolver from the `[shards]` configuration section
    pub fn from_config(config: &ShardConfig) -> Self {
        Self::new(config.table_prefix.clone(), config.history_start)
    }

    /// Table name prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// First day considered part of the history
    pub fn history_start(&self) -> NaiveDate {
        self.history_start
    }

    /// Shard table holding a given day
    ///
    /// # Errors
    ///
    /// Returns `InvalidDate` when the date cannot be encoded.
    pub fn resolve_shard(&self, date: NaiveDate) -> Result<ShardTable> {
        ShardTable::new(&self.prefix, date)
    }

    /// Every shard from `from` to `to`, both inclusive, in date order
    ///
    /// # Errors
    ///
    /// Returns `InvalidRun` when `from` is after `to`.
    pub fn shards_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<ShardTable>> {
        if from > to {
            return Err(TxnExportError::InvalidRun(format!(
                "start date {from} is after end date {to}"
            )));
        }

        from.iter_days()
            .take_while(|day| *day <= to)
            .map(|day| self.resolve_shard(day))
            .collect()
    }

    /// Discover every shard present in the store
    ///
    /// Names that do not decode to a date and shards dated before
    /// `history_start` are ignored. An empty catalog is not an error.
    ///
    /// # Errors
    ///
    /// Returns `CatalogUnavailable` when the catalog cannot be queried.
    pub async fn list_all_shards(&self, store: &dyn TransactionStore) -> Result<Vec<ShardTable>> {
        let names = store.list_shard_tables(&self.prefix).await.map_err(|e| match e {
            TxnExportError::CatalogUnavailable(_) => e,
            other => TxnExportError::CatalogUnavailable(other.to_string()),
        })?;

        let mut shards: Vec<ShardTable> = names
            .iter()
            .filter_map(|name| {
                let shard = ShardTable::parse(&self.prefix, name);
                if shard.is_none() {
                    tracing::debug!(table = %name, "Ignoring table that is not a shard");
                }
                shard
            })
            .filter(|shard| shard.date() >= self.history_start)
            .collect();

        shards.sort();
        shards.dedup();

        tracing::debug!(
            prefix = %self.prefix,
            discovered = shards.len(),
            "Listed shard tables"
        );

        Ok(shards)
    }
}
