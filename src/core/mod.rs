//! Core business logic for txn-export.
//!
//! # Modules
//!
//! - [`shard`] - Date to shard table resolution and catalog discovery
//! - [`partition`] - Splitting a shard's block range into chunks
//! - [`fetch`] - Bounded range queries per partition
//! - [`export`] - Counters, writer, run parameters and orchestration
//!
//! # Export Workflow
//!
//! 1. **Resolve scope**: a day, a date-time window or the whole catalog
//! 2. **Partition**: read each shard's block bounds and cut fixed-size ranges
//! 3. **Export**: one task per partition fetches, renders and appends rows
//! 4. **Finalize**: after every task has joined, write trailers and flush
//! 5. **Report**: return the [`export::ExportSummary`]
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use txn_export::adapters::postgresql::{PostgreSQLClient, PostgreSQLStore};
//! use txn_export::config::load_config;
//! use txn_export::core::export::{ExportCoordinator, ExportRun};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("txn-export.toml")?;
//! let client = PostgreSQLClient::new(&config.postgresql)?;
//! let store = Arc::new(PostgreSQLStore::new(client, config.shards.schema.clone()));
//!
//! let run = ExportRun::single_date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), &config.export);
//! let coordinator = ExportCoordinator::new(config, store);
//! let summary = coordinator.run_export(&run).await?;
//!
//! println!("Records: {}", summary.total_records);
//! println!("Amount: {}", summary.total_amount);
//! println!("Errors: {}", summary.errors.len());
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod fetch;
pub mod partition;
pub mod shard;
