// txn-export - Sharded transaction exporter
// Copyright (c) 2025 txn-export Contributors
// Licensed under the MIT License

//! # txn-export - Sharded transaction exporter
//!
//! txn-export reads financial transactions from a PostgreSQL database that
//! keeps one table per calendar day and writes them to delimited files, for a
//! single day, a date-time window, or the whole history.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Resolving** days and date ranges into shard tables (`transaction_YYYYMMDD`)
//! - **Partitioning** each shard's block number range into fixed-size chunks
//! - **Fetching** partitions concurrently with bounded parallelism
//! - **Writing** header, data and trailer rows while keeping exact running totals
//!
//! ## Architecture
//!
//! txn-export follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (shard resolution, partitioning, export)
//! - [`adapters`] - External integrations (PostgreSQL, output files)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use txn_export::adapters::postgresql::{PostgreSQLClient, PostgreSQLStore};
//! use txn_export::config::load_config;
//! use txn_export::core::export::{ExportCoordinator, ExportRun};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("txn-export.toml")?;
//!     let client = PostgreSQLClient::new(&config.postgresql)?;
//!     let store = Arc::new(PostgreSQLStore::new(client, config.shards.schema.clone()));
//!
//!     let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
//!     let run = ExportRun::single_date(day, &config.export);
//!     let summary = ExportCoordinator::new(config, store).run_export(&run).await?;
//!
//!     println!("Exported {} transactions", summary.total_records);
//!     Ok(())
//! }
//! ```
//!
//! ## Output Format
//!
//! Every destination starts with a header row and ends with a trailer row
//! carrying the record count and amount sum of the rows it holds:
//!
//! ```text
//! HD,TRACE,TXN_HASH,FROM,TO,TRANSTYPE,AMOUNT,STATUS,TXN_TIME
//! CT,T-1,0xabc,alice,bob,mint,123,00,2024-01-02 03:04:05
//! FT,1,1,0,123
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::Result`]. Failures of a single
//! shard, partition or row are collected as non-fatal errors on the
//! [`core::export::ExportSummary`]; only unusable run parameters and an
//! unreachable database or catalog fail a run.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
