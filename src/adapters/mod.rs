//! External system integrations for txn-export.
//!
//! - [`store`] - Transaction store abstraction (trait-based)
//! - [`postgresql`] - PostgreSQL implementation of the store
//! - [`sink`] - Output sinks for exported rows
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies so the export engine can be tested
//! against in-memory implementations.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use txn_export::adapters::postgresql::{PostgreSQLClient, PostgreSQLStore};
//! use txn_export::adapters::store::TransactionStore;
//! use txn_export::config::load_config;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("txn-export.toml")?;
//! let client = PostgreSQLClient::new(&config.postgresql)?;
//! let store: Arc<dyn TransactionStore> =
//!     Arc::new(PostgreSQLStore::new(client, config.shards.schema.clone()));
//! store.ping().await?;
//! # Ok(())
//! # }
//! ```

pub mod postgresql;
pub mod sink;
pub mod store;
