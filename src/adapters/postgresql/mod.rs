//! PostgreSQL database integration
//!
//! This module provides read access to day-sharded transaction tables
//! stored in PostgreSQL.

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgreSQLStore;
pub use client::PostgreSQLClient;
pub use models::RangeStatement;
