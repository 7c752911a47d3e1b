//! Storage abstraction layer
//!
//! Trait-based access to the sharded transaction store so the export engine
//! can run against PostgreSQL or an in-memory fake in tests.

pub mod traits;

pub use traits::{
    FetchedRange, RangeQuery, SequenceBounds, TimeWindow, TransactionStore, RECORD_COLUMNS, SEQUENCE_COLUMN,
    TIMESTAMP_COLUMN,
};
