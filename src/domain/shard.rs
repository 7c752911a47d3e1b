//! Date-partitioned shard table identifiers
//!
//! Each calendar day of transactions lives in its own table, named by a fixed
//! prefix followed by the day encoded as a `YYYYMMDD` integer
//! (`transaction_20240102`).

use super::errors::TxnExportError;
use super::result::Result;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// `YYYYMMDD` layout used in shard table names
pub const SHARD_DATE_FORMAT: &str = "%Y%m%d";

/// Identifies one date-partitioned storage table
///
/// The table name is derived deterministically from the date; two different
/// dates never produce the same name and the name can be parsed back into the
/// date with [`ShardTable::parse`].
///
/// # Examples
///
/// ```
/// use txn_export::domain::ShardTable;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2022, 6, 20).unwrap();
/// let shard = ShardTable::new("transaction_", date).unwrap();
/// assert_eq!(shard.table_name(), "transaction_20220620");
/// assert_eq!(shard.date_code(), 20220620);
///
/// let parsed = ShardTable::parse("transaction_", "transaction_20220620").unwrap();
/// assert_eq!(parsed, shard);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShardTable {
    date: NaiveDate,
    table_name: String,
}

impl ShardTable {
    /// Build the shard identifier for a calendar day
    ///
    /// # Errors
    ///
    /// Returns `InvalidDate` when the year cannot be encoded in four digits.
    pub fn new(prefix: &str, date: NaiveDate) -> Result<Self> {
        if !(1..=9999).contains(&date.year()) {
            return Err(TxnExportError::InvalidDate(format!(
                "{date} is outside the shard encoding range (years 0001-9999)"
            )));
        }

        Ok(Self {
            date,
            table_name: format!("{}{}", prefix, date.format(SHARD_DATE_FORMAT)),
        })
    }

    /// Parse a catalog table name back into a shard identifier
    ///
    /// Returns `None` for names that do not follow `prefix + YYYYMMDD` or that
    /// encode an impossible date.
    pub fn parse(prefix: &str, table_name: &str) -> Option<Self> {
        let suffix = table_name.strip_prefix(prefix)?;
        if suffix.len() != 8 || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let date = NaiveDate::parse_from_str(suffix, SHARD_DATE_FORMAT).ok()?;
        Self::new(prefix, date).ok()
    }

    /// Calendar day held by this shard
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Physical table name
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The `YYYYMMDD` integer encoding of the shard date
    pub fn date_code(&self) -> u32 {
        self.date.year() as u32 * 10_000 + self.date.month() * 100 + self.date.day()
    }

    /// Schema-qualified, quoted identifier safe to splice into SQL
    pub fn qualified_name(&self, schema: &str) -> String {
        format!(
            "{}.{}",
            quote_identifier(schema),
            quote_identifier(&self.table_name)
        )
    }
}

impl fmt::Display for ShardTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table_name)
    }
}

/// Quote a SQL identifier, doubling embedded quotes
fn quote_identifier(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
