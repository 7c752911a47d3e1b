//! SQL text and row mapping for shard tables
//!
//! Shard tables carry more columns than an export needs; only the projection
//! in [`RECORD_COLUMNS`] is selected. Numeric columns are cast to `bigint` and
//! the timestamp to `timestamp` so `int4`/`timestamptz` schemas map the same way.

use crate::adapters::store::{RangeQuery, RECORD_COLUMNS, SEQUENCE_COLUMN, TIMESTAMP_COLUMN};
use crate::domain::{ActionKind, Result, ShardTable, TransactionRecord, TxnExportError};
use chrono::NaiveDateTime;
use tokio_postgres::Row;

/// SQL and positional parameters for one range query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeStatement {
    /// Statement text with `$n` placeholders
    pub sql: String,
    /// Sequence lower bound ($1)
    pub from: i64,
    /// Sequence upper bound ($2)
    pub to: i64,
    /// Optional time bounds, in placeholder order
    pub time_params: Vec<NaiveDateTime>,
}

/// Projection with the casts applied
fn select_list() -> String {
    RECORD_COLUMNS
        .iter()
        .map(|column| match *column {
            c if c == SEQUENCE_COLUMN || c == "amount" => format!("{c}::bigint AS {c}"),
            c if c == TIMESTAMP_COLUMN => format!("{c}::timestamp AS {c}"),
            c => c.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the bounded range statement for a query
pub fn range_statement(schema: &str, query: &RangeQuery) -> RangeStatement {
    let upper = if query.range.inclusive_end { "<=" } else { "<" };
    let mut sql = format!(
        "SELECT {} FROM {} WHERE {seq} >= $1::bigint AND {seq} {upper} $2::bigint",
        select_list(),
        query.shard.qualified_name(schema),
        seq = SEQUENCE_COLUMN,
    );

    let mut time_params = Vec::new();
    if let Some(start) = query.window.start {
        time_params.push(start);
        sql.push_str(&format!(
            " AND {TIMESTAMP_COLUMN} >= ${}::timestamp",
            time_params.len() + 2
        ));
    }
    if let Some(end) = query.window.end {
        time_params.push(end);
        sql.push_str(&format!(
            " AND {TIMESTAMP_COLUMN} < ${}::timestamp",
            time_params.len() + 2
        ));
    }

    sql.push_str(&format!(
        " ORDER BY {SEQUENCE_COLUMN} ASC, {TIMESTAMP_COLUMN} ASC"
    ));

    RangeStatement {
        sql,
        from: query.range.from,
        to: query.range.to,
        time_params,
    }
}

/// Build the MIN/MAX sequence statement for a shard
pub fn bounds_statement(schema: &str, shard: &ShardTable) -> String {
    format!(
        "SELECT MIN({SEQUENCE_COLUMN})::bigint, MAX({SEQUENCE_COLUMN})::bigint FROM {}",
        shard.qualified_name(schema)
    )
}

/// Catalog statement listing tables of a schema by name pattern ($1 schema, $2 pattern)
pub const CATALOG_STATEMENT: &str = "SELECT table_name::text FROM information_schema.tables \
     WHERE table_schema = $1 AND table_name LIKE $2 ESCAPE '\\' ORDER BY table_name";

/// LIKE pattern matching every table that starts with `prefix`
pub fn like_prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '\\' | '_' | '%') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Map one result row onto a [`TransactionRecord`]
///
/// # Errors
///
/// Returns a `Serialization` error naming the offending column.
pub fn record_from_row(row: &Row) -> Result<TransactionRecord> {
    Ok(TransactionRecord {
        block_num: column(row, SEQUENCE_COLUMN)?,
        tx_hash: text_column(row, "txhash")?,
        trace_no: text_column(row, "trace_no")?,
        action: ActionKind::from_source(&text_column(row, "action")?),
        amount: column(row, "amount")?,
        sender_id: text_column(row, "sender_id")?,
        receiver_id: text_column(row, "receiver_id")?,
        system_date: column(row, TIMESTAMP_COLUMN)?,
    })
}

fn column<'a, T: tokio_postgres::types::FromSql<'a>>(row: &'a Row, name: &str) -> Result<T> {
    row.try_get(name).map_err(|e| {
        TxnExportError::Serialization(format!("Failed to read column '{name}': {e}"))
    })
}

/// Text columns are nullable in older shards; NULL maps to an empty field
fn text_column(row: &Row, name: &str) -> Result<String> {
    Ok(column::<Option<String>>(row, name)?.unwrap_or_default())
}
