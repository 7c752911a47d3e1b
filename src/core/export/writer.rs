//! Export writer
//!
//! Renders the header, data and trailer rows and appends them to a sink.
//! Every write goes through one lock, so partition tasks sharing a
//! destination never interleave fields of different rows.

use crate::adapters::sink::RowSink;
use crate::config::AmountScale;
use crate::domain::{Result, TransactionRecord};
use tokio::sync::Mutex;

/// Column titles of the header row
pub const HEADER_FIELDS: [&str; 9] = [
    "HD",
    "TRACE",
    "TXN_HASH",
    "FROM",
    "TO",
    "TRANSTYPE",
    "AMOUNT",
    "STATUS",
    "TXN_TIME",
];

/// Tag of data rows
pub const RECORD_TAG: &str = "CT";

/// Tag of the trailer row
pub const TRAILER_TAG: &str = "FT";

/// Status written for every exported transaction
pub const SUCCESS_STATUS: &str = "00";

/// Timestamp layout of the TXN_TIME column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Serialised writer over one output destination
pub struct ExportWriter {
    sink: Mutex<Box<dyn RowSink>>,
    amount_scale: AmountScale,
    location: String,
}

impl ExportWriter {
    /// Wrap a sink
    pub fn new(sink: Box<dyn RowSink>, amount_scale: AmountScale) -> Self {
        let location = sink.location();
        Self {
            sink: Mutex::new(sink),
            amount_scale,
            location,
        }
    }

    /// Where the rows go
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Write the header row
    pub async fn write_header(&self) -> Result<()> {
        let fields: Vec<String> = HEADER_FIELDS.iter().map(|f| f.to_string()).collect();
        self.sink.lock().await.write_row(&fields)
    }

    /// Write one data row and return the rescaled amount that was written
    ///
    /// # Errors
    ///
    /// A failed write leaves nothing counted; the caller skips the record.
    pub async fn write_record(&self, record: &TransactionRecord) -> Result<i64> {
        let (fields, amount) = format_record(record, self.amount_scale);
        self.sink.lock().await.write_row(&fields)?;
        Ok(amount)
    }

    /// Write the trailer row from the final totals
    pub async fn write_trailer(&self, record_count: u64, amount_sum: i64) -> Result<()> {
        self.sink.lock().await.write_row(&trailer_fields(record_count, amount_sum))
    }

    /// Flush buffered rows
    pub async fn flush(&self) -> Result<()> {
        self.sink.lock().await.flush()
    }
}

impl std::fmt::Debug for ExportWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportWriter")
            .field("location", &self.location)
            .field("amount_scale", &self.amount_scale)
            .finish()
    }
}

/// Render a record as data row fields, together with its rescaled amount
pub fn format_record(record: &TransactionRecord, scale: AmountScale) -> (Vec<String>, i64) {
    let amount = scale.apply(record.amount);
    let fields = vec![
        RECORD_TAG.to_string(),
        record.trace_no.clone(),
        record.tx_hash.clone(),
        record.sender_id.to_lowercase(),
        record.receiver_id.to_lowercase(),
        record.action.output_code().to_string(),
        amount.to_string(),
        SUCCESS_STATUS.to_string(),
        record.system_date.format(TIMESTAMP_FORMAT).to_string(),
    ];
    (fields, amount)
}

/// Render the trailer row
pub fn trailer_fields(record_count: u64, amount_sum: i64) -> Vec<String> {
    vec![
        TRAILER_TAG.to_string(),
        record_count.to_string(),
        record_count.to_string(),
        "0".to_string(),
        amount_sum.to_string(),
    ]
}
