//! Delimited file sink backed by the `csv` crate

use crate::adapters::sink::traits::RowSink;
use crate::domain::{Result, TxnExportError};
use csv::{Writer, WriterBuilder};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Writes rows to a delimited text file
pub struct CsvSink {
    writer: Writer<File>,
    path: PathBuf,
}

impl CsvSink {
    /// Create (or truncate) the file at `path`
    ///
    /// Missing parent directories are created.
    pub fn create(path: impl AsRef<Path>, delimiter: u8) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                TxnExportError::Io(format!(
                    "Failed to create output directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let file = File::create(&path).map_err(|e| {
            TxnExportError::Io(format!("Failed to create {}: {e}", path.display()))
        })?;

        // Header, data and trailer rows have different widths
        let writer = WriterBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .has_headers(false)
            .from_writer(file);

        Ok(Self { writer, path })
    }

    /// Path of the file being written
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowSink for CsvSink {
    fn write_row(&mut self, fields: &[String]) -> Result<()> {
        self.writer.write_record(fields)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Discards rows, used for dry runs
#[derive(Debug, Default)]
pub struct NullSink {
    label: String,
    rows: u64,
}

impl NullSink {
    /// Create a sink that counts rows under a label
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            rows: 0,
        }
    }

    /// Rows received so far
    pub fn rows(&self) -> u64 {
        self.rows
    }
}

impl RowSink for NullSink {
    fn write_row(&mut self, _fields: &[String]) -> Result<()> {
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn location(&self) -> String {
        format!("dry-run:{}", self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_csv_sink_writes_ragged_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.csv");

        let mut sink = CsvSink::create(&path, b',').unwrap();
        sink.write_row(&row(&["HD", "TRACE", "TXN_HASH"])).unwrap();
        sink.write_row(&row(&["FT", "0", "0", "0", "0"])).unwrap();
        sink.flush().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "HD,TRACE,TXN_HASH\nFT,0,0,0,0\n");
        assert_eq!(sink.location(), path.display().to_string());
    }

    #[test]
    fn test_csv_sink_custom_delimiter() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.psv");

        let mut sink = CsvSink::create(&path, b'|').unwrap();
        sink.write_row(&row(&["CT", "a", "b"])).unwrap();
        sink.flush().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "CT|a|b\n");
    }

    #[test]
    fn test_csv_sink_quotes_fields_containing_delimiter() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");

        let mut sink = CsvSink::create(&path, b',').unwrap();
        sink.write_row(&row(&["CT", "a,b"])).unwrap();
        sink.flush().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "CT,\"a,b\"\n");
    }

    #[test]
    fn test_null_sink_counts_rows() {
        let mut sink = NullSink::new("20240102");
        sink.write_row(&row(&["HD"])).unwrap();
        sink.write_row(&row(&["FT"])).unwrap();
        assert_eq!(sink.rows(), 2);
        assert_eq!(sink.location(), "dry-run:20240102");
    }
}
