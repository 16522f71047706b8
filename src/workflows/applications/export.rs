use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use super::domain::ApplicationRecord;

/// Flat record handed to spreadsheet exporters. Column order is fixed so
/// repeated exports diff cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    pub company: String,
    pub title: String,
    pub status: String,
    pub last_updated: String,
}

impl ExportRow {
    pub fn from_record(record: &ApplicationRecord) -> Self {
        Self {
            company: record.key.display_company.clone(),
            title: record.key.display_title.clone(),
            status: record.status.label().to_string(),
            last_updated: record
                .updated_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Export failures raised by sinks.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to serialize export rows")]
    Csv(#[from] csv::Error),
    #[error("failed to write export output")]
    Io(#[from] std::io::Error),
}

/// Outbound sink for export snapshots (spreadsheet sync, test doubles).
pub trait ExportSink: Send + Sync {
    fn publish(&self, rows: &[ExportRow]) -> Result<(), ExportError>;
}

/// Serialize rows as CSV with headers into any writer.
pub fn write_csv<W: Write>(rows: &[ExportRow], writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// CSV file sink used by the CLI export path.
pub struct CsvFileSink {
    path: PathBuf,
}

impl CsvFileSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ExportSink for CsvFileSink {
    fn publish(&self, rows: &[ExportRow]) -> Result<(), ExportError> {
        let file = File::create(&self.path)?;
        write_csv(rows, file)
    }
}
