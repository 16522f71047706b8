//! Mailbox-dump importer feeding the ingestion pipeline.
//!
//! The external mail collaborator is expected to hand over fully-formed rows;
//! this module only parses the CSV shape, it never fetches or authenticates.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::workflows::applications::InboundEmail;

#[derive(Debug, thiserror::Error)]
pub enum MailboxImportError {
    #[error("failed to read mailbox dump: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid mailbox CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row} has unparseable timestamp '{value}'")]
    InvalidTimestamp { row: usize, value: String },
}

#[derive(Debug, Deserialize)]
struct MailboxRow {
    #[serde(rename = "Company")]
    company: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Subject", default)]
    subject: String,
    #[serde(rename = "Body", default)]
    body: String,
    #[serde(rename = "Sender", default)]
    sender: String,
    #[serde(rename = "Received At")]
    received_at: String,
}

fn parse_received_at(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&dt));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt));
    }

    None
}

pub struct MailboxImporter;

impl MailboxImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<InboundEmail>, MailboxImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<InboundEmail>, MailboxImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut emails = Vec::new();
        for (index, record) in csv_reader.deserialize::<MailboxRow>().enumerate() {
            let row = record?;
            let received_at = parse_received_at(&row.received_at).ok_or_else(|| {
                MailboxImportError::InvalidTimestamp {
                    row: index + 1,
                    value: row.received_at.clone(),
                }
            })?;

            emails.push(InboundEmail {
                company: row.company,
                title: row.title,
                subject: row.subject,
                body: row.body,
                sender: row.sender,
                received_at,
            });
        }

        Ok(emails)
    }
}
