//! Job-application deduplication and reconciliation pipeline.
//!
//! Inbound emails flow through normalization, fingerprint matching, and
//! classification before the reconciliation store commits the result. The
//! store exclusively owns record identity and lifecycle; the normalizer,
//! matcher, and classifier are pure functions producing decisions the store
//! consumes.

pub mod classifier;
pub mod domain;
pub mod export;
pub mod fingerprint;
pub mod normalizer;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use classifier::classify;
pub use domain::{
    ApplicationRecord, ApplicationStatus, EmailCategory, EmailEvent, EmailEventId, NormalizedKey,
    RecordId, StatusChange,
};
pub use export::{write_csv, CsvFileSink, ExportError, ExportRow, ExportSink};
pub use fingerprint::{find_duplicate, Fingerprint, MatchCandidate};
pub use normalizer::{normalize, ValidationError};
pub use service::{
    BatchSummary, IngestError, IngestOutcome, IngestionService, InboundEmail,
};
pub use store::{
    DedupReport, ReconciliationStore, RecordFilter, RejectionStats, StoreError, StoreStats,
    UpsertOutcome,
};
