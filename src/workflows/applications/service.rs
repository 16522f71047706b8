use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::classifier::classify;
use super::domain::{EmailCategory, EmailEvent, EmailEventId, RecordId, StatusChange};
use super::normalizer::{normalize, ValidationError};
use super::store::{ReconciliationStore, StoreError};

/// Body excerpt length persisted on email events.
const BODY_EXCERPT_CHARS: usize = 280;

/// Fully-formed inbound email handed across the boundary by the mail/ATS
/// collaborator. Company and title come from the external extraction stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEmail {
    pub company: String,
    pub title: String,
    pub subject: String,
    pub body: String,
    pub sender: String,
    pub received_at: DateTime<Utc>,
}

/// Result of ingesting a single email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub record_id: RecordId,
    pub event_id: EmailEventId,
    pub category: EmailCategory,
    pub created: bool,
    pub status_change: Option<StatusChange>,
}

/// Counts reported after a batch ingestion run. Each email commits on its
/// own, so a failure partway through leaves earlier records in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub created: usize,
    pub merged: usize,
    pub failed: usize,
}

/// Error raised for a single email that cannot be ingested.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Facade composing the normalizer, fingerprint matcher, classifier, and
/// reconciliation store into the ingestion pipeline.
pub struct IngestionService {
    store: Arc<ReconciliationStore>,
}

impl IngestionService {
    pub fn new(store: Arc<ReconciliationStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<ReconciliationStore> {
        &self.store
    }

    /// Ingest one email: normalize, deduplicate, classify, and reconcile, as
    /// a single atomic unit of work.
    pub fn ingest_email(&self, email: InboundEmail) -> Result<IngestOutcome, IngestError> {
        let key = normalize(&email.company, &email.title)?;
        let upsert = self.store.upsert(key, None)?;

        let category = classify(&email.subject, &email.body);
        let event = EmailEvent {
            id: EmailEventId(0),
            record_id: None,
            category,
            raw_subject: email.subject,
            raw_body_excerpt: excerpt(&email.body),
            sender: email.sender,
            received_at: email.received_at,
        };
        let event_id = self.store.attach_email(upsert.record_id, event)?;
        let status_change = self.store.apply_email_event(upsert.record_id, category)?;

        Ok(IngestOutcome {
            record_id: upsert.record_id,
            event_id,
            category,
            created: upsert.created,
            status_change,
        })
    }

    /// Ingest a batch one email at a time. A failing email is counted and
    /// skipped; it never aborts the rest of the batch.
    pub fn ingest_batch(&self, emails: Vec<InboundEmail>) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for email in emails {
            summary.processed += 1;
            let sender = email.sender.clone();
            match self.ingest_email(email) {
                Ok(outcome) if outcome.created => summary.created += 1,
                Ok(_) => summary.merged += 1,
                Err(error) => {
                    summary.failed += 1;
                    warn!(%sender, %error, "skipping email that failed ingestion");
                }
            }
        }

        info!(
            processed = summary.processed,
            created = summary.created,
            merged = summary.merged,
            failed = summary.failed,
            "batch ingestion complete"
        );
        summary
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}
