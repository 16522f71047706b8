use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::MatcherConfig;

use super::domain::{
    ApplicationRecord, ApplicationStatus, EmailCategory, EmailEvent, EmailEventId, NormalizedKey,
    RecordId, StatusChange,
};
use super::export::ExportRow;
use super::fingerprint::{find_duplicate, Fingerprint, MatchCandidate};
use super::normalizer::ValidationError;

/// Lookup failures surfaced to the caller.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("record {0:?} not found")]
    NotFound(RecordId),
}

/// Result of an upsert: the surviving record id and whether it was created
/// fresh or merged into an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub record_id: RecordId,
    pub created: bool,
}

/// Per-status counts over a snapshot of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total: usize,
    pub applied: usize,
    pub under_review: usize,
    pub interview: usize,
    pub offer: usize,
    pub rejected: usize,
    pub withdrawn: usize,
}

/// Counts describing rejection traffic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RejectionStats {
    pub rejection_emails: usize,
    pub rejected_records: usize,
}

/// Outcome of a deduplication sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DedupReport {
    pub merged: usize,
    pub remaining: usize,
}

/// Filter applied to export listings. String filters are case-insensitive
/// substring matches against the normalized fields.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub status: Option<ApplicationStatus>,
    pub company: Option<String>,
    pub title: Option<String>,
}

impl RecordFilter {
    fn accepts(&self, record: &ApplicationRecord) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(company) = &self.company {
            if !record.key.company.contains(&company.to_lowercase()) {
                return false;
            }
        }
        if let Some(title) = &self.title {
            if !record.key.title.contains(&title.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

#[derive(Default)]
struct StoreInner {
    records: BTreeMap<RecordId, ApplicationRecord>,
    events: BTreeMap<EmailEventId, EmailEvent>,
    record_sequence: u64,
    event_sequence: u64,
}

impl StoreInner {
    fn next_record_id(&mut self) -> RecordId {
        self.record_sequence += 1;
        RecordId(self.record_sequence)
    }

    fn next_event_id(&mut self) -> EmailEventId {
        self.event_sequence += 1;
        EmailEventId(self.event_sequence)
    }
}

/// Authoritative set of application records.
///
/// All mutations take the write lock, preserving the single-writer discipline
/// behind the at-most-one-record-per-fingerprint invariant; reads clone a
/// consistent snapshot under the read lock and may proceed concurrently.
pub struct ReconciliationStore {
    matcher: MatcherConfig,
    inner: RwLock<StoreInner>,
}

impl ReconciliationStore {
    pub fn new(matcher: MatcherConfig) -> Self {
        Self {
            matcher,
            inner: RwLock::new(StoreInner::default()),
        }
    }

    pub fn matcher_config(&self) -> &MatcherConfig {
        &self.matcher
    }

    /// Create a record for `key`, or merge into the existing duplicate.
    ///
    /// New records start in `Applied`. An `incoming_status` is treated as a
    /// candidate transition subject to the usual state machine rules, so an
    /// import can never regress a record.
    pub fn upsert(
        &self,
        key: NormalizedKey,
        incoming_status: Option<ApplicationStatus>,
    ) -> Result<UpsertOutcome, ValidationError> {
        if key.is_empty() {
            return Err(ValidationError::EmptyKey);
        }

        let fingerprint = Fingerprint::of(&key);
        let mut inner = self.inner.write().expect("store lock poisoned");

        let candidates = inner
            .records
            .values()
            .filter(|record| record.status != ApplicationStatus::Withdrawn)
            .map(|record| MatchCandidate {
                id: record.id,
                fingerprint: &record.fingerprint,
                updated_at: record.updated_at,
            });
        let existing = find_duplicate(&fingerprint, candidates, &self.matcher);

        let outcome = match existing {
            Some(record_id) => {
                let record = inner
                    .records
                    .get_mut(&record_id)
                    .expect("matched record present");
                record.updated_at = Utc::now();
                if let Some(status) = incoming_status {
                    Self::advance_status(record, status);
                }
                debug!(record = %record_id.display(), "merged into existing record");
                UpsertOutcome {
                    record_id,
                    created: false,
                }
            }
            None => {
                let record_id = inner.next_record_id();
                let now = Utc::now();
                let mut record = ApplicationRecord {
                    id: record_id,
                    key,
                    fingerprint,
                    status: ApplicationStatus::Applied,
                    created_at: now,
                    updated_at: now,
                    source_emails: Vec::new(),
                };
                if let Some(status) = incoming_status {
                    Self::advance_status(&mut record, status);
                }
                inner.records.insert(record_id, record);
                debug!(record = %record_id.display(), "created new record");
                UpsertOutcome {
                    record_id,
                    created: true,
                }
            }
        };

        Ok(outcome)
    }

    /// Attach an inbound email to a record, preserving arrival order.
    pub fn attach_email(
        &self,
        record_id: RecordId,
        event: EmailEvent,
    ) -> Result<EmailEventId, StoreError> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        if !inner.records.contains_key(&record_id) {
            return Err(StoreError::NotFound(record_id));
        }

        let event_id = inner.next_event_id();
        let event = EmailEvent {
            id: event_id,
            record_id: Some(record_id),
            ..event
        };
        inner.events.insert(event_id, event);

        let record = inner
            .records
            .get_mut(&record_id)
            .expect("record checked above");
        record.source_emails.push(event_id);
        record.updated_at = Utc::now();

        Ok(event_id)
    }

    /// Apply the status transition implied by an email category.
    ///
    /// Invalid transitions are logged and ignored rather than raised: a stray
    /// rejection-sounding email must never regress an `Offer` record or halt
    /// batch ingestion.
    pub fn apply_email_event(
        &self,
        record_id: RecordId,
        category: EmailCategory,
    ) -> Result<Option<StatusChange>, StoreError> {
        let Some(candidate) = category.candidate_status() else {
            return Ok(None);
        };

        let mut inner = self.inner.write().expect("store lock poisoned");
        let record = inner
            .records
            .get_mut(&record_id)
            .ok_or(StoreError::NotFound(record_id))?;

        Ok(Self::advance_status(record, candidate))
    }

    /// Withdraw a record. Explicit user action only; reachable from any
    /// non-terminal state.
    pub fn withdraw(&self, record_id: RecordId) -> Result<Option<StatusChange>, StoreError> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let record = inner
            .records
            .get_mut(&record_id)
            .ok_or(StoreError::NotFound(record_id))?;

        if record.status.is_terminal() {
            warn!(
                record = %record_id.display(),
                status = record.status.label(),
                "ignoring withdrawal of terminal record"
            );
            return Ok(None);
        }

        let change = StatusChange {
            from: record.status,
            to: ApplicationStatus::Withdrawn,
        };
        record.status = ApplicationStatus::Withdrawn;
        record.updated_at = Utc::now();
        Ok(Some(change))
    }

    pub fn get(&self, record_id: RecordId) -> Result<ApplicationRecord, StoreError> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .records
            .get(&record_id)
            .cloned()
            .ok_or(StoreError::NotFound(record_id))
    }

    pub fn get_event(&self, event_id: EmailEventId) -> Option<EmailEvent> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.events.get(&event_id).cloned()
    }

    /// Consistent snapshot of all records ordered by creation time.
    pub fn snapshot(&self) -> Vec<ApplicationRecord> {
        let inner = self.inner.read().expect("store lock poisoned");
        let mut records: Vec<_> = inner.records.values().cloned().collect();
        records.sort_by_key(|record| (record.created_at, record.id));
        records
    }

    /// Flat export rows with stable column order, for spreadsheet sync.
    pub fn export_view(&self) -> Vec<ExportRow> {
        self.snapshot().iter().map(ExportRow::from_record).collect()
    }

    pub fn export_view_filtered(&self, filter: &RecordFilter) -> Vec<ExportRow> {
        self.snapshot()
            .iter()
            .filter(|record| filter.accepts(record))
            .map(ExportRow::from_record)
            .collect()
    }

    pub fn stats(&self) -> StoreStats {
        let mut stats = StoreStats::default();
        for record in self.snapshot() {
            stats.total += 1;
            match record.status {
                ApplicationStatus::Applied => stats.applied += 1,
                ApplicationStatus::UnderReview => stats.under_review += 1,
                ApplicationStatus::Interview => stats.interview += 1,
                ApplicationStatus::Offer => stats.offer += 1,
                ApplicationStatus::Rejected => stats.rejected += 1,
                ApplicationStatus::Withdrawn => stats.withdrawn += 1,
            }
        }
        stats
    }

    pub fn rejection_stats(&self) -> RejectionStats {
        let inner = self.inner.read().expect("store lock poisoned");
        RejectionStats {
            rejection_emails: inner
                .events
                .values()
                .filter(|event| event.category == EmailCategory::Rejection)
                .count(),
            rejected_records: inner
                .records
                .values()
                .filter(|record| record.status == ApplicationStatus::Rejected)
                .count(),
        }
    }

    /// Merge any records that violate the one-record-per-fingerprint
    /// invariant, keeping the earliest record of each duplicate group.
    ///
    /// Normal upserts maintain the invariant on their own; the sweep exists
    /// for stores rebuilt from external data or re-checked after a threshold
    /// retune.
    pub fn dedup_sweep(&self) -> DedupReport {
        let matcher = self.matcher;
        self.dedup_sweep_with(&matcher)
    }

    /// Sweep with an explicit matcher config, e.g. after loosening the
    /// similarity threshold.
    pub fn dedup_sweep_with(&self, matcher: &MatcherConfig) -> DedupReport {
        let mut inner = self.inner.write().expect("store lock poisoned");

        let mut ordered: Vec<RecordId> = {
            let mut ids: Vec<_> = inner
                .records
                .values()
                .filter(|record| record.status != ApplicationStatus::Withdrawn)
                .map(|record| (record.created_at, record.id))
                .collect();
            ids.sort();
            ids.into_iter().map(|(_, id)| id).collect()
        };

        let mut survivors: Vec<RecordId> = Vec::new();
        let mut merged = 0usize;

        while let Some(id) = ordered.first().copied() {
            ordered.remove(0);
            let fingerprint = inner.records[&id].fingerprint.clone();

            let duplicate_of = survivors.iter().copied().find(|survivor| {
                let candidate = &inner.records[survivor].fingerprint;
                fingerprint.same_company(candidate)
                    && fingerprint.title_similarity(candidate)
                        >= matcher.title_similarity_threshold
            });

            match duplicate_of {
                Some(survivor_id) => {
                    let duplicate = inner.records.remove(&id).expect("record present");
                    for event_id in &duplicate.source_emails {
                        if let Some(event) = inner.events.get_mut(event_id) {
                            event.record_id = Some(survivor_id);
                        }
                    }
                    let survivor = inner
                        .records
                        .get_mut(&survivor_id)
                        .expect("survivor present");
                    survivor.source_emails.extend(duplicate.source_emails);
                    Self::advance_status(survivor, duplicate.status);
                    survivor.updated_at = Utc::now();
                    merged += 1;
                    debug!(
                        duplicate = %id.display(),
                        survivor = %survivor_id.display(),
                        "merged duplicate record"
                    );
                }
                None => survivors.push(id),
            }
        }

        DedupReport {
            merged,
            remaining: inner.records.len(),
        }
    }

    fn advance_status(
        record: &mut ApplicationRecord,
        next: ApplicationStatus,
    ) -> Option<StatusChange> {
        if record.status == next {
            return None;
        }
        if !record.status.can_transition_to(next) {
            warn!(
                record = %record.id.display(),
                from = record.status.label(),
                to = next.label(),
                "ignoring invalid status transition"
            );
            return None;
        }

        let change = StatusChange {
            from: record.status,
            to: next,
        };
        record.status = next;
        record.updated_at = Utc::now();
        Some(change)
    }
}
