use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fingerprint::Fingerprint;

/// Identifier assigned by the reconciliation store when a record is created.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RecordId(pub u64);

impl RecordId {
    pub fn display(self) -> String {
        format!("rec-{:06}", self.0)
    }
}

/// Identifier for an ingested email event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EmailEventId(pub u64);

/// Canonical company/title key produced by the normalizer, alongside the
/// original display strings for export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedKey {
    pub company: String,
    pub title: String,
    pub display_company: String,
    pub display_title: String,
}

impl NormalizedKey {
    pub fn is_empty(&self) -> bool {
        self.company.is_empty() && self.title.is_empty()
    }
}

/// Lifecycle status of a tracked application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Applied,
    UnderReview,
    Interview,
    Offer,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Offer => "offer",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    /// Terminal states never advance through the automatic pipeline.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Offer | ApplicationStatus::Rejected | ApplicationStatus::Withdrawn
        )
    }

    const fn rank(self) -> u8 {
        match self {
            ApplicationStatus::Applied => 0,
            ApplicationStatus::UnderReview => 1,
            ApplicationStatus::Interview => 2,
            ApplicationStatus::Offer | ApplicationStatus::Rejected => 3,
            ApplicationStatus::Withdrawn => 4,
        }
    }

    /// Whether the pipeline may move a record from `self` to `next`.
    ///
    /// Transitions are forward-only: a record never regresses, terminal
    /// states have no outgoing edges, and withdrawal is reserved for the
    /// explicit store operation.
    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        if self.is_terminal() || next == ApplicationStatus::Withdrawn {
            return false;
        }
        next.rank() > self.rank()
    }
}

/// Category assigned to an inbound email by the classifier. Immutable once
/// assigned by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailCategory {
    Offer,
    InterviewRequest,
    Rejection,
    Confirmation,
    Other,
}

impl EmailCategory {
    pub const fn label(self) -> &'static str {
        match self {
            EmailCategory::Offer => "offer",
            EmailCategory::InterviewRequest => "interview_request",
            EmailCategory::Rejection => "rejection",
            EmailCategory::Confirmation => "confirmation",
            EmailCategory::Other => "other",
        }
    }

    /// Candidate status transition implied by the category, if any.
    pub const fn candidate_status(self) -> Option<ApplicationStatus> {
        match self {
            EmailCategory::Offer => Some(ApplicationStatus::Offer),
            EmailCategory::InterviewRequest => Some(ApplicationStatus::Interview),
            EmailCategory::Rejection => Some(ApplicationStatus::Rejected),
            EmailCategory::Confirmation => Some(ApplicationStatus::UnderReview),
            EmailCategory::Other => None,
        }
    }
}

/// Authoritative application record owned by the reconciliation store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: RecordId,
    pub key: NormalizedKey,
    pub fingerprint: Fingerprint,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Associated email events in arrival order.
    pub source_emails: Vec<EmailEventId>,
}

/// Ingested email event. Created once at ingestion and never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailEvent {
    pub id: EmailEventId,
    pub record_id: Option<RecordId>,
    pub category: EmailCategory,
    pub raw_subject: String,
    pub raw_body_excerpt: String,
    pub sender: String,
    pub received_at: DateTime<Utc>,
}

/// Applied status transition reported back to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
}
