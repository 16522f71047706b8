use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::config::MatcherConfig;
use crate::workflows::applications::domain::NormalizedKey;
use crate::workflows::applications::normalizer::normalize;
use crate::workflows::applications::service::{InboundEmail, IngestionService};
use crate::workflows::applications::store::ReconciliationStore;

pub(super) fn received_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 20, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn store() -> ReconciliationStore {
    ReconciliationStore::new(MatcherConfig::default())
}

pub(super) fn service() -> (IngestionService, Arc<ReconciliationStore>) {
    let store = Arc::new(store());
    (IngestionService::new(store.clone()), store)
}

pub(super) fn key(company: &str, title: &str) -> NormalizedKey {
    normalize(company, title).expect("valid key")
}

pub(super) fn email(company: &str, title: &str, subject: &str, body: &str) -> InboundEmail {
    InboundEmail {
        company: company.to_string(),
        title: title.to_string(),
        subject: subject.to_string(),
        body: body.to_string(),
        sender: "jobs@example.com".to_string(),
        received_at: received_at(),
    }
}
