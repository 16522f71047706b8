use std::collections::HashSet;

use super::common::{key, received_at, store};
use crate::workflows::applications::domain::{
    ApplicationStatus, EmailCategory, EmailEvent, EmailEventId, RecordId,
};
use crate::workflows::applications::normalizer::ValidationError;
use crate::workflows::applications::store::{RecordFilter, StoreError};

fn sample_event(category: EmailCategory) -> EmailEvent {
    EmailEvent {
        id: EmailEventId(0),
        record_id: None,
        category,
        raw_subject: "subject".to_string(),
        raw_body_excerpt: "body".to_string(),
        sender: "jobs@example.com".to_string(),
        received_at: received_at(),
    }
}

#[test]
fn upsert_creates_then_merges_equivalent_keys() {
    let store = store();

    let first = store
        .upsert(key("Acme Inc.", "Senior Backend Engineer"), None)
        .expect("first upsert");
    assert!(first.created);

    let second = store
        .upsert(key("ACME", "backend engineer, senior"), None)
        .expect("second upsert");
    assert!(!second.created);
    assert_eq!(second.record_id, first.record_id);

    assert_eq!(store.snapshot().len(), 1);
}

#[test]
fn upsert_rejects_empty_key() {
    let store = store();
    let mut empty = key("Acme", "x");
    empty.company.clear();
    empty.title.clear();

    assert_eq!(store.upsert(empty, None), Err(ValidationError::EmptyKey));
    assert!(store.snapshot().is_empty());
}

#[test]
fn at_most_one_non_withdrawn_record_per_fingerprint() {
    let store = store();
    let variants = [
        ("Acme Inc.", "Senior Backend Engineer"),
        ("ACME", "backend engineer, senior"),
        ("acme, inc", "Senior   Backend Engineer"),
        ("Acme Incorporated", "SENIOR BACKEND ENGINEER"),
    ];

    for (company, title) in variants {
        store.upsert(key(company, title), None).expect("upsert");
    }

    let snapshot = store.snapshot();
    let mut company_keys = HashSet::new();
    for record in snapshot
        .iter()
        .filter(|record| record.status != ApplicationStatus::Withdrawn)
    {
        assert!(
            company_keys.insert(record.fingerprint.company_key()),
            "duplicate fingerprint survived upserts"
        );
    }
    assert_eq!(snapshot.len(), 1);
}

#[test]
fn withdrawn_records_do_not_absorb_new_applications() {
    let store = store();
    let first = store
        .upsert(key("Acme", "Backend Engineer"), None)
        .expect("upsert");
    store.withdraw(first.record_id).expect("withdraw");

    let second = store
        .upsert(key("Acme", "Backend Engineer"), None)
        .expect("upsert after withdrawal");
    assert!(second.created);
    assert_ne!(second.record_id, first.record_id);
}

#[test]
fn incoming_status_advances_only_along_valid_transitions() {
    let store = store();
    let outcome = store
        .upsert(
            key("Acme", "Backend Engineer"),
            Some(ApplicationStatus::Interview),
        )
        .expect("upsert");
    let record = store.get(outcome.record_id).expect("record exists");
    assert_eq!(record.status, ApplicationStatus::Interview);

    // A later import claiming "applied" must not regress the record.
    store
        .upsert(key("Acme", "Backend Engineer"), Some(ApplicationStatus::Applied))
        .expect("merge upsert");
    let record = store.get(outcome.record_id).expect("record exists");
    assert_eq!(record.status, ApplicationStatus::Interview);
}

#[test]
fn apply_email_event_advances_status() {
    let store = store();
    let outcome = store
        .upsert(key("Acme", "Backend Engineer"), None)
        .expect("upsert");

    let change = store
        .apply_email_event(outcome.record_id, EmailCategory::InterviewRequest)
        .expect("record exists")
        .expect("transition applies");
    assert_eq!(change.from, ApplicationStatus::Applied);
    assert_eq!(change.to, ApplicationStatus::Interview);
}

#[test]
fn rejection_email_never_regresses_an_offer() {
    let store = store();
    let outcome = store
        .upsert(key("Acme", "Backend Engineer"), None)
        .expect("upsert");
    store
        .apply_email_event(outcome.record_id, EmailCategory::Offer)
        .expect("record exists");

    let change = store
        .apply_email_event(outcome.record_id, EmailCategory::Rejection)
        .expect("record exists");
    assert_eq!(change, None);

    let record = store.get(outcome.record_id).expect("record exists");
    assert_eq!(record.status, ApplicationStatus::Offer);
}

#[test]
fn terminal_states_never_transition_automatically() {
    for terminal in [EmailCategory::Offer, EmailCategory::Rejection] {
        let store = store();
        let outcome = store
            .upsert(key("Acme", "Backend Engineer"), None)
            .expect("upsert");
        store
            .apply_email_event(outcome.record_id, terminal)
            .expect("record exists");
        let settled = store.get(outcome.record_id).expect("record exists").status;

        for category in [
            EmailCategory::Confirmation,
            EmailCategory::InterviewRequest,
            EmailCategory::Rejection,
            EmailCategory::Offer,
            EmailCategory::Other,
        ] {
            let change = store
                .apply_email_event(outcome.record_id, category)
                .expect("record exists");
            assert_eq!(change, None, "terminal {settled:?} must not move");
        }
    }
}

#[test]
fn other_category_never_changes_status() {
    let store = store();
    let outcome = store
        .upsert(key("Acme", "Backend Engineer"), None)
        .expect("upsert");
    let change = store
        .apply_email_event(outcome.record_id, EmailCategory::Other)
        .expect("record exists");
    assert_eq!(change, None);
}

#[test]
fn unknown_record_id_is_surfaced() {
    let store = store();
    assert_eq!(
        store.apply_email_event(RecordId(42), EmailCategory::Rejection),
        Err(StoreError::NotFound(RecordId(42)))
    );
    assert_eq!(store.get(RecordId(42)), Err(StoreError::NotFound(RecordId(42))));
}

#[test]
fn attach_email_preserves_arrival_order() {
    let store = store();
    let outcome = store
        .upsert(key("Acme", "Backend Engineer"), None)
        .expect("upsert");

    let first = store
        .attach_email(outcome.record_id, sample_event(EmailCategory::Confirmation))
        .expect("attach");
    let second = store
        .attach_email(outcome.record_id, sample_event(EmailCategory::Rejection))
        .expect("attach");

    let record = store.get(outcome.record_id).expect("record exists");
    assert_eq!(record.source_emails, vec![first, second]);

    let event = store.get_event(first).expect("event stored");
    assert_eq!(event.record_id, Some(outcome.record_id));
}

#[test]
fn export_view_is_ordered_and_repeatable() {
    let store = store();
    store.upsert(key("Acme", "Backend Engineer"), None).expect("upsert");
    store.upsert(key("Globex", "Data Analyst"), None).expect("upsert");
    store.upsert(key("Initech", "Product Manager"), None).expect("upsert");

    let first = store.export_view();
    let second = store.export_view();
    assert_eq!(first, second);

    let companies: Vec<_> = first.iter().map(|row| row.company.as_str()).collect();
    assert_eq!(companies, vec!["Acme", "Globex", "Initech"]);
}

#[test]
fn filtered_view_honors_status_and_substrings() {
    let store = store();
    let acme = store
        .upsert(key("Acme", "Backend Engineer"), None)
        .expect("upsert");
    store.upsert(key("Globex", "Data Analyst"), None).expect("upsert");
    store
        .apply_email_event(acme.record_id, EmailCategory::Rejection)
        .expect("record exists");

    let rejected = store.export_view_filtered(&RecordFilter {
        status: Some(ApplicationStatus::Rejected),
        ..RecordFilter::default()
    });
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].company, "Acme");

    let by_title = store.export_view_filtered(&RecordFilter {
        title: Some("analyst".to_string()),
        ..RecordFilter::default()
    });
    assert_eq!(by_title.len(), 1);
    assert_eq!(by_title[0].company, "Globex");
}

#[test]
fn stats_count_records_per_status() {
    let store = store();
    store.upsert(key("Acme", "Backend Engineer"), None).expect("upsert");
    let globex = store
        .upsert(key("Globex", "Data Analyst"), None)
        .expect("upsert");
    store
        .apply_email_event(globex.record_id, EmailCategory::Rejection)
        .expect("record exists");

    let stats = store.stats();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.applied, 1);
    assert_eq!(stats.rejected, 1);
}

#[test]
fn rejection_stats_count_emails_and_records() {
    let store = store();
    let outcome = store
        .upsert(key("Acme", "Backend Engineer"), None)
        .expect("upsert");
    store
        .attach_email(outcome.record_id, sample_event(EmailCategory::Rejection))
        .expect("attach");
    store
        .apply_email_event(outcome.record_id, EmailCategory::Rejection)
        .expect("record exists");

    let stats = store.rejection_stats();
    assert_eq!(stats.rejection_emails, 1);
    assert_eq!(stats.rejected_records, 1);
}

#[test]
fn withdraw_is_explicit_and_ignores_terminal_records() {
    let store = store();
    let outcome = store
        .upsert(key("Acme", "Backend Engineer"), None)
        .expect("upsert");

    let change = store.withdraw(outcome.record_id).expect("record exists");
    assert_eq!(
        change.map(|c| c.to),
        Some(ApplicationStatus::Withdrawn)
    );

    // Withdrawing again (now terminal) is a logged no-op.
    let change = store.withdraw(outcome.record_id).expect("record exists");
    assert_eq!(change, None);
}

#[test]
fn dedup_sweep_merges_records_after_a_threshold_retune() {
    use crate::config::MatcherConfig;
    use crate::workflows::applications::store::ReconciliationStore;

    // Under a strict threshold these titles are distinct records.
    let strict = MatcherConfig::new(0.95).expect("valid threshold");
    let store = ReconciliationStore::new(strict);
    let first = store
        .upsert(key("Acme Inc.", "Senior Backend Engineer"), None)
        .expect("upsert");
    let second = store
        .upsert(key("ACME", "Backend Engineer"), None)
        .expect("upsert");
    store
        .attach_email(second.record_id, sample_event(EmailCategory::Confirmation))
        .expect("attach");
    assert_eq!(store.snapshot().len(), 2);

    // Sweeping with the default threshold collapses them onto the earliest
    // record, re-pointing the duplicate's email events.
    let report = store.dedup_sweep_with(&MatcherConfig::default());
    assert_eq!(report.merged, 1);
    assert_eq!(report.remaining, 1);

    let survivor = store.get(first.record_id).expect("survivor remains");
    assert_eq!(survivor.source_emails.len(), 1);
    let event = store
        .get_event(survivor.source_emails[0])
        .expect("event survives");
    assert_eq!(event.record_id, Some(first.record_id));
    assert_eq!(store.get(second.record_id), Err(StoreError::NotFound(second.record_id)));
}

#[test]
fn dedup_sweep_reports_a_clean_store_untouched() {
    let store = store();
    store.upsert(key("Acme", "Backend Engineer"), None).expect("upsert");
    store.upsert(key("Globex", "Data Analyst"), None).expect("upsert");

    let report = store.dedup_sweep();
    assert_eq!(report.merged, 0);
    assert_eq!(report.remaining, 2);
}
