use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::MatcherConfig;

use super::domain::{NormalizedKey, RecordId};

/// Order-independent token-set representation of a normalized key, so
/// "Software Engineer, Backend" and "Backend Software Engineer" fingerprint
/// identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    company_tokens: BTreeSet<String>,
    title_tokens: BTreeSet<String>,
}

impl Fingerprint {
    pub fn of(key: &NormalizedKey) -> Self {
        Self {
            company_tokens: tokenize(&key.company),
            title_tokens: tokenize(&key.title),
        }
    }

    pub fn same_company(&self, other: &Fingerprint) -> bool {
        self.company_tokens == other.company_tokens
    }

    /// Jaccard similarity over the title token sets. Two empty titles count
    /// as identical.
    pub fn title_similarity(&self, other: &Fingerprint) -> f32 {
        let union = self.title_tokens.union(&other.title_tokens).count();
        if union == 0 {
            return 1.0;
        }
        let intersection = self.title_tokens.intersection(&other.title_tokens).count();
        intersection as f32 / union as f32
    }

    pub fn company_key(&self) -> String {
        self.company_tokens
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn tokenize(value: &str) -> BTreeSet<String> {
    value
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Existing record offered to the matcher. Withdrawn records are excluded by
/// the store before reaching this point.
#[derive(Debug, Clone)]
pub struct MatchCandidate<'a> {
    pub id: RecordId,
    pub fingerprint: &'a Fingerprint,
    pub updated_at: DateTime<Utc>,
}

/// Find the duplicate of `fingerprint` among `candidates`, if any.
///
/// A candidate matches when its company token set is identical and its title
/// similarity clears the configured threshold. When several candidates clear
/// the bar, the most recently updated one wins. Absence of a duplicate is not
/// an error.
pub fn find_duplicate<'a, I>(
    fingerprint: &Fingerprint,
    candidates: I,
    config: &MatcherConfig,
) -> Option<RecordId>
where
    I: IntoIterator<Item = MatchCandidate<'a>>,
{
    candidates
        .into_iter()
        .filter(|candidate| fingerprint.same_company(candidate.fingerprint))
        .filter(|candidate| {
            fingerprint.title_similarity(candidate.fingerprint)
                >= config.title_similarity_threshold
        })
        .max_by_key(|candidate| (candidate.updated_at, candidate.id))
        .map(|candidate| candidate.id)
}
