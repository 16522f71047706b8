use super::domain::NormalizedKey;

/// Corporate suffixes dropped from company names so "Acme Inc." and "ACME"
/// canonicalize to the same key.
const CORPORATE_SUFFIXES: [&str; 8] = [
    "inc",
    "incorporated",
    "llc",
    "corp",
    "corporation",
    "ltd",
    "limited",
    "co",
];

/// Validation errors raised before anything reaches the store.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("company and title are both empty after normalization")]
    EmptyKey,
}

/// Canonicalize a raw company/title pair into a stable key.
///
/// Both fields are lowercased, trimmed, and whitespace-collapsed; punctuation
/// and corporate suffixes are stripped from the company only. Deterministic
/// and idempotent. Fails only when both inputs are empty after trimming.
pub fn normalize(raw_company: &str, raw_title: &str) -> Result<NormalizedKey, ValidationError> {
    let display_company = collapse_whitespace(raw_company);
    let display_title = collapse_whitespace(raw_title);

    if display_company.is_empty() && display_title.is_empty() {
        return Err(ValidationError::EmptyKey);
    }

    let company = normalize_company(&display_company);
    let title = display_title.to_lowercase();

    Ok(NormalizedKey {
        company,
        title,
        display_company,
        display_title,
    })
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_company(value: &str) -> String {
    let lowered = value.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();

    stripped
        .split_whitespace()
        .filter(|token| !CORPORATE_SUFFIXES.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}
