use super::domain::EmailCategory;

/// Phrase tables backing the categorizer. Matching is a plain occurrence
/// count over the lowercased subject and body; the lists are data, so tuning
/// them never touches the scoring logic.
const OFFER_PHRASES: &[&str] = &[
    "pleased to offer",
    "offer letter",
    "offer of employment",
    "extend an offer",
    "formal offer",
    "compensation package",
];

const INTERVIEW_PHRASES: &[&str] = &[
    "schedule a call",
    "phone screen",
    "schedule an interview",
    "interview availability",
    "technical interview",
    "meet the team",
    "next round",
];

const REJECTION_PHRASES: &[&str] = &[
    "unfortunately",
    "not moving forward",
    "not to move forward",
    "other candidates",
    "pursue other applicants",
    "will not be proceeding",
    "wish you the best in your search",
];

const CONFIRMATION_PHRASES: &[&str] = &[
    "thank you for applying",
    "application received",
    "we have received your application",
    "application has been submitted",
    "successfully submitted",
    "thank you for your interest",
];

/// Categories in tie-break priority order: rarer, higher-stakes signals must
/// not be masked by generic confirmation language.
const PRIORITY: [EmailCategory; 4] = [
    EmailCategory::Offer,
    EmailCategory::InterviewRequest,
    EmailCategory::Rejection,
    EmailCategory::Confirmation,
];

const fn phrases_for(category: EmailCategory) -> &'static [&'static str] {
    match category {
        EmailCategory::Offer => OFFER_PHRASES,
        EmailCategory::InterviewRequest => INTERVIEW_PHRASES,
        EmailCategory::Rejection => REJECTION_PHRASES,
        EmailCategory::Confirmation => CONFIRMATION_PHRASES,
        EmailCategory::Other => &[],
    }
}

/// Assign a category to an inbound email.
///
/// Total over every input: the highest phrase count wins, ties fall back to
/// the fixed priority order, and an all-zero score yields `Other`.
pub fn classify(subject: &str, body: &str) -> EmailCategory {
    let haystack = format!("{}\n{}", subject.to_lowercase(), body.to_lowercase());

    let mut winner = EmailCategory::Other;
    let mut best = 0usize;

    for category in PRIORITY {
        let score = score_category(&haystack, phrases_for(category));
        if score > best {
            best = score;
            winner = category;
        }
    }

    winner
}

fn score_category(haystack: &str, phrases: &[&str]) -> usize {
    phrases
        .iter()
        .map(|phrase| haystack.matches(phrase).count())
        .sum()
}
