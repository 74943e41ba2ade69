// src/outreach/synthesizer.rs
//! Candidate address synthesis from a person's name and company domain

/// Number of candidates produced for every recipient
pub const CANDIDATE_COUNT: usize = 10;

/// First/last name pair extracted from a free-text employee name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientName {
    pub first: String,
    pub last: String,
}

impl RecipientName {
    /// Split a free-text name on whitespace, keeping the first and last tokens.
    ///
    /// Returns `None` for names with fewer than two tokens and for names whose
    /// last token is a bare initial ("Bob X", "Ann B."), since the surname
    /// patterns cannot be derived from it.
    pub fn parse(raw: &str) -> Option<Self> {
        let parts: Vec<&str> = raw.split_whitespace().collect();
        if parts.len() < 2 {
            return None;
        }

        let first = parts[0];
        let last = parts[parts.len() - 1];

        let surname_chars = last.chars().filter(|c| c.is_alphanumeric()).count();
        if surname_chars < 2 {
            return None;
        }

        Some(Self {
            first: first.to_string(),
            last: last.to_string(),
        })
    }
}

fn initial(name: &str) -> String {
    name.chars().next().map(String::from).unwrap_or_default()
}

/// Produce the ordered candidate list for `first`/`last` at `domain`.
///
/// The order is significant: it is the probe order, so the first accepted
/// candidate wins. Both names must be non-empty.
pub fn synthesize(first: &str, last: &str, domain: &str) -> Vec<String> {
    let f = first.to_lowercase();
    let l = last.to_lowercase();
    let fi = initial(&f);
    let li = initial(&l);

    vec![
        format!("{}.{}@{}", f, l, domain),
        format!("{}@{}", f, domain),
        format!("{}.{}@{}", fi, l, domain),
        format!("{}.{}@{}", f, li, domain),
        format!("{}{}@{}", f, l, domain),
        format!("{}.{}@{}", l, f, domain),
        format!("{}{}42@{}", f, l, domain),
        format!("{}{}@{}", f, li, domain),
        format!("{}_{}@{}", f, l, domain),
        format!("{}{}@{}", l, fi, domain),
    ]
}
