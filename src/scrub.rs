//! PII scrubbing for story text.
//!
//! Emails and US-style phone numbers are replaced with placeholder tokens
//! before any text leaves the service boundary. We intentionally do NOT try
//! to strip personal names or other identifying content; that is unreliable
//! and would hurt the quality of the analysis. Documented limitation.

use once_cell::sync::Lazy;
use regex::Regex;

pub const EMAIL_PLACEHOLDER: &str = "[EMAIL]";
pub const PHONE_PLACEHOLDER: &str = "[PHONE]";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b").unwrap());

// Optional +1 country code, optional (possibly parenthesized) area code,
// separators limited to '-', '.' and space.
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:\+1[-.\s]?)?(?:\(?\d{3}\)?[-.\s]?)?\d{3}[-.\s]?\d{4}\b").unwrap()
});

/// Replace email addresses and phone numbers in `raw` with placeholder
/// tokens. Pure function; all other text passes through untouched. Emails
/// are substituted first so digits inside an address cannot be picked up by
/// the phone pattern.
pub fn scrub_story_text(raw: &str) -> String {
    let scrubbed = EMAIL_RE.replace_all(raw, EMAIL_PLACEHOLDER);
    PHONE_RE.replace_all(&scrubbed, PHONE_PLACEHOLDER).into_owned()
}
