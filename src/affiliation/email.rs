//! Email extraction from free-text affiliation blocks.

use regex::Regex;
use std::sync::OnceLock;

/// local-part@label(.label)*.tld, at least one dot in the domain.
const EMAIL_PATTERN: &str =
    r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}\b";

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"))
}

/// Return the first email address in `text`, in document order.
///
/// # Examples
///
/// ```
/// use pubmed_affiliations::affiliation::extract_email;
///
/// assert_eq!(
///     extract_email("John Doe, Acme Biotech, jdoe@acmebiotech.com").as_deref(),
///     Some("jdoe@acmebiotech.com")
/// );
/// assert_eq!(extract_email("Acme Biotech, Boston"), None);
/// ```
pub fn extract_email(text: &str) -> Option<String> {
    email_regex().find(text).map(|m| m.as_str().to_string())
}

/// Return every distinct email address in `text`, in document order.
pub fn extract_emails(text: &str) -> Vec<String> {
    let mut emails: Vec<String> = Vec::new();
    for m in email_regex().find_iter(text) {
        let email = m.as_str();
        if !emails.iter().any(|e| e == email) {
            emails.push(email.to_string());
        }
    }
    emails
}
