//! Text normalization for affiliation matching.
//!
//! The normalized form is only ever compared against keyword lists, it is
//! never shown to the user. Transformations applied:
//! - Unicode NFD decomposition with combining marks removed (é → e)
//! - Lowercase
//! - Whitespace collapsed to single spaces and trimmed

use unicode_normalization::UnicodeNormalization;

/// Normalize an affiliation string for keyword matching.
///
/// # Examples
///
/// ```
/// use pubmed_affiliations::affiliation::normalize;
///
/// assert_eq!(normalize("  Université   de Montréal "), "universite de montreal");
/// assert_eq!(normalize("ACME Pharma\tInc."), "acme pharma inc.");
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Split normalized text into alphanumeric tokens.
///
/// Punctuation of any kind separates tokens, so `"inc."` and `"co.,"` both
/// yield bare words.
pub fn tokens(normalized: &str) -> Vec<&str> {
    normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

/// True if `phrase` (already tokenized) occurs as a contiguous run in `haystack`.
pub(crate) fn contains_phrase(haystack: &[&str], phrase: &[&str]) -> bool {
    if phrase.is_empty() || phrase.len() > haystack.len() {
        return false;
    }
    haystack.windows(phrase.len()).any(|window| window == phrase)
}

fn is_combining_mark(c: char) -> bool {
    matches!(c,
        '\u{0300}'..='\u{036F}' |
        '\u{1AB0}'..='\u{1AFF}' |
        '\u{1DC0}'..='\u{1DFF}' |
        '\u{20D0}'..='\u{20FF}' |
        '\u{FE20}'..='\u{FE2F}'
    )
}
