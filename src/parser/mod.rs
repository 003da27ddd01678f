//! Record extraction from E-utilities efetch XML.
//!
//! [`split_article_set`] streams a `PubmedArticleSet` into one [`Element`]
//! tree per record and [`RecordParser`] turns each tree into a
//! [`Paper`](crate::models::Paper), classifying every author on the way.
//! Failures are isolated per record.

mod document;
mod record;

pub use document::{split_article_set, Element, ARTICLE_ELEMENT};
pub use record::{BatchOutcome, RecordParser, AFFILIATION_SEPARATOR};

/// Identifier used before a record's PMID is known.
pub const UNKNOWN_IDENTIFIER: &str = "<unknown>";

/// Record parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed document {identifier}: {reason}")]
    MalformedDocument { identifier: String, reason: String },
}

impl ParseError {
    pub fn malformed(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        ParseError::MalformedDocument {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    /// PMID of the record, or its position in the batch when unknown
    pub fn identifier(&self) -> &str {
        match self {
            ParseError::MalformedDocument { identifier, .. } => identifier,
        }
    }

    /// Replace an unknown identifier with `fallback`
    pub fn or_identifier(self, fallback: String) -> Self {
        match self {
            ParseError::MalformedDocument { identifier, reason }
                if identifier == UNKNOWN_IDENTIFIER =>
            {
                ParseError::MalformedDocument {
                    identifier: fallback,
                    reason,
                }
            }
            other => other,
        }
    }
}
