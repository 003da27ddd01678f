//! Record sources: where raw PubMed XML comes from.
//!
//! The parser does not care whether a payload was fetched over HTTP, read
//! from a file saved by an earlier run, or supplied by a test. Each origin
//! implements the [`Source`] trait:
//!
//! - [`PubMedSource`]: NCBI E-utilities (esearch + efetch) with bounded retry
//! - [`FileSource`]: a saved efetch XML file
//! - [`MockSource`]: a fixed payload, for tests
//!
//! A source returns the efetch payload as text. An empty string means the
//! query matched no records.

mod file;
pub mod mock;
mod pubmed;

pub use file::FileSource;
pub use mock::MockSource;
pub use pubmed::{PubMedSource, PUBMED_BASE_URL};

use crate::models::SearchQuery;
use async_trait::async_trait;

/// Interface implemented by every record source.
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Short identifier used in logs ("pubmed", "file", ...)
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Retrieve the raw record payload for a query.
    async fn fetch_documents(&self, query: &SearchQuery) -> Result<String, SourceError>;

    /// Validate that a record ID is correctly formatted for this source
    fn validate_id(&self, _id: &str) -> Result<(), SourceError> {
        Ok(())
    }
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// Server-side failure (5xx)
    #[error("Server error: HTTP {0}")]
    Server(u16),

    /// Parsing error in a source response
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Input not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// API error reported by the source
    #[error("API error: {0}")]
    Api(String),

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<quick_xml::DeError> for SourceError {
    fn from(err: quick_xml::DeError) -> Self {
        SourceError::Parse(format!("Failed to parse PubMed search XML: {}", err))
    }
}
