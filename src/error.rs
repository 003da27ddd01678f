//! Crate-level error type.

use crate::config::ConfigFileError;
use crate::report::WriteError;
use crate::sources::SourceError;

/// Errors surfaced by a pipeline run
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to fetch papers: {0}")]
    Fetch(#[from] SourceError),

    #[error("No results found for {query}")]
    NoResults { query: String },

    #[error("No valid records found after parsing ({failed} skipped)")]
    NoValidRecords { failed: usize },

    #[error("Failed to write report: {0}")]
    Write(#[from] WriteError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigFileError),
}

pub type Result<T> = std::result::Result<T, Error>;
