//! Core data models for parsed records and search requests.

mod paper;
mod search;

pub use paper::{Author, Paper, PaperBuilder, PublicationDate};
pub use search::{SearchQuery, DEFAULT_MAX_RESULTS};
