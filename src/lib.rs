//! # PubMed Affiliations
//!
//! Fetches PubMed records and reports the papers that have at least one
//! author affiliated with a pharmaceutical or biotech company.
//!
//! ## Architecture
//!
//! - [`affiliation`]: text normalization, academic/company classification, email extraction
//! - [`parser`]: efetch XML → [`Paper`](models::Paper), one record at a time
//! - [`sources`]: where the XML comes from (E-utilities, a saved file, a mock)
//! - [`report`]: six-column rows and their CSV / table / JSON renderings
//! - [`pipeline`]: fetch → parse → assemble
//! - [`config`]: layered configuration (defaults, TOML file, environment)
//! - [`utils`]: HTTP client, retry, terminal helpers
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pubmed_affiliations::{Pipeline, PubMedSource, RecordParser, ReportFilter, SearchQuery};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = Pipeline::new(
//!     Arc::new(PubMedSource::new()?),
//!     RecordParser::default(),
//!     ReportFilter::NonAcademicOnly,
//! );
//! let summary = pipeline.run(&SearchQuery::new("CRISPR therapy").max_results(20)).await?;
//! pubmed_affiliations::report::write_csv(&summary.rows, std::io::stdout())?;
//! # Ok(())
//! # }
//! ```

pub mod affiliation;
pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use error::{Error, Result};
pub use models::{Author, Paper, SearchQuery};
pub use parser::RecordParser;
pub use pipeline::{Pipeline, RunSummary};
pub use report::{ReportFilter, ReportRow};
pub use sources::{FileSource, PubMedSource, Source, SourceError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
