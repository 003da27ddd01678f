//! Fetch, parse and assemble in one pass.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::SearchQuery;
use crate::parser::{ParseError, RecordParser};
use crate::report::{assemble, ReportFilter, ReportRow};
use crate::sources::Source;

/// Outcome of one run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Report rows, after filtering
    pub rows: Vec<ReportRow>,
    /// Number of records parsed successfully
    pub papers_parsed: usize,
    /// Records that could not be parsed
    pub skipped: Vec<ParseError>,
}

/// One request/parse/classify/assemble pass over a source.
#[derive(Debug, Clone)]
pub struct Pipeline {
    source: Arc<dyn Source>,
    parser: RecordParser,
    filter: ReportFilter,
}

impl Pipeline {
    pub fn new(source: Arc<dyn Source>, parser: RecordParser, filter: ReportFilter) -> Self {
        Self {
            source,
            parser,
            filter,
        }
    }

    /// Run the pipeline for `query`.
    ///
    /// Returns [`Error::NoResults`] when the source has no records at all,
    /// and [`Error::NoValidRecords`] when every record failed to parse.
    /// Otherwise records that fail to parse are reported in
    /// [`RunSummary::skipped`] and do not fail the run.
    pub async fn run(&self, query: &SearchQuery) -> Result<RunSummary> {
        tracing::info!("Fetching {} from {}", query.describe(), self.source.name());
        let xml = self.source.fetch_documents(query).await?;

        if xml.trim().is_empty() {
            return Err(Error::NoResults {
                query: query.describe(),
            });
        }

        let outcome = self.parser.parse_batch(&xml);
        if outcome.total() == 0 {
            return Err(Error::NoResults {
                query: query.describe(),
            });
        }

        if outcome.papers.is_empty() {
            return Err(Error::NoValidRecords {
                failed: outcome.failures.len(),
            });
        }

        let rows = assemble(&outcome.papers, self.filter);
        tracing::info!(
            "{} of {} papers kept for the report",
            rows.len(),
            outcome.papers.len()
        );

        Ok(RunSummary {
            rows,
            papers_parsed: outcome.papers.len(),
            skipped: outcome.failures,
        })
    }
}
