//! Six-column company-affiliation report.
//!
//! [`assemble`] turns parsed papers into [`ReportRow`]s; the [`writer`]
//! functions render them as CSV, a console table or JSON.

mod writer;

pub use writer::{
    create_output_file, render_table, write_csv, write_csv_file, write_json, WriteError,
};

use serde::{Deserialize, Serialize};

use crate::models::Paper;

/// Separator used inside multi-valued cells.
pub const VALUE_SEPARATOR: &str = "; ";

/// Column headers, in output order.
pub const COLUMNS: [&str; 6] = [
    "PubmedID",
    "Title",
    "Publication Date",
    "Non-academic Author(s)",
    "Company Affiliation(s)",
    "Corresponding Author Email",
];

/// One output row per paper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "PubmedID")]
    pub pubmed_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Publication Date")]
    pub publication_date: String,
    #[serde(rename = "Non-academic Author(s)")]
    pub non_academic_authors: String,
    #[serde(rename = "Company Affiliation(s)")]
    pub company_affiliations: String,
    #[serde(rename = "Corresponding Author Email")]
    pub corresponding_email: String,
}

impl ReportRow {
    /// Build the row for one paper
    pub fn from_paper(paper: &Paper) -> Self {
        let authors: Vec<&str> = paper
            .non_academic_authors()
            .map(|a| a.name())
            .filter(|name| !name.is_empty())
            .collect();

        let mut companies: Vec<&str> = Vec::new();
        for company in paper.non_academic_authors().filter_map(|a| a.company_name()) {
            if !company.is_empty() && !companies.contains(&company) {
                companies.push(company);
            }
        }

        Self {
            pubmed_id: paper.id().to_string(),
            title: paper.title().unwrap_or_default().to_string(),
            publication_date: paper
                .publication_date()
                .map(ToString::to_string)
                .unwrap_or_default(),
            non_academic_authors: authors.join(VALUE_SEPARATOR),
            company_affiliations: companies.join(VALUE_SEPARATOR),
            corresponding_email: paper.corresponding_email().unwrap_or_default().to_string(),
        }
    }

    /// Cells in column order
    pub fn cells(&self) -> [&str; 6] {
        [
            &self.pubmed_id,
            &self.title,
            &self.publication_date,
            &self.non_academic_authors,
            &self.company_affiliations,
            &self.corresponding_email,
        ]
    }
}

/// Which papers make it into the report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFilter {
    /// Only papers with at least one non-academic author
    #[default]
    NonAcademicOnly,
    /// Every parsed paper
    IncludeAll,
}

impl ReportFilter {
    pub fn from_include_all(include_all: bool) -> Self {
        if include_all {
            ReportFilter::IncludeAll
        } else {
            ReportFilter::NonAcademicOnly
        }
    }

    fn accepts(self, paper: &Paper) -> bool {
        match self {
            ReportFilter::NonAcademicOnly => paper.has_non_academic_author(),
            ReportFilter::IncludeAll => true,
        }
    }
}

/// Aggregate papers into report rows, preserving input order.
pub fn assemble(papers: &[Paper], filter: ReportFilter) -> Vec<ReportRow> {
    papers
        .iter()
        .filter(|paper| filter.accepts(paper))
        .map(ReportRow::from_paper)
        .collect()
}
