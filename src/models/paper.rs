//! Paper and author records produced by the record parser.

use chrono::{Month, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::affiliation::ClassificationResult;

/// Publication date as found in the record: structured when PubMed gives
/// Year/Month/Day, free text otherwise (e.g. a MedlineDate like "2023 Jan-Feb").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PublicationDate {
    Structured {
        year: i32,
        month: Option<u32>,
        day: Option<u32>,
    },
    Freeform(String),
}

impl PublicationDate {
    /// Build a date from PubMed's Year/Month/Day elements.
    ///
    /// Months may be numeric ("03") or names ("Mar", "March"). Anything that
    /// does not form a valid calendar date is kept as free text.
    ///
    /// # Examples
    ///
    /// ```
    /// use pubmed_affiliations::models::PublicationDate;
    ///
    /// let date = PublicationDate::from_parts(Some("2023"), Some("Jan"), Some("5")).unwrap();
    /// assert_eq!(date.to_string(), "2023-01-05");
    ///
    /// let date = PublicationDate::from_parts(Some("2021"), Some("Spring"), None).unwrap();
    /// assert_eq!(date.to_string(), "2021 Spring");
    /// ```
    pub fn from_parts(year: Option<&str>, month: Option<&str>, day: Option<&str>) -> Option<Self> {
        let year = year.map(str::trim).filter(|s| !s.is_empty());
        let month = month.map(str::trim).filter(|s| !s.is_empty());
        let day = day.map(str::trim).filter(|s| !s.is_empty());

        if year.is_none() && month.is_none() && day.is_none() {
            return None;
        }

        let freeform = || {
            let text = [year, month, day]
                .iter()
                .flatten()
                .copied()
                .collect::<Vec<_>>()
                .join(" ");
            Some(PublicationDate::Freeform(text))
        };

        let Some(y) = year.and_then(|y| y.parse::<i32>().ok()) else {
            return freeform();
        };

        let m = match month {
            None => None,
            Some(raw) => match parse_month(raw) {
                Some(m) => Some(m),
                None => return freeform(),
            },
        };

        let d = match (m, day) {
            (_, None) => None,
            (None, Some(_)) => return freeform(),
            (Some(m), Some(raw)) => match raw.parse::<u32>() {
                Ok(d) if NaiveDate::from_ymd_opt(y, m, d).is_some() => Some(d),
                _ => return freeform(),
            },
        };

        Some(PublicationDate::Structured {
            year: y,
            month: m,
            day: d,
        })
    }

    /// Wrap free text such as a MedlineDate. Blank text gives `None`.
    pub fn freeform(text: &str) -> Option<Self> {
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            None
        } else {
            Some(PublicationDate::Freeform(text))
        }
    }
}

fn parse_month(raw: &str) -> Option<u32> {
    if let Ok(n) = raw.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    raw.parse::<Month>().ok().map(|m| m.number_from_month())
}

impl fmt::Display for PublicationDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublicationDate::Structured { year, month, day } => {
                write!(f, "{:04}", year)?;
                if let Some(m) = month {
                    write!(f, "-{:02}", m)?;
                }
                if let Some(d) = day {
                    write!(f, "-{:02}", d)?;
                }
                Ok(())
            }
            PublicationDate::Freeform(text) => f.write_str(text),
        }
    }
}

/// One author of a paper with their classified affiliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    name: String,
    affiliation_text: String,
    is_non_academic: bool,
    company_name: Option<String>,
    email: Option<String>,
}

impl Author {
    /// Create an author from a classification result.
    ///
    /// The company name is only kept when the classification is non-academic.
    pub fn new(
        name: impl Into<String>,
        affiliation_text: impl Into<String>,
        classification: ClassificationResult,
        email: Option<String>,
    ) -> Self {
        let company_name = if classification.is_non_academic {
            classification.company_name
        } else {
            None
        };
        Self {
            name: name.into(),
            affiliation_text: affiliation_text.into(),
            is_non_academic: classification.is_non_academic,
            company_name,
            email,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All affiliation fragments joined in document order
    pub fn affiliation_text(&self) -> &str {
        &self.affiliation_text
    }

    pub fn is_non_academic(&self) -> bool {
        self.is_non_academic
    }

    pub fn company_name(&self) -> Option<&str> {
        self.company_name.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

/// A parsed PubMed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    id: String,
    title: Option<String>,
    publication_date: Option<PublicationDate>,
    authors: Vec<Author>,
}

impl Paper {
    /// PubMed identifier (PMID)
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn publication_date(&self) -> Option<&PublicationDate> {
        self.publication_date.as_ref()
    }

    /// Authors in document order
    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    /// Authors classified as non-academic
    pub fn non_academic_authors(&self) -> impl Iterator<Item = &Author> {
        self.authors.iter().filter(|a| a.is_non_academic())
    }

    pub fn has_non_academic_author(&self) -> bool {
        self.authors.iter().any(Author::is_non_academic)
    }

    /// The first email found across the paper's authors
    pub fn corresponding_email(&self) -> Option<&str> {
        self.authors.iter().find_map(Author::email)
    }
}

/// Builder for constructing Paper objects
#[derive(Debug, Clone)]
pub struct PaperBuilder {
    paper: Paper,
}

impl PaperBuilder {
    /// Create a new builder for the given PMID
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            paper: Paper {
                id: id.into(),
                title: None,
                publication_date: None,
                authors: Vec::new(),
            },
        }
    }

    /// Set title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.paper.title = Some(title.into());
        self
    }

    /// Set publication date
    pub fn publication_date(mut self, date: PublicationDate) -> Self {
        self.paper.publication_date = Some(date);
        self
    }

    /// Append an author
    pub fn author(mut self, author: Author) -> Self {
        self.paper.authors.push(author);
        self
    }

    /// Build the Paper
    pub fn build(self) -> Paper {
        self.paper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(name: &str) -> ClassificationResult {
        ClassificationResult {
            is_non_academic: true,
            matched_company_term: Some("inc".to_string()),
            company_name: Some(name.to_string()),
        }
    }

    #[test]
    fn test_date_numeric_and_named_months() {
        let date = PublicationDate::from_parts(Some("2022"), Some("11"), Some("3")).unwrap();
        assert_eq!(date.to_string(), "2022-11-03");

        let date = PublicationDate::from_parts(Some("2022"), Some("September"), None).unwrap();
        assert_eq!(date.to_string(), "2022-09");

        let date = PublicationDate::from_parts(Some("2019"), None, None).unwrap();
        assert_eq!(date.to_string(), "2019");
    }

    #[test]
    fn test_date_invalid_kept_as_text() {
        let date = PublicationDate::from_parts(Some("2023"), Some("Feb"), Some("30")).unwrap();
        assert_eq!(date, PublicationDate::Freeform("2023 Feb 30".to_string()));

        assert!(PublicationDate::from_parts(None, None, None).is_none());
        assert!(PublicationDate::freeform("   ").is_none());
        assert_eq!(
            PublicationDate::freeform("2023  Jan-Feb").unwrap().to_string(),
            "2023 Jan-Feb"
        );
    }

    #[test]
    fn test_author_company_only_when_non_academic() {
        let mut classification = company("Acme");
        classification.is_non_academic = false;
        let author = Author::new("B", "Somewhere", classification, None);
        assert!(!author.is_non_academic());
        assert!(author.company_name().is_none());

        let author = Author::new("A", "Acme Inc.", company("Acme"), None);
        assert_eq!(author.company_name(), Some("Acme"));
    }

    #[test]
    fn test_paper_builder() {
        let paper = PaperBuilder::new("123456")
            .title("Test Paper")
            .author(Author::new("A", "Acme Inc.", company("Acme"), Some("a@acme.com".to_string())))
            .author(Author::new("B", "", ClassificationResult::default(), Some("b@uni.edu".to_string())))
            .build();

        assert_eq!(paper.id(), "123456");
        assert_eq!(paper.title(), Some("Test Paper"));
        assert!(paper.publication_date().is_none());
        assert!(paper.has_non_academic_author());
        assert_eq!(paper.non_academic_authors().count(), 1);
        assert_eq!(paper.corresponding_email(), Some("a@acme.com"));
    }
}
