//! Conversion of one `PubmedArticle` tree into a [`Paper`].

use crate::affiliation::{extract_email, extract_emails, AffiliationClassifier};
use crate::models::{Author, Paper, PaperBuilder, PublicationDate};

use super::document::{document_identifier, split_article_set, Element};
use super::ParseError;

/// Separator placed between an author's affiliation fragments.
pub const AFFILIATION_SEPARATOR: &str = "; ";

/// Papers and per-record failures from one efetch payload.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub papers: Vec<Paper>,
    pub failures: Vec<ParseError>,
}

impl BatchOutcome {
    /// Number of documents seen, parsed or not
    pub fn total(&self) -> usize {
        self.papers.len() + self.failures.len()
    }
}

/// Turns raw PubMed records into classified papers.
#[derive(Debug, Clone, Default)]
pub struct RecordParser {
    classifier: AffiliationClassifier,
}

impl RecordParser {
    pub fn new(classifier: AffiliationClassifier) -> Self {
        Self { classifier }
    }

    /// Parse every record in an efetch payload.
    ///
    /// A record that cannot be parsed is logged and skipped; the rest of the
    /// batch is unaffected.
    pub fn parse_batch(&self, xml: &str) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for (index, document) in split_article_set(xml).into_iter().enumerate() {
            match document.and_then(|doc| self.parse_document(&doc)) {
                Ok(paper) => outcome.papers.push(paper),
                Err(err) => {
                    let err = err.or_identifier(format!("record #{}", index + 1));
                    tracing::warn!(identifier = %err.identifier(), "Skipping record: {}", err);
                    outcome.failures.push(err);
                }
            }
        }

        tracing::info!(
            "Parsed {} of {} records ({} skipped)",
            outcome.papers.len(),
            outcome.total(),
            outcome.failures.len()
        );
        outcome
    }

    /// Parse one `PubmedArticle` element.
    ///
    /// `MedlineCitation` and its `PMID` are required; title, date and
    /// authors may be missing.
    pub fn parse_document(&self, article: &Element) -> Result<Paper, ParseError> {
        let Some(citation) = article.child("MedlineCitation") else {
            return Err(ParseError::malformed(
                super::UNKNOWN_IDENTIFIER,
                "missing MedlineCitation",
            ));
        };
        let Some(pmid) = document_identifier(article) else {
            return Err(ParseError::malformed(super::UNKNOWN_IDENTIFIER, "missing PMID"));
        };

        let mut builder = PaperBuilder::new(pmid.clone());
        let Some(article_el) = citation.child("Article") else {
            tracing::debug!(pmid = %pmid, "record has no Article element");
            return Ok(builder.build());
        };

        if let Some(title) = article_el
            .child("ArticleTitle")
            .and_then(Element::non_empty_text)
            .or_else(|| article_el.child("VernacularTitle").and_then(Element::non_empty_text))
        {
            builder = builder.title(title);
        }

        if let Some(date) = publication_date(article_el) {
            builder = builder.publication_date(date);
        }

        let mut email_found = false;
        if let Some(author_list) = article_el.child("AuthorList") {
            for author_el in author_list.children("Author") {
                let author = self.parse_author(author_el, !email_found);
                email_found |= author.email().is_some();
                builder = builder.author(author);
            }
        }

        Ok(builder.build())
    }

    fn parse_author(&self, author: &Element, look_for_email: bool) -> Author {
        let name = author_name(author);

        let mut fragments: Vec<String> = author
            .children("AffiliationInfo")
            .filter_map(|info| info.child("Affiliation"))
            .filter_map(Element::non_empty_text)
            .collect();
        if fragments.is_empty() {
            fragments.extend(author.children("Affiliation").filter_map(Element::non_empty_text));
        }
        let affiliation_text = fragments.join(AFFILIATION_SEPARATOR);

        let classification = self.classifier.classify(&affiliation_text);

        let email = if look_for_email {
            author
                .child("Email")
                .and_then(|e| extract_emails(&e.text()).into_iter().next())
                .or_else(|| extract_email(&affiliation_text))
        } else {
            None
        };

        Author::new(name, affiliation_text, classification, email)
    }
}

fn author_name(author: &Element) -> String {
    if let Some(collective) = author.child("CollectiveName").and_then(Element::non_empty_text) {
        return collective;
    }
    let given = author
        .child("ForeName")
        .and_then(Element::non_empty_text)
        .or_else(|| author.child("Initials").and_then(Element::non_empty_text));
    let last = author.child("LastName").and_then(Element::non_empty_text);

    [given, last].into_iter().flatten().collect::<Vec<_>>().join(" ")
}

fn date_from(el: &Element) -> Option<PublicationDate> {
    let part = |name: &str| el.child(name).map(Element::text);
    PublicationDate::from_parts(
        part("Year").as_deref(),
        part("Month").as_deref(),
        part("Day").as_deref(),
    )
}

fn publication_date(article: &Element) -> Option<PublicationDate> {
    let from_issue = article
        .find(&["Journal", "JournalIssue", "PubDate"])
        .and_then(|pub_date| match pub_date.child("MedlineDate") {
            Some(medline) => PublicationDate::freeform(&medline.text()),
            None => date_from(pub_date),
        });

    from_issue.or_else(|| article.child("ArticleDate").and_then(date_from))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_el(name: &str, text: &str) -> Element {
        Element::new(name).with_text(text)
    }

    fn author_el(fore: &str, last: &str, affiliations: &[&str]) -> Element {
        let mut el = Element::new("Author")
            .with_child(text_el("LastName", last))
            .with_child(text_el("ForeName", fore));
        for aff in affiliations {
            el = el.with_child(Element::new("AffiliationInfo").with_child(text_el("Affiliation", aff)));
        }
        el
    }

    fn article(pmid: &str, authors: Vec<Element>) -> Element {
        let mut author_list = Element::new("AuthorList");
        for a in authors {
            author_list = author_list.with_child(a);
        }
        Element::new("PubmedArticle").with_child(
            Element::new("MedlineCitation")
                .with_child(text_el("PMID", pmid))
                .with_child(
                    Element::new("Article")
                        .with_child(
                            Element::new("Journal").with_child(
                                Element::new("JournalIssue").with_child(
                                    Element::new("PubDate")
                                        .with_child(text_el("Year", "2023"))
                                        .with_child(text_el("Month", "Mar")),
                                ),
                            ),
                        )
                        .with_child(text_el("ArticleTitle", "A test paper"))
                        .with_child(author_list),
                ),
        )
    }

    #[test]
    fn test_parse_document_fields() {
        let doc = article(
            "123",
            vec![
                author_el("Jane", "Roe", &["Dept of Biology, Harvard University, jroe@harvard.edu"]),
                author_el("John", "Doe", &["Acme Pharmaceuticals Inc., Boston", "jdoe@acme.com"]),
            ],
        );
        let paper = RecordParser::default().parse_document(&doc).unwrap();

        assert_eq!(paper.id(), "123");
        assert_eq!(paper.title(), Some("A test paper"));
        assert_eq!(paper.publication_date().unwrap().to_string(), "2023-03");

        let authors = paper.authors();
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0].name(), "Jane Roe");
        assert!(!authors[0].is_non_academic());
        assert_eq!(authors[0].email(), Some("jroe@harvard.edu"));

        assert_eq!(authors[1].name(), "John Doe");
        assert_eq!(authors[1].affiliation_text(), "Acme Pharmaceuticals Inc., Boston; jdoe@acme.com");
        assert!(authors[1].is_non_academic());
        assert_eq!(authors[1].company_name(), Some("Acme Pharmaceuticals"));
        // only the first email of the paper is extracted
        assert_eq!(authors[1].email(), None);
        assert_eq!(paper.corresponding_email(), Some("jroe@harvard.edu"));
    }

    #[test]
    fn test_email_element_takes_first_address() {
        let author = author_el("Ana", "Silva", &["Acme Biotech, Lisbon. ana@lab.example.org"])
            .with_child(text_el("Email", "first@corp.com; second@corp.com"));
        let paper = RecordParser::default()
            .parse_document(&article("77", vec![author]))
            .unwrap();
        assert_eq!(paper.corresponding_email(), Some("first@corp.com"));
    }

    #[test]
    fn test_missing_title_and_date_tolerated() {
        let doc = Element::new("PubmedArticle").with_child(
            Element::new("MedlineCitation")
                .with_child(text_el("PMID", "42"))
                .with_child(Element::new("Article")),
        );
        let paper = RecordParser::default().parse_document(&doc).unwrap();
        assert_eq!(paper.id(), "42");
        assert!(paper.title().is_none());
        assert!(paper.publication_date().is_none());
        assert!(paper.authors().is_empty());
    }

    #[test]
    fn test_missing_citation_is_malformed() {
        let doc = Element::new("PubmedArticle").with_child(Element::new("PubmedData"));
        let err = RecordParser::default().parse_document(&doc).unwrap_err();
        assert!(matches!(err, ParseError::MalformedDocument { .. }));

        let doc = Element::new("PubmedArticle").with_child(Element::new("MedlineCitation"));
        assert!(RecordParser::default().parse_document(&doc).is_err());
    }

    #[test]
    fn test_collective_and_initials_names() {
        let collective = Element::new("Author").with_child(text_el("CollectiveName", "COVID Study Group"));
        assert_eq!(author_name(&collective), "COVID Study Group");

        let initials = Element::new("Author")
            .with_child(text_el("LastName", "Smith"))
            .with_child(text_el("Initials", "JA"));
        assert_eq!(author_name(&initials), "JA Smith");
    }

    #[test]
    fn test_medline_date_fallback() {
        let el = Element::new("Article").with_child(
            Element::new("Journal").with_child(
                Element::new("JournalIssue").with_child(
                    Element::new("PubDate").with_child(text_el("MedlineDate", "2021 Nov-Dec")),
                ),
            ),
        );
        assert_eq!(publication_date(&el).unwrap().to_string(), "2021 Nov-Dec");

        let el = Element::new("Article").with_child(
            Element::new("ArticleDate")
                .with_child(text_el("Year", "2020"))
                .with_child(text_el("Month", "07"))
                .with_child(text_el("Day", "14")),
        );
        assert_eq!(publication_date(&el).unwrap().to_string(), "2020-07-14");
    }

    #[test]
    fn test_parse_is_idempotent() {
        let doc = article("7", vec![author_el("A", "B", &["Genentech Inc., South San Francisco"])]);
        let parser = RecordParser::default();
        assert_eq!(parser.parse_document(&doc).unwrap(), parser.parse_document(&doc).unwrap());
    }
}
