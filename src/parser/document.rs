//! Streaming split of an E-utilities `PubmedArticleSet` into per-record trees.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::ParseError;

/// Element name of one record in an efetch payload.
pub const ARTICLE_ELEMENT: &str = "PubmedArticle";

/// A lightweight XML element tree.
///
/// `text` holds the element's character data with descendant text
/// concatenated in document order, so inline markup such as `<i>` inside a
/// title is flattened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append text (builder style, used by fixtures)
    pub fn with_text(mut self, text: &str) -> Self {
        self.text.push_str(text);
        self
    }

    /// Append a child (builder style, used by fixtures)
    pub fn with_child(mut self, child: Element) -> Self {
        self.push_child(child);
        self
    }

    pub fn push_child(&mut self, child: Element) {
        self.text.push_str(&child.text);
        self.children.push(child);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First direct child with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given name, in document order
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follow a path of first-match children
    pub fn find(&self, path: &[&str]) -> Option<&Element> {
        path.iter().try_fold(self, |el, name| el.child(name))
    }

    /// Text with whitespace collapsed
    pub fn text(&self) -> String {
        self.text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Collapsed text, or `None` when blank
    pub fn non_empty_text(&self) -> Option<String> {
        Some(self.text()).filter(|t| !t.is_empty())
    }

    fn from_start(start: &BytesStart<'_>) -> Self {
        let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));
        for attr in start.attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = match attr.unescape_value() {
                Ok(v) => v.into_owned(),
                Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
            };
            element.attributes.push((key, value));
        }
        element
    }
}

/// The PMID of a `PubmedArticle` element, if present.
pub(crate) fn document_identifier(article: &Element) -> Option<String> {
    article
        .find(&["MedlineCitation", "PMID"])
        .and_then(Element::non_empty_text)
}

/// Look for a PMID among the elements currently being built.
fn partial_identifier(stack: &[Element]) -> Option<String> {
    stack.iter().rev().find_map(|el| {
        el.child("PMID")
            .and_then(Element::non_empty_text)
            .or_else(|| document_identifier(el))
    })
}

fn identifier_or_unknown(stack: &[Element]) -> String {
    partial_identifier(stack).unwrap_or_else(|| super::UNKNOWN_IDENTIFIER.to_string())
}

/// Split an efetch payload into one element tree per `PubmedArticle`.
///
/// A text or entity error poisons only the record it occurs in. A syntax
/// error poisons the record being read and ends the scan, keeping the
/// records completed before it. Empty input yields no documents.
pub fn split_article_set(xml: &str) -> Vec<Result<Element, ParseError>> {
    let mut documents = Vec::new();
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut poisoned: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                if !stack.is_empty() || start.name().as_ref() == ARTICLE_ELEMENT.as_bytes() {
                    stack.push(Element::from_start(&start));
                }
            }
            Ok(Event::Empty(start)) => {
                let element = Element::from_start(&start);
                match stack.last_mut() {
                    Some(parent) => parent.push_child(element),
                    None if element.name == ARTICLE_ELEMENT => documents.push(Ok(element)),
                    None => {}
                }
            }
            Ok(Event::End(_)) => {
                let Some(element) = stack.pop() else {
                    continue;
                };
                match stack.last_mut() {
                    Some(parent) => parent.push_child(element),
                    None => match poisoned.take() {
                        Some(reason) => documents.push(Err(ParseError::malformed(
                            identifier_or_unknown(std::slice::from_ref(&element)),
                            reason,
                        ))),
                        None => documents.push(Ok(element)),
                    },
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(current) = stack.last_mut() {
                    match text.unescape() {
                        Ok(s) => current.text.push_str(&s),
                        Err(e) => {
                            poisoned.get_or_insert_with(|| format!("invalid text: {}", e));
                        }
                    }
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok(Event::Eof) => {
                if !stack.is_empty() {
                    documents.push(Err(ParseError::malformed(
                        identifier_or_unknown(&stack),
                        "document ended inside the record",
                    )));
                }
                break;
            }
            Ok(_) => {}
            Err(e) => {
                let position = reader.buffer_position();
                tracing::debug!("XML syntax error at byte {}: {}", position, e);
                documents.push(Err(ParseError::malformed(
                    identifier_or_unknown(&stack),
                    format!("XML syntax error at byte {}: {}", position, e),
                )));
                break;
            }
        }
    }

    documents
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_two_articles() {
        let xml = r#"<?xml version="1.0" ?>
<!DOCTYPE PubmedArticleSet PUBLIC "-//NLM//DTD PubMedArticle, 1st January 2024//EN" "https://dtd.nlm.nih.gov/ncbi/pubmed/out/pubmed_240101.dtd">
<PubmedArticleSet>
  <PubmedArticle><MedlineCitation><PMID Version="1">111</PMID></MedlineCitation></PubmedArticle>
  <PubmedArticle><MedlineCitation><PMID Version="1">222</PMID></MedlineCitation></PubmedArticle>
</PubmedArticleSet>"#;

        let docs = split_article_set(xml);
        assert_eq!(docs.len(), 2);
        let first = docs[0].as_ref().unwrap();
        let pmid = first.find(&["MedlineCitation", "PMID"]).unwrap();
        assert_eq!(pmid.text(), "111");
        assert_eq!(pmid.attribute("Version"), Some("1"));
    }

    #[test]
    fn test_inline_markup_is_flattened() {
        let xml = "<PubmedArticleSet><PubmedArticle><ArticleTitle>Role of <i>TP53</i> in\n   cancer &amp; aging</ArticleTitle></PubmedArticle></PubmedArticleSet>";
        let docs = split_article_set(xml);
        let title = docs[0].as_ref().unwrap().child("ArticleTitle").unwrap();
        assert_eq!(title.text(), "Role of TP53 in cancer & aging");
    }

    #[test]
    fn test_syntax_error_keeps_previous_records() {
        let xml = "<PubmedArticleSet>\
            <PubmedArticle><MedlineCitation><PMID>111</PMID></MedlineCitation></PubmedArticle>\
            <PubmedArticle><MedlineCitation><PMID>222</PMID><Article></MedlineCitation></PubmedArticle>\
            </PubmedArticleSet>";
        let docs = split_article_set(xml);
        assert_eq!(docs.len(), 2);
        assert!(docs[0].is_ok());
        let err = docs[1].as_ref().unwrap_err();
        assert_eq!(err.identifier(), "222");
    }

    #[test]
    fn test_truncated_record() {
        let xml = "<PubmedArticleSet><PubmedArticle><MedlineCitation><PMID>123456</PMID>";
        let docs = split_article_set(xml);
        assert_eq!(docs.len(), 1);
        assert!(docs[0].is_err());
    }

    #[test]
    fn test_bad_entity_poisons_only_its_record() {
        let xml = "<PubmedArticleSet>\
            <PubmedArticle><MedlineCitation><PMID>1</PMID><X>&bogus;</X></MedlineCitation></PubmedArticle>\
            <PubmedArticle><MedlineCitation><PMID>2</PMID></MedlineCitation></PubmedArticle>\
            </PubmedArticleSet>";
        let docs = split_article_set(xml);
        assert_eq!(docs.len(), 2);
        assert!(docs[0].is_err());
        assert!(docs[1].is_ok());
    }

    #[test]
    fn test_empty_input() {
        assert!(split_article_set("").is_empty());
        assert!(split_article_set("<PubmedArticleSet></PubmedArticleSet>").is_empty());
    }

    #[test]
    fn test_builder_helpers() {
        let el = Element::new("Author")
            .with_child(Element::new("LastName").with_text("Doe"))
            .with_child(Element::new("ForeName").with_text("Jane"));
        assert_eq!(el.find(&["LastName"]).unwrap().text(), "Doe");
        assert_eq!(el.children("ForeName").count(), 1);
        assert!(el.find(&["Missing", "Path"]).is_none());
    }
}
