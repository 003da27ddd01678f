//! Search request model.

use serde::{Deserialize, Serialize};

/// Default number of records requested from PubMed
pub const DEFAULT_MAX_RESULTS: usize = 50;

/// What to retrieve: a search term, explicit PMIDs, or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// PubMed search term (may be empty when only IDs are given)
    pub query: String,

    /// Explicit PubMed IDs
    pub ids: Vec<String>,

    /// Maximum number of records to fetch
    pub max_results: usize,

    /// Publication year filter ("2020", "2018-2022", "2010-", "-2015")
    pub year: Option<String>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            ids: Vec::new(),
            max_results: DEFAULT_MAX_RESULTS,
            year: None,
        }
    }
}

impl SearchQuery {
    /// Create a new search query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Create a query for explicit PubMed IDs
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::default().ids(ids)
    }

    /// Set explicit PubMed IDs (blank entries are dropped)
    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = ids
            .into_iter()
            .map(|id| {
                let id: String = id.into();
                id.trim().to_string()
            })
            .filter(|id| !id.is_empty())
            .collect();
        self
    }

    /// Set maximum results
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Set year filter
    pub fn year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    /// True when there is neither a term nor any ID
    pub fn is_empty(&self) -> bool {
        self.query.trim().is_empty() && self.ids.is_empty()
    }

    /// Short human description for log and error messages
    pub fn describe(&self) -> String {
        match (self.query.trim().is_empty(), self.ids.is_empty()) {
            (false, true) => format!("'{}'", self.query.trim()),
            (true, false) => format!("ids {}", self.ids.join(",")),
            (false, false) => format!("'{}' (ids {})", self.query.trim(), self.ids.join(",")),
            (true, true) => "<empty query>".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder() {
        let query = SearchQuery::new("covid-19").max_results(10).year("2020-2022");
        assert_eq!(query.query, "covid-19");
        assert_eq!(query.max_results, 10);
        assert_eq!(query.year.as_deref(), Some("2020-2022"));
        assert!(query.ids.is_empty());
        assert!(!query.is_empty());
    }

    #[test]
    fn test_ids_are_trimmed() {
        let query = SearchQuery::from_ids([" 123 ", "", "456"]);
        assert_eq!(query.ids, vec!["123", "456"]);
        assert_eq!(query.max_results, DEFAULT_MAX_RESULTS);
        assert_eq!(query.describe(), "ids 123,456");
    }

    #[test]
    fn test_empty_query() {
        assert!(SearchQuery::default().is_empty());
        assert!(SearchQuery::new("   ").is_empty());
    }
}
