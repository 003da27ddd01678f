//! PubMed record source using the NCBI E-utilities API.

use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::PubMedConfig;
use crate::models::SearchQuery;
use crate::sources::{Source, SourceError};
use crate::utils::{with_retry, HttpClient, RetryConfig};

/// E-utilities base URL
pub const PUBMED_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Bounds used for open-ended year ranges ("2010-", "-2015")
const EARLIEST_YEAR: &str = "1800";
const LATEST_YEAR: &str = "3000";

/// PubMed research source
///
/// Uses esearch to turn a query into PMIDs and efetch to retrieve the
/// records as XML.
#[derive(Debug, Clone)]
pub struct PubMedSource {
    client: Arc<HttpClient>,
    base_url: String,
    api_key: Option<String>,
    email: Option<String>,
    tool: Option<String>,
    retry: RetryConfig,
}

impl PubMedSource {
    /// Create a new PubMed source with default settings
    pub fn new() -> Result<Self, SourceError> {
        Self::from_config(&PubMedConfig::default(), RetryConfig::default())
    }

    /// Create a source from configuration
    pub fn from_config(config: &PubMedConfig, retry: RetryConfig) -> Result<Self, SourceError> {
        let client = HttpClient::with_timeout(Duration::from_secs(config.timeout_secs))?;
        Ok(Self::with_client(Arc::new(client), config, retry))
    }

    /// Create with a custom HTTP client (for testing)
    pub fn with_client(client: Arc<HttpClient>, config: &PubMedConfig, retry: RetryConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            email: config.email.clone().filter(|e| !e.is_empty()),
            tool: config.tool.clone().filter(|t| !t.is_empty()),
            retry,
        }
    }

    /// Parameters NCBI asks every client to send
    fn common_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(key) = &self.api_key {
            params.push(("api_key".to_string(), key.clone()));
        }
        if let Some(email) = &self.email {
            params.push(("email".to_string(), email.clone()));
        }
        if let Some(tool) = &self.tool {
            params.push(("tool".to_string(), tool.clone()));
        }
        params
    }

    fn encode_params(params: &[(String, String)]) -> String {
        params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// The esearch term: the query, restricted to the given IDs if any
    fn search_term(query: &SearchQuery) -> String {
        let term = query.query.trim();
        if query.ids.is_empty() {
            return term.to_string();
        }
        let ids = query
            .ids
            .iter()
            .map(|id| format!("{}[uid]", id))
            .collect::<Vec<_>>()
            .join(" OR ");
        format!("({}) AND ({})", term, ids)
    }

    /// Translate a year filter into esearch mindate/maxdate
    fn date_range(year: &str) -> Result<(String, String), SourceError> {
        let year = year.trim();
        let valid = |y: &str| y.len() == 4 && y.chars().all(|c| c.is_ascii_digit());

        let (min, max) = if let Some(until) = year.strip_prefix('-') {
            (EARLIEST_YEAR, until)
        } else if let Some(from) = year.strip_suffix('-') {
            (from, LATEST_YEAR)
        } else if let Some((from, to)) = year.split_once('-') {
            (from, to)
        } else {
            (year, year)
        };

        if !valid(min) || !valid(max) {
            return Err(SourceError::InvalidRequest(format!(
                "Invalid year filter '{}' (expected 2020, 2018-2022, 2010- or -2015)",
                year
            )));
        }
        Ok((min.to_string(), max.to_string()))
    }

    /// Build E-utilities search URL
    fn build_search_url(&self, query: &SearchQuery) -> Result<String, SourceError> {
        let mut params = vec![
            ("db".to_string(), "pubmed".to_string()),
            ("term".to_string(), Self::search_term(query)),
            ("retmax".to_string(), query.max_results.to_string()),
            ("retmode".to_string(), "xml".to_string()),
        ];

        if let Some(year) = &query.year {
            let (min, max) = Self::date_range(year)?;
            params.push(("datetype".to_string(), "pdat".to_string()));
            params.push(("mindate".to_string(), min));
            params.push(("maxdate".to_string(), max));
        }

        params.extend(self.common_params());
        Ok(format!(
            "{}/esearch.fcgi?{}",
            self.base_url,
            Self::encode_params(&params)
        ))
    }

    /// Build E-utilities fetch URL for specific PubMed IDs
    fn build_fetch_url(&self, ids: &[String]) -> String {
        let mut params = vec![
            ("db".to_string(), "pubmed".to_string()),
            ("id".to_string(), ids.join(",")),
            ("retmode".to_string(), "xml".to_string()),
        ];
        params.extend(self.common_params());
        format!("{}/efetch.fcgi?{}", self.base_url, Self::encode_params(&params))
    }

    /// Parse E-utilities search response XML
    fn parse_search_response(xml: &str) -> Result<Vec<String>, SourceError> {
        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct ESearchResult {
            Count: Option<u64>,
            IdList: Option<IdList>,
            ERROR: Option<String>,
        }

        #[derive(Debug, Deserialize)]
        struct IdList {
            #[serde(rename = "Id", default)]
            ids: Vec<String>,
        }

        let result: ESearchResult = from_str(xml)?;

        if let Some(error) = result.ERROR {
            return Err(SourceError::Api(format!("PubMed search failed: {}", error)));
        }

        let ids: Vec<String> = result
            .IdList
            .map(|list| list.ids)
            .unwrap_or_default()
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();

        tracing::debug!(
            "PubMed search matched {} records, returning {}",
            result.Count.unwrap_or(ids.len() as u64),
            ids.len()
        );
        Ok(ids)
    }

    /// GET a URL with retry on transient failures
    async fn get_text(&self, url: String, action: &'static str) -> Result<String, SourceError> {
        let client = Arc::clone(&self.client);

        with_retry(self.retry, || {
            let client = Arc::clone(&client);
            let url = url.clone();
            async move {
                let response = client
                    .client()
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| SourceError::Network(format!("Failed to {}: {}", action, e)))?;

                let status = response.status();
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    tracing::debug!("PubMed API rate-limited");
                    return Err(SourceError::RateLimit);
                }
                if status.is_server_error() {
                    return Err(SourceError::Server(status.as_u16()));
                }
                if !status.is_success() {
                    return Err(SourceError::Api(format!(
                        "PubMed API returned status {} while trying to {}",
                        status, action
                    )));
                }

                response
                    .text()
                    .await
                    .map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))
            }
        })
        .await
    }

    /// Resolve the query to PMIDs with esearch
    async fn search_ids(&self, query: &SearchQuery) -> Result<Vec<String>, SourceError> {
        let url = self.build_search_url(query)?;
        tracing::debug!("Searching PubMed for {}", query.describe());
        let xml = self.get_text(url, "search PubMed").await?;
        Self::parse_search_response(&xml)
    }
}

#[async_trait]
impl Source for PubMedSource {
    fn id(&self) -> &str {
        "pubmed"
    }

    fn name(&self) -> &str {
        "PubMed"
    }

    async fn fetch_documents(&self, query: &SearchQuery) -> Result<String, SourceError> {
        if query.is_empty() {
            return Err(SourceError::InvalidRequest(
                "a search query or at least one PubMed ID is required".to_string(),
            ));
        }
        for id in &query.ids {
            self.validate_id(id)?;
        }

        let ids = if query.query.trim().is_empty() {
            query.ids.clone()
        } else {
            self.search_ids(query).await?
        };

        if ids.is_empty() {
            tracing::info!("No articles found for {}", query.describe());
            return Ok(String::new());
        }

        tracing::debug!("Fetching {} PubMed records", ids.len());
        self.get_text(self.build_fetch_url(&ids), "fetch PubMed records")
            .await
    }

    fn validate_id(&self, id: &str) -> Result<(), SourceError> {
        if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
            Ok(())
        } else {
            Err(SourceError::InvalidRequest(format!(
                "'{}' is not a PubMed ID (digits only)",
                id
            )))
        }
    }
}
