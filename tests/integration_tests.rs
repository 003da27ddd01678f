//! Integration tests for PubMed Affiliations
//!
//! These tests run the full fetch → parse → report pipeline against a mock
//! E-utilities server and against saved efetch files.

use mockito::Matcher;
use pubmed_affiliations::config::PubMedConfig;
use pubmed_affiliations::report::{write_csv_file, ReportFilter, ReportRow};
use pubmed_affiliations::sources::{FileSource, PubMedSource, Source, SourceError};
use pubmed_affiliations::utils::RetryConfig;
use pubmed_affiliations::{Error, Pipeline, RecordParser, SearchQuery};
use std::sync::Arc;
use std::time::Duration;

const EFETCH_SAMPLE: &str = include_str!("fixtures/efetch_sample.xml");

const ESEARCH_TWO_IDS: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<!DOCTYPE eSearchResult PUBLIC "-//NLM//DTD esearch 20060628//EN" "https://eutils.ncbi.nlm.nih.gov/eutils/dtd/20060628/esearch.dtd">
<eSearchResult><Count>2</Count><RetMax>2</RetMax><RetStart>0</RetStart>
<IdList><Id>38100001</Id><Id>38100004</Id></IdList>
<TranslationSet/><QueryTranslation>kras[All Fields]</QueryTranslation>
</eSearchResult>"#;

const ESEARCH_EMPTY: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<eSearchResult><Count>0</Count><RetMax>0</RetMax><RetStart>0</RetStart><IdList/>
<ErrorList><PhraseNotFound>zzzzqqq</PhraseNotFound></ErrorList>
</eSearchResult>"#;

fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        ..RetryConfig::default()
    }
}

fn pubmed_source(base_url: &str, retry: RetryConfig) -> PubMedSource {
    let config = PubMedConfig {
        base_url: base_url.to_string(),
        api_key: Some("test-key".to_string()),
        timeout_secs: 5,
        ..PubMedConfig::default()
    };
    PubMedSource::from_config(&config, retry).unwrap()
}

fn pipeline(source: impl Source + 'static, filter: ReportFilter) -> Pipeline {
    Pipeline::new(Arc::new(source), RecordParser::default(), filter)
}

#[tokio::test]
async fn test_search_and_fetch_end_to_end() {
    let mut server = mockito::Server::new_async().await;

    let search = server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("db".into(), "pubmed".into()),
            Matcher::UrlEncoded("term".into(), "kras".into()),
            Matcher::UrlEncoded("retmax".into(), "20".into()),
            Matcher::UrlEncoded("api_key".into(), "test-key".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "text/xml")
        .with_body(ESEARCH_TWO_IDS)
        .expect(1)
        .create_async()
        .await;

    let fetch = server
        .mock("GET", "/efetch.fcgi")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("id".into(), "38100001,38100004".into()),
            Matcher::UrlEncoded("retmode".into(), "xml".into()),
        ]))
        .with_status(200)
        .with_body(EFETCH_SAMPLE)
        .expect(1)
        .create_async()
        .await;

    let source = pubmed_source(&server.url(), fast_retry(3));
    let summary = pipeline(source, ReportFilter::NonAcademicOnly)
        .run(&SearchQuery::new("kras").max_results(20))
        .await
        .unwrap();

    search.assert_async().await;
    fetch.assert_async().await;

    assert_eq!(summary.papers_parsed, 3);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].identifier(), "record #3");

    assert_eq!(
        summary.rows,
        vec![
            ReportRow {
                pubmed_id: "38100001".to_string(),
                title: "Discovery of a selective KRAS G12C inhibitor.".to_string(),
                publication_date: "2024-01-15".to_string(),
                non_academic_authors: "John Smith; Li Chen".to_string(),
                company_affiliations: "Pfizer".to_string(),
                corresponding_email: "john.smith@pfizer.com".to_string(),
            },
            ReportRow {
                pubmed_id: "38100004".to_string(),
                title: "Biomarkers for early diagnosis, a platform study.".to_string(),
                publication_date: "2022-09".to_string(),
                non_academic_authors: "Chidi Okafor; Yui Tanaka".to_string(),
                company_affiliations: "Genentech; Takeda Pharmaceutical".to_string(),
                corresponding_email: String::new(),
            },
        ]
    );
}

#[tokio::test]
async fn test_ids_only_skip_search() {
    let mut server = mockito::Server::new_async().await;

    let search = server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let fetch = server
        .mock("GET", "/efetch.fcgi")
        .match_query(Matcher::UrlEncoded("id".into(), "38100002".into()))
        .with_status(200)
        .with_body(EFETCH_SAMPLE)
        .expect(1)
        .create_async()
        .await;

    let source = pubmed_source(&server.url(), fast_retry(3));
    let summary = pipeline(source, ReportFilter::IncludeAll)
        .run(&SearchQuery::from_ids(["38100002"]))
        .await
        .unwrap();

    search.assert_async().await;
    fetch.assert_async().await;

    let academic = summary
        .rows
        .iter()
        .find(|row| row.pubmed_id == "38100002")
        .unwrap();
    assert_eq!(academic.publication_date, "2023 Nov-Dec");
    assert_eq!(academic.non_academic_authors, "");
    assert_eq!(academic.corresponding_email, "mgarcia@mgh.harvard.edu");
}

#[tokio::test]
async fn test_empty_search_is_no_results() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(ESEARCH_EMPTY)
        .create_async()
        .await;
    let fetch = server
        .mock("GET", "/efetch.fcgi")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let source = pubmed_source(&server.url(), fast_retry(3));
    let result = pipeline(source, ReportFilter::NonAcademicOnly)
        .run(&SearchQuery::new("zzzzqqq"))
        .await;

    assert!(matches!(result, Err(Error::NoResults { .. })));
    fetch.assert_async().await;
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let mut server = mockito::Server::new_async().await;

    let search = server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_status(500)
        .expect(2)
        .create_async()
        .await;

    let source = pubmed_source(&server.url(), fast_retry(2));
    let result = source.fetch_documents(&SearchQuery::new("kras")).await;

    assert!(matches!(result, Err(SourceError::Server(500))));
    search.assert_async().await;
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let mut server = mockito::Server::new_async().await;

    let search = server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_status(400)
        .expect(1)
        .create_async()
        .await;

    let source = pubmed_source(&server.url(), fast_retry(3));
    let result = source.fetch_documents(&SearchQuery::new("kras")).await;

    assert!(matches!(result, Err(SourceError::Api(_))));
    search.assert_async().await;
}

#[tokio::test]
async fn test_invalid_pmid_rejected_before_request() {
    let mut server = mockito::Server::new_async().await;
    let fetch = server
        .mock("GET", "/efetch.fcgi")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let source = pubmed_source(&server.url(), fast_retry(3));
    let result = source
        .fetch_documents(&SearchQuery::from_ids(["PMC12345"]))
        .await;

    assert!(matches!(result, Err(SourceError::InvalidRequest(_))));
    fetch.assert_async().await;
}

#[tokio::test]
async fn test_saved_file_to_csv() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("efetch.xml");
    std::fs::write(&input, EFETCH_SAMPLE).unwrap();

    let summary = pipeline(FileSource::new(&input), ReportFilter::NonAcademicOnly)
        .run(&SearchQuery::default())
        .await
        .unwrap();
    assert_eq!(summary.rows.len(), 2);

    let output = dir.path().join("reports").join("companies.csv");
    write_csv_file(&summary.rows, &output).unwrap();

    let mut reader = csv::Reader::from_path(&output).unwrap();
    let headers: Vec<String> = reader
        .headers()
        .unwrap()
        .iter()
        .map(String::from)
        .collect();
    assert_eq!(
        headers,
        vec![
            "PubmedID",
            "Title",
            "Publication Date",
            "Non-academic Author(s)",
            "Company Affiliation(s)",
            "Corresponding Author Email",
        ]
    );
    let rows: Vec<ReportRow> = reader.deserialize().collect::<Result<_, _>>().unwrap();
    assert_eq!(rows, summary.rows);
}

#[tokio::test]
async fn test_reparse_is_identical() {
    let parser = RecordParser::default();
    let first = parser.parse_batch(EFETCH_SAMPLE);
    let second = parser.parse_batch(EFETCH_SAMPLE);
    assert_eq!(first.papers, second.papers);
    assert_eq!(first.failures, second.failures);
}
