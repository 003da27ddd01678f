//! Configuration management.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `PUBMED_AFFILIATIONS_*` environment variables. Command-line flags are
//! applied on top by the binary.
//!
//! # Configuration File Format
//!
//! ```toml
//! [pubmed]
//! api_key = "your-ncbi-api-key"
//! email = "you@example.org"
//! max_results = 50
//! timeout_secs = 30
//!
//! [retry]
//! max_attempts = 3
//! initial_delay_ms = 500
//! max_delay_ms = 8000
//!
//! [classifier]
//! extra_academic_terms = ["foundation"]
//! extra_company_terms = ["genomics"]
//!
//! [report]
//! include_all = false
//!
//! [logging]
//! level = "info"
//! format = "text"
//! ```
//!
//! Nested keys map to environment variables with a double underscore, e.g.
//! `PUBMED_AFFILIATIONS_PUBMED__API_KEY`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::affiliation::AffiliationClassifier;
use crate::models::DEFAULT_MAX_RESULTS;
use crate::report::ReportFilter;
use crate::sources::PUBMED_BASE_URL;
use crate::utils::RetryConfig;

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "PUBMED_AFFILIATIONS";

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "pubmed-affiliations.toml";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pubmed: PubMedConfig,
    pub retry: RetrySettings,
    pub classifier: ClassifierConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

/// E-utilities connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PubMedConfig {
    pub base_url: String,

    /// NCBI API key (raises the rate limit from 3 to 10 requests per second)
    pub api_key: Option<String>,

    /// Contact address sent with every request
    pub email: Option<String>,

    /// Tool name sent with every request
    pub tool: Option<String>,

    pub max_results: usize,

    pub timeout_secs: u64,
}

impl Default for PubMedConfig {
    fn default() -> Self {
        Self {
            base_url: PUBMED_BASE_URL.to_string(),
            api_key: None,
            email: None,
            tool: Some(env!("CARGO_PKG_NAME").to_string()),
            max_results: DEFAULT_MAX_RESULTS,
            timeout_secs: crate::utils::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// Retry settings for HTTP calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
            max_delay_ms: 8000,
        }
    }
}

impl RetrySettings {
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts.max(1),
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms.max(self.initial_delay_ms)),
            ..RetryConfig::default()
        }
    }
}

/// Extra classifier terms
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Terms that mark an affiliation as academic
    pub extra_academic_terms: Vec<String>,

    /// Terms that mark an affiliation as a company
    pub extra_company_terms: Vec<String>,
}

impl ClassifierConfig {
    pub fn build_classifier(&self) -> AffiliationClassifier {
        AffiliationClassifier::with_extra_terms(&self.extra_academic_terms, &self.extra_company_terms)
    }
}

/// Report settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Also report papers without company-affiliated authors
    pub include_all: bool,
}

impl ReportConfig {
    pub fn filter(&self) -> ReportFilter {
        ReportFilter::from_include_all(self.include_all)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigFileError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Find the configuration file to use when none is given explicitly.
///
/// `./pubmed-affiliations.toml` wins over the per-user file.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join(env!("CARGO_PKG_NAME")).join("config.toml"))
        .filter(|path| path.is_file())
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("classifier.extra_academic_terms")
        .with_list_parse_key("classifier.extra_company_terms")
}

fn build(path: Option<&Path>, env: config::Environment) -> Result<Config, ConfigFileError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(
            config::File::from(path)
                .format(config::FileFormat::Toml)
                .required(true),
        );
    }
    let settings = builder.add_source(env).build()?;
    Ok(settings.try_deserialize()?)
}

/// Load configuration.
///
/// An explicit `path` must exist; otherwise [`find_config_file`] is used and
/// a missing file simply means defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigFileError> {
    let path = match path {
        Some(path) if !path.is_file() => return Err(ConfigFileError::NotFound(path.to_path_buf())),
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(),
    };

    if let Some(path) = &path {
        tracing::debug!("Loading configuration from {}", path.display());
    }
    build(path.as_deref(), environment())
}
