//! Utilities shared by the sources and the CLI.
//!
//! - [`HttpClient`]: reqwest client with timeouts and a crate user agent
//! - [`RetryConfig`] / [`with_retry`]: bounded retry with exponential backoff
//! - [`truncate_with_ellipsis`], [`terminal_width`]: terminal display helpers
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use pubmed_affiliations::sources::SourceError;
//! use pubmed_affiliations::utils::{with_retry, RetryConfig};
//!
//! # async fn fetch_data() -> Result<String, SourceError> { Ok("data".to_string()) }
//! # #[tokio::main]
//! # async fn main() -> Result<(), SourceError> {
//! let config = RetryConfig { max_attempts: 3, ..RetryConfig::default() };
//! let body = with_retry(config, || fetch_data()).await?;
//! # Ok(())
//! # }
//! ```

mod display;
mod http;
mod retry;

pub use display::{is_terminal, terminal_width, truncate_with_ellipsis, DEFAULT_WIDTH};
pub use http::{HttpClient, DEFAULT_TIMEOUT};
pub use retry::{with_retry, RetryConfig, TransientError};
