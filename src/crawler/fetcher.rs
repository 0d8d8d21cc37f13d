//! HTTP fetcher implementation
//!
//! This module handles all page requests for the crawler and extractor:
//! - Building the HTTP client with the configured user agent and timeout
//! - Retry logic for transient failures
//! - Error classification
//!
//! Callers depend on the [`Fetcher`] trait rather than on reqwest, so tests
//! can substitute an in-memory site.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Maximum redirect hops followed for a single request
pub const MAX_REDIRECTS: usize = 10;

const BASE_BACKOFF: Duration = Duration::from_millis(250);
const MAX_BACKOFF_EXPONENT: u32 = 5;

/// A successful (2xx) response
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value, empty if absent
    pub content_type: String,
    /// Response body decoded as text
    pub body: String,
}

/// Transport-level failure for a single URL
///
/// These never abort a crawl; the caller records the failure for the page
/// and moves on.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("HTTP status {status}")]
    Http { status: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("failed to read response body: {0}")]
    Body(String),
}

impl FetchError {
    /// Whether another attempt might succeed
    ///
    /// | Condition | Retried |
    /// |-----------|---------|
    /// | HTTP 5xx | yes |
    /// | HTTP 429 | yes |
    /// | Timeout | yes |
    /// | HTTP 404 and other 4xx | no |
    /// | Connection or TLS failure | no |
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Http { status } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
            }
            FetchError::Timeout => true,
            FetchError::Network(_) | FetchError::Body(_) => false,
        }
    }
}

/// Capability to fetch a URL and return its body
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url`; any non-2xx status is an error
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

/// reqwest-backed [`Fetcher`] with retries
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_retries: u32,
}

impl HttpFetcher {
    /// Builds a fetcher from the crawler settings
    ///
    /// # Arguments
    ///
    /// * `config` - Supplies user agent, timeout and retry count
    ///
    /// # Returns
    ///
    /// * `Ok(HttpFetcher)` - Successfully built HTTP client
    /// * `Err(reqwest::Error)` - Failed to build client
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rufus_rag::config::Config;
    /// use rufus_rag::crawler::HttpFetcher;
    ///
    /// let fetcher = HttpFetcher::new(&Config::default()).unwrap();
    /// ```
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(config.crawler.timeout);

        let client = Client::builder()
            .user_agent(config.user_agent_header())
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .redirect(Policy::limited(MAX_REDIRECTS))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            max_retries: config.crawler.max_retries,
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let response = self.client.get(url).send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Body(e.to_string())
            }
        })?;

        Ok(FetchResponse {
            final_url,
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let backoff = backoff_delay(attempt);
                    tracing::debug!(
                        "Retrying {} after {} (attempt {}/{}, waiting {:?})",
                        url,
                        e,
                        attempt + 1,
                        self.max_retries,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Exponential backoff: 250ms, 500ms, 1s, ... capped at 8s
pub fn backoff_delay(attempt: u32) -> Duration {
    BASE_BACKOFF * 2u32.pow(attempt.min(MAX_BACKOFF_EXPONENT))
}

fn classify(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = error.status() {
        FetchError::Http {
            status: status.as_u16(),
        }
    } else {
        FetchError::Network(error.to_string())
    }
}
