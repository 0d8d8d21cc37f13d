//! Page content extraction
//!
//! `ContentExtractor` turns URLs into [`PageRecord`]s: it consults the
//! response cache, waits on the domain rate limiter (honouring the host's
//! robots.txt `Crawl-delay`), fetches the page and
//! extracts cleaned text, metadata, links, and images. Every failure becomes
//! an error record for that URL; nothing is raised to the caller.

mod html;
mod record;

pub use html::{collapse_whitespace, extract_page, STRIPPED_ELEMENTS};
pub use record::{ImageRef, LinkRef, PageRecord, PageStatus};

use crate::cache::ResponseCache;
use crate::config::Config;
use crate::crawler::Fetcher;
use crate::robots::RobotsGate;
use crate::state::DomainRateLimiter;
use crate::ScraperError;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Whether a Content-Type can be treated as markup
///
/// An absent header is accepted; servers often omit it for HTML.
fn is_markup(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.is_empty()
        || content_type.contains("html")
        || content_type.contains("xml")
        || content_type.starts_with("text/")
}

/// Fetches pages and extracts their content
pub struct ContentExtractor {
    fetcher: Arc<dyn Fetcher>,
    robots: Arc<RobotsGate>,
    limiter: Arc<DomainRateLimiter>,
    cache: Arc<ResponseCache>,
    user_agent: String,
    max_text_length: usize,
    parallel: usize,
}

impl ContentExtractor {
    pub fn new(
        config: &Config,
        fetcher: Arc<dyn Fetcher>,
        robots: Arc<RobotsGate>,
        limiter: Arc<DomainRateLimiter>,
        cache: Arc<ResponseCache>,
    ) -> Self {
        Self {
            fetcher,
            robots,
            limiter,
            cache,
            user_agent: config.user_agent_header().to_string(),
            max_text_length: config.extraction.max_text_length,
            parallel: config.crawler.parallel_requests.max(1),
        }
    }

    /// Produces the record for one URL
    ///
    /// A fresh cached record is returned without any network access.
    /// Successful records are written back to the cache; error records are not.
    pub async fn process_page(&self, url: &str) -> PageRecord {
        let span = tracing::debug_span!("extract", url = %url);
        self.process(url).instrument(span).await
    }

    async fn process(&self, url: &str) -> PageRecord {
        if let Some(record) = self.cache.get_page(url) {
            tracing::debug!("Using cached record");
            return record;
        }

        let record = match self.fetch_and_extract(url).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("{}", e);
                return PageRecord::error(url, e.to_string());
            }
        };

        if let Err(e) = self.cache.set_page(url, &record) {
            tracing::warn!("Failed to cache {}: {}", url, e);
        }
        record
    }

    async fn fetch_and_extract(&self, url: &str) -> Result<PageRecord, ScraperError> {
        let delay = self
            .robots
            .polite_delay(url, &self.user_agent, self.limiter.delay())
            .await;
        self.limiter.wait_with_delay(url, delay).await;

        let response = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|e| ScraperError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !is_markup(&response.content_type) {
            return Err(ScraperError::HtmlParse {
                url: url.to_string(),
                message: format!("unsupported content type {}", response.content_type),
            });
        }

        Ok(extract_page(url, &response.body, self.max_text_length))
    }

    /// Processes every URL independently, preserving input order
    ///
    /// One page's failure never affects the others; the result has exactly
    /// one record per URL.
    pub async fn process_multiple_pages(&self, urls: &[String]) -> Vec<PageRecord> {
        self.process_until_cancelled(urls, &CancellationToken::new())
            .await
    }

    /// Like [`process_multiple_pages`](Self::process_multiple_pages), but
    /// stops starting new pages once `cancel` fires
    ///
    /// Pages already started run to completion; URLs never started get no
    /// record.
    pub async fn process_until_cancelled(
        &self,
        urls: &[String],
        cancel: &CancellationToken,
    ) -> Vec<PageRecord> {
        let records: Vec<PageRecord> = stream::iter(urls)
            .take_while(|_| futures::future::ready(!cancel.is_cancelled()))
            .map(|url| self.process_page(url))
            .buffered(self.parallel)
            .collect()
            .await;

        let failed = records.iter().filter(|r| !r.is_success()).count();
        tracing::info!(
            "Extracted {} pages ({} failed, {} skipped)",
            records.len(),
            failed,
            urls.len() - records.len()
        );
        records
    }
}
