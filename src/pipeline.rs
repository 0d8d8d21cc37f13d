//! Crawl, extract and filter pipeline
//!
//! # Request Flow
//!
//! 1. Crawl from the seed to collect candidate URLs
//! 2. Add the seed itself, dedupe, and drop URLs robots.txt disallows
//! 3. Extract every remaining page (cached pages skip the network)
//! 4. Rank the successful pages against the query
//!
//! A failure to embed the query leaves `relevant` empty and is reported in
//! `relevance_error`; the extracted pages are still returned.

use crate::cache::{cache_key, ResponseCache};
use crate::config::{validate, Config};
use crate::crawler::{Crawler, Fetcher};
use crate::extract::{ContentExtractor, PageRecord};
use crate::relevance::{Embedder, RelevanceFilter};
use crate::robots::RobotsGate;
use crate::state::DomainRateLimiter;
use crate::url::{dedupe, normalize_url};
use crate::{Result, ScraperError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub use crate::relevance::RelevantItem;

/// Everything one pipeline run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub seed: String,
    pub query: String,
    /// Content language from `[extraction]`
    pub language: String,
    /// One record per extracted URL, successful or not
    pub pages: Vec<PageRecord>,
    /// Content above the similarity threshold
    pub relevant: Vec<RelevantItem>,
    /// Why ranking failed, if it did; `pages` is complete either way
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_error: Option<String>,
    /// Whether the run was cut short by cancellation
    pub cancelled: bool,
}

/// A retrieval-ready document built from one relevant item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagDocument {
    /// Cache key of the source URL, suffixed when a page yields several items
    pub id: String,
    pub url: String,
    pub title: String,
    pub content: String,
    pub metadata: BTreeMap<String, String>,
}

/// Output shape of `--rag-format`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagOutput {
    pub seed: String,
    pub query: String,
    pub documents: Vec<RagDocument>,
}

impl PipelineResult {
    /// Successfully extracted pages
    pub fn successful_pages(&self) -> impl Iterator<Item = &PageRecord> {
        self.pages.iter().filter(|p| p.is_success())
    }

    /// Converts the relevant items into RAG documents
    ///
    /// Page metadata is carried over, plus `language` and `similarity`.
    pub fn to_rag_documents(&self) -> Vec<RagDocument> {
        let pages: HashMap<&str, &PageRecord> =
            self.pages.iter().map(|p| (p.url.as_str(), p)).collect();
        let mut seen_per_url: HashMap<&str, usize> = HashMap::new();

        self.relevant
            .iter()
            .map(|item| {
                let page = pages.get(item.url.as_str());
                let ordinal = seen_per_url.entry(item.url.as_str()).or_insert(0);
                let key = cache_key(&item.url);
                let id = if *ordinal == 0 {
                    key
                } else {
                    format!("{}-{}", key, ordinal)
                };
                *ordinal += 1;

                let mut metadata = page.map(|p| p.metadata.clone()).unwrap_or_default();
                metadata.insert("language".to_string(), self.language.clone());
                metadata.insert("similarity".to_string(), format!("{:.4}", item.similarity));

                RagDocument {
                    id,
                    url: item.url.clone(),
                    title: page.and_then(|p| p.title()).unwrap_or_default().to_string(),
                    content: item.content.clone(),
                    metadata,
                }
            })
            .collect()
    }

    pub fn to_rag_output(&self) -> RagOutput {
        RagOutput {
            seed: self.seed.clone(),
            query: self.query.clone(),
            documents: self.to_rag_documents(),
        }
    }
}

/// Composes crawler, extractor and relevance filter for one configuration
pub struct Pipeline {
    config: Config,
    cache: Arc<ResponseCache>,
    robots: Arc<RobotsGate>,
    crawler: Crawler,
    extractor: ContentExtractor,
    relevance: RelevanceFilter,
}

impl Pipeline {
    /// Builds a pipeline
    ///
    /// # Returns
    ///
    /// * `Ok(Pipeline)` - Configuration is valid and the cache directory exists
    /// * `Err(ScraperError::Config)` - Invalid configuration
    /// * `Err(ScraperError::Io)` - The cache directory could not be created
    pub fn new(config: Config, fetcher: Arc<dyn Fetcher>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        validate(&config)?;

        let cache = Arc::new(ResponseCache::new(&config.cache.dir, config.cache.expiry)?);
        let limiter = Arc::new(DomainRateLimiter::from_config(&config.crawler));
        let robots = Arc::new(RobotsGate::new(&config.crawler, Arc::clone(&fetcher)));

        let crawler = Crawler::new(
            config.crawler.clone(),
            Arc::clone(&fetcher),
            Arc::clone(&robots),
            Arc::clone(&limiter),
        );
        let extractor = ContentExtractor::new(
            &config,
            fetcher,
            Arc::clone(&robots),
            limiter,
            Arc::clone(&cache),
        );
        let relevance = RelevanceFilter::from_config(&config, embedder);

        Ok(Self {
            config,
            cache,
            robots,
            crawler,
            extractor,
            relevance,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Runs the full pipeline for `seed` and `query`
    ///
    /// Cancellation during the run yields a partial result with `cancelled`
    /// set; a token that is already cancelled yields `ScraperError::Cancelled`.
    pub async fn run(&self, seed: &str, query: &str, cancel: &CancellationToken) -> Result<PipelineResult> {
        let seed_url = normalize_url(seed)?.to_string();
        if cancel.is_cancelled() {
            return Err(ScraperError::Cancelled);
        }
        tracing::info!("Starting pipeline for {}", seed_url);

        let crawled = self.crawler.crawl(&seed_url, cancel).await;
        let candidates = dedupe(std::iter::once(seed_url.clone()).chain(crawled));

        let user_agent = self.config.user_agent_header();
        let mut allowed = Vec::with_capacity(candidates.len());
        for url in candidates {
            if self.robots.can_fetch(&url, user_agent).await {
                allowed.push(url);
            } else {
                tracing::info!("Skipping {} (disallowed by robots.txt)", url);
            }
        }

        let pages = self.extractor.process_until_cancelled(&allowed, cancel).await;
        let threshold = self.config.relevance.similarity_threshold;
        let (relevant, relevance_error) = match self
            .relevance
            .filter_pages_until_cancelled(&pages, query, threshold, cancel)
            .await
        {
            Ok(relevant) => (relevant, None),
            Err(e) => {
                tracing::error!("Relevance filtering failed; keeping {} extracted pages: {}", pages.len(), e);
                (Vec::new(), Some(e.to_string()))
            }
        };

        let cancelled = cancel.is_cancelled();
        if cancelled {
            tracing::warn!("Pipeline cancelled; returning partial results");
        }

        Ok(PipelineResult {
            seed: seed.to_string(),
            query: query.to_string(),
            language: self.config.extraction.language.clone(),
            pages,
            relevant,
            relevance_error,
            cancelled,
        })
    }
}
