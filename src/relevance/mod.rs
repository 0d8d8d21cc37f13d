//! Embedding-based relevance filtering
//!
//! Similarity itself comes from the [`Embedder`]; this module only decides
//! what to embed and which items clear the threshold. An item is kept when
//! its cosine similarity to the query is strictly greater than the
//! threshold.

mod embedder;
mod sentences;

pub use embedder::{Embedder, EmbeddingError, OpenAiEmbedder};
pub use sentences::{RegexSentenceSplitter, SentenceSplitter};

use crate::config::Config;
use crate::extract::PageRecord;
use crate::{Result, ScraperError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Cosine similarity of two vectors
///
/// Returns 0.0 for empty or mismatched vectors and for zero-magnitude input.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// A piece of page content that cleared the threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevantItem {
    pub url: String,
    /// Whole page text, or a single sentence in sentence-level mode
    pub content: String,
    pub similarity: f32,
}

/// Selects content similar enough to a query
pub struct RelevanceFilter {
    embedder: Arc<dyn Embedder>,
    splitter: Arc<dyn SentenceSplitter>,
    sentence_level: bool,
    min_text_length: usize,
}

impl RelevanceFilter {
    /// Page-level filter using the punctuation sentence splitter
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            splitter: Arc::new(RegexSentenceSplitter),
            sentence_level: false,
            min_text_length: 0,
        }
    }

    /// Filter configured from `[relevance]` and `[extraction]`
    pub fn from_config(config: &Config, embedder: Arc<dyn Embedder>) -> Self {
        Self::new(embedder)
            .sentence_level(config.relevance.sentence_level)
            .min_text_length(config.extraction.min_text_length)
    }

    pub fn with_splitter(mut self, splitter: Arc<dyn SentenceSplitter>) -> Self {
        self.splitter = splitter;
        self
    }

    /// Rank individual sentences instead of whole pages in [`filter_pages`](Self::filter_pages)
    pub fn sentence_level(mut self, enabled: bool) -> Self {
        self.sentence_level = enabled;
        self
    }

    /// Pages with fewer characters of text are not ranked
    pub fn min_text_length(mut self, chars: usize) -> Self {
        self.min_text_length = chars;
        self
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        self.embedder
            .embed(query)
            .await
            .map_err(|e| ScraperError::Embedding(format!("query: {}", e)))
    }

    /// Similarity of `text` to the query, or `None` if it cannot be embedded
    async fn score(&self, text: &str, query_embedding: &[f32]) -> Option<f32> {
        match self.embedder.embed(text).await {
            Ok(embedding) => Some(cosine_similarity(&embedding, query_embedding)),
            Err(e) => {
                tracing::warn!("Skipping content that failed to embed: {}", e);
                None
            }
        }
    }

    /// Keeps the items whose similarity to `query` exceeds `threshold`
    ///
    /// Items that fail to embed are dropped. Failing to embed the query is an
    /// error.
    pub async fn filter(&self, contents: &[String], query: &str, threshold: f32) -> Result<Vec<String>> {
        if contents.is_empty() {
            return Ok(Vec::new());
        }
        let query_embedding = self.embed_query(query).await?;

        let mut relevant = Vec::new();
        for content in contents {
            if let Some(similarity) = self.score(content, &query_embedding).await {
                if similarity > threshold {
                    relevant.push(content.clone());
                }
            }
        }
        Ok(relevant)
    }

    /// Splits `content` into sentences and keeps those relevant to `query`
    pub async fn filter_sentences(&self, content: &str, query: &str, threshold: f32) -> Result<Vec<String>> {
        let sentences = self.splitter.sentences(content);
        self.filter(&sentences, query, threshold).await
    }

    /// Ranks successful pages (or their sentences) against `query`
    ///
    /// Error records and pages shorter than the minimum text length are
    /// skipped. Results keep page order, then sentence order.
    pub async fn filter_pages(
        &self,
        pages: &[PageRecord],
        query: &str,
        threshold: f32,
    ) -> Result<Vec<RelevantItem>> {
        self.filter_pages_until_cancelled(pages, query, threshold, &CancellationToken::new())
            .await
    }

    /// Like [`filter_pages`](Self::filter_pages), but stops embedding once
    /// `cancel` fires
    ///
    /// Items ranked before cancellation are kept. A token that is already
    /// cancelled yields no items and sends no embedding requests.
    pub async fn filter_pages_until_cancelled(
        &self,
        pages: &[PageRecord],
        query: &str,
        threshold: f32,
        cancel: &CancellationToken,
    ) -> Result<Vec<RelevantItem>> {
        let span = tracing::info_span!("relevance", query = %query);
        self.rank_pages(pages, query, threshold, cancel)
            .instrument(span)
            .await
    }

    async fn rank_pages(
        &self,
        pages: &[PageRecord],
        query: &str,
        threshold: f32,
        cancel: &CancellationToken,
    ) -> Result<Vec<RelevantItem>> {
        if cancel.is_cancelled() {
            tracing::info!("Cancelled before ranking");
            return Ok(Vec::new());
        }

        let candidates: Vec<&PageRecord> = pages
            .iter()
            .filter(|page| page.is_success() && page.text.chars().count() >= self.min_text_length)
            .collect();
        if candidates.is_empty() {
            tracing::info!("No pages eligible for ranking");
            return Ok(Vec::new());
        }

        let query_embedding = self.embed_query(query).await?;
        let mut relevant = Vec::new();

        'pages: for page in &candidates {
            let units = if self.sentence_level {
                self.splitter.sentences(&page.text)
            } else {
                vec![page.text.clone()]
            };

            for content in units {
                if cancel.is_cancelled() {
                    tracing::warn!("Ranking cancelled with {} relevant items so far", relevant.len());
                    break 'pages;
                }
                let Some(similarity) = self.score(&content, &query_embedding).await else {
                    continue;
                };
                if similarity > threshold {
                    relevant.push(RelevantItem {
                        url: page.url.clone(),
                        content,
                        similarity,
                    });
                }
            }
        }

        tracing::info!(
            "{} relevant items from {} ranked pages (threshold {})",
            relevant.len(),
            candidates.len(),
            threshold
        );
        Ok(relevant)
    }
}
