//! Rufus-RAG: a polite crawl-extract-filter pipeline
//!
//! This crate crawls a website to a bounded depth, extracts cleaned text and
//! metadata from every page it reaches, and keeps the content whose embedding
//! is similar enough to a user query. The result is ready to be fed into a
//! retrieval-augmented-generation workflow.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod pipeline;
pub mod relevance;
pub mod robots;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Rufus-RAG operations
///
/// Only configuration problems and unrecoverable resource errors are expected
/// to reach the caller of [`pipeline::Pipeline`]; per-page and per-domain
/// failures are contained inside the crawler and extractor.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("HTML parse error for {url}: {message}")]
    HtmlParse { url: String, message: String },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Rufus-RAG operations
pub type Result<T> = std::result::Result<T, ScraperError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use cache::{CachedContent, ResponseCache};
pub use config::Config;
pub use crawler::{Crawler, Fetcher, HttpFetcher};
pub use extract::{ContentExtractor, PageRecord, PageStatus};
pub use pipeline::{Pipeline, PipelineResult, RagDocument};
pub use relevance::{cosine_similarity, Embedder, RelevanceFilter};
pub use robots::RobotsGate;
pub use state::{CrawlState, DomainRateLimiter};
pub use url::{dedupe, extract_domain, normalize, normalize_url};
