use serde::{Deserialize, Serialize};

/// Main configuration structure for Rufus-RAG
///
/// Every section and key is optional in the TOML file; missing values fall
/// back to the defaults below. A loaded `Config` is treated as an immutable
/// snapshot and shared by every component of one pipeline run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub extraction: ExtractionConfig,
    pub relevance: RelevanceConfig,
    pub cache: CacheConfig,
    pub output: OutputConfig,
    pub embedding: EmbeddingConfig,
}

impl Config {
    /// Returns the User-Agent header value sent with every request
    pub fn user_agent_header(&self) -> &str {
        &self.crawler.user_agent
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum depth to crawl from the seed URL
    pub max_depth: u32,

    /// Number of outbound links followed from each page
    pub max_links_per_page: usize,

    /// Minimum time between requests to the same domain (seconds)
    pub request_delay: f64,

    /// Retries for transient fetch failures
    pub max_retries: u32,

    /// User-Agent header and robots.txt identity
    pub user_agent: String,

    /// Per-request timeout (seconds)
    pub timeout: u64,

    /// Maximum number of concurrent page fetches
    pub parallel_requests: usize,

    /// Whether robots.txt rules are honored
    pub follow_robots_txt: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_links_per_page: 10,
            request_delay: 1.0,
            max_retries: 3,
            user_agent: "RufusBot/1.0".to_string(),
            timeout: 30,
            parallel_requests: 3,
            follow_robots_txt: true,
        }
    }
}

/// Content extraction configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExtractionConfig {
    /// Pages with less text than this are not ranked for relevance
    pub min_text_length: usize,

    /// Extracted text is truncated to this many characters
    pub max_text_length: usize,

    /// Content language tag, carried into RAG documents
    pub language: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_text_length: 50,
            max_text_length: 100_000,
            language: "en".to_string(),
        }
    }
}

/// Relevance filtering configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RelevanceConfig {
    /// Minimum cosine similarity (exclusive) for content to be kept
    pub similarity_threshold: f32,

    /// Filter individual sentences instead of whole pages
    pub sentence_level: bool,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.3,
            sentence_level: false,
        }
    }
}

/// Response cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CacheConfig {
    /// Directory holding one JSON file per cached URL
    pub dir: String,

    /// Entry lifetime (seconds)
    pub expiry: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: "data/cache".to_string(),
            expiry: 3600,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory for result files when no explicit path is given
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "data/output".to_string(),
        }
    }
}

/// Embedding endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EmbeddingConfig {
    /// Base URL of an OpenAI-compatible API
    pub endpoint: String,

    /// Embedding model name
    pub model: String,

    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}
