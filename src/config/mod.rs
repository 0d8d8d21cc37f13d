//! Configuration module for Rufus-RAG
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use rufus_rag::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("rufus.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CacheConfig, Config, CrawlerConfig, EmbeddingConfig, ExtractionConfig, OutputConfig,
    RelevanceConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, MAX_DEPTH_LIMIT};
