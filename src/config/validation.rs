use crate::config::types::{
    CacheConfig, Config, CrawlerConfig, EmbeddingConfig, ExtractionConfig, RelevanceConfig,
};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Deepest crawl the configuration accepts
pub const MAX_DEPTH_LIMIT: u32 = 10;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crawler_config(&config.crawler)?;
    validate_extraction_config(&config.extraction)?;
    validate_relevance_config(&config.relevance)?;
    validate_cache_config(&config.cache)?;
    validate_embedding_config(&config.embedding)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    if config.max_depth > MAX_DEPTH_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_depth must be <= {}, got {}",
            MAX_DEPTH_LIMIT, config.max_depth
        )));
    }

    if config.max_links_per_page < 1 {
        return Err(ConfigError::Validation(
            "max_links_per_page must be >= 1".to_string(),
        ));
    }

    if !config.request_delay.is_finite() || config.request_delay < 0.0 {
        return Err(ConfigError::Validation(format!(
            "request_delay must be a non-negative number of seconds, got {}",
            config.request_delay
        )));
    }

    if config.timeout < 1 {
        return Err(ConfigError::Validation(
            "timeout must be >= 1 second".to_string(),
        ));
    }

    if config.parallel_requests < 1 || config.parallel_requests > 100 {
        return Err(ConfigError::Validation(format!(
            "parallel_requests must be between 1 and 100, got {}",
            config.parallel_requests
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_extraction_config(config: &ExtractionConfig) -> ConfigResult<()> {
    if config.min_text_length > config.max_text_length {
        return Err(ConfigError::Validation(format!(
            "min_text_length ({}) cannot exceed max_text_length ({})",
            config.min_text_length, config.max_text_length
        )));
    }

    Ok(())
}

fn validate_relevance_config(config: &RelevanceConfig) -> ConfigResult<()> {
    let threshold = config.similarity_threshold;
    if !threshold.is_finite() || !(-1.0..=1.0).contains(&threshold) {
        return Err(ConfigError::Validation(format!(
            "similarity_threshold must be within [-1, 1], got {}",
            threshold
        )));
    }

    Ok(())
}

fn validate_cache_config(config: &CacheConfig) -> ConfigResult<()> {
    if config.dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "cache dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_embedding_config(config: &EmbeddingConfig) -> ConfigResult<()> {
    Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid embedding endpoint: {}", e)))?;

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "embedding model cannot be empty".to_string(),
        ));
    }

    Ok(())
}
