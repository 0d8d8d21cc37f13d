//! Embedding capability and its OpenAI-compatible client

use crate::config::Config;
use crate::crawler::backoff_delay;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Failure to embed one piece of text
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("missing API key: environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("invalid embedder configuration: {0}")]
    Config(String),

    #[error("embedding request failed: {0}")]
    Request(String),

    #[error("embedding API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
}

/// Capability to turn text into a fixed-size vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Async client for OpenAI-compatible `/embeddings` endpoints
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    max_retries: u32,
}

impl OpenAiEmbedder {
    /// Builds a client
    ///
    /// # Arguments
    ///
    /// * `api_key` - Bearer token sent with every request
    /// * `base_url` - API root; `/embeddings` is appended
    /// * `model` - Embedding model name
    /// * `timeout` - Per-request timeout
    /// * `max_retries` - Retries for 429 and 5xx responses
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, EmbeddingError> {
        if model.trim().is_empty() {
            return Err(EmbeddingError::Config("missing model name".to_string()));
        }

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| EmbeddingError::Config("API key is not a valid header value".to_string()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| EmbeddingError::Config(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.to_string(),
            max_retries,
        })
    }

    /// Builds a client from `[embedding]`, reading the key from the
    /// environment variable named by `api-key-env`
    pub fn from_config(config: &Config) -> Result<Self, EmbeddingError> {
        let var = &config.embedding.api_key_env;
        let api_key = std::env::var(var)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| EmbeddingError::MissingApiKey(var.clone()))?;

        Self::new(
            &api_key,
            &config.embedding.endpoint,
            &config.embedding.model,
            Duration::from_secs(config.crawler.timeout),
            config.crawler.max_retries,
        )
    }

    async fn request(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: [text],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbeddingError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        parsed
            .data
            .into_iter()
            .min_by_key(|entry| entry.index)
            .map(|entry| entry.embedding)
            .filter(|embedding| !embedding.is_empty())
            .ok_or_else(|| EmbeddingError::InvalidResponse("no embedding returned".to_string()))
    }
}

fn should_retry(error: &EmbeddingError) -> bool {
    match error {
        EmbeddingError::Api { status, .. } => {
            *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
        }
        EmbeddingError::Request(_) => true,
        _ => false,
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut attempt = 0;
        loop {
            match self.request(text).await {
                Ok(embedding) => return Ok(embedding),
                Err(e) if should_retry(&e) && attempt < self.max_retries => {
                    tracing::debug!("Retrying embedding request: {}", e);
                    tokio::time::sleep(backoff_delay(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
