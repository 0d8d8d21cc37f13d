//! In-memory site used by unit tests across the crate

use super::{FetchError, FetchResponse, Fetcher};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Serves canned bodies by exact URL and counts every request
#[derive(Debug, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, Result<String, FetchError>>,
    stalls: HashMap<String, CancellationToken>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` for `url`
    pub fn page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), Ok(body.to_string()));
        self
    }

    /// Serves an HTML page linking to each of `links`
    pub fn linked_page(self, url: &str, links: &[&str]) -> Self {
        let anchors: String = links
            .iter()
            .map(|l| format!("<a href=\"{}\">{}</a>", l, l))
            .collect();
        let body = format!("<html><body>{}</body></html>", anchors);
        self.page(url, &body)
    }

    /// Fails every request for `url` with `error`
    pub fn failing(mut self, url: &str, error: FetchError) -> Self {
        self.pages.insert(url.to_string(), Err(error));
        self
    }

    /// Cancels `token` when `url` is requested, then never answers
    pub fn cancelling(mut self, url: &str, token: CancellationToken) -> Self {
        self.stalls.insert(url.to_string(), token);
        self
    }

    /// Every URL requested so far, in request order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// How many times `url` was requested
    pub fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|r| r.as_str() == url).count()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        if let Some(token) = self.stalls.get(url) {
            token.cancel();
            std::future::pending::<()>().await;
        }

        match self.pages.get(url) {
            Some(Ok(body)) => Ok(FetchResponse {
                final_url: url.to_string(),
                status: 200,
                content_type: "text/html".to_string(),
                body: body.clone(),
            }),
            Some(Err(e)) => Err(e.clone()),
            None => Err(FetchError::Http { status: 404 }),
        }
    }
}
