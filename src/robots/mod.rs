//! Robots.txt handling module
//!
//! This module fetches robots.txt once per host, memoizes the parsed rules for
//! the lifetime of the gate, and answers fetchability and crawl-delay queries.
//! Any failure to obtain robots.txt leaves the host unrestricted.

mod parser;

pub use parser::ParsedRobots;

use crate::config::CrawlerConfig;
use crate::crawler::Fetcher;
use crate::url::domain_key;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

type RulesCell = Arc<OnceCell<ParsedRobots>>;

/// Returns the product token of a user agent (`RufusBot/1.0` -> `RufusBot`)
///
/// robots.txt groups name products, not full user agent strings.
pub fn product_token(user_agent: &str) -> &str {
    user_agent
        .split_once('/')
        .map_or(user_agent, |(product, _)| product)
        .trim()
}

/// Decides whether URLs may be fetched according to their host's robots.txt
pub struct RobotsGate {
    fetcher: Arc<dyn Fetcher>,
    enabled: bool,
    hosts: Mutex<HashMap<String, RulesCell>>,
}

impl RobotsGate {
    /// Creates a gate; with `follow-robots-txt = false` it allows everything
    /// and never touches the network
    pub fn new(config: &CrawlerConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            enabled: config.follow_robots_txt,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// Checks if `url` may be fetched by `user_agent`
    ///
    /// # Returns
    ///
    /// * `true` - Allowed, robots checking is off, or robots.txt was unavailable
    /// * `false` - The host's robots.txt disallows the URL
    pub async fn can_fetch(&self, url: &str, user_agent: &str) -> bool {
        if !self.enabled {
            return true;
        }
        let Ok(parsed) = Url::parse(url) else {
            return true;
        };

        let cell = self.rules_cell(&parsed);
        let rules = cell.get_or_init(|| self.fetch_rules(&parsed)).await;
        let allowed = rules.is_allowed(parsed.as_str(), product_token(user_agent));

        if !allowed {
            tracing::debug!("robots.txt disallows {}", url);
        }
        allowed
    }

    /// Crawl-delay requested by `url`'s host for `user_agent`, if any
    pub async fn crawl_delay(&self, url: &str, user_agent: &str) -> Option<Duration> {
        if !self.enabled {
            return None;
        }
        let parsed = Url::parse(url).ok()?;

        let cell = self.rules_cell(&parsed);
        let rules = cell.get_or_init(|| self.fetch_rules(&parsed)).await;
        rules
            .crawl_delay(product_token(user_agent))
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Spacing to keep between requests to `url`'s host
    ///
    /// The host's `Crawl-delay` wins when it is longer than `configured`.
    pub async fn polite_delay(&self, url: &str, user_agent: &str, configured: Duration) -> Duration {
        match self.crawl_delay(url, user_agent).await {
            Some(crawl_delay) => crawl_delay.max(configured),
            None => configured,
        }
    }

    /// Number of hosts whose rules are memoized or being fetched
    pub fn known_hosts(&self) -> usize {
        self.hosts.lock().map(|h| h.len()).unwrap_or(0)
    }

    fn rules_cell(&self, url: &Url) -> RulesCell {
        let key = domain_key(url.as_str());
        let mut hosts = self.hosts.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(hosts.entry(key).or_default())
    }

    async fn fetch_rules(&self, url: &Url) -> ParsedRobots {
        let robots_url = match url.join("/robots.txt") {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!("Cannot build robots.txt URL for {}: {}", url, e);
                return ParsedRobots::allow_all();
            }
        };

        match self.fetcher.fetch(robots_url.as_str()).await {
            Ok(response) => {
                tracing::debug!("Fetched {}", robots_url);
                ParsedRobots::from_content(&response.body)
            }
            Err(e) => {
                tracing::warn!("Could not fetch {}: {}; allowing all", robots_url, e);
                ParsedRobots::allow_all()
            }
        }
    }
}
