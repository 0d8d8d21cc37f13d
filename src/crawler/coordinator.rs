//! Crawler coordinator - bounded-depth link discovery
//!
//! The crawl is a depth-first walk over an explicit worklist of
//! `(url, depth)` pairs. Up to `parallel-requests` pages are expanded at once;
//! each expansion is:
//! 1. Prune if the depth limit is reached, the URL was visited, or robots.txt
//!    disallows it
//! 2. Claim the URL in the visited set (check-and-mark is atomic)
//! 3. Wait on the domain rate limiter, then fetch
//! 4. Keep the first `max-links-per-page` links and push them at depth + 1
//!
//! A failing page contributes no links and never aborts the crawl.

use crate::config::CrawlerConfig;
use crate::crawler::parser::extract_links;
use crate::crawler::Fetcher;
use crate::robots::RobotsGate;
use crate::state::{CrawlState, DomainRateLimiter};
use crate::url::dedupe;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use url::Url;

/// Outcome of expanding one page
struct Expansion {
    depth: u32,
    links: Vec<String>,
}

/// Bounded-depth, politeness-aware crawler
pub struct Crawler {
    config: CrawlerConfig,
    fetcher: Arc<dyn Fetcher>,
    robots: Arc<RobotsGate>,
    limiter: Arc<DomainRateLimiter>,
}

impl Crawler {
    /// Creates a crawler sharing the given robots gate and rate limiter
    pub fn new(
        config: CrawlerConfig,
        fetcher: Arc<dyn Fetcher>,
        robots: Arc<RobotsGate>,
        limiter: Arc<DomainRateLimiter>,
    ) -> Self {
        Self {
            config,
            fetcher,
            robots,
            limiter,
        }
    }

    /// Discovers every URL reachable from `seed` within `max-depth`
    ///
    /// # Returns
    ///
    /// Normalized URLs in discovery order without duplicates. The seed is
    /// included only if some crawled page links back to it. Once `cancel`
    /// fires, pending expansions are abandoned and the links found so far
    /// are returned.
    pub async fn crawl(&self, seed: &str, cancel: &CancellationToken) -> Vec<String> {
        let span = tracing::info_span!("crawl", seed = %seed);
        self.run(seed, cancel).instrument(span).await
    }

    async fn run(&self, seed: &str, cancel: &CancellationToken) -> Vec<String> {
        tracing::info!(
            "Starting crawl (max depth {}, {} parallel)",
            self.config.max_depth,
            self.config.parallel_requests
        );

        let state = CrawlState::new();
        let parallel = self.config.parallel_requests.max(1);
        let mut frontier: Vec<(String, u32)> = vec![(seed.to_string(), 0)];
        let mut discovered: Vec<String> = Vec::new();
        let mut in_flight = FuturesUnordered::new();

        loop {
            while in_flight.len() < parallel && !cancel.is_cancelled() {
                let Some((url, depth)) = frontier.pop() else {
                    break;
                };
                if depth >= self.config.max_depth || state.is_visited(&url) {
                    continue;
                }
                in_flight.push(self.expand(url, depth, &state));
            }

            if in_flight.is_empty() {
                break;
            }

            let expansion = tokio::select! {
                Some(expansion) = in_flight.next() => expansion,
                _ = cancel.cancelled() => {
                    tracing::warn!("Crawl cancelled with {} pages in flight", in_flight.len());
                    break;
                }
            };

            // Reverse so the first link on the page is expanded next
            for link in expansion.links.iter().rev() {
                frontier.push((link.clone(), expansion.depth + 1));
            }
            discovered.extend(expansion.links);
        }

        let urls = dedupe(discovered);
        tracing::info!(
            "Crawl finished: {} pages visited, {} URLs discovered",
            state.visited_count(),
            urls.len()
        );
        urls
    }

    async fn expand(&self, url: String, depth: u32, state: &CrawlState) -> Expansion {
        let user_agent = self.config.user_agent.as_str();
        let mut expansion = Expansion {
            depth,
            links: Vec::new(),
        };

        if !self.robots.can_fetch(&url, user_agent).await {
            return expansion;
        }
        if !state.mark_visited(&url) {
            return expansion;
        }

        let delay = self
            .robots
            .polite_delay(&url, user_agent, self.limiter.delay())
            .await;
        self.limiter.wait_with_delay(&url, delay).await;

        let response = match self.fetcher.fetch(&url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Error crawling {}: {}", url, e);
                return expansion;
            }
        };

        let base = Url::parse(&response.final_url).or_else(|_| Url::parse(&url));
        let Ok(base) = base else {
            tracing::warn!("Cannot resolve links on {}: invalid base URL", url);
            return expansion;
        };

        let mut links = extract_links(&response.body, &base);
        links.truncate(self.config.max_links_per_page);
        tracing::debug!("{} (depth {}): keeping {} links", url, depth, links.len());

        expansion.links = links;
        expansion
    }
}
