use crate::url::normalize;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

/// Per-crawl record of which URLs have been expanded
///
/// Scoped to a single crawl invocation and never persisted. URLs are stored
/// in normalized form, so equivalent spellings count as one visit.
#[derive(Debug, Default)]
pub struct CrawlState {
    visited: Mutex<HashSet<String>>,
}

impl CrawlState {
    /// Creates an empty crawl state
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.visited.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Marks `url` as visited
    ///
    /// Check and insert happen under one lock, so exactly one caller gets
    /// `true` for a given URL.
    ///
    /// # Returns
    ///
    /// * `true` - The URL was not visited before and the caller owns it now
    /// * `false` - Another caller already claimed the URL
    pub fn mark_visited(&self, url: &str) -> bool {
        self.lock().insert(normalize(url))
    }

    /// Checks whether `url` has been visited
    pub fn is_visited(&self, url: &str) -> bool {
        self.lock().contains(&normalize(url))
    }

    /// Number of visited URLs
    pub fn visited_count(&self) -> usize {
        self.lock().len()
    }
}
