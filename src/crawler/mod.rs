//! Crawler module for web page fetching and link discovery
//!
//! This module contains the core crawling logic, including:
//! - The fetch capability and its reqwest implementation with retries
//! - HTML link extraction
//! - Bounded-depth crawl coordination

mod coordinator;
mod fetcher;
mod parser;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::Crawler;
pub use fetcher::{backoff_delay, FetchError, FetchResponse, Fetcher, HttpFetcher, MAX_REDIRECTS};
pub use parser::extract_links;
