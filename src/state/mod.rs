//! Shared mutable state for a crawl
//!
//! # Components
//!
//! - `DomainRateLimiter`: per-domain request pacing, safe across workers
//! - `CrawlState`: the visited set that keeps each URL to a single expansion

mod crawl_state;
mod rate_limiter;

// Re-export main types
pub use crawl_state::CrawlState;
pub use rate_limiter::{DomainRateLimiter, DEFAULT_MAX_DOMAINS};
