//! URL handling module for Rufus-RAG
//!
//! This module provides URL normalization, deduplication, domain extraction,
//! and resolution of page links against their base URL.

mod domain;
mod links;
mod normalize;

use std::collections::HashSet;

// Re-export main functions
pub use domain::{domain_key, extract_domain};
pub use links::resolve_link;
pub use normalize::{normalize, normalize_url};

/// Normalizes every URL and drops repeats, keeping first-seen order
///
/// Strings that cannot be normalized pass through unchanged and are compared
/// as-is.
///
/// # Examples
///
/// ```
/// use rufus_rag::url::dedupe;
///
/// let urls = ["a", "b", "a"];
/// assert_eq!(dedupe(urls), vec!["a".to_string(), "b".to_string()]);
///
/// let urls = ["https://example.com/x/", "https://example.com/x#top"];
/// assert_eq!(dedupe(urls), vec!["https://example.com/x".to_string()]);
/// ```
pub fn dedupe<I, S>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut unique = Vec::new();

    for url in urls {
        let normalized = normalize(url.as_ref());
        if seen.insert(normalized.clone()) {
            unique.push(normalized);
        }
    }

    unique
}
