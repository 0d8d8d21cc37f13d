//! Link discovery for the crawler
//!
//! Only `<a href>` anchors are followed. Each href is resolved against the
//! page URL, normalized, and deduplicated in document order.

use crate::url::{normalize_url, resolve_link};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts the followable links of an HTML page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document, `rel="nofollow"` included
///
/// **Exclude:**
/// - Empty and fragment-only hrefs
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - Anything that does not resolve to an HTTP(S) URL
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The page URL used to resolve relative links
///
/// # Returns
///
/// Normalized absolute URLs in first-seen order, without duplicates
///
/// # Example
///
/// ```
/// use rufus_rag::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/a/">A</a><a href="/a#top">A again</a><a href="b">B</a>"#;
/// let base = Url::parse("https://example.com/docs/").unwrap();
/// assert_eq!(
///     extract_links(html, &base),
///     vec!["https://example.com/a", "https://example.com/docs/b"]
/// );
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(anchor) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&anchor) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(absolute) = resolve_link(href, base_url) else {
            continue;
        };
        let Ok(normalized) = normalize_url(absolute.as_str()) else {
            continue;
        };

        let normalized = normalized.to_string();
        if seen.insert(normalized.clone()) {
            links.push(normalized);
        }
    }

    links
}
