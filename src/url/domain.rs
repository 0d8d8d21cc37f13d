use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use rufus_rag::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the key used for per-domain state: `host` or `host:port`
///
/// Rate limiting and robots.txt memoization are keyed on this value, so two
/// servers on the same host but different ports are kept apart. Strings that
/// are not absolute URLs are used as their own key.
pub fn domain_key(url_str: &str) -> String {
    match Url::parse(url_str) {
        Ok(url) => match (extract_domain(&url), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host,
            (None, _) => url_str.to_string(),
        },
        Err(_) => url_str.to_string(),
    }
}
