use rufus_rag::config::Config;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration tuned for fast, deterministic tests
pub fn test_config(cache_dir: &Path) -> Config {
    let mut config = Config::default();
    config.crawler.request_delay = 0.0;
    config.crawler.max_retries = 0;
    config.crawler.parallel_requests = 1;
    config.crawler.timeout = 5;
    config.extraction.min_text_length = 0;
    config.cache.dir = cache_dir.to_string_lossy().into_owned();
    config
}

/// A 200 response carrying HTML
pub fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

/// Mounts an HTML page at `route`
pub async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

/// Mounts robots.txt with the given rules
pub async fn mount_robots(server: &MockServer, rules: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(rules))
        .mount(server)
        .await;
}
