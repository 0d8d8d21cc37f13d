//! Crawler behavior against a live mock site

use crate::helpers::{mount_page, mount_robots, test_config};
use rufus_rag::config::Config;
use rufus_rag::crawler::{Crawler, HttpFetcher};
use rufus_rag::{DomainRateLimiter, RobotsGate};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn build_crawler(config: &Config) -> Crawler {
    let fetcher = Arc::new(HttpFetcher::new(config).expect("Failed to build fetcher"));
    let robots = Arc::new(RobotsGate::new(&config.crawler, fetcher.clone()));
    let limiter = Arc::new(DomainRateLimiter::from_config(&config.crawler));
    Crawler::new(config.crawler.clone(), fetcher, robots, limiter)
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, "User-agent: *\nAllow: /").await;
    mount_page(
        &server,
        "/",
        &format!(
            r#"<html><head><title>Home</title></head><body>
            <a href="{}/page1">Page 1</a>
            <a href="/page2">Page 2</a>
            <a href="mailto:team@example.com">Mail</a>
            </body></html>"#,
            base
        ),
    )
    .await;
    mount_page(&server, "/page1", r#"<html><body><a href="/page3">Deeper</a></body></html>"#).await;
    mount_page(&server, "/page2", "<html><body>Content 2</body></html>").await;
    mount_page(&server, "/page3", "<html><body>Content 3</body></html>").await;

    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let crawler = build_crawler(&config);

    let urls = crawler
        .crawl(&format!("{}/", base), &CancellationToken::new())
        .await;

    assert_eq!(
        urls,
        vec![
            format!("{}/page1", base),
            format!("{}/page2", base),
            format!("{}/page3", base),
        ]
    );
}

#[tokio::test]
async fn test_robots_disallow_prevents_fetch() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, "User-agent: *\nDisallow: /private").await;
    mount_page(
        &server,
        "/",
        r#"<html><body><a href="/private/data">Private</a><a href="/public">Public</a></body></html>"#,
    )
    .await;
    mount_page(&server, "/public", "<html><body>Public</body></html>").await;

    Mock::given(method("GET"))
        .and(path("/private/data"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0) // Should never be called
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let crawler = build_crawler(&test_config(dir.path()));

    let urls = crawler
        .crawl(&format!("{}/", base), &CancellationToken::new())
        .await;

    // Disallowed links are still reported; they are just never fetched
    assert!(urls.contains(&format!("{}/private/data", base)));
    assert!(urls.contains(&format!("{}/public", base)));

    // Wiremock will automatically verify expectations when the server drops
}

#[tokio::test]
async fn test_robots_fetched_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
    mount_page(&server, "/a", r#"<a href="/b">B</a>"#).await;
    mount_page(&server, "/b", "done").await;

    let dir = tempdir().unwrap();
    let crawler = build_crawler(&test_config(dir.path()));

    crawler
        .crawl(&format!("{}/", server.uri()), &CancellationToken::new())
        .await;
}

#[tokio::test]
async fn test_missing_robots_is_permissive() {
    let server = MockServer::start().await;
    let base = server.uri();

    // No robots.txt mock: the server answers 404
    mount_page(&server, "/", r#"<a href="/next">Next</a>"#).await;
    mount_page(&server, "/next", "<p>reached</p>").await;

    let dir = tempdir().unwrap();
    let crawler = build_crawler(&test_config(dir.path()));

    let urls = crawler
        .crawl(&format!("{}/", base), &CancellationToken::new())
        .await;

    assert_eq!(urls, vec![format!("{}/next", base)]);
}

#[tokio::test]
async fn test_failing_page_does_not_abort_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/broken">Broken</a><a href="/ok">Ok</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_page(&server, "/ok", r#"<a href="/leaf">Leaf</a>"#).await;
    mount_page(&server, "/leaf", "leaf").await;

    let dir = tempdir().unwrap();
    let crawler = build_crawler(&test_config(dir.path()));

    let urls = crawler
        .crawl(&format!("{}/", base), &CancellationToken::new())
        .await;

    assert_eq!(
        urls,
        vec![
            format!("{}/broken", base),
            format!("{}/ok", base),
            format!("{}/leaf", base),
        ]
    );
}

#[tokio::test]
async fn test_same_domain_requests_are_spaced() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
    mount_page(&server, "/a", "a").await;
    mount_page(&server, "/b", "b").await;

    let dir = tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.crawler.request_delay = 0.3;
    config.crawler.follow_robots_txt = false;
    config.crawler.parallel_requests = 3;
    let crawler = build_crawler(&config);

    let start = Instant::now();
    crawler
        .crawl(&format!("{}/", server.uri()), &CancellationToken::new())
        .await;

    // Three page fetches on one domain need two full gaps
    assert!(start.elapsed() >= Duration::from_millis(600));
}
