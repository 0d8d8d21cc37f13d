//! HttpFetcher retry and error classification

use crate::helpers::{html, test_config};
use rufus_rag::crawler::{FetchError, Fetcher, HttpFetcher};
use tempfile::tempdir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(max_retries: u32) -> HttpFetcher {
    let dir = tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.crawler.max_retries = max_retries;
    HttpFetcher::new(&config).expect("Failed to build fetcher")
}

#[tokio::test]
async fn test_sends_configured_user_agent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "RufusBot/1.0"))
        .respond_with(html("<p>hi</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let response = fetcher(0)
        .fetch(&format!("{}/", server.uri()))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "<p>hi</p>");
    assert!(response.content_type.starts_with("text/html"));
}

#[tokio::test]
async fn test_retries_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(html("recovered"))
        .expect(1)
        .mount(&server)
        .await;

    let response = fetcher(2)
        .fetch(&format!("{}/flaky", server.uri()))
        .await
        .unwrap();

    assert_eq!(response.body, "recovered");
}

#[tokio::test]
async fn test_gives_up_after_max_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let result = fetcher(2).fetch(&format!("{}/down", server.uri())).await;

    assert_eq!(result.unwrap_err(), FetchError::Http { status: 502 });
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let result = fetcher(3).fetch(&format!("{}/missing", server.uri())).await;

    assert_eq!(result.unwrap_err(), FetchError::Http { status: 404 });
}

#[tokio::test]
async fn test_follows_redirects() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html("moved"))
        .mount(&server)
        .await;

    let response = fetcher(0)
        .fetch(&format!("{}/old", server.uri()))
        .await
        .unwrap();

    assert_eq!(response.body, "moved");
    assert_eq!(response.final_url, format!("{}/new", server.uri()));
}
