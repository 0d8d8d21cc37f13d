//! Full pipeline runs with an OpenAI-compatible mock embedding endpoint

use crate::helpers::{html, mount_page, mount_robots, test_config};
use rufus_rag::config::Config;
use rufus_rag::crawler::HttpFetcher;
use rufus_rag::relevance::OpenAiEmbedder;
use rufus_rag::{PageStatus, Pipeline};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUERY: &str = "ownership";

fn embedding(vector: [f32; 2]) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "data": [{ "embedding": vector, "index": 0 }]
    }))
}

/// Text mentioning the query maps to the query's direction, anything else
/// to an orthogonal one
async fn mount_embeddings(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(body_string_contains(QUERY))
        .respond_with(embedding([1.0, 0.0]))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(embedding([0.0, 1.0]))
        .mount(server)
        .await;
}

/// Seed links to a relevant page, an irrelevant page, a failing page and a
/// robots-disallowed page
async fn mount_site(server: &MockServer) {
    mount_robots(server, "User-agent: *\nDisallow: /private").await;
    mount_page(
        server,
        "/",
        r#"<html><head><title>Rust Notes</title><meta name="description" content="Notes"></head>
        <body>
            <nav><a href="/">Home</a></nav>
            <p>Welcome.</p>
            <a href="/ownership">Ownership</a>
            <a href="/cooking">Cooking</a>
            <a href="/broken">Broken</a>
            <a href="/private">Private</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        server,
        "/ownership",
        "<html><head><title>Ownership</title></head><body><p>Rust ownership moves values.</p></body></html>",
    )
    .await;
    mount_page(
        server,
        "/cooking",
        "<html><body><p>Boil the pasta for ten minutes.</p></body></html>",
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(html("secret"))
        .expect(0)
        .mount(server)
        .await;
}

fn pipeline(config: Config, embed_server: &MockServer) -> Pipeline {
    let fetcher = Arc::new(HttpFetcher::new(&config).expect("Failed to build fetcher"));
    let embedder = OpenAiEmbedder::new(
        "test-key",
        &format!("{}/v1", embed_server.uri()),
        "test-model",
        Duration::from_secs(5),
        0,
    )
    .expect("Failed to build embedder");
    Pipeline::new(config, fetcher, Arc::new(embedder)).expect("Failed to build pipeline")
}

#[tokio::test]
async fn test_full_pipeline() {
    let site = MockServer::start().await;
    let embeddings = MockServer::start().await;
    mount_site(&site).await;
    mount_embeddings(&embeddings).await;

    let dir = tempdir().unwrap();
    let pipeline = pipeline(test_config(dir.path()), &embeddings);
    let base = site.uri();

    let result = pipeline
        .run(&base, QUERY, &CancellationToken::new())
        .await
        .expect("Pipeline failed");

    let urls: Vec<_> = result.pages.iter().map(|p| p.url.clone()).collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/", base),
            format!("{}/ownership", base),
            format!("{}/cooking", base),
            format!("{}/broken", base),
        ]
    );

    // Exactly the failing page is marked as an error
    let failed: Vec<_> = result
        .pages
        .iter()
        .filter(|p| p.status == PageStatus::Error)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].url, format!("{}/broken", base));
    assert!(failed[0].error.as_deref().unwrap_or("").contains("500"));

    // Nav was stripped before extraction
    let home = &result.pages[0];
    assert_eq!(home.title(), Some("Rust Notes"));
    assert!(!home.links.iter().any(|l| l.text == "Home"));

    assert_eq!(result.relevant.len(), 1);
    assert_eq!(result.relevant[0].url, format!("{}/ownership", base));
    assert!(result.relevant[0].content.contains("Rust ownership moves values."));
}

#[tokio::test]
async fn test_sentence_level_pipeline() {
    let site = MockServer::start().await;
    let embeddings = MockServer::start().await;
    mount_robots(&site, "").await;
    mount_page(
        &site,
        "/",
        "<html><body><p>Ownership is a Rust idea. Pasta needs salt.</p></body></html>",
    )
    .await;
    // Matching is case-sensitive
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(body_string_contains("Ownership"))
        .respond_with(embedding([1.0, 0.0]))
        .mount(&embeddings)
        .await;
    mount_embeddings(&embeddings).await;

    let dir = tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.relevance.sentence_level = true;
    let pipeline = pipeline(config, &embeddings);

    let result = pipeline
        .run(&site.uri(), QUERY, &CancellationToken::new())
        .await
        .expect("Pipeline failed");

    let contents: Vec<_> = result.relevant.iter().map(|r| r.content.as_str()).collect();
    assert_eq!(contents, vec!["Ownership is a Rust idea."]);
}

#[tokio::test]
async fn test_rag_output() {
    let site = MockServer::start().await;
    let embeddings = MockServer::start().await;
    mount_site(&site).await;
    mount_embeddings(&embeddings).await;

    let dir = tempdir().unwrap();
    let pipeline = pipeline(test_config(dir.path()), &embeddings);

    let result = pipeline
        .run(&site.uri(), QUERY, &CancellationToken::new())
        .await
        .expect("Pipeline failed");
    let output = result.to_rag_output();

    assert_eq!(output.query, QUERY);
    assert_eq!(output.documents.len(), 1);
    let doc = &output.documents[0];
    assert_eq!(doc.title, "Ownership");
    assert_eq!(doc.id.len(), 64);
    assert_eq!(doc.metadata.get("language").map(String::as_str), Some("en"));

    let value = serde_json::to_value(&output).unwrap();
    assert!(value["documents"][0]["content"].is_string());
}

#[tokio::test]
async fn test_cached_pages_are_not_refetched() {
    let site = MockServer::start().await;
    let embeddings = MockServer::start().await;
    mount_robots(&site, "").await;
    // One crawl fetch per run plus one extraction fetch on the first run
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>Rust ownership in one page.</p>"))
        .expect(3)
        .mount(&site)
        .await;
    mount_embeddings(&embeddings).await;

    let dir = tempdir().unwrap();
    let pipeline = pipeline(test_config(dir.path()), &embeddings);

    for _ in 0..2 {
        let result = pipeline
            .run(&site.uri(), QUERY, &CancellationToken::new())
            .await
            .expect("Pipeline failed");
        assert_eq!(result.relevant.len(), 1);
    }
}

#[tokio::test]
async fn test_rejected_embedder_keeps_extracted_pages() {
    let site = MockServer::start().await;
    let embeddings = MockServer::start().await;
    mount_robots(&site, "").await;
    mount_page(&site, "/", "<p>Rust ownership.</p>").await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&embeddings)
        .await;

    let dir = tempdir().unwrap();
    let pipeline = pipeline(test_config(dir.path()), &embeddings);

    let result = pipeline
        .run(&site.uri(), QUERY, &CancellationToken::new())
        .await
        .expect("Pipeline failed");

    assert_eq!(result.successful_pages().count(), 1);
    assert!(result.relevant.is_empty());
    assert!(result.relevance_error.as_deref().unwrap_or("").contains("401"));

    let value = serde_json::to_value(&result).unwrap();
    assert!(value["relevance_error"].is_string());
}

#[tokio::test]
async fn test_timeout_during_extraction_keeps_started_pages() {
    let site = MockServer::start().await;
    let embeddings = MockServer::start().await;
    mount_robots(&site, "").await;

    // The crawl fetch answers at once; the extraction fetch is slow
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<p>Rust ownership.</p><a href="/next">Next</a>"#))
        .up_to_n_times(1)
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            html(r#"<p>Rust ownership.</p><a href="/next">Next</a>"#)
                .set_delay(Duration::from_secs(1)),
        )
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(html("<p>never reached</p>"))
        .expect(0)
        .mount(&site)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(embedding([1.0, 0.0]))
        .expect(0)
        .mount(&embeddings)
        .await;

    let dir = tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.crawler.max_depth = 1;
    let pipeline = pipeline(config, &embeddings);

    let cancel = CancellationToken::new();
    let timer = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        timer.cancel();
    });

    let result = pipeline
        .run(&site.uri(), QUERY, &cancel)
        .await
        .expect("Pipeline failed");

    assert!(result.cancelled);
    let urls: Vec<_> = result.pages.iter().map(|p| p.url.clone()).collect();
    assert_eq!(urls, vec![format!("{}/", site.uri())]);
    assert!(result.relevant.is_empty());
}
