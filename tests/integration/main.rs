//! Integration tests for Rufus-RAG
//!
//! These tests use wiremock to stand up mock HTTP servers and exercise
//! fetching, crawling, and the full pipeline end-to-end.

mod crawl_tests;
mod fetcher_tests;
mod helpers;
mod pipeline_tests;
