//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock catalog servers and exercise
//! the full crawl cycle end-to-end.

mod crawl_tests;
mod fetch_tests;
