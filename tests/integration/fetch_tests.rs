//! Fetcher behaviour against a live mock server

use folio_crawler::config::UserAgentConfig;
use folio_crawler::crawler::{build_http_client, Fetcher, FetchStatus};
use folio_crawler::FetchError;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_fetcher(timeout: Duration, max_retries: u32) -> Fetcher {
    let user_agent = UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
    };
    let client = build_http_client(&user_agent, timeout).unwrap();
    Fetcher::new(client, max_retries, Duration::from_millis(10))
}

#[tokio::test]
async fn test_fetch_sends_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page.html"))
        .and(header(
            "user-agent",
            "TestBot/1.0.0 (+https://example.com/contact)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = create_fetcher(Duration::from_secs(2), 0);
    let url = format!("{}/page.html", mock_server.uri());
    let result = fetcher.fetch(&url).await;

    assert_eq!(result.status, FetchStatus::Ok);
    assert_eq!(result.attempts, 1);
    assert_eq!(result.final_url, url);
    assert_eq!(result.body.as_deref(), Some("<html></html>"));
}

#[tokio::test]
async fn test_fetch_timeout_is_retried_then_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_millis(500)),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let fetcher = create_fetcher(Duration::from_millis(100), 1);
    let result = fetcher.fetch(&format!("{}/slow.html", mock_server.uri())).await;

    assert_eq!(result.attempts, 2);
    match result.status {
        FetchStatus::Failed(FetchError::Network { timeout, .. }) => assert!(timeout),
        other => panic!("expected a timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_server_error_exhausts_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .expect(4)
        .mount(&mock_server)
        .await;

    let fetcher = create_fetcher(Duration::from_secs(2), 3);
    let result = fetcher.fetch(&format!("{}/down.html", mock_server.uri())).await;

    assert_eq!(result.attempts, 4);
    assert_eq!(
        result.status,
        FetchStatus::Failed(FetchError::HttpStatus { status: 502 })
    );
}

#[tokio::test]
async fn test_fetch_reports_final_url_after_redirect() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/old.html"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/new.html", base_url).as_str()),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
        .mount(&mock_server)
        .await;

    let fetcher = create_fetcher(Duration::from_secs(2), 0);
    let requested = format!("{}/old.html", base_url);
    let result = fetcher.fetch(&requested).await;

    assert_eq!(result.status, FetchStatus::Ok);
    assert_eq!(result.requested_url, requested);
    assert_eq!(result.final_url, format!("{}/new.html", base_url));
}

#[tokio::test]
async fn test_fetch_redirect_loop_is_not_retried() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/loop.html"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/loop.html", base_url).as_str()),
        )
        .mount(&mock_server)
        .await;

    let fetcher = create_fetcher(Duration::from_secs(2), 3);
    let result = fetcher.fetch(&format!("{}/loop.html", base_url)).await;

    assert_eq!(result.attempts, 1);
    assert!(matches!(
        result.status,
        FetchStatus::Failed(FetchError::InvalidUrl { .. })
    ));
}
