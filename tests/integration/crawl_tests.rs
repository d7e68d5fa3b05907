//! End-to-end crawl tests against a mock catalog

use crate::common::{create_test_config, detail_page, listing_page, mount_html, record_urls};
use folio_crawler::crawler::crawl;
use folio_crawler::output::{read_records, write_report, FailureReason};
use folio_crawler::{FetchError, FolioError, RunState, TargetKind};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_two_listings_three_details() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(
        &mock_server,
        "/catalogue/page-1.html",
        listing_page(&["a_1/index.html", "b_2/index.html"], Some("page-2.html")),
        Some(1),
    )
    .await;
    mount_html(
        &mock_server,
        "/catalogue/page-2.html",
        listing_page(&["c_3/index.html"], None),
        Some(1),
    )
    .await;
    for (slug, title) in [("a_1", "Alpha"), ("b_2", "Beta"), ("c_3", "Gamma")] {
        mount_html(
            &mock_server,
            &format!("/catalogue/{}/index.html", slug),
            detail_page(title, Some("£12.50")),
            Some(1),
        )
        .await;
    }

    let config = create_test_config(format!("{}/catalogue/page-1.html", base_url));
    let report = crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.records.len(), 3);
    assert!(report.failures.is_empty());
    assert_eq!(report.pages_fetched, 5);
    assert_eq!(report.listings_visited, 2);
    assert_eq!(report.details_visited, 3);
    assert!(report.complete);
    assert_eq!(report.final_state, RunState::Done);

    let alpha = report
        .records
        .iter()
        .find(|r| r.title == "Alpha")
        .expect("Alpha should be extracted");
    assert_eq!(alpha.price, "£12.50");
    assert_eq!(alpha.availability, "In stock (22 available)");
    assert_eq!(alpha.rating, "Three");
    assert_eq!(alpha.category, "Poetry");
    assert_eq!(
        alpha.image_url.as_deref(),
        Some(format!("{}/media/cover.jpg", base_url).as_str())
    );
    assert_eq!(
        alpha.source_url,
        format!("{}/catalogue/a_1/index.html", base_url)
    );
}

#[tokio::test]
async fn test_missing_price_is_extraction_failure() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(
        &mock_server,
        "/catalogue/page-1.html",
        listing_page(
            &["a_1/index.html", "no-price_2/index.html", "c_3/index.html"],
            None,
        ),
        None,
    )
    .await;
    mount_html(
        &mock_server,
        "/catalogue/a_1/index.html",
        detail_page("Alpha", Some("£1.00")),
        None,
    )
    .await;
    // Extraction failures are not retried
    mount_html(
        &mock_server,
        "/catalogue/no-price_2/index.html",
        detail_page("Priceless", None),
        Some(1),
    )
    .await;
    mount_html(
        &mock_server,
        "/catalogue/c_3/index.html",
        detail_page("Gamma", Some("£3.00")),
        None,
    )
    .await;

    let config = create_test_config(format!("{}/catalogue/page-1.html", base_url));
    let report = crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.records.len(), 2);
    assert!(report.records.iter().all(|r| r.title != "Priceless"));
    assert_eq!(report.failures.len(), 1);

    let failure = &report.failures[0];
    assert_eq!(
        failure.url,
        format!("{}/catalogue/no-price_2/index.html", base_url)
    );
    assert_eq!(failure.kind, TargetKind::Detail);
    assert_eq!(
        failure.reason,
        FailureReason::Extraction {
            missing_field: "price"
        }
    );
    assert_eq!(report.extraction_failures(), 1);
}

#[tokio::test]
async fn test_detail_recovers_after_server_errors() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(
        &mock_server,
        "/catalogue/page-1.html",
        listing_page(&["flaky_1/index.html"], None),
        None,
    )
    .await;

    // Fails twice, then succeeds on the third attempt
    Mock::given(method("GET"))
        .and(path("/catalogue/flaky_1/index.html"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_html(
        &mock_server,
        "/catalogue/flaky_1/index.html",
        detail_page("Flaky", Some("£9.99")),
        Some(1),
    )
    .await;

    let config = create_test_config(format!("{}/catalogue/page-1.html", base_url));
    assert_eq!(config.crawler.max_retries, 2);

    let report = crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].title, "Flaky");
    assert!(report.failures.is_empty());
}

#[tokio::test]
async fn test_unreachable_start_listing_is_fatal() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // One attempt plus two retries
    Mock::given(method("GET"))
        .and(path("/catalogue/page-1.html"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = create_test_config(format!("{}/catalogue/page-1.html", base_url));
    let result = crawl(&config, CancellationToken::new()).await;

    match result {
        Err(FolioError::FatalStart { url, source }) => {
            assert_eq!(url, format!("{}/catalogue/page-1.html", base_url));
            assert_eq!(source, FetchError::HttpStatus { status: 503 });
        }
        other => panic!("expected FatalStart, got {:?}", other.map(|r| r.records)),
    }
}

#[tokio::test]
async fn test_shared_detail_fetched_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(
        &mock_server,
        "/catalogue/page-1.html",
        listing_page(&["shared_1/index.html", "a_2/index.html"], Some("page-2.html")),
        None,
    )
    .await;
    // Same book linked again, spelled with a fragment and a tracking parameter
    mount_html(
        &mock_server,
        "/catalogue/page-2.html",
        listing_page(&["shared_1/index.html#reviews", "shared_1/index.html?utm_source=x"], None),
        None,
    )
    .await;
    mount_html(
        &mock_server,
        "/catalogue/shared_1/index.html",
        detail_page("Shared", Some("£5.00")),
        Some(1),
    )
    .await;
    mount_html(
        &mock_server,
        "/catalogue/a_2/index.html",
        detail_page("Alpha", Some("£5.00")),
        Some(1),
    )
    .await;

    let config = create_test_config(format!("{}/catalogue/page-1.html", base_url));
    let report = crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.records.len(), 2);
    assert_eq!(report.details_visited, 2);

    let urls = record_urls(&report.records);
    let mut deduped = urls.clone();
    deduped.dedup();
    assert_eq!(urls, deduped);
}

#[tokio::test]
async fn test_client_error_not_retried() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(
        &mock_server,
        "/catalogue/page-1.html",
        listing_page(&["gone_1/index.html", "a_2/index.html"], None),
        None,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/catalogue/gone_1/index.html"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_html(
        &mock_server,
        "/catalogue/a_2/index.html",
        detail_page("Alpha", Some("£5.00")),
        None,
    )
    .await;

    let config = create_test_config(format!("{}/catalogue/page-1.html", base_url));
    let report = crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(
        report.failures[0].reason,
        FailureReason::HttpStatus { status: 404 }
    );
    assert_eq!(report.failures[0].attempts, 1);
}

#[tokio::test]
async fn test_links_resolve_against_redirected_url() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/catalogue/page-1.html", base_url).as_str()),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_html(
        &mock_server,
        "/catalogue/page-1.html",
        listing_page(&["a_1/index.html"], None),
        Some(1),
    )
    .await;
    mount_html(
        &mock_server,
        "/catalogue/a_1/index.html",
        detail_page("Alpha", Some("£5.00")),
        Some(1),
    )
    .await;

    let config = create_test_config(format!("{}/", base_url));
    let report = crawl(&config, CancellationToken::new()).await.unwrap();

    assert!(report.failures.is_empty());
    assert_eq!(report.records.len(), 1);
    assert_eq!(
        report.records[0].source_url,
        format!("{}/catalogue/a_1/index.html", base_url)
    );
}

#[tokio::test]
async fn test_redirected_detail_is_accounted_for() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(
        &mock_server,
        "/catalogue/page-1.html",
        listing_page(&["old_1/index.html", "new_1/index.html"], None),
        None,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/catalogue/old_1/index.html"))
        .respond_with(ResponseTemplate::new(301).insert_header(
            "location",
            format!("{}/catalogue/new_1/index.html", base_url).as_str(),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_html(
        &mock_server,
        "/catalogue/new_1/index.html",
        detail_page("Moved", Some("£4.00")),
        None,
    )
    .await;

    let mut config = create_test_config(format!("{}/catalogue/page-1.html", base_url));
    config.crawler.worker_pool_size = 1;

    let report = crawl(&config, CancellationToken::new()).await.unwrap();

    // Start listing plus both detail targets
    let dispatched = 3;
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.duplicates_ignored, 1);
    assert!(report.failures.is_empty());
    assert_eq!(report.succeeded() + report.failed(), dispatched);
}

#[tokio::test]
async fn test_empty_listing_completes_without_records() {
    let mock_server = MockServer::start().await;

    mount_html(
        &mock_server,
        "/catalogue/page-1.html",
        listing_page(&[], None),
        Some(1),
    )
    .await;

    let config = create_test_config(format!("{}/catalogue/page-1.html", mock_server.uri()));
    let report = crawl(&config, CancellationToken::new()).await.unwrap();

    assert!(report.records.is_empty());
    assert!(report.failures.is_empty());
    assert_eq!(report.listings_visited, 1);
    assert!(report.complete);
}

/// Mounts a one-listing catalog of `count` books
async fn mount_catalog(mock_server: &MockServer, count: usize, delay: Duration) {
    let slugs: Vec<String> = (1..=count).map(|i| format!("book_{}/index.html", i)).collect();
    let hrefs: Vec<&str> = slugs.iter().map(String::as_str).collect();
    mount_html(
        mock_server,
        "/catalogue/page-1.html",
        listing_page(&hrefs, None),
        None,
    )
    .await;

    for i in 1..=count {
        Mock::given(method("GET"))
            .and(path(format!("/catalogue/book_{}/index.html", i)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(detail_page(&format!("Book {}", i), Some("£1.00")))
                    .set_delay(delay),
            )
            .mount(mock_server)
            .await;
    }
}

#[tokio::test]
async fn test_repeated_runs_are_idempotent() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server, 6, Duration::ZERO).await;

    let config = create_test_config(format!("{}/catalogue/page-1.html", mock_server.uri()));
    let first = crawl(&config, CancellationToken::new()).await.unwrap();
    let second = crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(first.records.len(), 6);

    let mut first_records = first.records.clone();
    let mut second_records = second.records.clone();
    first_records.sort_by(|a, b| a.source_url.cmp(&b.source_url));
    second_records.sort_by(|a, b| a.source_url.cmp(&b.source_url));
    assert_eq!(first_records, second_records);
}

#[tokio::test]
async fn test_cancelled_run_is_subset_of_full_run() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server, 5, Duration::from_millis(300)).await;

    let mut config = create_test_config(format!("{}/catalogue/page-1.html", mock_server.uri()));
    config.crawler.worker_pool_size = 1;

    let full = crawl(&config, CancellationToken::new()).await.unwrap();
    assert_eq!(full.records.len(), 5);
    assert!(full.complete);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let partial = crawl(&config, cancel).await.unwrap();

    assert!(!partial.complete);
    assert_eq!(partial.final_state, RunState::Done);
    assert!(partial.records.len() < full.records.len());

    let full_urls = record_urls(&full.records);
    for url in record_urls(&partial.records) {
        assert!(full_urls.contains(&url), "{} not in full run", url);
    }
}

#[tokio::test]
async fn test_written_records_have_seven_keys() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server, 2, Duration::ZERO).await;

    let dir = tempfile::tempdir().unwrap();
    let records_path = dir.path().join("out").join("books.json");
    let failures_path = dir.path().join("failures.json");

    let mut config = create_test_config(format!("{}/catalogue/page-1.html", mock_server.uri()));
    config.output.records_path = records_path.display().to_string();
    config.output.failures_path = Some(failures_path.display().to_string());

    let report = crawl(&config, CancellationToken::new()).await.unwrap();
    write_report(&report, &config.output).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&records_path).unwrap()).unwrap();
    let array = value.as_array().unwrap();
    assert_eq!(array.len(), 2);
    for object in array {
        let object = object.as_object().unwrap();
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "availability",
                "category",
                "image_url",
                "price",
                "rating",
                "title",
                "url"
            ]
        );
    }

    assert_eq!(read_records(&records_path).unwrap().len(), 2);
    assert_eq!(
        std::fs::read_to_string(&failures_path).unwrap().trim(),
        "[]"
    );
}
