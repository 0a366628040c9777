//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use kraul::config::{Config, SinkConfig, SinkFailureMode, SinkKind};
use kraul::crawler::Coordinator;
use kraul::sink::{build_sink, HttpSink, MemorySink, SqliteSink};
use kraul::CrawlerError;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Upper bound for any single crawl in these tests
const CRAWL_DEADLINE: Duration = Duration::from_secs(30);

/// Creates a fast test configuration
fn create_test_config(workers: usize) -> Config {
    let mut config = Config::default();
    config.crawler.workers = workers;
    config.crawler.fetch_delay_ms = 0;
    config.crawler.fetch_timeout_secs = 5;
    config.crawler.connect_timeout_secs = 1;
    config.user_agent.crawler_name = "TestBot".to_string();
    config
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

/// Mounts a small site:
///
/// - `/` links to `/b`, `./c`, itself, a fragment, a phone number and a dead host
/// - `/b` links back to `/`
/// - `/c` sets `<base href="/docs/">` and links to `intro`
/// - `/docs/intro` answers 404 but still links to `/b`
///
/// Each page expects exactly one request.
async fn mount_site(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            r##"
            <a href="/b">B</a>
            <a href="./c">C</a>
            <a href="/">Home</a>
            <a href="#x">Anchor</a>
            <a href="tel://5551234">Call us</a>
            <a href="mailto:someone@example.com">Mail</a>
            <a href="http://127.0.0.1:1/">Dead</a>
            "##,
        ))
        .expect(1)
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html_page(r#"<a href="/">Back</a>"#))
        .expect(1)
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(
                r#"<html><head><base href="/docs/"></head><body><a href="intro">Intro</a></body></html>"#,
            ),
        )
        .expect(1)
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/intro"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"<a href="/b">B</a>"#))
        .expect(1)
        .mount(mock_server)
        .await;
}

fn expected_site_addresses(base: &str) -> Vec<String> {
    let mut expected = vec![
        format!("{}/", base),
        format!("{}/b", base),
        format!("{}/c", base),
        format!("{}/docs/intro", base),
        "http://127.0.0.1:1/".to_string(),
    ];
    expected.sort();
    expected
}

#[tokio::test]
async fn test_full_crawl_reaches_quiescence() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_site(&mock_server).await;

    let sink = MemorySink::new();
    let seed = format!("{}/", base_url);

    let summary = tokio::time::timeout(
        CRAWL_DEADLINE,
        kraul::crawl(create_test_config(3), &seed, Box::new(sink.clone())),
    )
    .await
    .expect("crawl did not terminate")
    .expect("crawl failed");

    assert_eq!(summary.pages_fetched, 4);
    assert_eq!(summary.fetch_errors, 1);
    assert_eq!(summary.pages_stored, 4);
    assert!(!summary.cancelled);
    assert_eq!(summary.visited, expected_site_addresses(&base_url));

    let pages = sink.pages();
    assert_eq!(pages.len(), 4);

    let home = pages
        .iter()
        .find(|page| page.url.as_str() == seed)
        .expect("seed page stored");
    assert_eq!(home.phone_numbers, vec!["tel://5551234"]);
    assert!(home
        .links
        .iter()
        .all(|link| link.fragment().is_none()));
    assert!(home
        .links
        .iter()
        .any(|link| link.scheme() == "mailto"));

    let c = pages
        .iter()
        .find(|page| page.url.path() == "/c")
        .expect("base-tag page stored");
    assert_eq!(c.links, vec![Url::parse(&format!("{}/docs/intro", base_url)).unwrap()]);
}

#[tokio::test]
async fn test_single_worker_gives_same_result() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_site(&mock_server).await;

    let mut config = create_test_config(1);
    config.crawler.dispatch_capacity = 1;

    let summary = tokio::time::timeout(
        CRAWL_DEADLINE,
        kraul::crawl(config, &format!("{}/", base_url), Box::new(MemorySink::new())),
    )
    .await
    .expect("crawl did not terminate")
    .expect("crawl failed");

    assert_eq!(summary.pages_fetched, 4);
    assert_eq!(summary.visited, expected_site_addresses(&base_url));
}

#[tokio::test]
async fn test_wide_page_does_not_deadlock() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let links: String = (0..40)
        .map(|i| format!(r#"<a href="/leaf/{}">{}</a>"#, i, i))
        .collect();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(&links))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(html_page(r#"<a href="/">Home</a>"#))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(2);
    config.crawler.dispatch_capacity = 1;

    let summary = tokio::time::timeout(
        CRAWL_DEADLINE,
        kraul::crawl(config, &format!("{}/", base_url), Box::new(MemorySink::new())),
    )
    .await
    .expect("crawl did not terminate")
    .expect("crawl failed");

    assert_eq!(summary.pages_fetched, 41);
    assert_eq!(summary.visited.len(), 41);
    assert_eq!(summary.fetch_errors, 0);
}

#[tokio::test]
async fn test_unreachable_seed() {
    let summary = tokio::time::timeout(
        CRAWL_DEADLINE,
        kraul::crawl(
            create_test_config(2),
            "http://127.0.0.1:1/",
            Box::new(MemorySink::new()),
        ),
    )
    .await
    .expect("crawl did not terminate")
    .expect("crawl failed");

    assert_eq!(summary.pages_fetched, 0);
    assert_eq!(summary.fetch_errors, 1);
    assert_eq!(summary.visited, vec!["http://127.0.0.1:1/"]);
}

#[tokio::test]
async fn test_invalid_seed_is_rejected() {
    for seed in ["not a url", "ftp://example.com/", "mailto:someone@example.com"] {
        let result = kraul::crawl(create_test_config(1), seed, Box::new(MemorySink::new())).await;
        assert!(
            matches!(result, Err(CrawlerError::InvalidSeed { .. })),
            "seed {} should be rejected",
            seed
        );
    }
}

#[tokio::test]
async fn test_cancellation_stops_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // A long chain of slow pages
    for i in 0..50 {
        Mock::given(method("GET"))
            .and(path(format!("/p{}", i)))
            .respond_with(
                html_page(&format!(r#"<a href="/p{}">next</a>"#, i + 1))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&mock_server)
            .await;
    }

    let token = CancellationToken::new();
    let seed = Url::parse(&format!("{}/p0", base_url)).unwrap();
    let coordinator = Coordinator::new(create_test_config(2), seed, Box::new(MemorySink::new()))
        .unwrap()
        .with_cancellation(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        token.cancel();
    });

    let summary = tokio::time::timeout(CRAWL_DEADLINE, coordinator.run())
        .await
        .expect("crawl did not stop after cancellation")
        .expect("crawl failed");
    canceller.await.unwrap();

    assert!(summary.cancelled);
    assert!(summary.pages_fetched >= 1);
    assert!(summary.pages_fetched < 50);
    assert_eq!(summary.pages_stored, summary.pages_fetched);
}

#[tokio::test]
async fn test_sqlite_sink_stores_every_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_site(&mock_server).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("pages.db");

    let mut config = create_test_config(2);
    config.sink = SinkConfig {
        kind: SinkKind::Sqlite,
        database_path: db_path.to_string_lossy().to_string(),
        ..SinkConfig::default()
    };

    let sink = build_sink(&config).unwrap();
    let summary = tokio::time::timeout(
        CRAWL_DEADLINE,
        kraul::crawl(config, &format!("{}/", base_url), sink),
    )
    .await
    .expect("crawl did not terminate")
    .expect("crawl failed");

    assert_eq!(summary.pages_stored, 4);

    let storage = SqliteSink::open(&db_path).unwrap();
    assert_eq!(storage.count_pages().unwrap(), 4);

    let home = storage
        .get_page(&format!("{}/", base_url))
        .unwrap()
        .expect("seed page stored");
    assert_eq!(home.phone_numbers, vec!["tel://5551234"]);
    assert!(home.links.contains(&format!("{}/b", base_url)));
}

#[tokio::test]
async fn test_fatal_sink_failure_aborts_crawl() {
    let site = MockServer::start().await;
    mount_site_without_expectations(&site).await;

    let store = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&store)
        .await;

    let mut config = create_test_config(2);
    config.sink.failure_policy = SinkFailureMode::Fatal;

    let sink = HttpSink::new(&format!("{}/text/article", store.uri())).unwrap();
    let seed = Url::parse(&format!("{}/", site.uri())).unwrap();

    let result = tokio::time::timeout(
        CRAWL_DEADLINE,
        Coordinator::new(config, seed, Box::new(sink)).unwrap().run(),
    )
    .await
    .expect("crawl did not terminate");

    assert!(matches!(result, Err(CrawlerError::SinkWrite { .. })));
}

#[tokio::test]
async fn test_sink_failure_continues_by_default() {
    let site = MockServer::start().await;
    mount_site_without_expectations(&site).await;

    let store = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&store)
        .await;

    let sink = HttpSink::new(&format!("{}/text/article", store.uri())).unwrap();
    let seed = Url::parse(&format!("{}/", site.uri())).unwrap();

    let summary = tokio::time::timeout(
        CRAWL_DEADLINE,
        Coordinator::new(create_test_config(2), seed, Box::new(sink))
            .unwrap()
            .run(),
    )
    .await
    .expect("crawl did not terminate")
    .expect("crawl failed");

    assert_eq!(summary.pages_fetched, 4);
    assert_eq!(summary.pages_stored, 0);
}

/// Same site as `mount_site`, for tests that may stop before every page is fetched
async fn mount_site_without_expectations(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(r#"<a href="/b">B</a><a href="./c">C</a>"#))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html_page(r#"<a href="/">Back</a>"#))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(html_page(r#"<a href="/docs/intro">Intro</a>"#))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/intro"))
        .respond_with(html_page(""))
        .mount(mock_server)
        .await;
}
