//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use ripple_map::config::Config;
use ripple_map::crawler::{crawl, CrawlSummary, Crawler, FetchFailure};
use ripple_map::{CrawlError, ErrorStage, SkipReason};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with a fast rate limit
fn create_test_config(max_depth: u32, max_visited: usize) -> Config {
    let mut config = Config::default();
    config.crawler.max_depth = max_depth;
    config.crawler.max_visited = max_visited;
    config.crawler.workers = 4;
    config.rate_limit.requests_per_second = 1000.0;
    config.rate_limit.burst = 100;
    config.http.timeout_secs = 5;
    config.http.user_agent = "ripple-map-test/1.0".to_string();
    config.http.accept_language = "en-US".to_string();
    config
}

/// HTML response with the given body
fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn run_crawl(seed: &str, config: Config) -> (CrawlSummary, Vec<String>, Vec<CrawlError>) {
    crawl(seed, config).await.expect("crawler should start")
}

fn sorted(mut results: Vec<String>) -> Vec<String> {
    results.sort();
    results
}

#[tokio::test]
async fn test_spawns_one_child_per_in_host_link() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        &format!(
            r#"<a href="/a">A</a>
            <a href="{}/b">B</a>
            <a href="http://other.example/x">External</a>
            <a href="mailto:someone@example.com">Mail</a>"#,
            base
        ),
    )
    .await;
    mount_page(&server, "/a", "<p>A</p>").await;
    mount_page(&server, "/b", "<p>B</p>").await;

    let seed = format!("{}/", base);
    let (summary, results, errors) = run_crawl(&seed, create_test_config(2, 100)).await;

    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    assert_eq!(summary.tasks_scheduled, 3);
    assert_eq!(summary.pages_processed, 3);
    assert_eq!(
        sorted(results.clone()),
        vec![seed.clone(), format!("{}/a", base), format!("{}/b", base)]
    );

    // Every result is on the seed's host
    let seed_url = Url::parse(&seed).unwrap();
    for result in &results {
        let url = Url::parse(result).unwrap();
        assert_eq!(url.host_str(), seed_url.host_str());
        assert_eq!(url.port(), seed_url.port());
    }
}

#[tokio::test]
async fn test_max_visited_of_one_yields_only_seed() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html("A"))
        .expect(0)
        .mount(&server)
        .await;

    let seed = format!("{}/", server.uri());
    let (summary, results, errors) = run_crawl(&seed, create_test_config(2, 1)).await;

    assert_eq!(results, vec![seed]);
    assert!(errors.is_empty());
    assert_eq!(summary.visited, 1);
    assert_eq!(summary.skipped_for(SkipReason::NotClaimed), 2);
}

#[tokio::test]
async fn test_not_found_page_is_reported_as_error() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<a href="/missing">Missing</a><a href="/present">Present</a>"#,
    )
    .await;
    mount_page(&server, "/present", "<p>here</p>").await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let seed = format!("{}/", base);
    let (summary, results, errors) = run_crawl(&seed, create_test_config(2, 100)).await;

    let missing = format!("{}/missing", base);
    assert_eq!(
        sorted(results.clone()),
        vec![seed, format!("{}/present", base)]
    );
    assert!(!results.contains(&missing));

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].stage(), ErrorStage::Status);
    assert_eq!(errors[0].target(), Some(missing.as_str()));
    assert!(matches!(
        &errors[0],
        CrawlError::Status { status, .. } if status.as_u16() == 404
    ));
    assert_eq!(summary.tasks_failed, 1);
}

#[tokio::test]
async fn test_page_without_anchors_is_still_a_result() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<p>No links here</p><link rel="stylesheet" href="/style.css">"#,
    )
    .await;

    let seed = format!("{}/", server.uri());
    let (summary, results, errors) = run_crawl(&seed, create_test_config(3, 100)).await;

    assert_eq!(results, vec![seed]);
    assert!(errors.is_empty());
    assert_eq!(summary.tasks_scheduled, 1);
}

#[tokio::test]
async fn test_shared_target_is_fetched_and_expanded_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
    mount_page(&server, "/a", r#"<a href="/shared">S</a><a href="/">Home</a>"#).await;
    mount_page(&server, "/b", r#"<a href="/shared">S</a><a href="/a">A</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/shared"))
        .respond_with(html(r#"<a href="/leaf">Leaf</a><a href="/b">B</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/leaf"))
        .respond_with(html("leaf"))
        .expect(1)
        .mount(&server)
        .await;

    let seed = format!("{}/", base);
    let (summary, results, errors) = run_crawl(&seed, create_test_config(4, 100)).await;

    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    assert_eq!(results.len(), 5);
    let distinct: HashSet<_> = results.iter().collect();
    assert_eq!(distinct.len(), 5);
    assert_eq!(summary.pages_processed, 5);
    assert!(summary.skipped_for(SkipReason::NotClaimed) > 0);
}

#[tokio::test]
async fn test_depth_limit_is_respected() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/one">1</a>"#).await;
    mount_page(&server, "/one", r#"<a href="/two">2</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/two"))
        .respond_with(html(r#"<a href="/three">3</a>"#))
        .expect(0)
        .mount(&server)
        .await;

    let seed = format!("{}/", base);
    let (summary, results, errors) = run_crawl(&seed, create_test_config(2, 100)).await;

    assert!(errors.is_empty());
    assert_eq!(sorted(results), vec![seed, format!("{}/one", base)]);
    // Links beyond the depth limit are never queued
    assert_eq!(summary.tasks_scheduled, 2);
}

#[tokio::test]
async fn test_max_depth_of_one_fetches_only_seed() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/one">1</a>"#).await;

    let seed = format!("{}/", server.uri());
    let (summary, results, _) = run_crawl(&seed, create_test_config(1, 100)).await;

    assert_eq!(results, vec![seed]);
    assert_eq!(summary.tasks_scheduled, 1);
}

#[tokio::test]
async fn test_results_never_exceed_max_visited() {
    let server = MockServer::start().await;

    let links: String = (0..10)
        .map(|i| format!(r#"<a href="/p{}">{}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", &links).await;
    for i in 0..10 {
        mount_page(&server, &format!("/p{}", i), &links).await;
    }

    let seed = format!("{}/", server.uri());
    let (summary, results, errors) = run_crawl(&seed, create_test_config(3, 5)).await;

    assert!(errors.is_empty());
    assert_eq!(results.len(), 5);
    assert_eq!(results.iter().collect::<HashSet<_>>().len(), 5);
    assert!(results.contains(&seed));
    assert_eq!(summary.visited, 5);
}

#[tokio::test]
async fn test_redirects_are_followed() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/old">Old</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new/"))
        .mount(&server)
        .await;
    mount_page(&server, "/new/", r#"<a href="child">Child</a>"#).await;
    mount_page(&server, "/new/child", "<p>child</p>").await;

    let seed = format!("{}/", base);
    let (_, results, errors) = run_crawl(&seed, create_test_config(3, 100)).await;

    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    // The requested URL is reported; children resolve against the final URL
    assert_eq!(
        sorted(results),
        vec![
            seed,
            format!("{}/new/child", base),
            format!("{}/old", base),
        ]
    );
}

#[tokio::test]
async fn test_redirect_loop_is_a_fetch_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/loop"))
        .mount(&server)
        .await;

    let mut config = create_test_config(2, 100);
    config.http.max_redirects = 3;

    let seed = format!("{}/loop", server.uri());
    let (summary, results, errors) = run_crawl(&seed, config).await;

    assert!(results.is_empty());
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        CrawlError::Fetch { kind: FetchFailure::RedirectLimit, .. }
    ));
    assert_eq!(summary.tasks_failed, 1);
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("slow").set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let mut config = create_test_config(2, 100);
    config.http.timeout_secs = 1;

    let seed = format!("{}/", server.uri());
    let (_, results, errors) = run_crawl(&seed, config).await;

    assert!(results.is_empty());
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        CrawlError::Fetch { kind: FetchFailure::Timeout, .. }
    ));
}

#[tokio::test]
async fn test_requests_carry_fixed_headers() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "ripple-map-test/1.0"))
        .and(header("accept-language", "en-US"))
        .and(header("referer", seed.as_str()))
        .respond_with(html(r#"<a href="/next">Next</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/next"))
        .and(header("referer", seed.as_str()))
        .respond_with(html("next"))
        .expect(1)
        .mount(&server)
        .await;

    let (_, results, errors) = run_crawl(&seed, create_test_config(2, 100)).await;

    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_malformed_link_is_a_parse_error() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<a href="http://[::1">Broken</a><a href="/fine">Fine</a>"#,
    )
    .await;
    mount_page(&server, "/fine", "<p>fine</p>").await;

    let seed = format!("{}/", base);
    let (summary, results, errors) = run_crawl(&seed, create_test_config(2, 100)).await;

    // The parent still succeeds and its other links are followed
    assert_eq!(sorted(results), vec![seed, format!("{}/fine", base)]);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].stage(), ErrorStage::Parse);
    assert_eq!(errors[0].target(), Some("http://[::1"));
    assert_eq!(summary.tasks_failed, 0);
    assert_eq!(summary.errors_recorded, 1);
}

#[tokio::test]
async fn test_malformed_link_on_last_level_is_not_reported() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="http://[::1">Broken</a>"#).await;

    let seed = format!("{}/", server.uri());
    let (summary, results, errors) = run_crawl(&seed, create_test_config(1, 100)).await;

    assert_eq!(results, vec![seed]);
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    assert_eq!(summary.errors_recorded, 0);
    assert_eq!(summary.tasks_scheduled, 1);
}

#[tokio::test]
async fn test_full_result_buffer_drops_results() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
    mount_page(&server, "/a", "<p>A</p>").await;
    mount_page(&server, "/b", "<p>B</p>").await;

    let mut config = create_test_config(2, 100);
    config.crawler.result_buffer = Some(1);

    // Nothing drains the results while the crawl runs
    let seed = format!("{}/", server.uri());
    let (summary, results, errors) = run_crawl(&seed, config).await;

    assert!(errors.is_empty());
    assert_eq!(summary.pages_processed, 3);
    assert_eq!(results.len(), 1);
    assert_eq!(summary.results_emitted, 1);
    assert_eq!(summary.results_dropped, 2);
}

#[tokio::test]
async fn test_shutdown_cancels_pending_fetches() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html("A"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html("B"))
        .expect(0)
        .mount(&server)
        .await;

    // One token up front, then one every ten seconds
    let mut config = create_test_config(2, 100);
    config.rate_limit.requests_per_second = 0.1;
    config.rate_limit.burst = 1;

    let seed = format!("{}/", server.uri());
    let (crawler, output) = Crawler::new(&seed, config).unwrap();
    let shutdown = crawler.shutdown_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        shutdown.trigger();
    });

    let summary = crawler.run().await;
    let (results, errors) = output.collect().await;

    assert_eq!(results, vec![seed]);
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| e.stage() == ErrorStage::RateLimit));
    assert!(summary.elapsed < Duration::from_secs(5));
}

#[tokio::test]
async fn test_invalid_seed_fails_before_crawling() {
    let result = crawl("not a url", create_test_config(2, 100)).await;
    assert!(matches!(result, Err(CrawlError::Url(_))));
}
