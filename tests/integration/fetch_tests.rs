//! Fetch core behavior against a mock server

use std::sync::Arc;
use std::time::Duration;
use terminal_scraper::config::HttpConfig;
use terminal_scraper::fetch::{FetchError, FetchRequest, Fetcher, RateLimiter, RetryPolicy};
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(max_retries: u32) -> Fetcher {
    Fetcher::new(
        HttpConfig::default(),
        Arc::new(RateLimiter::new(2, Duration::ZERO)),
        RetryPolicy {
            max_retries,
            backoff_base: Duration::from_millis(5),
            backoff_max: Duration::from_millis(20),
        },
    )
}

fn url(server: &MockServer, path: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), path)).unwrap()
}

#[tokio::test]
async fn test_transient_error_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>ok</p>"))
        .mount(&server)
        .await;

    let fetcher = fetcher(2);
    let client = fetcher.session_client().unwrap();
    let response = fetcher
        .fetch(&client, &FetchRequest::get(url(&server, "/flaky")))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "<p>ok</p>");
    assert_eq!(fetcher.requests_sent(), 2);
}

#[tokio::test]
async fn test_retry_budget_is_bounded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = fetcher(2);
    let client = fetcher.session_client().unwrap();
    let err = fetcher
        .fetch(&client, &FetchRequest::get(url(&server, "/down")))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Http { status: 503, .. }));
}

#[tokio::test]
async fn test_unauthorized_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/secure"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(3);
    let client = fetcher.session_client().unwrap();
    let err = fetcher
        .fetch(&client, &FetchRequest::get(url(&server, "/secure")))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Unauthorized { status: 401, .. }));
    assert!(!err.is_retryable());
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

    let fetcher = fetcher(3);
    let client = fetcher.session_client().unwrap();
    let err = fetcher
        .fetch(&client, &FetchRequest::get(url(&server, "/missing")))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Http { status: 404, .. }));
}

#[tokio::test]
async fn test_connection_failure_is_classified() {
    // Nothing listens on port 9 of localhost in the test environment.
    let fetcher = fetcher(0);
    let client = fetcher.session_client().unwrap();
    let err = fetcher
        .fetch(
            &client,
            &FetchRequest::get(Url::parse("http://127.0.0.1:9/").unwrap()),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::ConnectionFailed { .. }));
}

#[tokio::test]
async fn test_post_form_sends_fields() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string_contains("user=demo"))
        .and(body_string_contains("pass=x"))
        .respond_with(ResponseTemplate::new(200).set_body_string("welcome"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(0);
    let client = fetcher.session_client().unwrap();
    let request = FetchRequest::post_form(
        url(&server, "/login"),
        vec![
            ("user".to_string(), "demo".to_string()),
            ("pass".to_string(), "x".to_string()),
        ],
    );

    let response = fetcher.fetch(&client, &request).await.unwrap();
    assert_eq!(response.body, "welcome");
}

#[tokio::test]
async fn test_redirects_are_followed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", format!("{}/new", server.uri()).as_str()),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
        .mount(&server)
        .await;

    let fetcher = fetcher(0);
    let client = fetcher.session_client().unwrap();
    let response = fetcher
        .fetch(&client, &FetchRequest::get(url(&server, "/old")))
        .await
        .unwrap();

    assert_eq!(response.final_url.path(), "/new");
    assert_eq!(response.body, "moved");
}
