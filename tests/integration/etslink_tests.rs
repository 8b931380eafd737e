//! ETSLink runs against a mock portal

use crate::common::{has_event, test_config, LOGIN_PAGE, REJECTED_LOGIN_PAGE, WELCOME_PAGE};
use std::sync::Arc;
use std::time::Duration;
use terminal_scraper::config::LocationEntry;
use terminal_scraper::model::{Credential, LogKind};
use terminal_scraper::{build_adapter, scrape, Fetcher, Orchestrator, Portal, ScrapeRequest};
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LAX_INQUIRY: &str = r#"
<html><head><title>LAX Inquiry</title></head><body>
    <a href="/main/inquiry?PI_TERMINAL_ID=OAK">Oakland</a>
    <a href="javascript:void(0)">Print</a>
    <table>
        <tr><th>Col1</th><th>Col2</th></tr>
        <tr><td>A</td><td>B</td></tr>
    </table>
</body></html>
"#;

async fn mount_login(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string_contains("PI_LOGIN_ID=demo"))
        .and(body_string_contains("PI_PASSWORD=x"))
        .and(body_string_contains("csrf=tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(WELCOME_PAGE))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_partial_failure_end_to_end() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/main/inquiry"))
        .and(query_param("PI_TERMINAL_ID", "LAX"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LAX_INQUIRY))
        .mount(&server)
        .await;

    // Slower than the one-second request timeout on every attempt.
    Mock::given(method("GET"))
        .and(path("/main/inquiry"))
        .and(query_param("PI_TERMINAL_ID", "OAK"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<p>late</p>")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let request = ScrapeRequest::new(Portal::EtsLink, Credential::new("demo", "x"))
        .with_targets(["LAX", "OAK"]);

    let result = scrape(&config, &request).await.unwrap();

    assert!(result.success);
    assert!(result.error.is_none());

    let lax = result.location("LAX").unwrap();
    assert!(lax.is_success());
    assert_eq!(lax.location_name, "Los Angeles");
    assert_eq!(lax.title.as_deref(), Some("LAX Inquiry"));
    assert_eq!(lax.tables.len(), 1);
    assert_eq!(lax.tables[0].headers, vec!["Col1", "Col2"]);
    assert_eq!(lax.tables[0].row_count, 1);
    assert_eq!(lax.tables[0].rows[0], vec!["A", "B"]);
    assert_eq!(lax.links.len(), 1);
    assert_eq!(
        lax.links[0].href,
        format!("{}/main/inquiry?PI_TERMINAL_ID=OAK", server.uri())
    );

    let oak = result.location("OAK").unwrap();
    assert!(!oak.error.as_deref().unwrap().is_empty());
    assert!(oak.links.is_empty());
    assert!(oak.tables.is_empty());

    assert!(has_event(&result, LogKind::Success, "Login successful!"));
    assert!(has_event(&result, LogKind::Success, "LAX"));
    assert!(has_event(&result, LogKind::Error, "OAK"));

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["data"]["LAX"]["tables"][0]["rowCount"], 1);
    assert_eq!(json["data"]["OAK"]["locationCode"], "OAK");
}

#[tokio::test]
async fn test_invalid_credential_skips_fan_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(REJECTED_LOGIN_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/main/inquiry"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let request = ScrapeRequest::new(Portal::EtsLink, Credential::new("demo", "wrong"));
    let result = scrape(&config, &request).await.unwrap();

    assert!(!result.success);
    assert!(result.data.is_none());
    assert!(result
        .error
        .as_deref()
        .unwrap()
        .contains("Invalid User ID or Password"));
    assert!(has_event(&result, LogKind::Error, "Login failed"));
}

#[tokio::test]
async fn test_verification_challenge_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<form><input type="text" name="PI_VERIFY_CODE"></form>"#),
        )
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let request = ScrapeRequest::new(Portal::EtsLink, Credential::new("demo", "x"));
    let result = scrape(&config, &request).await.unwrap();

    assert!(!result.success);
    assert!(result
        .error
        .as_deref()
        .unwrap()
        .contains("verification code required"));
}

#[tokio::test]
async fn test_concurrency_cap_across_ten_locations() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/main/inquiry"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<table><tr><td>x</td></tr></table>")
                .set_delay(Duration::from_millis(50)),
        )
        .expect(10)
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.etslink.locations = (0..10)
        .map(|i| LocationEntry::new(format!("T{}", i), format!("Terminal {}", i)))
        .collect();

    let fetcher = Arc::new(Fetcher::from_config(&config));
    let adapter = build_adapter(Portal::EtsLink, &config, Arc::clone(&fetcher)).unwrap();
    let request = ScrapeRequest::new(Portal::EtsLink, Credential::new("demo", "x"));

    // The orchestrator would allow all ten at once; the shared limiter caps them.
    let result = Orchestrator::new(adapter.as_ref(), 10).run(&request).await;

    assert!(result.success);
    let locations = result.data.as_ref().unwrap().as_locations().unwrap();
    assert_eq!(locations.len(), 10);
    assert!(locations.values().all(|location| location.is_success()));
    assert!(fetcher.limiter().peak_in_flight() <= 3);
    assert_eq!(fetcher.limiter().in_flight(), 0);
}

#[tokio::test]
async fn test_live_location_list_and_unknown_codes() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/main/terminals"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<select><option value="SEA">Seattle</option><option value="LAX">Los Angeles</option></select>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/main/inquiry"))
        .and(query_param("PI_TERMINAL_ID", "SEA"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>Seattle</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.etslink.locations_path = Some("main/terminals".to_string());

    let request = ScrapeRequest::new(Portal::EtsLink, Credential::new("demo", "x"))
        .with_targets(["sea", "OAK"]);
    let result = scrape(&config, &request).await.unwrap();

    assert!(result.success);
    let sea = result.location("SEA").unwrap();
    assert_eq!(sea.location_name, "Seattle");
    assert!(sea.is_success());
    assert!(result.location("OAK").is_none());
    assert!(has_event(&result, LogKind::Info, "OAK: unknown location, skipped"));
}

#[tokio::test]
async fn test_unreachable_portal_fails_run() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let request = ScrapeRequest::new(Portal::EtsLink, Credential::new("demo", "x"));
    let result = scrape(&config, &request).await.unwrap();

    assert!(!result.success);
    assert!(result.error.as_deref().unwrap().contains("portal unavailable"));
}
