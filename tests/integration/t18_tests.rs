//! T18 runs against a mock portal

use crate::common::{has_event, test_config};
use terminal_scraper::model::{Credential, LogKind};
use terminal_scraper::{scrape, Portal, ScrapeRequest};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const T18_LOGIN_PAGE: &str = r#"
<html><head><title>T18 Login</title></head><body>
    <form id="loginForm" action="j_security_check" method="post">
        <input type="hidden" name="csrf" value="tok-18">
        <input type="text" name="j_username">
        <input type="password" name="j_password">
    </form>
</body></html>
"#;

const T18_DASHBOARD: &str = r##"
<html><head><title>T18 Dashboard</title></head><body>
    <nav>
        <a href="availability.do">Container Availability</a>
        <a href="javascript:openHelp()">Help</a>
        <a href="#top">Top</a>
    </nav>
    <table>
        <thead><tr><th>Vessel</th><th>Voyage</th><th>ETA</th></tr></thead>
        <tbody>
            <tr><td>MAERSK KOLKATA</td><td>412W</td><td>2024-05-02</td></tr>
            <tr><td>CMA CGM ARGENTINA</td><td>0MX3</td><td>2024-05-04</td></tr>
        </tbody>
    </table>
</body></html>
"##;

async fn mount_login_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/fc-T18/default.do"))
        .respond_with(ResponseTemplate::new(200).set_body_string(T18_LOGIN_PAGE))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_and_dashboard_scrape() {
    let server = MockServer::start().await;
    mount_login_page(&server).await;

    Mock::given(method("POST"))
        .and(path("/fc-T18/j_security_check"))
        .and(body_string_contains("j_username=demo"))
        .and(body_string_contains("j_password=x"))
        .and(body_string_contains("csrf=tok-18"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "JSESSIONID=t18session; Path=/")
                .set_body_string("<html><body><h1>Welcome</h1></body></html>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    // Only answers when the session cookie from the login response is sent,
    // with the post-login page as referrer.
    Mock::given(method("GET"))
        .and(path("/fc-T18/dashboard.do"))
        .and(header("cookie", "JSESSIONID=t18session"))
        .and(header(
            "referer",
            format!("{}/fc-T18/j_security_check", server.uri()).as_str(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(T18_DASHBOARD))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let request = ScrapeRequest::new(Portal::T18, Credential::new("demo", "x"));
    let result = scrape(&config, &request).await.unwrap();

    assert!(result.success);
    let page = result.data.as_ref().unwrap().as_page().unwrap();
    assert!(page.error.is_none());
    assert_eq!(page.title.as_deref(), Some("T18 Dashboard"));

    assert_eq!(page.links.len(), 1);
    assert_eq!(page.links[0].text, "Container Availability");
    assert_eq!(
        page.links[0].href,
        format!("{}/fc-T18/availability.do", server.uri())
    );

    assert_eq!(page.tables.len(), 1);
    assert_eq!(page.tables[0].headers, vec!["Vessel", "Voyage", "ETA"]);
    assert_eq!(page.tables[0].row_count, 2);

    assert!(has_event(&result, LogKind::Success, "Login successful!"));
    assert!(has_event(&result, LogKind::Info, "Fetching T18 Dashboard..."));
    assert!(has_event(&result, LogKind::Success, "DASHBOARD: 1 tables, 1 links"));
}

#[tokio::test]
async fn test_rejected_login_never_fetches_dashboard() {
    let server = MockServer::start().await;
    mount_login_page(&server).await;

    Mock::given(method("POST"))
        .and(path("/fc-T18/j_security_check"))
        .respond_with(ResponseTemplate::new(200).set_body_string(T18_LOGIN_PAGE))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fc-T18/dashboard.do"))
        .respond_with(ResponseTemplate::new(200).set_body_string(T18_DASHBOARD))
        .expect(0)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let request = ScrapeRequest::new(Portal::T18, Credential::new("demo", "wrong"));
    let result = scrape(&config, &request).await.unwrap();

    assert!(!result.success);
    assert!(result.error.as_deref().unwrap().contains("invalid credential"));
    assert!(has_event(&result, LogKind::Error, "Login failed"));
}

#[tokio::test]
async fn test_forbidden_login_is_invalid_credential() {
    let server = MockServer::start().await;
    mount_login_page(&server).await;

    Mock::given(method("POST"))
        .and(path("/fc-T18/j_security_check"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let request = ScrapeRequest::new(Portal::T18, Credential::new("demo", "x"));
    let result = scrape(&config, &request).await.unwrap();

    assert!(!result.success);
    assert!(result.error.as_deref().unwrap().starts_with("invalid credential"));
}

#[tokio::test]
async fn test_dashboard_failure_is_partial() {
    let server = MockServer::start().await;
    mount_login_page(&server).await;

    Mock::given(method("POST"))
        .and(path("/fc-T18/j_security_check"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Welcome</h1>"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fc-T18/dashboard.do"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let request = ScrapeRequest::new(Portal::T18, Credential::new("demo", "x"));
    let result = scrape(&config, &request).await.unwrap();

    assert!(result.success);
    let page = result.data.as_ref().unwrap().as_page().unwrap();
    assert!(page.error.as_deref().unwrap().contains("500"));
    assert!(page.tables.is_empty());
    assert!(has_event(&result, LogKind::Error, "DASHBOARD"));
}

#[tokio::test]
async fn test_missing_password_is_validation_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let request = ScrapeRequest::new(Portal::T18, Credential::new("demo", ""));
    let result = scrape(&config, &request).await.unwrap();

    assert!(!result.success);
    assert!(has_event(&result, LogKind::Error, "Validation failed"));
}

#[tokio::test]
async fn test_get_login_form_submits_query_string() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fc-T18/default.do"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<form action="login.do" method="get">
                <input type="hidden" name="csrf" value="tok-18">
                <input type="text" name="j_username">
                <input type="password" name="j_password">
            </form>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fc-T18/login.do"))
        .and(query_param("csrf", "tok-18"))
        .and(query_param("j_username", "demo"))
        .and(query_param("j_password", "x"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Welcome</h1>"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fc-T18/dashboard.do"))
        .respond_with(ResponseTemplate::new(200).set_body_string(T18_DASHBOARD))
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let request = ScrapeRequest::new(Portal::T18, Credential::new("demo", "x"));
    let result = scrape(&config, &request).await.unwrap();

    assert!(result.success);
    assert!(has_event(&result, LogKind::Success, "Login successful!"));
}
