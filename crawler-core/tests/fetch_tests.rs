//! Fetcher tests against a local mock HTTP server.

use crawler_core::{BrowserClient, FetchConfig, FetchError, HttpClient};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> FetchConfig {
    FetchConfig::empty()
        .header("channel", "local")
        .header("Sec-Fetch-Mode", "navigate")
        .cookie("ahoy_visitor", "abc")
        .cookie("_ga", "GA1")
}

#[tokio::test]
async fn returns_body_on_200() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let client = BrowserClient::new(test_config()).unwrap();
    let html = client
        .fetch_html(&format!("{}/page", server.uri()))
        .await
        .unwrap();
    assert_eq!(html, "<html>ok</html>");
}

#[tokio::test]
async fn sends_configured_headers_and_cookies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("channel", "local"))
        .and(header("sec-fetch-mode", "navigate"))
        .and(header("cookie", "_ga=GA1; ahoy_visitor=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("matched"))
        .expect(1)
        .mount(&server)
        .await;

    let client = BrowserClient::new(test_config()).unwrap();
    let html = client.fetch_html(&server.uri()).await.unwrap();
    assert_eq!(html, "matched");
}

#[tokio::test]
async fn non_200_statuses_are_failures() {
    let server = MockServer::start().await;
    for (route, status) in [("/missing", 404), ("/boom", 500), ("/same", 304), ("/empty", 204)] {
        Mock::given(path(route))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
    }

    let client = BrowserClient::new(test_config()).unwrap();
    for (route, status) in [("/missing", 404), ("/boom", 500), ("/same", 304), ("/empty", 204)] {
        let err = client
            .fetch_html(&format!("{}{}", server.uri(), route))
            .await
            .unwrap_err();
        match err {
            FetchError::Status(code) => assert_eq!(code, status),
            other => panic!("expected status error for {}, got {:?}", route, other),
        }
    }
}

#[tokio::test]
async fn follows_redirects_by_default() {
    let server = MockServer::start().await;
    Mock::given(path("/old"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", format!("{}/new", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved here"))
        .mount(&server)
        .await;

    let client = BrowserClient::new(test_config()).unwrap();
    let html = client
        .fetch_html(&format!("{}/old", server.uri()))
        .await
        .unwrap();
    assert_eq!(html, "moved here");
}

#[tokio::test]
async fn redirect_is_failure_when_following_disabled() {
    let server = MockServer::start().await;
    Mock::given(path("/old"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", format!("{}/new", server.uri())),
        )
        .mount(&server)
        .await;

    let client = BrowserClient::new(test_config().max_redirects(0)).unwrap();
    let err = client
        .fetch_html(&format!("{}/old", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status(302)), "got {:?}", err);
}

#[tokio::test]
async fn redirect_loop_is_classified() {
    let server = MockServer::start().await;
    Mock::given(path("/loop"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", format!("{}/loop", server.uri())),
        )
        .mount(&server)
        .await;

    let client = BrowserClient::new(test_config().max_redirects(2)).unwrap();
    let err = client
        .fetch_html(&format!("{}/loop", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Redirect(_)), "got {:?}", err);
}

#[tokio::test]
async fn slow_origin_times_out() {
    let server = MockServer::start().await;
    Mock::given(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = BrowserClient::new(test_config().timeout(Duration::from_secs(1))).unwrap();
    let err = client
        .fetch_html(&format!("{}/slow", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Timeout), "got {:?}", err);
}

#[tokio::test]
async fn sub_second_timeout_allows_fast_origin() {
    let server = MockServer::start().await;
    Mock::given(path("/fast"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>quick</html>"))
        .mount(&server)
        .await;

    let client = BrowserClient::new(test_config().timeout(Duration::from_millis(500))).unwrap();
    let html = client
        .fetch_html(&format!("{}/fast", server.uri()))
        .await
        .unwrap();
    assert_eq!(html, "<html>quick</html>");
}

#[tokio::test]
async fn sub_second_timeout_still_bounds_slow_origin() {
    let server = MockServer::start().await;
    Mock::given(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = BrowserClient::new(test_config().timeout(Duration::from_millis(300))).unwrap();
    let err = client
        .fetch_html(&format!("{}/slow", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Timeout), "got {:?}", err);
}

#[test]
fn zero_timeouts_are_rejected_before_any_fetch() {
    let zero_total = test_config().timeout(Duration::ZERO);
    assert!(matches!(
        BrowserClient::new(zero_total),
        Err(FetchError::InvalidConfig(_))
    ));

    let zero_connect = FetchConfig {
        connect_timeout_ms: 0,
        ..test_config()
    };
    assert!(matches!(
        BrowserClient::new(zero_connect),
        Err(FetchError::InvalidConfig(_))
    ));
}

#[tokio::test]
async fn refused_connection_is_classified() {
    let client = BrowserClient::new(test_config()).unwrap();
    let err = client.fetch_html("http://127.0.0.1:1/").await.unwrap_err();
    assert!(matches!(err, FetchError::Connect(_)), "got {:?}", err);
}

#[tokio::test]
async fn decodes_declared_charset() {
    let server = MockServer::start().await;
    Mock::given(path("/gbk"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"<p>\xd6\xd0\xce\xc4</p>".to_vec(), "text/html; charset=gbk"),
        )
        .mount(&server)
        .await;

    let client = BrowserClient::new(test_config()).unwrap();
    let html = client
        .fetch_html(&format!("{}/gbk", server.uri()))
        .await
        .unwrap();
    assert_eq!(html, "<p>中文</p>");
}

#[tokio::test]
async fn repeated_fetches_are_identical() {
    let server = MockServer::start().await;
    Mock::given(path("/static"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>same</html>"))
        .expect(2)
        .mount(&server)
        .await;

    let client = BrowserClient::new(test_config()).unwrap();
    let url = format!("{}/static", server.uri());
    let first = client.fetch_html(&url).await.unwrap();
    let second = client.fetch_html(&url).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn default_profile_sends_browser_identity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("channel", "local"))
        .and(header("sec-fetch-dest", "document"))
        .and(header("upgrade-insecure-requests", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>hi</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let html = crawler_core::fetch_html(&server.uri()).await.unwrap();
    assert_eq!(html, "<html>hi</html>");
}
