use std::time::Duration;

use enricher_engine::{
    fetch_html, FailureKind, FetchSettings, PageSession, ReqwestSessionFactory, SessionFactory,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn open(settings: FetchSettings) -> Box<dyn PageSession> {
    ReqwestSessionFactory::new(settings)
        .open(0)
        .expect("session opens")
}

#[tokio::test]
async fn session_returns_page_bytes_and_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<h2 class="product-price">19,99 €</h2>"#,
            "text/html; charset=utf-8",
        ))
        .mount(&server)
        .await;

    let mut session = open(FetchSettings::default());
    let url = format!("{}/p/1", server.uri());

    let output = session.load(&url).await.expect("fetch ok");
    assert_eq!(output.metadata.original_url, url);
    assert_eq!(output.metadata.final_url, url);
    assert!(output
        .metadata
        .content_type
        .unwrap()
        .starts_with("text/html"));
    assert_eq!(output.bytes, r#"<h2 class="product-price">19,99 €</h2>"#.as_bytes());
}

#[tokio::test]
async fn one_session_serves_many_pages() {
    let server = MockServer::start().await;
    for page in ["/p/1", "/p/2", "/p/3"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<p>ok</p>", "text/html"))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut session = open(FetchSettings::default());
    for page in ["/p/1", "/p/2", "/p/3"] {
        let html = fetch_html(session.as_mut(), &format!("{}{page}", server.uri()))
            .await
            .expect("page loads");
        assert_eq!(html, "<p>ok</p>");
    }
}

#[tokio::test]
async fn session_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut session = open(FetchSettings::default());
    let err = session
        .load(&format!("{}/missing", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn session_times_out_on_slow_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("slow"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        page_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let mut session = open(settings);
    let err = session
        .load(&format!("{}/slow", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn session_rejects_too_large_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("01234567890", "text/html"))
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 10,
        ..FetchSettings::default()
    };
    let mut session = open(settings);
    let err = session
        .load(&format!("{}/large", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}

#[tokio::test]
async fn session_rejects_non_html() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;

    let mut session = open(FetchSettings::default());
    let err = session
        .load(&format!("{}/feed.json", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(
        err.kind,
        FailureKind::UnsupportedContentType { .. }
    ));
}

#[tokio::test]
async fn released_session_refuses_loads() {
    let mut session = open(FetchSettings::default());
    session.release();
    session.release();
    let err = session.load("https://shop.example.com/p/1").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::SessionUnavailable);
}

#[tokio::test]
async fn malformed_url_is_reported() {
    let mut session = open(FetchSettings::default());
    let err = session.load("https://").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
