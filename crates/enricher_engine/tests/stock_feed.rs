use std::fs;

use enricher_engine::{
    index_feed_text, load_stock_feed, reconcile_stock, FailureKind, FetchSettings,
    StockFeedError, StockSource,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENVELOPE_FEED: &str = concat!(
    r#"{"value": "[{\"CodProd\":\"A1\",\"StockContable\":5},"#,
    r#"{\"CodProd\":\"B2\",\"StockContable\":\"3.9\"}]"}"#,
);

#[tokio::test]
async fn remote_envelope_feed_is_indexed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stock"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ENVELOPE_FEED, "application/json"))
        .mount(&server)
        .await;

    let source = StockSource::Remote(format!("{}/stock", server.uri()));
    let index = reconcile_stock(Some(&source), &FetchSettings::default()).await;

    assert_eq!(index.len(), 2);
    assert_eq!(index.quantity_for("A1"), 5);
    assert_eq!(index.quantity_for("B2"), 3);
    assert_eq!(index.quantity_for("C3"), 0);
}

#[tokio::test]
async fn failing_remote_feed_degrades_to_empty_index() {
    engine_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stock"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let source = StockSource::Remote(format!("{}/stock", server.uri()));
    let err = load_stock_feed(&source, &FetchSettings::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StockFeedError::Fetch(_)));

    let index = reconcile_stock(Some(&source), &FetchSettings::default()).await;
    assert!(index.is_empty());
}

#[tokio::test]
async fn oversized_remote_feed_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stock"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ENVELOPE_FEED, "application/json"))
        .mount(&server)
        .await;

    let settings = FetchSettings {
        feed_max_bytes: 16,
        ..FetchSettings::default()
    };
    let source = StockSource::Remote(format!("{}/stock", server.uri()));
    let err = load_stock_feed(&source, &settings).await.unwrap_err();
    match err {
        StockFeedError::Fetch(fetch) => assert!(matches!(
            fetch.kind,
            FailureKind::TooLarge { max_bytes: 16, .. }
        )),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(reconcile_stock(Some(&source), &settings).await.is_empty());
}

#[tokio::test]
async fn remote_latin1_feed_is_decoded_by_charset() {
    let server = MockServer::start().await;
    // "Código;Cantidad" in ISO-8859-1.
    let body = b"C\xf3digo;Cantidad\nA1;2\n".to_vec();
    Mock::given(method("GET"))
        .and(path("/stock.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/csv; charset=iso-8859-1"))
        .mount(&server)
        .await;

    let source = StockSource::Remote(format!("{}/stock.csv", server.uri()));
    let text = load_stock_feed(&source, &FetchSettings::default())
        .await
        .unwrap();
    assert!(text.starts_with("Código;Cantidad"));
    assert_eq!(index_feed_text(&text).unwrap().quantity_for("A1"), 2);
}

#[tokio::test]
async fn local_semicolon_feed_is_indexed() {
    let temp = TempDir::new().unwrap();
    let feed = temp.path().join("stock.csv");
    fs::write(&feed, "Codigo;Cantidad\nA1;7\nB2;-4\nA1;9\n").unwrap();

    let index = reconcile_stock(
        Some(&StockSource::Local(feed)),
        &FetchSettings::default(),
    )
    .await;

    assert_eq!(index.quantity_for("A1"), 9);
    assert_eq!(index.quantity_for("B2"), 0);
}

#[tokio::test]
async fn missing_local_feed_is_an_io_error() {
    let temp = TempDir::new().unwrap();
    let source = StockSource::Local(temp.path().join("absent.csv"));

    let err = load_stock_feed(&source, &FetchSettings::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StockFeedError::Io { .. }));
    assert!(reconcile_stock(Some(&source), &FetchSettings::default())
        .await
        .is_empty());
}

#[tokio::test]
async fn no_source_means_no_stock() {
    assert!(reconcile_stock(None, &FetchSettings::default())
        .await
        .is_empty());
}

#[test]
fn single_column_feed_indexes_nothing() {
    let index = index_feed_text("sku\nA1\nB2\n").unwrap();
    assert!(index.is_empty());
}

#[test]
fn unknown_headers_fall_back_to_position() {
    let index = index_feed_text("ref,units_left\nA1,4\n").unwrap();
    assert_eq!(index.quantity_for("A1"), 4);
}
