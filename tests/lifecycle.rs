//! Client lifecycle and asset fetch tests.

mod common;

use common::*;
use integrations_instatus::{InstatusErrorKind, RequestOptions, Route};
use reqwest::Method;
use serde_json::json;
use std::time::{Duration, Instant};
use test_case::test_case;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_close_cancels_in_flight_requests() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/v1/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let pending = {
        let client = client.clone();
        tokio::spawn(async move {
            client
                .request(Route::new(Method::GET, "v1/slow"), RequestOptions::new())
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let start = Instant::now();
    client.close().await;
    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(client.is_closed());

    let error = pending.await.unwrap().unwrap_err();
    assert_eq!(error.kind(), InstatusErrorKind::Closed);
}

#[tokio::test]
async fn test_recreate_after_close() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/v1/user"))
        .respond_with(success_response(json!({ "id": "usr-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.close().await;

    let error = client.user().get().await.unwrap_err();
    assert_eq!(error.kind(), InstatusErrorKind::Closed);
    assert_eq!(client.metrics().requests_failed, 1);

    client.recreate().unwrap();
    assert!(!client.is_closed());
    assert_eq!(client.user().get().await.unwrap().id, "usr-1");
}

#[tokio::test]
async fn test_recreate_while_close_waits_keeps_new_pool() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/v1/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/user"))
        .respond_with(success_response(json!({ "id": "usr-1" })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let pending = {
        let client = client.clone();
        tokio::spawn(async move {
            client
                .request(Route::new(Method::GET, "v1/slow"), RequestOptions::new())
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let closing = client.close();
    tokio::pin!(closing);
    tokio::select! {
        biased;
        _ = &mut closing => panic!("close finished with a request in flight"),
        _ = std::future::ready(()) => {}
    }
    assert!(client.is_closed());

    client.recreate().unwrap();
    closing.await;

    assert!(!client.is_closed());
    assert!(pending.await.unwrap().is_ok());
    assert_eq!(client.user().get().await.unwrap().id, "usr-1");
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let server = setup_mock_server().await;
    let client = client_for(&server);

    client.close().await;
    client.close().await;
    assert!(client.is_closed());
}

#[tokio::test]
async fn test_get_from_cdn_returns_bytes() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/assets/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G']))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let bytes = client
        .get_from_cdn(&format!("{}/assets/logo.png", server.uri()))
        .await
        .unwrap();

    assert_eq!(bytes.as_ref(), &[0x89, b'P', b'N', b'G']);
}

#[test_case(404, InstatusErrorKind::NotFound, "asset not found")]
#[test_case(403, InstatusErrorKind::Forbidden, "cannot retrieve asset")]
#[test_case(500, InstatusErrorKind::HttpException, "failed to get asset")]
#[test_case(503, InstatusErrorKind::HttpException, "failed to get asset")]
#[tokio::test]
async fn test_get_from_cdn_errors(status: u16, kind: InstatusErrorKind, message: &str) {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/assets/missing.png"))
        .respond_with(ResponseTemplate::new(status))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let error = client
        .get_from_cdn(&format!("{}/assets/missing.png", server.uri()))
        .await
        .unwrap_err();

    assert_eq!(error.kind(), kind);
    assert_eq!(error.status_code(), Some(status));
    assert_eq!(error.message(), message);
}
