//! Failure classification: every failure is returned, never retried

use std::time::Duration;

use catsync_core::domain::{FetchError, Selector};
use catsync_remote::client::CatalogClient;
use serde_json::json;
use wiremock::ResponseTemplate;

use crate::common;

#[tokio::test]
async fn test_non_success_status_is_protocol_error() {
    let (server, client) =
        common::setup_raw_mock(ResponseTemplate::new(503), Duration::from_secs(2)).await;

    let err = client.fetch_snapshot(Selector::OnMain).await.unwrap_err();
    assert!(matches!(err, FetchError::Protocol { status: 503 }));

    // Exactly one request, no retry
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_status_not_ok_is_bad_response() {
    let (_server, client) = common::setup_raw_mock(
        ResponseTemplate::new(200)
            .set_body_json(json!({"status": "error", "message": "maintenance"})),
        Duration::from_secs(2),
    )
    .await;

    let err = client.fetch_snapshot(Selector::OnMain).await.unwrap_err();
    match err {
        FetchError::BadResponse(reason) => assert!(reason.contains("maintenance")),
        other => panic!("expected BadResponse, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unparsable_body_is_bad_response() {
    let (_server, client) = common::setup_raw_mock(
        ResponseTemplate::new(200).set_body_string("not json"),
        Duration::from_secs(2),
    )
    .await;

    let err = client.fetch_snapshot(Selector::OnMain).await.unwrap_err();
    assert_eq!(err.kind(), "bad_response");
}

#[tokio::test]
async fn test_slow_server_is_timeout() {
    let (_server, client) = common::setup_raw_mock(
        ResponseTemplate::new(200)
            .set_body_json(json!({"status": "ok"}))
            .set_delay(Duration::from_secs(2)),
        Duration::from_millis(200),
    )
    .await;

    let err = client.fetch_snapshot(Selector::OnMain).await.unwrap_err();
    assert!(matches!(err, FetchError::Timeout(_)), "got {err:?}");
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    // Bind and immediately release a port so nothing listens on it
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client =
        CatalogClient::new(format!("http://127.0.0.1:{port}"), Duration::from_secs(2)).unwrap();

    let err = client.fetch_snapshot(Selector::OnMain).await.unwrap_err();
    assert!(matches!(err, FetchError::Network(_)), "got {err:?}");
}
