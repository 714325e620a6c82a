//! Successful snapshot fetches

use catsync_core::domain::Selector;
use catsync_core::ports::ISnapshotSource;
use catsync_remote::HttpSnapshotSource;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn test_fetch_on_main_snapshot() {
    let (_server, client) = common::setup_catalog_mock("true", common::sample_body()).await;

    let snapshot = client
        .fetch_snapshot(Selector::OnMain)
        .await
        .expect("fetch failed");

    assert_eq!(snapshot.categories.len(), 1);
    assert_eq!(snapshot.product_marks.len(), 1);
    assert_eq!(snapshot.products.len(), 1);
    assert_eq!(snapshot.special_parameters["min_order_value"], json!(500));
    assert!(snapshot.special_actions.is_empty());
    assert_eq!(
        snapshot.special_json_configs["delivery"],
        json!({"free_from": 3000})
    );
}

#[tokio::test]
async fn test_fetch_sends_selector_as_query() {
    let (_server, client) =
        common::setup_catalog_mock("false", json!({"status": "ok", "products": []})).await;

    let snapshot = client
        .fetch_snapshot(Selector::OffMain)
        .await
        .expect("off-main fetch failed");
    assert!(snapshot.products.is_empty());

    // The mock only answers on_main=false
    let err = client.fetch_snapshot(Selector::OnMain).await.unwrap_err();
    assert_eq!(err.kind(), "protocol");
}

#[tokio::test]
async fn test_missing_sections_are_empty() {
    let (_server, client) = common::setup_catalog_mock("true", json!({"status": "ok"})).await;

    let snapshot = client.fetch_snapshot(Selector::OnMain).await.unwrap();
    assert!(snapshot.categories.is_empty());
    assert!(snapshot.products.is_empty());
    assert!(snapshot.special_json_configs.is_empty());
}

#[tokio::test]
async fn test_provider_delegates_to_client() {
    let (_server, client) = common::setup_catalog_mock("true", common::sample_body()).await;
    let source = HttpSnapshotSource::new(client);

    let snapshot = source.fetch(Selector::OnMain).await.unwrap();
    assert_eq!(snapshot.products[0]["Product_ID"], json!(9));
}
