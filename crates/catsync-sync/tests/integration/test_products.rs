//! ProductReconciler: timestamps, link-replace and owned-set diffs

use chrono::Utc;
use serde_json::{json, Value};

use catsync_cache::SqliteCatalogStore;
use catsync_core::domain::{ChangeKind, ChangeRecord, ChildKind, LinkKind};
use catsync_core::ports::ICatalogStore;
use catsync_sync::ProductReconciler;

use crate::common::{self, category_json, color_json, product_json};

async fn sync_product(store: &SqliteCatalogStore, raw: Value) -> Vec<ChangeRecord> {
    let mut tx = store.begin().await.unwrap();
    let records = ProductReconciler::reconcile(tx.as_mut(), &raw).await.unwrap();
    tx.commit().await.unwrap();
    records
}

#[tokio::test]
async fn test_new_product_is_added() {
    let (_pool, store) = common::setup().await;

    let records = sync_product(&store, product_json(9)).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].to_string(), "+ product #9 added");

    let mut tx = store.begin().await.unwrap();
    let stored = tx.get_product(9).await.unwrap().unwrap();
    tx.rollback().await.unwrap();
    assert_eq!(stored.name, "Product 9");
    assert_eq!(stored.tags, Some(vec!["new".to_string()]));
    assert_eq!(stored.created_at.to_rfc3339(), "2024-01-15T10:30:00+00:00");
}

#[tokio::test]
async fn test_unparsable_created_at_falls_back_with_one_warning() {
    let (_pool, store) = common::setup().await;
    let mut raw = product_json(9);
    raw["Created_At"] = json!("the day before yesterday");

    let before = Utc::now();
    let records = sync_product(&store, raw).await;

    assert_eq!(common::count(&records, ChangeKind::Warning), 1);
    assert_eq!(common::count(&records, ChangeKind::Added), 1);

    let mut tx = store.begin().await.unwrap();
    let stored = tx.get_product(9).await.unwrap().unwrap();
    tx.rollback().await.unwrap();
    // Stored with second-or-better precision, so compare against a small margin
    assert!(stored.created_at >= before - chrono::Duration::seconds(1));
    assert!(stored.created_at <= Utc::now());
}

#[tokio::test]
async fn test_scalar_fields_are_diffed() {
    let (_pool, store) = common::setup().await;
    sync_product(&store, product_json(9)).await;

    let mut raw = product_json(9);
    raw["Product_Name"] = json!("Renamed");
    raw["Created_At"] = json!("Tue, 02 Jan 2024 00:00:00 GMT");
    let records = sync_product(&store, raw).await;

    // created_at is never diffed
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].field.as_deref(), Some("name"));
    assert_eq!(records[0].new.as_deref(), Some("Renamed"));
}

#[tokio::test]
async fn test_rerun_is_silent() {
    let (_pool, store) = common::setup().await;
    let mut raw = product_json(9);
    raw["categories"] = json!([category_json(10, "A")]);
    raw["colors"] = json!([color_json(1, "Black")]);

    assert!(!sync_product(&store, raw.clone()).await.is_empty());
    assert!(sync_product(&store, raw).await.is_empty());
}

#[tokio::test]
async fn test_owned_set_diff() {
    let (_pool, store) = common::setup().await;
    let mut raw = product_json(9);
    raw["colors"] = json!([
        color_json(1, "Black"),
        color_json(2, "White"),
        color_json(3, "Red")
    ]);
    sync_product(&store, raw.clone()).await;

    raw["colors"] = json!([
        color_json(2, "White"),
        color_json(3, "Crimson"),
        color_json(4, "Blue")
    ]);
    let records = sync_product(&store, raw).await;

    assert_eq!(
        common::child_ids(&store, ChildKind::Color, 9).await,
        vec![2, 3, 4]
    );
    assert_eq!(common::count(&records, ChangeKind::Deleted), 1);
    assert_eq!(common::count(&records, ChangeKind::Updated), 1);
    assert_eq!(common::count(&records, ChangeKind::Added), 1);

    let rendered: Vec<String> = records.iter().map(ToString::to_string).collect();
    assert!(rendered.contains(&"- color #1 of product #9 deleted".to_string()));
    assert!(rendered.contains(&"~ color #3 of product #9 name: 'Red' -> 'Crimson'".to_string()));
    assert!(rendered.contains(&"+ color #4 of product #9 added".to_string()));
}

#[tokio::test]
async fn test_absent_section_leaves_children_alone() {
    let (_pool, store) = common::setup().await;
    let mut raw = product_json(9);
    raw["colors"] = json!([color_json(1, "Black")]);
    sync_product(&store, raw).await;

    let records = sync_product(&store, product_json(9)).await;
    assert!(records.is_empty());
    assert_eq!(common::child_ids(&store, ChildKind::Color, 9).await, vec![1]);
}

#[tokio::test]
async fn test_empty_section_clears_children() {
    let (_pool, store) = common::setup().await;
    let mut raw = product_json(9);
    raw["colors"] = json!([color_json(1, "Black")]);
    sync_product(&store, raw.clone()).await;

    raw["colors"] = json!([]);
    let records = sync_product(&store, raw).await;
    assert_eq!(common::count(&records, ChangeKind::Deleted), 1);
    assert!(common::child_ids(&store, ChildKind::Color, 9).await.is_empty());
}

#[tokio::test]
async fn test_malformed_child_is_skipped_but_kept() {
    let (_pool, store) = common::setup().await;
    let mut raw = product_json(9);
    raw["colors"] = json!([color_json(1, "Black"), color_json(2, "White")]);
    sync_product(&store, raw.clone()).await;

    // Color 1 loses its name: skipped with a warning, not deleted
    raw["colors"] = json!([{"Color_ID": 1, "Color_Code": "#000000"}, color_json(2, "White")]);
    let records = sync_product(&store, raw).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, ChangeKind::Warning);
    assert_eq!(common::child_ids(&store, ChildKind::Color, 9).await, vec![1, 2]);
}

#[tokio::test]
async fn test_link_replace() {
    let (_pool, store) = common::setup().await;
    let mut raw = product_json(9);
    raw["categories"] = json!([category_json(10, "Old"), category_json(11, "Kept")]);
    sync_product(&store, raw.clone()).await;
    assert_eq!(
        common::linked_ids(&store, LinkKind::Category, 9).await,
        vec![10, 11]
    );

    // 11 is referenced by ID only; 12 does not exist yet
    raw["categories"] = json!([{"Category_ID": 11}, category_json(12, "New")]);
    let records = sync_product(&store, raw).await;

    assert_eq!(
        common::linked_ids(&store, LinkKind::Category, 9).await,
        vec![11, 12]
    );
    assert!(common::category_exists(&store, 10).await);
    assert!(common::category_exists(&store, 12).await);

    assert_eq!(common::count(&records, ChangeKind::Added), 1);
    assert_eq!(common::count(&records, ChangeKind::Linked), 1);
    let linked = records
        .iter()
        .find(|r| r.kind == ChangeKind::Linked)
        .unwrap();
    assert_eq!(linked.old.as_deref(), Some("[10, 11]"));
    assert_eq!(linked.new.as_deref(), Some("[11, 12]"));
}

#[tokio::test]
async fn test_unknown_link_without_payload_is_skipped() {
    let (_pool, store) = common::setup().await;
    let mut raw = product_json(9);
    raw["marks"] = json!([{"Mark_ID": 5}, {"Mark_ID": 6, "Mark_Name": "Sale"}]);

    let records = sync_product(&store, raw).await;

    assert_eq!(common::linked_ids(&store, LinkKind::Mark, 9).await, vec![6]);
    assert_eq!(common::count(&records, ChangeKind::Warning), 1);
    let warning = records
        .iter()
        .find(|r| r.kind == ChangeKind::Warning)
        .unwrap();
    assert!(warning.message.as_deref().unwrap().contains("Mark_Name"));
}

#[tokio::test]
async fn test_link_fault_keeps_other_links() {
    let (pool, store) = common::setup().await;
    common::inject_category_fault(&pool, 2).await;
    let mut raw = product_json(9);
    raw["categories"] = json!([category_json(1, "A"), category_json(2, "B"), category_json(3, "C")]);

    let records = sync_product(&store, raw).await;

    assert_eq!(
        common::linked_ids(&store, LinkKind::Category, 9).await,
        vec![1, 3]
    );
    assert_eq!(common::count(&records, ChangeKind::Error), 1);
}

#[tokio::test]
async fn test_invalid_product_is_skipped() {
    let (_pool, store) = common::setup().await;
    let records = sync_product(&store, json!({"Product_ID": 4, "OnMain": false})).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, ChangeKind::Warning);
    assert_eq!(records[0].entity.key.as_deref(), Some("4"));
}

#[tokio::test]
async fn test_unparsable_updated_at_on_existing_product_uses_now() {
    let (_pool, store) = common::setup().await;
    sync_product(&store, product_json(9)).await;

    let mut raw = product_json(9);
    raw["Updated_At"] = json!("not a date");
    let before = Utc::now();
    let records = sync_product(&store, raw).await;

    assert_eq!(common::count(&records, ChangeKind::Warning), 1);
    assert_eq!(records.len(), 2);
    let update = records
        .iter()
        .find(|r| r.kind == ChangeKind::Updated)
        .unwrap();
    assert_eq!(update.field.as_deref(), Some("updated_at"));

    let mut tx = store.begin().await.unwrap();
    let stored = tx.get_product(9).await.unwrap().unwrap();
    tx.rollback().await.unwrap();
    assert!(stored.updated_at >= before - chrono::Duration::seconds(1));
    assert_eq!(stored.created_at.to_rfc3339(), "2024-01-15T10:30:00+00:00");
}

#[tokio::test]
async fn test_image_with_text_position_is_stored() {
    let (_pool, store) = common::setup().await;
    let mut raw = product_json(9);
    raw["images"] = json!([
        {"Image_ID": 1, "Image_URL": "https://cdn.example/1.jpg", "MainImage": true, "position": "1"},
        {"Image_ID": 2, "Image_URL": "https://cdn.example/2.jpg", "MainImage": false, "position": "left"}
    ]);

    let records = sync_product(&store, raw.clone()).await;
    assert_eq!(common::count(&records, ChangeKind::Warning), 0);
    assert_eq!(
        common::child_ids(&store, ChildKind::Image, 9).await,
        vec![1, 2]
    );

    let catalog = store.load_catalog().await.unwrap();
    let positions: Vec<Option<&str>> = catalog[0]
        .images
        .iter()
        .map(|i| i.position.as_deref())
        .collect();
    assert_eq!(positions, vec![Some("1"), Some("left")]);

    assert!(sync_product(&store, raw).await.is_empty());
}
