//! EntityReconciler: field diffs, inserts and per-record isolation

use serde_json::{json, Value};

use catsync_core::domain::payload::{json_configs, project_parameters};
use catsync_core::domain::{
    Category, ChangeKind, ChangeRecord, ProjectJsonConfig, ProjectParameter,
};
use catsync_core::ports::ICatalogStore;
use catsync_sync::entity::decode_section;
use catsync_sync::EntityReconciler;

use crate::common::{self, category_json};

async fn reconcile_categories(
    store: &catsync_cache::SqliteCatalogStore,
    raw: Vec<Value>,
) -> Vec<ChangeRecord> {
    let mut tx = store.begin().await.unwrap();
    let records = EntityReconciler::reconcile(
        tx.as_mut(),
        decode_section::<Category>(&raw, "Category_ID"),
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();
    records
}

#[tokio::test]
async fn test_insert_on_absence() {
    let (_pool, store) = common::setup().await;

    let records = reconcile_categories(&store, vec![category_json(7, "Phones")]).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, ChangeKind::Added);
    assert_eq!(records[0].entity.key.as_deref(), Some("7"));

    let mut tx = store.begin().await.unwrap();
    let stored = tx.get_category(7).await.unwrap().unwrap();
    tx.rollback().await.unwrap();
    assert_eq!(stored.name, "Phones");
    assert_eq!(stored.image, "https://cdn.example/c7.png");
    assert_eq!(stored.sort_order, None);
}

#[tokio::test]
async fn test_field_diff_minimality() {
    let (_pool, store) = common::setup().await;
    reconcile_categories(&store, vec![category_json(1, "A")]).await;

    let unchanged = reconcile_categories(&store, vec![category_json(1, "A")]).await;
    assert!(unchanged.is_empty());

    let changed = reconcile_categories(&store, vec![category_json(1, "B")]).await;
    assert_eq!(changed.len(), 1);
    let record = &changed[0];
    assert_eq!(record.kind, ChangeKind::Updated);
    assert_eq!(record.field.as_deref(), Some("name"));
    assert_eq!(record.old.as_deref(), Some("A"));
    assert_eq!(record.new.as_deref(), Some("B"));
    assert_eq!(record.to_string(), "~ category #1 name: 'A' -> 'B'");
}

#[tokio::test]
async fn test_missing_field_is_skipped_with_one_warning() {
    let (_pool, store) = common::setup().await;

    let records = reconcile_categories(
        &store,
        vec![
            category_json(1, "A"),
            json!({"Category_ID": 2, "Category_Image": "b.png"}),
            category_json(3, "C"),
        ],
    )
    .await;

    assert_eq!(common::count(&records, ChangeKind::Added), 2);
    assert_eq!(common::count(&records, ChangeKind::Warning), 1);
    let warning = records
        .iter()
        .find(|r| r.kind == ChangeKind::Warning)
        .unwrap();
    assert_eq!(warning.entity.key.as_deref(), Some("2"));
    assert!(warning.message.as_deref().unwrap().contains("Category_Name"));

    assert!(common::category_exists(&store, 1).await);
    assert!(!common::category_exists(&store, 2).await);
    assert!(common::category_exists(&store, 3).await);
}

#[tokio::test]
async fn test_storage_fault_only_discards_its_record() {
    let (pool, store) = common::setup().await;
    common::inject_category_fault(&pool, 2).await;

    let records = reconcile_categories(
        &store,
        vec![
            category_json(1, "A"),
            category_json(2, "B"),
            category_json(3, "C"),
        ],
    )
    .await;

    assert_eq!(common::count(&records, ChangeKind::Added), 2);
    assert_eq!(common::count(&records, ChangeKind::Error), 1);
    let failure = records.iter().find(|r| r.kind == ChangeKind::Error).unwrap();
    assert_eq!(failure.entity.key.as_deref(), Some("2"));
    assert!(failure.message.as_deref().unwrap().contains("injected fault"));

    assert!(common::category_exists(&store, 1).await);
    assert!(!common::category_exists(&store, 2).await);
    assert!(common::category_exists(&store, 3).await);
}

#[tokio::test]
async fn test_project_parameters_by_key() {
    let (_pool, store) = common::setup().await;
    let map = json!({
        "min_order_value": 500,
        "min_order_description": "Minimum order",
        "unrelated": true
    });
    let incoming: Vec<ProjectParameter> = project_parameters(map.as_object().unwrap());

    let mut tx = store.begin().await.unwrap();
    let records = EntityReconciler::reconcile(tx.as_mut(), incoming.into_iter().map(Ok).collect())
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].entity.key.as_deref(), Some("min_order"));

    let mut tx = store.begin().await.unwrap();
    let stored = tx.get_parameter("min_order").await.unwrap().unwrap();
    tx.rollback().await.unwrap();
    assert_eq!(stored.value, "500");
    assert_eq!(stored.description.as_deref(), Some("Minimum order"));
}

async fn reconcile_json_configs(
    store: &catsync_cache::SqliteCatalogStore,
    map: &Value,
) -> Vec<ChangeRecord> {
    let incoming: Vec<ProjectJsonConfig> = json_configs(map.as_object().unwrap());
    let mut tx = store.begin().await.unwrap();
    let records = EntityReconciler::reconcile(tx.as_mut(), incoming.into_iter().map(Ok).collect())
        .await
        .unwrap();
    tx.commit().await.unwrap();
    records
}

#[tokio::test]
async fn test_json_config_with_full_precision_floats_is_stable() {
    let (_pool, store) = common::setup().await;
    let map = json!({
        "menu": {
            "v": 1.0715660391465826e-75,
            "ratio": 0.30000000000000004,
            "nested": [2.2250738585072014e-308, 9007199254740993.0]
        }
    });

    let first = reconcile_json_configs(&store, &map).await;
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].to_string(), "+ json config #menu added");

    for _ in 0..3 {
        assert!(reconcile_json_configs(&store, &map).await.is_empty());
    }

    let mut tx = store.begin().await.unwrap();
    let stored = tx.get_json_config("menu").await.unwrap().unwrap();
    tx.rollback().await.unwrap();
    assert_eq!(stored.config_data, map["menu"]);
}
