//! Shared fixtures: store setup, fake snapshot sources and run logs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use catsync_cache::{DatabasePool, SqliteCatalogStore};
use catsync_core::domain::{
    Category, ChangeKind, ChangeRecord, ChildKind, ChildRecord, FetchError, LinkKind, Mark,
    Product, ProductView, ProjectAction, ProjectBadge, ProjectJsonConfig, ProjectParameter,
    Selector, Snapshot, SyncReport,
};
use catsync_core::ports::{
    ICatalogStore, ICatalogTransaction, IRunLog, ISnapshotSource, RunLogEntry,
};

// ============================================================================
// Store
// ============================================================================

pub async fn setup() -> (DatabasePool, Arc<SqliteCatalogStore>) {
    let pool = DatabasePool::in_memory()
        .await
        .expect("Failed to create in-memory database");
    let store = Arc::new(SqliteCatalogStore::new(pool.pool().clone()));
    (pool, store)
}

/// Makes every insert of the given category ID fail inside SQLite
pub async fn inject_category_fault(pool: &DatabasePool, category_id: i64) {
    let sql = format!(
        "CREATE TRIGGER fail_category_insert BEFORE INSERT ON categories \
         WHEN NEW.category_id = {category_id} \
         BEGIN SELECT RAISE(ABORT, 'injected fault'); END;"
    );
    sqlx::raw_sql(&sql)
        .execute(pool.pool())
        .await
        .expect("Failed to create fault trigger");
}

pub async fn linked_ids(store: &SqliteCatalogStore, kind: LinkKind, product_id: i64) -> Vec<i64> {
    let mut tx = store.begin().await.unwrap();
    let ids = tx.linked_ids(kind, product_id).await.unwrap();
    tx.rollback().await.unwrap();
    ids
}

pub async fn child_ids(store: &SqliteCatalogStore, kind: ChildKind, product_id: i64) -> Vec<i64> {
    let mut tx = store.begin().await.unwrap();
    let ids = tx
        .load_children(kind, product_id)
        .await
        .unwrap()
        .iter()
        .map(|c| c.id())
        .collect();
    tx.rollback().await.unwrap();
    ids
}

pub async fn category_exists(store: &SqliteCatalogStore, id: i64) -> bool {
    let mut tx = store.begin().await.unwrap();
    let found = tx.get_category(id).await.unwrap().is_some();
    tx.rollback().await.unwrap();
    found
}

pub fn count(records: &[ChangeRecord], kind: ChangeKind) -> usize {
    records.iter().filter(|r| r.kind == kind).count()
}

/// Which step of the chosen transaction fails
#[derive(Clone, Copy)]
enum Fault {
    Begin,
    Commit,
}

/// Store wrapper that fails the transaction opened by the given 1-based
/// `begin()` call, either when it is opened or when it is committed
pub struct FlakyStore {
    inner: Arc<SqliteCatalogStore>,
    fail_on: usize,
    fault: Fault,
    calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: Arc<SqliteCatalogStore>, fail_on: usize) -> Self {
        Self::with_fault(inner, fail_on, Fault::Begin)
    }

    /// The chosen transaction does all its work, then its commit fails
    pub fn failing_commit(inner: Arc<SqliteCatalogStore>, fail_on: usize) -> Self {
        Self::with_fault(inner, fail_on, Fault::Commit)
    }

    fn with_fault(inner: Arc<SqliteCatalogStore>, fail_on: usize, fault: Fault) -> Self {
        Self {
            inner,
            fail_on,
            fault,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ICatalogStore for FlakyStore {
    async fn begin(&self) -> Result<Box<dyn ICatalogTransaction>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call != self.fail_on {
            return self.inner.begin().await;
        }
        match self.fault {
            Fault::Begin => anyhow::bail!("simulated storage outage"),
            Fault::Commit => Ok(Box::new(CommitFailingTransaction {
                inner: self.inner.begin().await?,
            })),
        }
    }

    async fn load_catalog(&self) -> Result<Vec<ProductView>> {
        self.inner.load_catalog().await
    }
}

/// Delegates every call, but rolls back and errors on commit
struct CommitFailingTransaction {
    inner: Box<dyn ICatalogTransaction>,
}

#[async_trait]
impl ICatalogTransaction for CommitFailingTransaction {
    async fn savepoint(&mut self) -> Result<()> {
        self.inner.savepoint().await
    }
    async fn release_savepoint(&mut self) -> Result<()> {
        self.inner.release_savepoint().await
    }
    async fn rollback_to_savepoint(&mut self) -> Result<()> {
        self.inner.rollback_to_savepoint().await
    }
    async fn commit(self: Box<Self>) -> Result<()> {
        self.inner.rollback().await?;
        anyhow::bail!("simulated disk full on commit")
    }
    async fn rollback(self: Box<Self>) -> Result<()> {
        self.inner.rollback().await
    }

    async fn get_category(&mut self, id: i64) -> Result<Option<Category>> {
        self.inner.get_category(id).await
    }
    async fn insert_category(&mut self, category: &Category) -> Result<()> {
        self.inner.insert_category(category).await
    }
    async fn update_category(&mut self, category: &Category) -> Result<()> {
        self.inner.update_category(category).await
    }

    async fn get_mark(&mut self, id: i64) -> Result<Option<Mark>> {
        self.inner.get_mark(id).await
    }
    async fn insert_mark(&mut self, mark: &Mark) -> Result<()> {
        self.inner.insert_mark(mark).await
    }
    async fn update_mark(&mut self, mark: &Mark) -> Result<()> {
        self.inner.update_mark(mark).await
    }

    async fn get_product(&mut self, id: i64) -> Result<Option<Product>> {
        self.inner.get_product(id).await
    }
    async fn insert_product(&mut self, product: &Product) -> Result<()> {
        self.inner.insert_product(product).await
    }
    async fn update_product(&mut self, product: &Product) -> Result<()> {
        self.inner.update_product(product).await
    }

    async fn get_parameter(&mut self, key: &str) -> Result<Option<ProjectParameter>> {
        self.inner.get_parameter(key).await
    }
    async fn insert_parameter(&mut self, parameter: &ProjectParameter) -> Result<()> {
        self.inner.insert_parameter(parameter).await
    }
    async fn update_parameter(&mut self, parameter: &ProjectParameter) -> Result<()> {
        self.inner.update_parameter(parameter).await
    }

    async fn get_action(&mut self, id: i64) -> Result<Option<ProjectAction>> {
        self.inner.get_action(id).await
    }
    async fn insert_action(&mut self, action: &ProjectAction) -> Result<()> {
        self.inner.insert_action(action).await
    }
    async fn update_action(&mut self, action: &ProjectAction) -> Result<()> {
        self.inner.update_action(action).await
    }

    async fn get_badge(&mut self, id: i64) -> Result<Option<ProjectBadge>> {
        self.inner.get_badge(id).await
    }
    async fn insert_badge(&mut self, badge: &ProjectBadge) -> Result<()> {
        self.inner.insert_badge(badge).await
    }
    async fn update_badge(&mut self, badge: &ProjectBadge) -> Result<()> {
        self.inner.update_badge(badge).await
    }

    async fn get_json_config(&mut self, config_type: &str) -> Result<Option<ProjectJsonConfig>> {
        self.inner.get_json_config(config_type).await
    }
    async fn insert_json_config(&mut self, config: &ProjectJsonConfig) -> Result<()> {
        self.inner.insert_json_config(config).await
    }
    async fn update_json_config(&mut self, config: &ProjectJsonConfig) -> Result<()> {
        self.inner.update_json_config(config).await
    }

    async fn load_children(&mut self, kind: ChildKind, product_id: i64) -> Result<Vec<ChildRecord>> {
        self.inner.load_children(kind, product_id).await
    }
    async fn insert_child(&mut self, product_id: i64, child: &ChildRecord) -> Result<()> {
        self.inner.insert_child(product_id, child).await
    }
    async fn update_child(&mut self, child: &ChildRecord) -> Result<()> {
        self.inner.update_child(child).await
    }
    async fn delete_child(&mut self, kind: ChildKind, id: i64) -> Result<()> {
        self.inner.delete_child(kind, id).await
    }

    async fn linked_ids(&mut self, kind: LinkKind, product_id: i64) -> Result<Vec<i64>> {
        self.inner.linked_ids(kind, product_id).await
    }
    async fn clear_links(&mut self, kind: LinkKind, product_id: i64) -> Result<()> {
        self.inner.clear_links(kind, product_id).await
    }
    async fn add_link(&mut self, kind: LinkKind, product_id: i64, target_id: i64) -> Result<()> {
        self.inner.add_link(kind, product_id, target_id).await
    }
}

// ============================================================================
// Snapshot sources
// ============================================================================

pub fn snapshot(body: Value) -> Snapshot {
    serde_json::from_value(body).expect("invalid snapshot fixture")
}

/// Serves the same snapshot for every selector until replaced
pub struct StaticSource {
    snapshot: Mutex<Snapshot>,
    pub fetches: AtomicUsize,
}

impl StaticSource {
    pub fn new(body: Value) -> Self {
        Self {
            snapshot: Mutex::new(snapshot(body)),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn replace(&self, body: Value) {
        *self.snapshot.lock().unwrap() = snapshot(body);
    }
}

#[async_trait]
impl ISnapshotSource for StaticSource {
    async fn fetch(&self, _selector: Selector) -> Result<Snapshot, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot.lock().unwrap().clone())
    }
}

pub struct FailingSource;

#[async_trait]
impl ISnapshotSource for FailingSource {
    async fn fetch(&self, _selector: Selector) -> Result<Snapshot, FetchError> {
        Err(FetchError::Protocol { status: 502 })
    }
}

/// Sleeps before answering with an empty snapshot
pub struct SlowSource(pub Duration);

#[async_trait]
impl ISnapshotSource for SlowSource {
    async fn fetch(&self, _selector: Selector) -> Result<Snapshot, FetchError> {
        tokio::time::sleep(self.0).await;
        Ok(Snapshot::default())
    }
}

pub struct PanickingSource;

#[async_trait]
impl ISnapshotSource for PanickingSource {
    async fn fetch(&self, _selector: Selector) -> Result<Snapshot, FetchError> {
        panic!("source exploded");
    }
}

// ============================================================================
// Run log
// ============================================================================

#[derive(Default)]
pub struct MemoryRunLog {
    pub rendered: Mutex<Vec<String>>,
}

impl MemoryRunLog {
    pub fn len(&self) -> usize {
        self.rendered.lock().unwrap().len()
    }
}

#[async_trait]
impl IRunLog for MemoryRunLog {
    async fn record(&self, report: &SyncReport) -> Result<()> {
        self.rendered.lock().unwrap().push(report.render());
        Ok(())
    }

    async fn latest(&self) -> Result<Option<RunLogEntry>> {
        Ok(self.rendered.lock().unwrap().last().map(|content| RunLogEntry {
            log_file: "memory".to_string(),
            timestamp: String::new(),
            content: content.clone(),
        }))
    }
}

// ============================================================================
// Payload fixtures
// ============================================================================

pub fn category_json(id: i64, name: &str) -> Value {
    json!({
        "Category_ID": id,
        "Category_Name": name,
        "Category_Image": format!("https://cdn.example/c{id}.png")
    })
}

pub fn color_json(id: i64, name: &str) -> Value {
    json!({"Color_ID": id, "Color_Name": name, "Color_Code": "#000000"})
}

pub fn product_json(id: i64) -> Value {
    json!({
        "Product_ID": id,
        "Product_Name": format!("Product {id}"),
        "OnMain": true,
        "Created_At": "Mon, 15 Jan 2024 10:30:00 GMT",
        "Updated_At": "Thu, 01 Feb 2024 08:00:00 GMT",
        "tags": ["new"]
    })
}

/// A snapshot touching every section
pub fn full_snapshot() -> Value {
    let mut product = product_json(9);
    product["categories"] = json!([category_json(1, "Phones")]);
    product["marks"] = json!([{"Mark_ID": 5, "Mark_Name": "Hit"}]);
    product["colors"] = json!([color_json(1, "Black"), color_json(2, "White")]);
    product["parameters"] = json!([{
        "Parameter_ID": 3, "name": "Memory", "parameter_string": "128 GB",
        "price": 999.0, "chosen": true, "disabled": false
    }]);
    product["images"] = json!([{"Image_ID": 4, "Image_URL": "https://cdn.example/4.jpg", "MainImage": true}]);
    product["excluded"] = json!([{"id": 1, "Color_ID": 1, "Parameter_ID": 3}]);
    product["importance"] = json!([{"id": 1, "importance": 10}]);

    json!({
        "status": "ok",
        "categories": [category_json(1, "Phones"), category_json(2, "Tablets")],
        "product_marks": [{"Mark_ID": 5, "Mark_Name": "Hit"}],
        "products": [product],
        "special_project_parameters": {
            "min_order_value": 500,
            "min_order_description": "Minimum order",
            "phone_value": "+100"
        },
        "special_project_parameters_actions": [
            {"id": 1, "action_type": "banner", "description": "Sale", "sort_order": 1}
        ],
        "special_project_parameters_badges": [
            {"id": 1, "description": "Hit", "image_url": "https://cdn.example/hit.png", "sort_order": 0}
        ],
        "special_project_parameters_json": {"delivery": {"free_from": 3000}}
    })
}
