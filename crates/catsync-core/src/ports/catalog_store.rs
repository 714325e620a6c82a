//! Catalog store port (driven/secondary port)
//!
//! This module defines the transactional record store the reconcilers
//! write through.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific and
//!   the reconcilers only need to know that a write failed.
//! - A transaction handle is opened per section (or per product) and passed
//!   explicitly into each reconciler call.
//! - Savepoints nest: every `savepoint()` must be matched by exactly one
//!   `release_savepoint()` or `rollback_to_savepoint()`.
//! - `commit`/`rollback` consume the handle; dropping it uncommitted rolls back.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{
    Category, ChildKind, ChildRecord, LinkKind, Mark, Product, ProductView, ProjectAction,
    ProjectBadge, ProjectJsonConfig, ProjectParameter,
};

/// Opens transactions and serves the read model
#[async_trait]
pub trait ICatalogStore: Send + Sync {
    /// Starts a new transaction
    async fn begin(&self) -> Result<Box<dyn ICatalogTransaction>>;

    /// Every product with its nested collections, ordered by product ID
    async fn load_catalog(&self) -> Result<Vec<ProductView>>;
}

/// One open transaction against the catalog
#[async_trait]
pub trait ICatalogTransaction: Send {
    // ------------------------------------------------------------------
    // Transaction control
    // ------------------------------------------------------------------

    /// Opens a nested savepoint
    async fn savepoint(&mut self) -> Result<()>;

    /// Keeps the work done since the innermost savepoint
    async fn release_savepoint(&mut self) -> Result<()>;

    /// Discards the work done since the innermost savepoint and closes it
    async fn rollback_to_savepoint(&mut self) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;

    // ------------------------------------------------------------------
    // Top-level entities
    // ------------------------------------------------------------------

    async fn get_category(&mut self, id: i64) -> Result<Option<Category>>;
    async fn insert_category(&mut self, category: &Category) -> Result<()>;
    async fn update_category(&mut self, category: &Category) -> Result<()>;

    async fn get_mark(&mut self, id: i64) -> Result<Option<Mark>>;
    async fn insert_mark(&mut self, mark: &Mark) -> Result<()>;
    async fn update_mark(&mut self, mark: &Mark) -> Result<()>;

    async fn get_product(&mut self, id: i64) -> Result<Option<Product>>;
    async fn insert_product(&mut self, product: &Product) -> Result<()>;
    /// Writes every scalar field except `created_at`
    async fn update_product(&mut self, product: &Product) -> Result<()>;

    async fn get_parameter(&mut self, key: &str) -> Result<Option<ProjectParameter>>;
    async fn insert_parameter(&mut self, parameter: &ProjectParameter) -> Result<()>;
    async fn update_parameter(&mut self, parameter: &ProjectParameter) -> Result<()>;

    async fn get_action(&mut self, id: i64) -> Result<Option<ProjectAction>>;
    async fn insert_action(&mut self, action: &ProjectAction) -> Result<()>;
    async fn update_action(&mut self, action: &ProjectAction) -> Result<()>;

    async fn get_badge(&mut self, id: i64) -> Result<Option<ProjectBadge>>;
    async fn insert_badge(&mut self, badge: &ProjectBadge) -> Result<()>;
    async fn update_badge(&mut self, badge: &ProjectBadge) -> Result<()>;

    async fn get_json_config(&mut self, config_type: &str) -> Result<Option<ProjectJsonConfig>>;
    async fn insert_json_config(&mut self, config: &ProjectJsonConfig) -> Result<()>;
    async fn update_json_config(&mut self, config: &ProjectJsonConfig) -> Result<()>;

    // ------------------------------------------------------------------
    // Owned children
    // ------------------------------------------------------------------

    /// Children of `kind` currently owned by the product
    async fn load_children(&mut self, kind: ChildKind, product_id: i64) -> Result<Vec<ChildRecord>>;
    async fn insert_child(&mut self, product_id: i64, child: &ChildRecord) -> Result<()>;
    async fn update_child(&mut self, child: &ChildRecord) -> Result<()>;
    async fn delete_child(&mut self, kind: ChildKind, id: i64) -> Result<()>;

    // ------------------------------------------------------------------
    // Many-to-many links
    // ------------------------------------------------------------------

    /// Linked entity IDs, ascending
    async fn linked_ids(&mut self, kind: LinkKind, product_id: i64) -> Result<Vec<i64>>;
    /// Drops every association of `kind` for the product
    async fn clear_links(&mut self, kind: LinkKind, product_id: i64) -> Result<()>;
    /// Attaches one entity; attaching twice is a no-op
    async fn add_link(&mut self, kind: LinkKind, product_id: i64, target_id: i64) -> Result<()>;
}
