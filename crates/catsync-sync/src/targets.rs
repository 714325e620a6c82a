//! Storage bindings for the top-level entities
//!
//! [`ReconcileTarget`] tells the generic
//! [`EntityReconciler`](crate::entity::EntityReconciler) how to look up,
//! insert and update one entity kind through an open transaction.

use anyhow::{Context, Result};
use async_trait::async_trait;

use catsync_core::domain::{
    Category, EntityKind, FieldDiff, Mark, ProjectAction, ProjectBadge, ProjectJsonConfig,
    ProjectParameter,
};
use catsync_core::ports::ICatalogTransaction;

/// A top-level entity reconciled by natural key
#[async_trait]
pub trait ReconcileTarget: FieldDiff + Send + Sync + Sized {
    const ENTITY: EntityKind;

    /// Natural key as shown in the report
    fn key(&self) -> String;

    /// The stored row sharing this record's key
    async fn find(&self, tx: &mut dyn ICatalogTransaction) -> Result<Option<Self>>;

    async fn insert(&self, tx: &mut dyn ICatalogTransaction) -> Result<()>;

    async fn update(&self, tx: &mut dyn ICatalogTransaction) -> Result<()>;
}

#[async_trait]
impl ReconcileTarget for Category {
    const ENTITY: EntityKind = EntityKind::Category;

    fn key(&self) -> String {
        self.id.to_string()
    }

    async fn find(&self, tx: &mut dyn ICatalogTransaction) -> Result<Option<Self>> {
        tx.get_category(self.id).await
    }

    async fn insert(&self, tx: &mut dyn ICatalogTransaction) -> Result<()> {
        tx.insert_category(self)
            .await
            .with_context(|| format!("Failed to insert category {}", self.id))
    }

    async fn update(&self, tx: &mut dyn ICatalogTransaction) -> Result<()> {
        tx.update_category(self)
            .await
            .with_context(|| format!("Failed to update category {}", self.id))
    }
}

#[async_trait]
impl ReconcileTarget for Mark {
    const ENTITY: EntityKind = EntityKind::Mark;

    fn key(&self) -> String {
        self.id.to_string()
    }

    async fn find(&self, tx: &mut dyn ICatalogTransaction) -> Result<Option<Self>> {
        tx.get_mark(self.id).await
    }

    async fn insert(&self, tx: &mut dyn ICatalogTransaction) -> Result<()> {
        tx.insert_mark(self)
            .await
            .with_context(|| format!("Failed to insert mark {}", self.id))
    }

    async fn update(&self, tx: &mut dyn ICatalogTransaction) -> Result<()> {
        tx.update_mark(self)
            .await
            .with_context(|| format!("Failed to update mark {}", self.id))
    }
}

#[async_trait]
impl ReconcileTarget for ProjectParameter {
    const ENTITY: EntityKind = EntityKind::ProjectParameter;

    fn key(&self) -> String {
        self.key.clone()
    }

    async fn find(&self, tx: &mut dyn ICatalogTransaction) -> Result<Option<Self>> {
        tx.get_parameter(&self.key).await
    }

    async fn insert(&self, tx: &mut dyn ICatalogTransaction) -> Result<()> {
        tx.insert_parameter(self)
            .await
            .with_context(|| format!("Failed to insert parameter {}", self.key))
    }

    async fn update(&self, tx: &mut dyn ICatalogTransaction) -> Result<()> {
        tx.update_parameter(self)
            .await
            .with_context(|| format!("Failed to update parameter {}", self.key))
    }
}

#[async_trait]
impl ReconcileTarget for ProjectAction {
    const ENTITY: EntityKind = EntityKind::ProjectAction;

    fn key(&self) -> String {
        self.id.to_string()
    }

    async fn find(&self, tx: &mut dyn ICatalogTransaction) -> Result<Option<Self>> {
        tx.get_action(self.id).await
    }

    async fn insert(&self, tx: &mut dyn ICatalogTransaction) -> Result<()> {
        tx.insert_action(self)
            .await
            .with_context(|| format!("Failed to insert action {}", self.id))
    }

    async fn update(&self, tx: &mut dyn ICatalogTransaction) -> Result<()> {
        tx.update_action(self)
            .await
            .with_context(|| format!("Failed to update action {}", self.id))
    }
}

#[async_trait]
impl ReconcileTarget for ProjectBadge {
    const ENTITY: EntityKind = EntityKind::ProjectBadge;

    fn key(&self) -> String {
        self.id.to_string()
    }

    async fn find(&self, tx: &mut dyn ICatalogTransaction) -> Result<Option<Self>> {
        tx.get_badge(self.id).await
    }

    async fn insert(&self, tx: &mut dyn ICatalogTransaction) -> Result<()> {
        tx.insert_badge(self)
            .await
            .with_context(|| format!("Failed to insert badge {}", self.id))
    }

    async fn update(&self, tx: &mut dyn ICatalogTransaction) -> Result<()> {
        tx.update_badge(self)
            .await
            .with_context(|| format!("Failed to update badge {}", self.id))
    }
}

#[async_trait]
impl ReconcileTarget for ProjectJsonConfig {
    const ENTITY: EntityKind = EntityKind::ProjectJsonConfig;

    fn key(&self) -> String {
        self.config_type.clone()
    }

    async fn find(&self, tx: &mut dyn ICatalogTransaction) -> Result<Option<Self>> {
        tx.get_json_config(&self.config_type).await
    }

    async fn insert(&self, tx: &mut dyn ICatalogTransaction) -> Result<()> {
        tx.insert_json_config(self)
            .await
            .with_context(|| format!("Failed to insert json config {}", self.config_type))
    }

    async fn update(&self, tx: &mut dyn ICatalogTransaction) -> Result<()> {
        tx.update_json_config(self)
            .await
            .with_context(|| format!("Failed to update json config {}", self.config_type))
    }
}
