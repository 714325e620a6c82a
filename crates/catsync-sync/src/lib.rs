//! Catsync Sync - Catalog reconciliation engine
//!
//! Provides:
//! - Generic field-diff reconciliation for top-level entities
//! - Product reconciliation with link-replace and owned-set strategies
//! - Per-selector orchestration with section isolation
//! - A skip-if-busy periodic scheduler
//!
//! ## Modules
//!
//! - [`targets`] - How each top-level entity is looked up and written
//! - [`entity`] - Reconciler for categories, marks and project rows
//! - [`product`] - Reconciler for products and their nested collections
//! - [`orchestrator`] - Fetch, reconcile every section, aggregate the report
//! - [`scheduler`] - Periodic trigger that never overlaps runs

pub mod entity;
pub mod orchestrator;
pub mod product;
pub mod scheduler;
pub mod targets;

pub use entity::{EntityReconciler, Incoming, Rejected};
pub use orchestrator::SyncOrchestrator;
pub use product::ProductReconciler;
pub use scheduler::{SyncScheduler, TriggerOutcome};

use thiserror::Error;

/// Errors that abort a whole section (or a whole product)
///
/// Record-level problems never surface here; they become report records.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The section's transaction could not be opened
    #[error("failed to open transaction: {0}")]
    Begin(String),

    /// The section's transaction could not be committed
    #[error("failed to commit transaction: {0}")]
    Commit(String),

    /// A storage call outside any per-record savepoint failed
    #[error("{0:#}")]
    Storage(anyhow::Error),
}

impl From<anyhow::Error> for SyncError {
    fn from(err: anyhow::Error) -> Self {
        SyncError::Storage(err)
    }
}
