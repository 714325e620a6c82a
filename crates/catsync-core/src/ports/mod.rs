//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the interfaces the reconciliation engine depends on; their
//! implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`ISnapshotSource`] - Fetches one catalog snapshot per selector
//! - [`ICatalogStore`] / [`ICatalogTransaction`] - Transactional catalog persistence
//! - [`IRunLog`] - Persists rendered run reports and reads back the latest one

pub mod catalog_store;
pub mod run_log;
pub mod snapshot_source;

pub use catalog_store::{ICatalogStore, ICatalogTransaction};
pub use run_log::{IRunLog, RunLogEntry};
pub use snapshot_source::ISnapshotSource;
