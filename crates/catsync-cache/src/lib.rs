//! Catsync Cache - Local catalog persistence
//!
//! SQLite-based storage for:
//! - Categories, marks and products
//! - Product-owned child collections and category/mark associations
//! - Project-level configuration rows
//!
//! ## Architecture
//!
//! This crate implements the `ICatalogStore` port from `catsync-core`
//! using SQLite as the storage backend. It is a driven (secondary) adapter
//! in the hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - Connection pool with migration support
//! - [`SqliteCatalogStore`] - `ICatalogStore` implementation and `/info` read model
//! - [`SqliteCatalogTransaction`] - Transaction handle with nested savepoints
//! - [`CacheError`] - Error types for cache operations
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use catsync_cache::{DatabasePool, SqliteCatalogStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/var/lib/catsync/catalog.db")).await?;
//! let store = SqliteCatalogStore::new(pool.pool().clone());
//! // Use store as ICatalogStore...
//! # Ok(())
//! # }
//! ```

pub mod pool;
mod rows;
pub mod store;

pub use pool::DatabasePool;
pub use store::{SqliteCatalogStore, SqliteCatalogTransaction};

/// Errors raised by the SQLite catalog adapter
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cannot open catalog database: {0}")]
    Open(String),

    #[error("cannot apply catalog schema: {0}")]
    Schema(String),

    #[error("catalog query failed: {0}")]
    Query(#[from] sqlx::Error),

    /// A stored column no longer decodes into its domain type
    #[error("corrupt stored value: {0}")]
    Decode(String),

    #[error("no open savepoint")]
    NoSavepoint,
}
