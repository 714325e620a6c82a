//! Catsync Remote - Product catalog API client
//!
//! Provides an async client for `GET {base}/api/products?on_main={true|false}`
//! and an [`ISnapshotSource`](catsync_core::ports::ISnapshotSource)
//! implementation on top of it.
//!
//! ## Modules
//!
//! - [`client`] - Typed HTTP client with failure classification
//! - [`provider`] - Snapshot source adapter used by the orchestrator

pub mod client;
pub mod provider;

pub use client::CatalogClient;
pub use provider::HttpSnapshotSource;
