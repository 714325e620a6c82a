//! HttpSnapshotSource - ISnapshotSource implementation over the catalog API
//!
//! Thin adapter around [`CatalogClient`] so the orchestrator only depends on
//! the [`ISnapshotSource`] port.

use async_trait::async_trait;
use tracing::info;

use catsync_core::domain::{FetchError, Selector, Snapshot};
use catsync_core::ports::ISnapshotSource;

use crate::client::CatalogClient;

/// Snapshot source backed by the remote HTTP API
pub struct HttpSnapshotSource {
    client: CatalogClient,
}

impl HttpSnapshotSource {
    pub fn new(client: CatalogClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &CatalogClient {
        &self.client
    }
}

#[async_trait]
impl ISnapshotSource for HttpSnapshotSource {
    async fn fetch(&self, selector: Selector) -> Result<Snapshot, FetchError> {
        let started = std::time::Instant::now();
        let result = self.client.fetch_snapshot(selector).await;
        match &result {
            Ok(snapshot) => info!(
                %selector,
                products = snapshot.products.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Snapshot fetched"
            ),
            Err(e) => info!(
                %selector,
                kind = e.kind(),
                error = %e,
                "Snapshot fetch failed"
            ),
        }
        result
    }
}
