//! Snapshot source port (driven/secondary port)

use async_trait::async_trait;

use crate::domain::{FetchError, Selector, Snapshot};

/// Retrieves one structured snapshot of the remote catalog
///
/// Implementations issue a single bounded-timeout request and never retry;
/// retrying is left to the next scheduler tick.
#[async_trait]
pub trait ISnapshotSource: Send + Sync {
    async fn fetch(&self, selector: Selector) -> Result<Snapshot, FetchError>;
}
