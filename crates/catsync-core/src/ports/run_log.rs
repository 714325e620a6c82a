//! Run log port
//!
//! Every orchestration run leaves one text artifact behind. The HTTP
//! surface reads the newest artifact back for `/last_update`.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::SyncReport;

/// The newest run-log artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunLogEntry {
    /// Artifact name, e.g. `sync_20250114_103000.log`
    pub log_file: String,
    /// `YYYYMMDD_HHMMSS` part of the name
    pub timestamp: String,
    pub content: String,
}

#[async_trait]
pub trait IRunLog: Send + Sync {
    /// Appends the rendered report of one run
    async fn record(&self, report: &SyncReport) -> anyhow::Result<()>;

    /// Returns the lexicographically newest artifact, if any exists
    async fn latest(&self) -> anyhow::Result<Option<RunLogEntry>>;
}
