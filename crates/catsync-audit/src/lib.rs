//! Catsync Audit - Run-log artifacts
//!
//! Provides:
//! - `FileRunLog`: one `sync_YYYYMMDD_HHMMSS.log` text file per run,
//!   implementing the `IRunLog` port
//! - Lookup of the newest artifact for the `/last_update` endpoint

pub mod run_log;

pub use run_log::FileRunLog;

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or writing run-log artifacts
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
