//! FileRunLog - IRunLog implementation over a directory of text files
//!
//! Every run appends to `{dir}/sync_YYYYMMDD_HHMMSS.log`, named after the
//! run start time in UTC. Two runs starting in the same second share a file.
//! Each run contributes a start line, the rendered report and a completion
//! line.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;

use catsync_core::domain::{ChangeKind, RunOutcome, SyncReport};
use catsync_core::ports::{IRunLog, RunLogEntry};

use crate::AuditError;

const FILE_PREFIX: &str = "sync_";
const FILE_SUFFIX: &str = ".log";
const NAME_FORMAT: &str = "sync_%Y%m%d_%H%M%S.log";

/// Run-log store rooted at one directory
pub struct FileRunLog {
    dir: PathBuf,
}

impl FileRunLog {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Artifact name for a run started at `started_at`
    pub fn file_name(started_at: &DateTime<Utc>) -> String {
        started_at.format(NAME_FORMAT).to_string()
    }

    /// Names of every artifact in the directory, unsorted
    async fn artifact_names(&self) -> Result<Vec<String>, AuditError> {
        let mut reader = match tokio::fs::read_dir(&self.dir).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(AuditError::Read {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut names = Vec::new();
        loop {
            let entry = reader.next_entry().await.map_err(|source| AuditError::Read {
                path: self.dir.clone(),
                source,
            })?;
            let Some(entry) = entry else { break };
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_artifact_name(&name) {
                names.push(name);
            }
        }
        Ok(names)
    }
}

/// `sync_YYYYMMDD_HHMMSS.log`
fn is_artifact_name(name: &str) -> bool {
    name.len() == FILE_PREFIX.len() + 15 + FILE_SUFFIX.len()
        && name.starts_with(FILE_PREFIX)
        && name.ends_with(FILE_SUFFIX)
}

/// One-word outcome for the completion line
fn outcome_label(report: &SyncReport) -> String {
    match &report.outcome {
        RunOutcome::FetchFailed(err) => format!("fetch failed ({})", err.kind()),
        RunOutcome::Critical(_) => "critical error".to_string(),
        RunOutcome::Completed(_) if report.is_green() => "no changes".to_string(),
        RunOutcome::Completed(sections) => {
            let failed = sections.iter().filter(|s| s.failure().is_some()).count();
            format!(
                "{} added, {} updated, {} deleted, {} warnings, {} errors, {} failed sections",
                report.count(ChangeKind::Added),
                report.count(ChangeKind::Updated),
                report.count(ChangeKind::Deleted),
                report.count(ChangeKind::Warning),
                report.count(ChangeKind::Error),
                failed
            )
        }
    }
}

/// Text appended to the artifact for one run
pub fn render_entry(report: &SyncReport, finished_at: &DateTime<Utc>) -> String {
    format!(
        "[{}] Sync started for {}\n{}\n[{}] Sync finished for {}: {}\n",
        report.started_at.to_rfc3339(),
        report.selector,
        report.render(),
        finished_at.to_rfc3339(),
        report.selector,
        outcome_label(report)
    )
}

#[async_trait]
impl IRunLog for FileRunLog {
    async fn record(&self, report: &SyncReport) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| AuditError::Write {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.dir.join(Self::file_name(&report.started_at));
        let entry = render_entry(report, &Utc::now());

        let write = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await?;
            file.write_all(entry.as_bytes()).await?;
            file.flush().await
        };
        write.await.map_err(|source| AuditError::Write {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(path = %path.display(), selector = %report.selector, "Run log written");
        Ok(())
    }

    async fn latest(&self) -> anyhow::Result<Option<RunLogEntry>> {
        let Some(name) = self.artifact_names().await?.into_iter().max() else {
            return Ok(None);
        };

        let path = self.dir.join(&name);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| AuditError::Read {
                path: path.clone(),
                source,
            })?;
        let timestamp = name[FILE_PREFIX.len()..name.len() - FILE_SUFFIX.len()].to_string();

        Ok(Some(RunLogEntry {
            log_file: name,
            timestamp,
            content,
        }))
    }
}
