//! Structured change report
//!
//! Reconcilers emit [`ChangeRecord`]s; sections group them into
//! [`SectionReport`]s and a whole run becomes one [`SyncReport`]. Text is
//! produced only by [`SyncReport::render`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::diff::FieldChange;
use super::errors::FetchError;
use super::snapshot::Selector;

/// Report text of a completed run with nothing to report
pub const ALL_GREEN: &str = "All systems green! No changes detected in the database.";

// ============================================================================
// Sections and phases
// ============================================================================

/// Named slices of a snapshot, in reconciliation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Categories,
    Marks,
    Products,
    SpecialParameters,
    SpecialActions,
    SpecialBadges,
    SpecialJsonConfigs,
}

impl Section {
    pub const ORDER: [Section; 7] = [
        Section::Categories,
        Section::Marks,
        Section::Products,
        Section::SpecialParameters,
        Section::SpecialActions,
        Section::SpecialBadges,
        Section::SpecialJsonConfigs,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Section::Categories => "categories",
            Section::Marks => "product_marks",
            Section::Products => "products",
            Section::SpecialParameters => "special_parameters",
            Section::SpecialActions => "special_actions",
            Section::SpecialBadges => "special_badges",
            Section::SpecialJsonConfigs => "special_json_configs",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where an orchestration run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "section", rename_all = "snake_case")]
pub enum SyncPhase {
    Idle,
    Fetching,
    Reconciling(Section),
    Committing(Section),
    Done,
    Failed,
}

// ============================================================================
// Change records
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Category,
    Mark,
    Product,
    Color,
    Parameter,
    Image,
    Extra,
    Review,
    Video,
    ExcludedCombination,
    ImportanceItem,
    ProjectParameter,
    ProjectAction,
    ProjectBadge,
    ProjectJsonConfig,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Category => "category",
            EntityKind::Mark => "mark",
            EntityKind::Product => "product",
            EntityKind::Color => "color",
            EntityKind::Parameter => "parameter",
            EntityKind::Image => "image",
            EntityKind::Extra => "extra",
            EntityKind::Review => "review",
            EntityKind::Video => "video",
            EntityKind::ExcludedCombination => "excluded combination",
            EntityKind::ImportanceItem => "importance item",
            EntityKind::ProjectParameter => "project parameter",
            EntityKind::ProjectAction => "project action",
            EntityKind::ProjectBadge => "project badge",
            EntityKind::ProjectJsonConfig => "json config",
        }
    }
}

/// Identifies the entity a record is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    /// Natural key, when it could be read from the payload
    pub key: Option<String>,
    /// Owning product for nested records
    pub product_id: Option<i64>,
}

impl EntityRef {
    pub fn new(kind: EntityKind, key: impl ToString) -> Self {
        Self {
            kind,
            key: Some(key.to_string()),
            product_id: None,
        }
    }

    /// An entity whose key could not be read
    pub fn unkeyed(kind: EntityKind) -> Self {
        Self {
            kind,
            key: None,
            product_id: None,
        }
    }

    pub fn in_product(mut self, product_id: i64) -> Self {
        self.product_id = Some(product_id);
        self
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.label())?;
        if let Some(key) = &self.key {
            write!(f, " #{key}")?;
        }
        if let Some(product_id) = self.product_id {
            write!(f, " of product #{product_id}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Updated,
    Deleted,
    Linked,
    Warning,
    Error,
}

/// One tagged line of the change report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub entity: EntityRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ChangeRecord {
    fn bare(kind: ChangeKind, entity: EntityRef) -> Self {
        Self {
            kind,
            entity,
            field: None,
            old: None,
            new: None,
            message: None,
        }
    }

    pub fn added(entity: EntityRef) -> Self {
        Self::bare(ChangeKind::Added, entity)
    }

    pub fn updated(entity: EntityRef, change: FieldChange) -> Self {
        Self {
            field: Some(change.field.to_string()),
            old: Some(change.old),
            new: Some(change.new),
            ..Self::bare(ChangeKind::Updated, entity)
        }
    }

    pub fn deleted(entity: EntityRef) -> Self {
        Self::bare(ChangeKind::Deleted, entity)
    }

    /// The linked-ID set of `field` changed from `old` to `new`
    pub fn linked(entity: EntityRef, field: &str, old: &[i64], new: &[i64]) -> Self {
        Self {
            field: Some(field.to_string()),
            old: Some(format!("{old:?}")),
            new: Some(format!("{new:?}")),
            ..Self::bare(ChangeKind::Linked, entity)
        }
    }

    pub fn warning(entity: EntityRef, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::bare(ChangeKind::Warning, entity)
        }
    }

    pub fn error(entity: EntityRef, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::bare(ChangeKind::Error, entity)
        }
    }
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let or_null = |v: &Option<String>| v.clone().unwrap_or_else(|| "null".to_string());
        match self.kind {
            ChangeKind::Added => write!(f, "+ {} added", self.entity),
            ChangeKind::Deleted => write!(f, "- {} deleted", self.entity),
            ChangeKind::Updated => write!(
                f,
                "~ {} {}: '{}' -> '{}'",
                self.entity,
                self.field.as_deref().unwrap_or("?"),
                or_null(&self.old),
                or_null(&self.new)
            ),
            ChangeKind::Linked => write!(
                f,
                "= {} {} relinked: {} -> {}",
                self.entity,
                self.field.as_deref().unwrap_or("?"),
                or_null(&self.old),
                or_null(&self.new)
            ),
            ChangeKind::Warning => write!(
                f,
                "! {} skipped: {}",
                self.entity,
                self.message.as_deref().unwrap_or_default()
            ),
            ChangeKind::Error => write!(
                f,
                "x {} failed: {}",
                self.entity,
                self.message.as_deref().unwrap_or_default()
            ),
        }
    }
}

// ============================================================================
// Section and run reports
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum SectionOutcome {
    /// Section committed; carries every record it produced
    Applied(Vec<ChangeRecord>),
    /// Section discarded; the single section-level failure message
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionReport {
    pub section: Section,
    pub outcome: SectionOutcome,
}

impl SectionReport {
    pub fn applied(section: Section, records: Vec<ChangeRecord>) -> Self {
        Self {
            section,
            outcome: SectionOutcome::Applied(records),
        }
    }

    pub fn failed(section: Section, message: impl Into<String>) -> Self {
        Self {
            section,
            outcome: SectionOutcome::Failed(message.into()),
        }
    }

    /// True when the section committed without producing any record
    pub fn is_quiet(&self) -> bool {
        matches!(&self.outcome, SectionOutcome::Applied(records) if records.is_empty())
    }

    pub fn records(&self) -> &[ChangeRecord] {
        match &self.outcome {
            SectionOutcome::Applied(records) => records,
            SectionOutcome::Failed(_) => &[],
        }
    }

    /// The section-level failure message, if the section was discarded
    pub fn failure(&self) -> Option<&str> {
        match &self.outcome {
            SectionOutcome::Applied(_) => None,
            SectionOutcome::Failed(message) => Some(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    FetchFailed(FetchError),
    Completed(Vec<SectionReport>),
    Critical(String),
}

/// The outcome of one orchestration run for one selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub selector: Selector,
    pub started_at: DateTime<Utc>,
    pub outcome: RunOutcome,
}

impl SyncReport {
    pub fn new(selector: Selector, started_at: DateTime<Utc>, outcome: RunOutcome) -> Self {
        Self {
            selector,
            started_at,
            outcome,
        }
    }

    /// Completed with every section quiet
    pub fn is_green(&self) -> bool {
        match &self.outcome {
            RunOutcome::Completed(sections) => sections.iter().all(SectionReport::is_quiet),
            _ => false,
        }
    }

    /// Every record across all applied sections
    pub fn records(&self) -> impl Iterator<Item = &ChangeRecord> {
        let sections: &[SectionReport] = match &self.outcome {
            RunOutcome::Completed(sections) => sections,
            _ => &[],
        };
        sections.iter().flat_map(SectionReport::records)
    }

    /// Number of records of the given kind
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.records().filter(|r| r.kind == kind).count()
    }

    /// Finds the report of one section, if it ran
    pub fn section(&self, section: Section) -> Option<&SectionReport> {
        match &self.outcome {
            RunOutcome::Completed(sections) => sections.iter().find(|s| s.section == section),
            _ => None,
        }
    }

    /// Human-readable report text
    pub fn render(&self) -> String {
        match &self.outcome {
            RunOutcome::FetchFailed(err) => {
                format!("Snapshot fetch failed for {}: {err}", self.selector)
            }
            RunOutcome::Critical(message) => {
                format!("Critical error during synchronization: {message}")
            }
            RunOutcome::Completed(_) if self.is_green() => ALL_GREEN.to_string(),
            RunOutcome::Completed(sections) => {
                let blocks: Vec<String> = sections
                    .iter()
                    .filter(|s| !s.is_quiet())
                    .map(render_section)
                    .collect();
                format!(
                    "Data synchronization complete for {}:\n{}",
                    self.selector,
                    blocks.join("\n\n")
                )
            }
        }
    }
}

fn render_section(report: &SectionReport) -> String {
    match &report.outcome {
        SectionOutcome::Failed(message) => {
            format!("[{}]\n  Error syncing {}: {message}", report.section, report.section)
        }
        SectionOutcome::Applied(records) => {
            let mut out = format!("[{}]", report.section);
            for record in records {
                out.push_str("\n  ");
                out.push_str(&record.to_string());
            }
            out
        }
    }
}
