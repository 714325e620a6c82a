//! Sync orchestrator
//!
//! Runs one selector end to end: fetch the snapshot, reconcile every
//! non-empty section in a fixed order, and aggregate the report.
//!
//! ## Transaction boundaries
//!
//! - categories, marks and each special section: one transaction each
//! - products: one transaction per product
//!
//! A section whose transaction cannot be opened or committed is reported
//! as failed; the following sections still run.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{error, info, warn};

use catsync_core::domain::payload::{json_configs, project_parameters, read_id};
use catsync_core::domain::{
    Category, ChangeRecord, EntityKind, EntityRef, Mark, ProjectAction, ProjectBadge, RunOutcome,
    Section, SectionReport, Selector, Snapshot, SyncPhase, SyncReport,
};
use catsync_core::ports::{ICatalogStore, ISnapshotSource};

use crate::entity::{decode_section, EntityReconciler, Incoming};
use crate::product::ProductReconciler;
use crate::targets::ReconcileTarget;
use crate::SyncError;

/// Drives one reconciliation run per selector
pub struct SyncOrchestrator {
    source: Arc<dyn ISnapshotSource>,
    store: Arc<dyn ICatalogStore>,
    phase: watch::Sender<SyncPhase>,
}

impl SyncOrchestrator {
    pub fn new(source: Arc<dyn ISnapshotSource>, store: Arc<dyn ICatalogStore>) -> Self {
        let (phase, _) = watch::channel(SyncPhase::Idle);
        Self {
            source,
            store,
            phase,
        }
    }

    /// Receiver that observes every phase transition
    pub fn subscribe(&self) -> watch::Receiver<SyncPhase> {
        self.phase.subscribe()
    }

    /// The phase of the current (or last) run
    pub fn phase(&self) -> SyncPhase {
        *self.phase.borrow()
    }

    pub(crate) fn set_phase(&self, phase: SyncPhase) {
        self.phase.send_replace(phase);
    }

    /// Runs one full reconciliation for `selector`
    ///
    /// Never fails: a fetch failure and every section failure are part of
    /// the returned report.
    #[tracing::instrument(skip(self), fields(selector = %selector))]
    pub async fn run(&self, selector: Selector) -> SyncReport {
        let started_at = Utc::now();
        info!("Starting sync run");

        self.set_phase(SyncPhase::Fetching);
        let snapshot = match self.source.fetch(selector).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                error!(kind = err.kind(), error = %err, "Snapshot fetch failed");
                self.set_phase(SyncPhase::Failed);
                return SyncReport::new(selector, started_at, RunOutcome::FetchFailed(err));
            }
        };

        let mut sections = Vec::new();
        for section in Section::ORDER {
            if section_is_empty(&snapshot, section) {
                continue;
            }
            self.set_phase(SyncPhase::Reconciling(section));
            let report = self.run_section(section, &snapshot).await;
            match report.failure() {
                Some(reason) => error!(section = section.name(), %reason, "Section failed"),
                None => info!(
                    section = section.name(),
                    records = report.records().len(),
                    "Section reconciled"
                ),
            }
            sections.push(report);
        }

        self.set_phase(SyncPhase::Done);
        let report = SyncReport::new(selector, started_at, RunOutcome::Completed(sections));
        info!(
            green = report.is_green(),
            records = report.records().count(),
            "Sync run complete"
        );
        report
    }

    async fn run_section(&self, section: Section, snapshot: &Snapshot) -> SectionReport {
        let result = match section {
            Section::Categories => {
                let incoming = decode_section::<Category>(&snapshot.categories, "Category_ID");
                self.run_entities(section, incoming).await
            }
            Section::Marks => {
                let incoming = decode_section::<Mark>(&snapshot.product_marks, "Mark_ID");
                self.run_entities(section, incoming).await
            }
            Section::Products => Ok(self.run_products(&snapshot.products).await),
            Section::SpecialParameters => {
                let incoming = project_parameters(&snapshot.special_parameters)
                    .into_iter()
                    .map(Ok)
                    .collect();
                self.run_entities(section, incoming).await
            }
            Section::SpecialActions => {
                let incoming = decode_section::<ProjectAction>(&snapshot.special_actions, "id");
                self.run_entities(section, incoming).await
            }
            Section::SpecialBadges => {
                let incoming = decode_section::<ProjectBadge>(&snapshot.special_badges, "id");
                self.run_entities(section, incoming).await
            }
            Section::SpecialJsonConfigs => {
                let incoming = json_configs(&snapshot.special_json_configs)
                    .into_iter()
                    .map(Ok)
                    .collect();
                self.run_entities(section, incoming).await
            }
        };

        match result {
            Ok(records) => SectionReport::applied(section, records),
            Err(err) => SectionReport::failed(section, err.to_string()),
        }
    }

    /// One transaction for the whole section
    async fn run_entities<T: ReconcileTarget>(
        &self,
        section: Section,
        incoming: Vec<Incoming<T>>,
    ) -> Result<Vec<ChangeRecord>, SyncError> {
        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|e| SyncError::Begin(format!("{e:#}")))?;

        let records = match EntityReconciler::reconcile(tx.as_mut(), incoming).await {
            Ok(records) => records,
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                return Err(err);
            }
        };

        self.set_phase(SyncPhase::Committing(section));
        tx.commit()
            .await
            .map_err(|e| SyncError::Commit(format!("{e:#}")))?;
        Ok(records)
    }

    /// One transaction per product; a failed product becomes one error record
    async fn run_products(&self, products: &[serde_json::Value]) -> Vec<ChangeRecord> {
        let mut records = Vec::new();
        for raw in products {
            match self.run_product(raw).await {
                Ok(lines) => records.extend(lines),
                Err(err) => {
                    let entity = match read_id(raw, "Product_ID") {
                        Ok(id) => EntityRef::new(EntityKind::Product, id),
                        Err(_) => EntityRef::unkeyed(EntityKind::Product),
                    };
                    error!(entity = %entity, error = %err, "Product sync failed");
                    records.push(ChangeRecord::error(entity, err.to_string()));
                }
            }
        }
        records
    }

    async fn run_product(&self, raw: &serde_json::Value) -> Result<Vec<ChangeRecord>, SyncError> {
        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|e| SyncError::Begin(format!("{e:#}")))?;

        let records = match ProductReconciler::reconcile(tx.as_mut(), raw).await {
            Ok(records) => records,
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                return Err(err);
            }
        };

        self.set_phase(SyncPhase::Committing(Section::Products));
        tx.commit()
            .await
            .map_err(|e| SyncError::Commit(format!("{e:#}")))?;
        Ok(records)
    }
}

/// Sections with no incoming data are skipped without a report entry
pub fn section_is_empty(snapshot: &Snapshot, section: Section) -> bool {
    match section {
        Section::Categories => snapshot.categories.is_empty(),
        Section::Marks => snapshot.product_marks.is_empty(),
        Section::Products => snapshot.products.is_empty(),
        Section::SpecialParameters => snapshot.special_parameters.is_empty(),
        Section::SpecialActions => snapshot.special_actions.is_empty(),
        Section::SpecialBadges => snapshot.special_badges.is_empty(),
        Section::SpecialJsonConfigs => snapshot.special_json_configs.is_empty(),
    }
}
