//! Sync scheduler - periodic, non-overlapping orchestration runs
//!
//! Every tick runs the on-main selector, then the off-main one, and records
//! both reports. A tick that fires while the previous trigger is still
//! running is skipped.
//!
//! ## Flow
//!
//! ```text
//! interval tick ──→ trigger() ──→ busy? ──yes──→ SkippedBusy
//!                                   │no
//!                                   ▼
//!                     orchestrator.run(on_main=true)  ──→ run log
//!                     orchestrator.run(on_main=false) ──→ run log
//! ```

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use catsync_core::domain::{RunOutcome, Selector, SyncPhase, SyncReport};
use catsync_core::ports::IRunLog;

use crate::orchestrator::SyncOrchestrator;

/// Result of one trigger
#[derive(Debug)]
pub enum TriggerOutcome {
    /// Both selectors ran; reports in selector order
    Completed(Vec<SyncReport>),
    /// A previous trigger was still running
    SkippedBusy,
}

/// Clears the busy flag when the trigger ends, however it ends
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Periodic trigger for the orchestrator
pub struct SyncScheduler {
    orchestrator: Arc<SyncOrchestrator>,
    run_log: Arc<dyn IRunLog>,
    busy: Arc<AtomicBool>,
    interval: Duration,
}

impl SyncScheduler {
    pub fn new(
        orchestrator: Arc<SyncOrchestrator>,
        run_log: Arc<dyn IRunLog>,
        interval: Duration,
    ) -> Self {
        info!(interval_secs = interval.as_secs(), "Creating sync scheduler");
        Self {
            orchestrator,
            run_log,
            busy: Arc::new(AtomicBool::new(false)),
            interval,
        }
    }

    pub fn orchestrator(&self) -> &Arc<SyncOrchestrator> {
        &self.orchestrator
    }

    /// True while a trigger is running
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Runs every selector once, unless a trigger is already running
    pub async fn trigger(&self) -> TriggerOutcome {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Previous sync still running, skipping this tick");
            return TriggerOutcome::SkippedBusy;
        }
        let _guard = BusyGuard(Arc::clone(&self.busy));

        let mut reports = Vec::with_capacity(Selector::ALL.len());
        for selector in Selector::ALL {
            let report = self.run_isolated(selector).await;
            if let Err(err) = self.run_log.record(&report).await {
                warn!(%selector, error = %format!("{err:#}"), "Failed to record run log");
            }
            reports.push(report);
        }
        TriggerOutcome::Completed(reports)
    }

    /// Runs one selector on its own task so a panic becomes a critical report
    async fn run_isolated(&self, selector: Selector) -> SyncReport {
        let started_at = Utc::now();
        let orchestrator = Arc::clone(&self.orchestrator);
        match tokio::spawn(async move { orchestrator.run(selector).await }).await {
            Ok(report) => report,
            Err(join_err) => {
                error!(%selector, error = %join_err, "Sync run aborted");
                self.orchestrator.set_phase(SyncPhase::Failed);
                SyncReport::new(
                    selector,
                    started_at,
                    RunOutcome::Critical(join_err.to_string()),
                )
            }
        }
    }

    /// Main loop: one trigger per tick until `shutdown` fires
    ///
    /// The first tick fires immediately. Triggers run on their own task so
    /// a slow run makes later ticks skip instead of queueing. An in-flight
    /// trigger is awaited, never cancelled, before this returns.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        info!("Sync scheduler starting");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight: Option<JoinHandle<TriggerOutcome>> = None;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, stopping scheduler");
                    break;
                }
                _ = ticker.tick() => {
                    if self.is_busy() {
                        warn!("Previous sync still running, skipping this tick");
                        continue;
                    }
                    let this = Arc::clone(&self);
                    in_flight = Some(tokio::spawn(async move { this.trigger().await }));
                    debug!("Sync trigger spawned");
                }
            }
        }

        if let Some(handle) = in_flight {
            if !handle.is_finished() {
                info!("Waiting for in-flight sync to finish");
            }
            if let Err(err) = handle.await {
                error!(error = %err, "Sync trigger task failed");
            }
        }
        info!("Sync scheduler stopped");
    }
}
