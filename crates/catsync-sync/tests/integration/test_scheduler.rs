//! SyncScheduler: selector order, skip-if-busy, panics and shutdown

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use catsync_core::domain::{RunOutcome, Selector, SyncPhase};
use catsync_sync::{SyncOrchestrator, SyncScheduler, TriggerOutcome};

use crate::common::{self, MemoryRunLog, PanickingSource, SlowSource, StaticSource};

#[tokio::test]
async fn test_trigger_runs_both_selectors_and_records() {
    let (_pool, store) = common::setup().await;
    let source = Arc::new(StaticSource::new(json!({"status": "ok"})));
    let orchestrator = Arc::new(SyncOrchestrator::new(source.clone(), store));
    let run_log = Arc::new(MemoryRunLog::default());
    let scheduler = SyncScheduler::new(orchestrator, run_log.clone(), Duration::from_secs(60));

    let TriggerOutcome::Completed(reports) = scheduler.trigger().await else {
        panic!("trigger was skipped");
    };

    let selectors: Vec<Selector> = reports.iter().map(|r| r.selector).collect();
    assert_eq!(selectors, vec![Selector::OnMain, Selector::OffMain]);
    assert_eq!(run_log.len(), 2);
    assert_eq!(source.fetches.load(std::sync::atomic::Ordering::SeqCst), 2);
    assert!(!scheduler.is_busy());
}

#[tokio::test]
async fn test_overlapping_trigger_is_skipped() {
    let (_pool, store) = common::setup().await;
    let source = Arc::new(SlowSource(Duration::from_millis(300)));
    let orchestrator = Arc::new(SyncOrchestrator::new(source, store));
    let run_log = Arc::new(MemoryRunLog::default());
    let scheduler = Arc::new(SyncScheduler::new(
        orchestrator,
        run_log.clone(),
        Duration::from_secs(60),
    ));

    let first = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move { scheduler.trigger().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(scheduler.is_busy());

    assert!(matches!(
        scheduler.trigger().await,
        TriggerOutcome::SkippedBusy
    ));

    assert!(matches!(
        first.await.unwrap(),
        TriggerOutcome::Completed(ref reports) if reports.len() == 2
    ));
    assert_eq!(run_log.len(), 2);
    assert!(!scheduler.is_busy());
}

#[tokio::test]
async fn test_panicking_run_becomes_critical_report() {
    let (_pool, store) = common::setup().await;
    let orchestrator = Arc::new(SyncOrchestrator::new(Arc::new(PanickingSource), store));
    let run_log = Arc::new(MemoryRunLog::default());
    let scheduler = SyncScheduler::new(
        Arc::clone(&orchestrator),
        run_log.clone(),
        Duration::from_secs(60),
    );

    let TriggerOutcome::Completed(reports) = scheduler.trigger().await else {
        panic!("trigger was skipped");
    };

    assert_eq!(reports.len(), 2);
    assert!(matches!(reports[0].outcome, RunOutcome::Critical(_)));
    assert!(reports[0]
        .render()
        .starts_with("Critical error during synchronization:"));
    assert_eq!(orchestrator.phase(), SyncPhase::Failed);
    assert_eq!(run_log.len(), 2);
}

#[tokio::test]
async fn test_run_loop_triggers_immediately_and_stops_on_cancel() {
    let (_pool, store) = common::setup().await;
    let source = Arc::new(StaticSource::new(json!({"status": "ok"})));
    let orchestrator = Arc::new(SyncOrchestrator::new(source, store));
    let run_log = Arc::new(MemoryRunLog::default());
    let scheduler = Arc::new(SyncScheduler::new(
        orchestrator,
        run_log.clone(),
        Duration::from_secs(3600),
    ));

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(Arc::clone(&scheduler).run(shutdown.clone()));

    for _ in 0..100 {
        if run_log.len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(run_log.len(), 2);

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler did not stop")
        .unwrap();
}
