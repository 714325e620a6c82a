//! Catsync Daemon - Background catalog synchronization service
//!
//! This binary handles:
//! - Periodic polling of the remote catalog for both selectors
//! - Reconciliation into the local SQLite catalog
//! - The `/health`, `/info` and `/last_update` HTTP surface
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! `main` loads the configuration, installs the tracing subscriber and wires
//! the adapters into a `SyncScheduler`. The scheduler loop and the HTTP
//! surface share one `CancellationToken` that is triggered on receipt of
//! SIGTERM or SIGINT. With `--once` a single trigger runs and the process
//! exits.

mod server;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use catsync_audit::FileRunLog;
use catsync_cache::{DatabasePool, SqliteCatalogStore};
use catsync_core::config::{Config, LoggingConfig};
use catsync_core::ports::{ICatalogStore, IRunLog};
use catsync_remote::{CatalogClient, HttpSnapshotSource};
use catsync_sync::{SyncOrchestrator, SyncScheduler, TriggerOutcome};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::server::{ApiServer, ApiState};

/// Catalog sync service
#[derive(Debug, Parser)]
#[command(name = "catsyncd", version, about)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run one sync for both selectors and exit
    #[arg(long)]
    once: bool,
}

// ============================================================================
// DaemonService
// ============================================================================

/// Wired service: scheduler, HTTP state and the shutdown token
struct DaemonService {
    config: Config,
    scheduler: Arc<SyncScheduler>,
    api_state: Arc<ApiState>,
    shutdown: CancellationToken,
    /// Keeps the connection pool open for the life of the service
    _db_pool: DatabasePool,
}

impl DaemonService {
    /// Opens the database and builds every adapter
    async fn new(config: Config, shutdown: CancellationToken) -> Result<Self> {
        let db_pool = DatabasePool::new(&config.database.path)
            .await
            .context("Failed to open database")?;
        info!(path = %config.database.path.display(), "Opened catalog database");
        let store: Arc<dyn ICatalogStore> =
            Arc::new(SqliteCatalogStore::new(db_pool.pool().clone()));

        let client = CatalogClient::new(
            config.remote.base_url.clone(),
            Duration::from_secs(config.remote.timeout_secs),
        )
        .context("Failed to build catalog client")?;
        let source = Arc::new(HttpSnapshotSource::new(client));

        let orchestrator = Arc::new(SyncOrchestrator::new(source, Arc::clone(&store)));
        let run_log: Arc<dyn IRunLog> = Arc::new(FileRunLog::new(config.reports.dir.clone()));

        let api_state = Arc::new(ApiState {
            store,
            run_log: Arc::clone(&run_log),
            phase: orchestrator.subscribe(),
        });

        let scheduler = Arc::new(SyncScheduler::new(
            orchestrator,
            run_log,
            Duration::from_secs(config.sync.interval_secs),
        ));

        Ok(Self {
            config,
            scheduler,
            api_state,
            shutdown,
            _db_pool: db_pool,
        })
    }

    /// Runs the scheduler loop and the HTTP surface until shutdown
    async fn run(&self) -> Result<()> {
        let server_handle = if self.config.http.enabled {
            let server = ApiServer::new(Arc::clone(&self.api_state), &self.config.http.bind)
                .context("Invalid http.bind address")?;
            let token = self.shutdown.clone();
            Some(tokio::spawn(async move { server.run(token).await }))
        } else {
            info!("HTTP surface disabled");
            None
        };

        Arc::clone(&self.scheduler)
            .run(self.shutdown.clone())
            .await;

        if let Some(handle) = server_handle {
            // The scheduler only returns on shutdown; make sure the server follows.
            self.shutdown.cancel();
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %format!("{e:#}"), "HTTP surface failed"),
                Err(e) => error!(error = %e, "HTTP surface task panicked"),
            }
        }

        Ok(())
    }

    /// Runs a single trigger and prints both reports
    async fn run_once(&self) -> Result<()> {
        match self.scheduler.trigger().await {
            TriggerOutcome::Completed(reports) => {
                for report in reports {
                    println!("{}", report.render());
                }
                Ok(())
            }
            TriggerOutcome::SkippedBusy => {
                anyhow::bail!("A sync run is already in progress")
            }
        }
    }
}

// ============================================================================
// Configuration and logging
// ============================================================================

/// Loads the configuration named on the command line, or the default one
///
/// An explicitly named file must exist and parse; the default location
/// silently falls back to built-in defaults.
fn load_config(path: Option<&PathBuf>) -> Result<(Config, PathBuf)> {
    let (config, path) = match path {
        Some(path) => {
            let config = Config::load(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            (config, path.clone())
        }
        None => {
            let path = Config::default_path();
            (Config::load_or_default(&path), path)
        }
    };

    let errors = config.validate();
    if !errors.is_empty() {
        let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
        anyhow::bail!("Invalid configuration: {}", joined.join("; "));
    }

    Ok((config, path))
}

/// Installs the global tracing subscriber; `RUST_LOG` overrides the configured level
fn init_tracing(logging: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}

// ============================================================================
// Graceful shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

// ============================================================================
// Main entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (config, config_path) = load_config(args.config.as_ref())?;
    init_tracing(&config.logging);

    info!(
        config_path = %config_path.display(),
        base_url = %config.remote.base_url,
        interval_secs = config.sync.interval_secs,
        "Catalog sync service starting (catsyncd)"
    );

    let shutdown_token = CancellationToken::new();
    let service = DaemonService::new(config, shutdown_token.clone()).await?;

    if args.once {
        return service.run_once().await;
    }

    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let result = service.run().await;

    match &result {
        Ok(()) => info!("Catalog sync service shut down gracefully"),
        Err(e) => error!(error = %format!("{e:#}"), "Catalog sync service exiting with error"),
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
