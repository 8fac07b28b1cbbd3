//! # Apteka Sync Daemon
//!
//! Keeps the local pharmacy database in step with the provider's
//! inventory feed: one full walk at startup, incremental passes on an
//! interval, graceful shutdown on ctrl-c or SIGTERM.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            syncd                                │
//! │                                                                 │
//! │  Provider API ───► Scheduler ───► Orchestrator ───► SQLite      │
//! │                                        │                        │
//! │                                        ▼                        │
//! │                                 tracing events                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `syncd [config.toml]`. Without an argument the platform config
//! directory is consulted, then built-in defaults; `APTEKA_*` environment
//! variables override either.

use std::path::PathBuf;
use std::sync::Arc;

use apteka_core::DEFAULT_RETENTION_DAYS;
use apteka_db::{Database, DbConfig};
use apteka_sync::{ProviderClient, Scheduler, SyncConfig, SyncOrchestrator, TracingNotifier};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Apteka sync daemon...");

    // Load configuration
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let mut config = SyncConfig::load_or_default(config_path.as_deref())?;
    config.apply_env_overrides();
    config.validate()?;
    info!(provider = %config.provider.base_url, "Configuration loaded");

    // Open the database
    let db_path = config.database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db_config =
        DbConfig::new(&db_path).with_max_connections(config.database.max_connections);
    let db = Arc::new(Database::new(db_config).await?);
    info!(path = %db_path.display(), "Database ready");

    // Probe the provider once so a dead endpoint shows up in the logs
    // immediately instead of at the first scheduled run.
    let provider = Arc::new(ProviderClient::new(&config.provider)?);
    let health = provider.health().await;
    if health.healthy {
        info!(
            response_time_ms = health.response_time_ms,
            "Provider reachable"
        );
    } else {
        warn!(
            error = ?health.error,
            "Provider health check failed; syncs will retry on schedule"
        );
    }

    let orchestrator = Arc::new(
        SyncOrchestrator::new(db.clone(), provider)
            .with_notifier(Arc::new(TracingNotifier))
            .with_page_delay(config.schedule.page_delay())
            .with_sync_interval(config.schedule.incremental_interval()),
    );

    // Retention sweep before the first walk
    match orchestrator.clear_old_data(DEFAULT_RETENTION_DAYS).await {
        Ok(deleted) if deleted > 0 => info!(deleted, "Removed stale empty products"),
        Ok(_) => {}
        Err(err) => warn!(error = %err, "Retention sweep failed"),
    }

    // Run the scheduler until a shutdown signal arrives
    let (scheduler, handle) =
        Scheduler::new(orchestrator, config.schedule.incremental_interval());
    let scheduler_task = tokio::spawn(scheduler.run());

    shutdown_signal().await;

    handle.shutdown().await;
    if let Err(err) = scheduler_task.await {
        warn!(error = %err, "Scheduler task ended abnormally");
    }
    db.close().await;

    info!("Sync daemon shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=apteka=trace` - Show trace for apteka crates only
/// - Default: INFO level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,apteka=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
