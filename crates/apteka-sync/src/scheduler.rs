//! # Sync Scheduler
//!
//! Owns the background cadence: one full sync at startup, then an
//! incremental pass every interval until shutdown.
//!
//! ## Why
//! The orchestrator is single-flight, so the scheduler never has to
//! coordinate with manual runs triggered elsewhere; a tick that collides
//! with one simply comes back as a skipped outcome. Missed ticks are
//! delayed rather than bursted, so a long full sync is followed by one
//! incremental pass, not a backlog of them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::orchestrator::SyncOrchestrator;

/// Background sync loop. Consumed by [`Scheduler::run`].
pub struct Scheduler {
    orchestrator: Arc<SyncOrchestrator>,
    interval: Duration,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Cloneable remote control for a running scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl SchedulerHandle {
    /// Ask the scheduler to stop after its current pass. Idempotent; a
    /// scheduler that is already gone is not an error.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

impl Scheduler {
    pub fn new(
        orchestrator: Arc<SyncOrchestrator>,
        interval: Duration,
    ) -> (Self, SchedulerHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        (
            Self {
                orchestrator,
                interval,
                shutdown_rx,
            },
            SchedulerHandle { shutdown_tx },
        )
    }

    /// Run until shutdown. Spawn this onto the runtime; run errors are
    /// logged here and never end the loop.
    pub async fn run(mut self) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Sync scheduler started"
        );

        // The startup pass walks the whole catalog before the cadence
        // begins, so a fresh install is usable right away.
        if let Err(err) = self.orchestrator.run_full_sync().await {
            error!(error = %err, "Startup full sync failed");
        }

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // An interval's first tick completes immediately; the startup pass
        // already covered it.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.orchestrator.run_incremental_sync().await {
                        error!(error = %err, "Scheduled incremental sync failed");
                    }
                }
                _ = self.shutdown_rx.recv() => {
                    info!("Sync scheduler stopping");
                    break;
                }
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
