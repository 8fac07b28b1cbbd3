//! # Sync Orchestrator
//!
//! Drives the status state machine for every run flavor.
//!
//! ## Status Lifecycle
//! ```text
//!           ┌──────────────────────────────────────────┐
//!           ▼                                          │
//! idle ► syncing ──► completed ──(next run)────────────┤
//!           │                                          │
//!           └──────► error ──(next run)────────────────┘
//! ```
//!
//! At most one run is in flight per orchestrator. The flag is an
//! `AtomicBool` held by a guard whose `Drop` releases it, so early
//! returns, `?` propagation and panics all end with the flag down.
//! Scheduled runs that lose the race are skipped with an `Ok` outcome;
//! pushes are rejected with [`SyncError::AlreadyRunning`] so the caller
//! can retry.
//!
//! During a full sync the resume cursor (`last_page_synced`) is persisted
//! after every page, so a run cut down mid-walk leaves an honest record of
//! how far it got.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use apteka_core::{RawItem, RunKind, RunOutcome, SyncState};
use apteka_db::Database;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::batch::{BatchProcessor, UpsertMode};
use crate::credentials::{CredentialGenerator, RandomCredentials};
use crate::error::{SyncError, SyncResult};
use crate::notify::{NoopNotifier, SyncNotifier, EVENT_SYNC_COMPLETED, EVENT_SYNC_ERROR};
use crate::provider::PageSource;
use crate::stats::StatisticsAggregator;

// =============================================================================
// Run Guard
// =============================================================================

/// Holds the single-flight flag for the duration of one run.
struct RunGuard {
    flag: Arc<AtomicBool>,
}

impl RunGuard {
    /// Take the flag, or `None` if another run holds it.
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
            .then(|| Self { flag: flag.clone() })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// What a finished run accomplished.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub total_pages: u32,
    pub total_records: u64,
    pub pages_processed: u32,
    pub items_processed: u64,
    pub execution_time_ms: i64,
}

/// Result of asking for a scheduled run.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Completed(SyncReport),
    /// Another run held the flag; nothing happened.
    AlreadyRunning,
}

/// Result of a push ingestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    /// Items that made it into the store.
    pub processed_count: u64,
    /// Caller-declared catalog size, defaulting to the batch length.
    pub total_records: u64,
}

// =============================================================================
// Orchestrator
// =============================================================================

pub struct SyncOrchestrator {
    db: Arc<Database>,
    source: Arc<dyn PageSource>,
    notifier: Arc<dyn SyncNotifier>,
    batch: BatchProcessor,
    stats: StatisticsAggregator,
    page_delay: Duration,
    sync_interval: Duration,
    running: Arc<AtomicBool>,
}

impl SyncOrchestrator {
    pub fn new(db: Arc<Database>, source: Arc<dyn PageSource>) -> Self {
        Self {
            batch: BatchProcessor::new(db.clone()),
            stats: StatisticsAggregator::new(db.clone(), Arc::new(RandomCredentials)),
            db,
            source,
            notifier: Arc::new(NoopNotifier),
            page_delay: Duration::from_millis(apteka_core::DEFAULT_PAGE_DELAY_MS),
            sync_interval: Duration::from_secs(apteka_core::DEFAULT_SYNC_INTERVAL_SECS),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn SyncNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialGenerator>) -> Self {
        self.stats = StatisticsAggregator::new(self.db.clone(), credentials);
        self
    }

    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    /// Interval used to stamp `next_sync_scheduled`; keep it equal to the
    /// scheduler's cadence.
    pub fn with_sync_interval(mut self, sync_interval: Duration) -> Self {
        self.sync_interval = sync_interval;
        self
    }

    /// Whether a run currently holds the single-flight flag.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn database(&self) -> &Arc<Database> {
        &self.db
    }

    // ===== Full Sync =====

    /// Walk every provider page, rebuild supplier statistics, notify.
    pub async fn run_full_sync(&self) -> SyncResult<SyncOutcome> {
        let _guard = match RunGuard::acquire(&self.running) {
            Some(guard) => guard,
            None => {
                info!("Full sync requested while another run is active; skipping");
                return Ok(SyncOutcome::AlreadyRunning);
            }
        };

        let started = Instant::now();
        match self.full_sync_inner(started).await {
            Ok(report) => {
                self.notifier.notify(
                    EVENT_SYNC_COMPLETED,
                    json!({
                        "totalPages": report.total_pages,
                        "totalRecords": report.total_records,
                        "timestamp": Utc::now().to_rfc3339(),
                    }),
                );
                Ok(SyncOutcome::Completed(report))
            }
            Err(err) => {
                self.record_failure(RunKind::Full, &err, started).await;
                Err(err)
            }
        }
    }

    async fn full_sync_inner(&self, started: Instant) -> SyncResult<SyncReport> {
        let status_repo = self.db.sync_status();
        let now = Utc::now();

        let mut status = status_repo.load_or_init(now).await?;
        status.status = SyncState::Syncing;
        status.last_sync_date = Some(now);
        status.error_message = None;
        status.updated_at = now;
        status_repo.save(&status).await?;

        info!("Full inventory sync started");

        // The first fetch establishes the walk; the page itself is fetched
        // again inside the loop so every page goes through one code path.
        let first = self.source.fetch_page(1).await?;
        let total_pages = first.total_pages;
        let total_records = first.total_count;
        status.total_pages = i64::from(total_pages);
        status.total_records = total_records as i64;
        status.updated_at = Utc::now();
        status_repo.save(&status).await?;

        let mut pages_processed = 0u32;
        let mut items_processed = 0u64;

        for page_number in 1..=total_pages {
            let page = self.source.fetch_page(page_number).await?;
            let processed = self.batch.process(&page.items, UpsertMode::Overwrite).await?;
            pages_processed += 1;
            items_processed += processed;

            status.last_page_synced = i64::from(page_number);
            status.updated_at = Utc::now();
            status_repo.save(&status).await?;
            debug!(
                page = page_number,
                total_pages,
                items = processed,
                "Inventory page stored"
            );

            if page_number < total_pages && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        self.stats.rebuild().await?;

        let finished = Utc::now();
        let execution_time_ms = started.elapsed().as_millis() as i64;
        status.status = SyncState::Completed;
        status.error_message = None;
        status.next_sync_scheduled =
            Some(finished + chrono::Duration::seconds(self.sync_interval.as_secs() as i64));
        status.execution_time_ms = Some(execution_time_ms);
        status.updated_at = finished;
        status_repo.save(&status).await?;

        self.db
            .sync_runs()
            .append(
                RunKind::Full,
                RunOutcome::Completed,
                items_processed as i64,
                None,
                Some(execution_time_ms),
                finished,
            )
            .await?;

        info!(
            total_pages,
            total_records,
            items_processed,
            execution_time_ms,
            "Full inventory sync completed"
        );

        Ok(SyncReport {
            total_pages,
            total_records,
            pages_processed,
            items_processed,
            execution_time_ms,
        })
    }

    // ===== Incremental Sync =====

    /// Re-fetch the resume page and merge it in. Quiet: no statistics
    /// rebuild, no events. Falls back to a full sync when no full sync has
    /// ever recorded a cursor.
    pub async fn run_incremental_sync(&self) -> SyncResult<SyncOutcome> {
        // Decide on fallback before taking the flag, so the delegated full
        // sync can take it itself.
        let resume_page = self
            .db
            .sync_status()
            .load_or_init(Utc::now())
            .await?
            .last_page_synced;
        if resume_page <= 0 {
            info!("No resume cursor yet; running a full sync instead");
            return self.run_full_sync().await;
        }

        let _guard = match RunGuard::acquire(&self.running) {
            Some(guard) => guard,
            None => {
                debug!("Incremental sync requested while another run is active; skipping");
                return Ok(SyncOutcome::AlreadyRunning);
            }
        };

        let started = Instant::now();
        match self.incremental_inner(resume_page as u32, started).await {
            Ok(report) => Ok(SyncOutcome::Completed(report)),
            Err(err) => {
                self.record_failure(RunKind::Incremental, &err, started).await;
                Err(err)
            }
        }
    }

    async fn incremental_inner(
        &self,
        page_number: u32,
        started: Instant,
    ) -> SyncResult<SyncReport> {
        let status_repo = self.db.sync_status();
        let now = Utc::now();

        let mut status = status_repo.load_or_init(now).await?;
        status.status = SyncState::Syncing;
        status.last_sync_date = Some(now);
        status.error_message = None;
        status.updated_at = now;
        status_repo.save(&status).await?;

        debug!(page = page_number, "Incremental sync started");

        let page = self.source.fetch_page(page_number).await?;
        let items_processed = self.batch.process(&page.items, UpsertMode::Merge).await?;

        let finished = Utc::now();
        let execution_time_ms = started.elapsed().as_millis() as i64;
        status.status = SyncState::Completed;
        status.next_sync_scheduled =
            Some(finished + chrono::Duration::seconds(self.sync_interval.as_secs() as i64));
        status.execution_time_ms = Some(execution_time_ms);
        status.updated_at = finished;
        status_repo.save(&status).await?;

        self.db
            .sync_runs()
            .append(
                RunKind::Incremental,
                RunOutcome::Completed,
                items_processed as i64,
                None,
                Some(execution_time_ms),
                finished,
            )
            .await?;

        info!(
            page = page_number,
            items = items_processed,
            "Incremental sync completed"
        );

        Ok(SyncReport {
            total_pages: page.total_pages,
            total_records: page.total_count,
            pages_processed: 1,
            items_processed,
            execution_time_ms,
        })
    }

    // ===== Push Ingestion =====

    /// Store a caller-supplied batch in merge mode, statistics rebuild
    /// included. Rejected outright while another run is in flight.
    pub async fn ingest_batch(
        &self,
        items: &[RawItem],
        total_count: Option<u64>,
    ) -> SyncResult<IngestSummary> {
        let _guard = match RunGuard::acquire(&self.running) {
            Some(guard) => guard,
            None => return Err(SyncError::AlreadyRunning),
        };

        let started = Instant::now();
        match self.ingest_inner(items, total_count, started).await {
            Ok(summary) => {
                self.notifier.notify(
                    EVENT_SYNC_COMPLETED,
                    json!({
                        "totalRecords": summary.total_records,
                        "processedCount": summary.processed_count,
                        "timestamp": Utc::now().to_rfc3339(),
                    }),
                );
                Ok(summary)
            }
            Err(err) => {
                self.record_failure(RunKind::Push, &err, started).await;
                Err(err)
            }
        }
    }

    async fn ingest_inner(
        &self,
        items: &[RawItem],
        total_count: Option<u64>,
        started: Instant,
    ) -> SyncResult<IngestSummary> {
        let status_repo = self.db.sync_status();
        let now = Utc::now();

        let mut status = status_repo.load_or_init(now).await?;
        status.status = SyncState::Syncing;
        status.last_sync_date = Some(now);
        status.error_message = None;
        status.updated_at = now;
        status_repo.save(&status).await?;

        info!(items = items.len(), "Push ingestion started");

        let processed_count = self.batch.process(items, UpsertMode::Merge).await?;
        self.stats.rebuild().await?;

        let finished = Utc::now();
        let execution_time_ms = started.elapsed().as_millis() as i64;
        let total_records = total_count.unwrap_or(items.len() as u64);

        status.status = SyncState::Completed;
        status.total_records = total_records as i64;
        status.execution_time_ms = Some(execution_time_ms);
        status.updated_at = finished;
        status_repo.save(&status).await?;

        self.db
            .sync_runs()
            .append(
                RunKind::Push,
                RunOutcome::Completed,
                processed_count as i64,
                None,
                Some(execution_time_ms),
                finished,
            )
            .await?;

        info!(processed_count, total_records, "Push ingestion completed");

        Ok(IngestSummary {
            processed_count,
            total_records,
        })
    }

    // ===== Retention =====

    /// Delete zero-quantity products untouched for `days_old` days.
    /// Runs independently of the single-flight flag.
    pub async fn clear_old_data(&self, days_old: u32) -> SyncResult<u64> {
        let cutoff = Utc::now() - chrono::Duration::days(i64::from(days_old));
        let deleted = self.db.products().delete_stale(cutoff).await?;
        Ok(deleted)
    }

    // ===== Failure Recording =====

    /// Best-effort bookkeeping for a failed run: error status, journal
    /// line, and (for visible runs) an error event. Never masks the
    /// original failure with its own.
    async fn record_failure(&self, kind: RunKind, err: &SyncError, started: Instant) {
        let now = Utc::now();
        let execution_time_ms = started.elapsed().as_millis() as i64;

        match self.db.sync_status().load_or_init(now).await {
            Ok(mut status) => {
                status.status = SyncState::Error;
                status.error_message = Some(err.to_string());
                status.updated_at = now;
                if let Err(save_err) = self.db.sync_status().save(&status).await {
                    warn!(error = %save_err, "Failed to persist error status");
                }
            }
            Err(load_err) => {
                warn!(error = %load_err, "Failed to load status while recording a failure");
            }
        }

        if let Err(journal_err) = self
            .db
            .sync_runs()
            .append(
                kind,
                RunOutcome::Error,
                0,
                Some(&err.to_string()),
                Some(execution_time_ms),
                now,
            )
            .await
        {
            warn!(error = %journal_err, "Failed to journal errored run");
        }

        if kind != RunKind::Incremental {
            self.notifier.notify(
                EVENT_SYNC_ERROR,
                json!({
                    "error": err.to_string(),
                    "timestamp": now.to_rfc3339(),
                }),
            );
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
