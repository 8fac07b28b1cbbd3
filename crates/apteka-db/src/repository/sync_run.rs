//! # Sync Run Repository
//!
//! Append-only journal of sync runs. One row per attempt, written at the
//! very end of a run whether it completed or failed.

use apteka_core::{RunKind, RunOutcome, SyncRun};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::DbResult;

pub struct SyncRunRepository {
    pool: SqlitePool,
}

impl SyncRunRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record one finished run.
    pub async fn append(
        &self,
        kind: RunKind,
        status: RunOutcome,
        records_updated: i64,
        error_message: Option<&str>,
        execution_time_ms: Option<i64>,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO sync_runs (kind, status, records_updated, error_message, \
                 execution_time_ms, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(kind)
        .bind(status)
        .bind(records_updated)
        .bind(error_message)
        .bind(execution_time_ms)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Most recent runs, newest first.
    pub async fn recent(&self, limit: i64) -> DbResult<Vec<SyncRun>> {
        let runs = sqlx::query_as::<_, SyncRun>(
            "SELECT id, kind, status, records_updated, error_message, \
                 execution_time_ms, created_at \
             FROM sync_runs ORDER BY created_at DESC, id DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(runs)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
