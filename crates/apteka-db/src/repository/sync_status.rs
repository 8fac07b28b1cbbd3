//! # Sync Status Repository
//!
//! The `sync_status` table holds exactly one row (enforced by a CHECK on
//! its id). Every write goes through `save`, which upserts that row, so
//! torn state between runs is impossible.

use apteka_core::SyncStatus;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::DbResult;

const STATUS_COLUMNS: &str = "status, last_sync_date, last_page_synced, \
     total_pages, total_records, error_message, next_sync_scheduled, \
     execution_time_ms, updated_at";

pub struct SyncStatusRepository {
    pool: SqlitePool,
}

impl SyncStatusRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Read the singleton row, creating an idle one on first call.
    pub async fn load_or_init(&self, now: DateTime<Utc>) -> DbResult<SyncStatus> {
        sqlx::query(
            "INSERT INTO sync_status (id, status, updated_at) VALUES (1, 'idle', ?1) \
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        let sql = format!("SELECT {STATUS_COLUMNS} FROM sync_status WHERE id = 1");
        let status = sqlx::query_as::<_, SyncStatus>(&sql)
            .fetch_one(&self.pool)
            .await?;
        Ok(status)
    }

    /// Persist the whole status record.
    pub async fn save(&self, status: &SyncStatus) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO sync_status (id, status, last_sync_date, last_page_synced, \
                 total_pages, total_records, error_message, next_sync_scheduled, \
                 execution_time_ms, updated_at) \
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
             ON CONFLICT(id) DO UPDATE SET \
                 status = excluded.status, \
                 last_sync_date = excluded.last_sync_date, \
                 last_page_synced = excluded.last_page_synced, \
                 total_pages = excluded.total_pages, \
                 total_records = excluded.total_records, \
                 error_message = excluded.error_message, \
                 next_sync_scheduled = excluded.next_sync_scheduled, \
                 execution_time_ms = excluded.execution_time_ms, \
                 updated_at = excluded.updated_at",
        )
        .bind(status.status)
        .bind(status.last_sync_date)
        .bind(status.last_page_synced)
        .bind(status.total_pages)
        .bind(status.total_records)
        .bind(&status.error_message)
        .bind(status.next_sync_scheduled)
        .bind(status.execution_time_ms)
        .bind(status.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Database;
    use apteka_core::SyncState;

    async fn test_db() -> Database {
        Database::in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_load_or_init_creates_idle_row() {
        let db = test_db().await;
        let repo = db.sync_status();

        let status = repo.load_or_init(Utc::now()).await.unwrap();
        assert_eq!(status.status, SyncState::Idle);
        assert_eq!(status.last_page_synced, 0);
        assert!(status.last_sync_date.is_none());
        assert!(status.execution_time_ms.is_none());
    }

    #[tokio::test]
    async fn test_save_round_trips() {
        let db = test_db().await;
        let repo = db.sync_status();
        let now = Utc::now();

        let mut status = repo.load_or_init(now).await.unwrap();
        status.status = SyncState::Completed;
        status.last_sync_date = Some(now);
        status.last_page_synced = 7;
        status.total_pages = 7;
        status.total_records = 654;
        status.execution_time_ms = Some(42_000);
        status.updated_at = now;
        repo.save(&status).await.unwrap();

        let loaded = repo.load_or_init(now).await.unwrap();
        assert_eq!(loaded.status, SyncState::Completed);
        assert_eq!(loaded.last_page_synced, 7);
        assert_eq!(loaded.total_records, 654);
        assert_eq!(loaded.execution_time_ms, Some(42_000));
    }

    #[tokio::test]
    async fn test_save_is_a_singleton_upsert() {
        let db = test_db().await;
        let repo = db.sync_status();
        let now = Utc::now();

        let mut status = repo.load_or_init(now).await.unwrap();
        status.status = SyncState::Syncing;
        repo.save(&status).await.unwrap();
        status.status = SyncState::Error;
        status.error_message = Some("provider unreachable".to_string());
        repo.save(&status).await.unwrap();

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sync_status")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(rows, 1);

        let loaded = repo.load_or_init(now).await.unwrap();
        assert_eq!(loaded.status, SyncState::Error);
        assert_eq!(
            loaded.error_message.as_deref(),
            Some("provider unreachable")
        );
    }
}
