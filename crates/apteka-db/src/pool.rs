//! # Connection Pool Management
//!
//! Owns the SQLite pool and hands out repositories.
//!
//! ## Connection Settings
//! - WAL journal mode: status readers keep working while a sync run writes
//! - `synchronous = NORMAL`: safe with WAL, much faster than FULL
//! - `mode=rwc`: create the database file on first run
//!
//! In-memory databases (tests) pin the pool to a single connection, since
//! every new `:memory:` connection would otherwise be a fresh empty
//! database.

use std::path::PathBuf;
use std::str::FromStr;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::{
    ProductRepository, SupplierRepository, SyncRunRepository, SyncStatusRepository,
};

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the database file. Ignored for in-memory databases.
    pub path: PathBuf,
    /// Maximum pool size.
    pub max_connections: u32,
    /// Use a shared in-memory database instead of a file.
    pub in_memory: bool,
}

impl DbConfig {
    /// File-backed database at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_connections: 5,
            in_memory: false,
        }
    }

    /// In-memory database, single connection.
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            max_connections: 1,
            in_memory: true,
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }
}

// =============================================================================
// Database Handle
// =============================================================================

/// Shared database handle. Cheap to clone; all clones use the same pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the database, applying pending migrations.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let options = if config.in_memory {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            let url = format!("sqlite://{}?mode=rwc", config.path.display());
            SqliteConnectOptions::from_str(&url)
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .create_if_missing(true)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options.foreign_keys(true))
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        migrations::run_migrations(&pool).await?;

        if !config.in_memory {
            info!(path = %config.path.display(), "Database ready");
        }

        Ok(Self { pool })
    }

    /// In-memory database for tests.
    pub async fn in_memory() -> DbResult<Self> {
        Self::new(DbConfig::in_memory()).await
    }

    /// Raw pool access for callers that need transactions.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ===== Repositories =====

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn suppliers(&self) -> SupplierRepository {
        SupplierRepository::new(self.pool.clone())
    }

    pub fn sync_status(&self) -> SyncStatusRepository {
        SyncStatusRepository::new(self.pool.clone())
    }

    pub fn sync_runs(&self) -> SyncRunRepository {
        SyncRunRepository::new(self.pool.clone())
    }

    // ===== Lifecycle =====

    /// Cheap liveness probe.
    pub async fn health_check(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the pool, flushing WAL.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_starts_migrated() {
        let db = Database::in_memory().await.unwrap();
        db.health_check().await.unwrap();
        // Migrated schema means the products table exists and is empty.
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_close_is_clean() {
        let db = Database::in_memory().await.unwrap();
        db.close().await;
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("apteka.db").with_max_connections(12);
        assert_eq!(config.max_connections, 12);
        assert!(!config.in_memory);

        let mem = DbConfig::in_memory();
        assert_eq!(mem.max_connections, 1);
        assert!(mem.in_memory);
    }
}
