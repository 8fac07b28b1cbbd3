//! # Schema Migrations
//!
//! Migration SQL lives in `migrations/sqlite/` at the workspace root and is
//! embedded into the binary at compile time, so a deployed daemon carries
//! its own schema and needs no files on disk.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrator, sourced from `migrations/sqlite/`.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Apply any pending migrations.
///
/// Safe to call on every startup; already-applied versions are skipped
/// via sqlx's `_sqlx_migrations` bookkeeping table.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;
    info!(
        migrations = MIGRATOR.migrations.len(),
        "Database migrations up to date"
    );
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
