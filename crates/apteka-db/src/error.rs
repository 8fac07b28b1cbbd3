//! # Database Error Types
//!
//! All database operations return [`DbResult`]. Raw `sqlx` errors never
//! leave this crate: the `From` impl below classifies them so callers can
//! branch on meaning (unique violation vs. connection loss) instead of
//! string-matching driver messages.

use thiserror::Error;

// =============================================================================
// Database Error
// =============================================================================

#[derive(Debug, Error)]
pub enum DbError {
    /// Could not open the database, or the connection layer went away
    /// (closed pool, crashed worker, I/O failure).
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    /// Schema migration did not apply cleanly.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A query expected a row and found none.
    #[error("Record not found")]
    NotFound,

    /// An insert collided with a UNIQUE constraint.
    ///
    /// Carries the driver message, which names the violated column. The
    /// statistics pass treats this as a per-supplier containable failure
    /// (two feed names can collapse to the same derived username).
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// No free connection within the pool's acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Any other query failure.
    #[error("Query failed: {0}")]
    QueryFailed(String),
}

impl DbError {
    /// True when the failure is a UNIQUE constraint collision.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation(_))
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed | sqlx::Error::Io(_) => {
                DbError::ConnectionFailed(err.to_string())
            }
            sqlx::Error::Database(db_err) => {
                let message = db_err.message();
                if message.contains("UNIQUE constraint failed") {
                    DbError::UniqueViolation(message.to_string())
                } else {
                    DbError::QueryFailed(err.to_string())
                }
            }
            _ => DbError::QueryFailed(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with DbError.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================
