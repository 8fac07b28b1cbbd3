//! # Sync Error Types
//!
//! One error enum for the whole engine, grouped by where in the pipeline a
//! failure can surface. The `From` impls at the bottom keep `?` working on
//! reqwest, database and config-parsing calls without losing the class of
//! the failure.

use apteka_db::DbError;
use thiserror::Error;

// =============================================================================
// Sync Error
// =============================================================================

#[derive(Debug, Error)]
pub enum SyncError {
    // ===== Configuration Errors =====
    /// A setting is present but unusable (bad URL, zero page size).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The config file could not be read or parsed.
    #[error("Failed to load configuration: {0}")]
    ConfigLoadFailed(String),

    // ===== Provider Errors =====
    /// The request never produced a usable response (DNS, refused, TLS).
    #[error("Provider request failed: {0}")]
    Transport(String),

    /// The provider did not answer within the request timeout.
    #[error("Provider request timed out")]
    Timeout,

    /// The provider answered with a non-success HTTP status.
    #[error("Provider returned HTTP {0}")]
    UnexpectedStatus(u16),

    /// The response body is not the shape the wire contract promises.
    #[error("Malformed provider response: {0}")]
    Format(String),

    // ===== Processing Errors =====
    /// One inventory item could not be mapped or stored. Contained by the
    /// batch processor; never fails a run on its own.
    #[error("Item '{id}' rejected: {reason}")]
    Item { id: String, reason: String },

    /// Password hashing for a provisioned supplier account failed.
    #[error("Credential provisioning failed: {0}")]
    Credential(String),

    // ===== Run Errors =====
    /// A sync run is already in flight.
    #[error("A sync run is already in progress")]
    AlreadyRunning,

    /// The store rejected an operation.
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl SyncError {
    /// True for failures between us and the provider.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SyncError::Transport(_) | SyncError::Timeout | SyncError::UnexpectedStatus(_)
        )
    }

    /// True when the failure is the single-flight rejection.
    pub fn is_concurrency(&self) -> bool {
        matches!(self, SyncError::AlreadyRunning)
    }

    /// True for failures that need an operator, not a retry.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_) | SyncError::ConfigLoadFailed(_)
        )
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Timeout
        } else if let Some(status) = err.status() {
            SyncError::UnexpectedStatus(status.as_u16())
        } else if err.is_decode() {
            SyncError::Format(err.to_string())
        } else {
            SyncError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Format(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidConfig(err.to_string())
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with SyncError.
pub type SyncResult<T> = Result<T, SyncError>;

// =============================================================================
// Unit Tests
// =============================================================================
