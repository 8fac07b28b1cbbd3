//! # Error Types
//!
//! Domain-specific error types for apteka-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  apteka-core errors (this file)                                        │
//! │  └── CoreError        - Domain-level mapping failures                  │
//! │                                                                         │
//! │  apteka-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  apteka-sync errors (separate crate)                                   │
//! │  └── SyncError        - Transport/format/run-level failures            │
//! │                                                                         │
//! │  Flow: CoreError → SyncError (item-level) → Sync Status record         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (external id, field name)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain mapping errors.
///
/// These errors represent payloads that cannot be turned into domain records.
/// Numeric and date sloppiness is absorbed by the coercion rules in
/// [`crate::coerce`]; only structurally unusable items end up here.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Inventory item arrived without an external id.
    ///
    /// ## When This Occurs
    /// - The provider emits a row with `id` missing, null, or blank
    /// - A push-ingested batch contains a malformed item
    ///
    /// The external id is the upsert key, so there is nothing sensible to
    /// store. The batch processor counts and logs the item, then moves on.
    #[error("Inventory item has no external id")]
    MissingExternalId,

    /// Inventory item arrived without a product name.
    ///
    /// ## When This Occurs
    /// - The provider emits a row whose `product` field is missing or blank
    ///
    /// A nameless row is unusable for search and display, so the item is
    /// rejected rather than stored as an empty shell.
    #[error("Inventory item '{external_id}' has no product name")]
    MissingName { external_id: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::MissingExternalId;
        assert_eq!(err.to_string(), "Inventory item has no external id");

        let err = CoreError::MissingName {
            external_id: "ext-1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Inventory item 'ext-1' has no product name"
        );
    }
}
