//! # apteka-core: Pure Domain Logic for the Apteka Sync Service
//!
//! This crate is the **heart** of the synchronizer. It contains the domain
//! types and payload rules as pure code with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Apteka Sync Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 External Inventory Provider                     │   │
//! │  │        paginated POST /report/inventory/remains (JSON)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 apteka-sync (orchestration)                     │   │
//! │  │    page fetcher ──► batch processor ──► statistics rebuild      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ apteka-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  coerce   │  │ username  │  │   error   │  │   │
//! │  │   │  Product  │  │  lenient  │  │  derive   │  │ CoreError │  │   │
//! │  │   │  Supplier │  │  numbers  │  │  supplier │  │           │  │   │
//! │  │   │ SyncStatus│  │  & dates  │  │   logins  │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apteka-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Supplier, SyncStatus, RawItem, etc.)
//! - [`coerce`] - Lenient deserialization rules for provider payloads
//! - [`username`] - Deterministic supplier username derivation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Lenient Inbound**: Provider payloads are messy; numerics coerce to 0,
//!    bad dates coerce to None, never to a hard failure
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use apteka_core::username::derive_username;
//!
//! // Supplier logins are derived, not chosen
//! assert_eq!(derive_username("Grand Pharm Trade"), "grand_pharm_trade");
//! assert_eq!(derive_username("OOO \"Meros-Farm\""), "ooo_meros_farm");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod coerce;
pub mod error;
pub mod types;
pub mod username;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use apteka_core::Product` instead of
// `use apteka_core::types::Product`

pub use error::{CoreError, CoreResult};
pub use types::*;
pub use username::derive_username;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Number of inventory items requested per provider page.
///
/// ## Why a constant?
/// The provider caps result pages at 100 items; requesting more silently
/// truncates. Configurable per deployment, but this is the contract default.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Default delay between consecutive page fetches during a full sync.
///
/// The provider is a shared multi-tenant API; hammering it page after page
/// gets the token throttled. One second keeps a 300-page sync under six
/// minutes while staying well inside the provider's rate budget.
pub const DEFAULT_PAGE_DELAY_MS: u64 = 1_000;

/// Default cadence for scheduler-triggered incremental syncs.
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 600;

/// Per-request timeout for provider page fetches.
pub const PROVIDER_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Quantity below which an in-stock product counts as low stock.
///
/// A product with `0 < quantity < LOW_STOCK_THRESHOLD` shows up in the
/// low-stock count of the data statistics view. Zero-quantity products are
/// out of stock, not low stock.
pub const LOW_STOCK_THRESHOLD: f64 = 10.0;

/// Maximum length of a derived supplier username.
pub const USERNAME_MAX_LEN: usize = 32;

/// Length of the random initial password for auto-provisioned suppliers.
pub const GENERATED_PASSWORD_LEN: usize = 8;

/// Default retention window for `clear_old_data` style cleanup (days).
pub const DEFAULT_RETENTION_DAYS: u32 = 30;
