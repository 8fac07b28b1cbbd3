//! # apteka-sync - External Data Synchronization
//!
//! Pulls the wholesale provider's inventory into the local store and keeps
//! it fresh.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          apteka-sync                                    │
//! │                                                                         │
//! │   ┌───────────┐    ┌──────────────────────────────────────────────┐    │
//! │   │ scheduler │───►│            SyncOrchestrator                  │    │
//! │   │ (interval)│    │                                              │    │
//! │   └───────────┘    │  run_full_sync ──┐                           │    │
//! │                    │  run_incremental │  single-flight guard      │    │
//! │   ┌───────────┐    │  ingest_batch  ──┘                           │    │
//! │   │ provider  │◄───┤                                              │    │
//! │   │ (HTTP)    │    │  ┌────────────┐  ┌──────────────────────┐    │    │
//! │   └───────────┘    │  │ batch      │  │ stats                │    │    │
//! │                    │  │ processor  │  │ aggregator + accounts│    │    │
//! │                    │  └─────┬──────┘  └──────────┬───────────┘    │    │
//! │                    └────────┼────────────────────┼────────────────┘    │
//! │                             ▼                    ▼                     │
//! │                          apteka-db (products, suppliers, status)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Run Flavors
//! - **Full**: walk every provider page, overwrite-upsert, rebuild supplier
//!   statistics, emit a completion event
//! - **Incremental**: re-fetch the resume page only, merge-upsert, quiet
//! - **Push**: caller-supplied batch, no provider traffic
//!
//! At most one run is in flight at any time; concurrent requests are
//! either skipped (scheduled runs) or rejected (pushes).

pub mod batch;
pub mod config;
pub mod credentials;
pub mod error;
pub mod notify;
pub mod orchestrator;
pub mod provider;
pub mod report;
pub mod scheduler;
pub mod stats;

pub use batch::{BatchProcessor, UpsertMode};
pub use config::{DatabaseSettings, ProviderSettings, ScheduleSettings, SyncConfig};
pub use credentials::{
    hash_password, verify_password, CredentialGenerator, Credentials, FixedCredentials,
    RandomCredentials,
};
pub use error::{SyncError, SyncResult};
pub use notify::{
    NoopNotifier, SyncNotifier, TracingNotifier, EVENT_SYNC_COMPLETED, EVENT_SYNC_ERROR,
};
pub use orchestrator::{IngestSummary, SyncOrchestrator, SyncOutcome, SyncReport};
pub use provider::{PageSource, ProviderClient, ProviderHealth};
pub use report::{DataStatistics, RecentProduct, StatusSnapshot};
pub use scheduler::{Scheduler, SchedulerHandle};
pub use stats::StatisticsAggregator;
