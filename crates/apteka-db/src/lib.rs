//! # apteka-db - Persistence Layer
//!
//! SQLite-backed storage for the synchronization subsystem.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          apteka-db                                      │
//! │                                                                         │
//! │  ┌──────────┐   ┌──────────────┐   ┌─────────────────────────────────┐ │
//! │  │   pool   │──►│  migrations  │   │           repository            │ │
//! │  │          │   │              │   │                                 │ │
//! │  │ Database │   │ embedded SQL │   │  ProductRepository              │ │
//! │  │ DbConfig │   │ (sqlx)       │   │  SupplierRepository             │ │
//! │  └──────────┘   └──────────────┘   │  SyncStatusRepository           │ │
//! │                                    │  SyncRunRepository              │ │
//! │                                    └─────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```no_run
//! use apteka_db::{Database, DbConfig};
//!
//! # async fn demo() -> apteka_db::DbResult<()> {
//! let db = Database::new(DbConfig::new("apteka.db")).await?;
//! let total = db.products().count().await?;
//! println!("{total} products");
//! # Ok(())
//! # }
//! ```
//!
//! The pool runs SQLite in WAL mode so status readers never block behind a
//! sync run's writes.

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::{
    ProductRepository, SupplierRepository, SupplierRollup, SyncRunRepository,
    SyncStatusRepository,
};
