//! # Repository Pattern Implementation
//!
//! One repository per table. Repositories are cheap value types holding a
//! pool clone; get them from [`crate::Database`]'s accessor methods rather
//! than constructing them directly.

mod product;
mod supplier;
mod sync_run;
mod sync_status;

pub use product::{ProductRepository, SupplierRollup};
pub use supplier::SupplierRepository;
pub use sync_run::SyncRunRepository;
pub use sync_status::SyncStatusRepository;
