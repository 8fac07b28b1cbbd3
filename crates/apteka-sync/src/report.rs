//! # Status & Statistics Readers
//!
//! Read-only views over the stores, shaped for an IPC or HTTP surface.
//!
//! ## Why
//! Dashboards poll these endpoints every few seconds. A flaky read must
//! never take the caller down, so these methods absorb every failure and
//! report it in-band through an `error` field on an otherwise zeroed
//! payload. The orchestrator's run entry points stay loud; only the
//! readers are silent.

use apteka_core::{Product, SyncRun, SyncState, LOW_STOCK_THRESHOLD};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::error::SyncResult;
use crate::orchestrator::SyncOrchestrator;

/// How many recently touched products a statistics payload carries.
const RECENT_PRODUCT_LIMIT: i64 = 5;

// =============================================================================
// Payloads
// =============================================================================

/// Point-in-time view of the sync state machine, merged with live store
/// counts so one poll answers "what is it doing and what has it got".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub status: SyncState,
    /// Live single-flight flag, not the persisted state. The two disagree
    /// briefly around the edges of a run.
    pub is_running: bool,
    pub last_sync_date: Option<DateTime<Utc>>,
    pub last_page_synced: i64,
    pub total_pages: i64,
    /// Catalog size the provider reported for the last walk.
    pub total_records: i64,
    /// Rows actually in the product store right now.
    pub total_products: i64,
    pub total_suppliers: i64,
    pub last_product_update: Option<DateTime<Utc>>,
    pub next_sync_scheduled: Option<DateTime<Utc>>,
    pub execution_time_ms: Option<i64>,
    pub error: Option<String>,
}

/// A product row trimmed down for activity feeds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentProduct {
    pub external_id: String,
    pub name: String,
    pub supplier: Option<String>,
    pub quantity: f64,
    pub last_updated: DateTime<Utc>,
}

impl From<Product> for RecentProduct {
    fn from(product: Product) -> Self {
        Self {
            external_id: product.external_id,
            name: product.name,
            supplier: product.supplier,
            quantity: product.quantity,
            last_updated: product.last_updated,
        }
    }
}

/// Aggregate counters over the synchronized catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStatistics {
    pub total_products: i64,
    pub active_products: i64,
    /// Products with some stock left but less than the low-stock threshold.
    pub low_stock_products: i64,
    /// Active supplier accounts only.
    pub total_suppliers: i64,
    pub branches: Vec<String>,
    pub last_update: Option<DateTime<Utc>>,
    pub recent_products: Vec<RecentProduct>,
    pub error: Option<String>,
}

// =============================================================================
// Readers
// =============================================================================

impl SyncOrchestrator {
    /// Current status, infallible. A failed read comes back as an
    /// error-state snapshot with the failure in `error`.
    pub async fn status_snapshot(&self) -> StatusSnapshot {
        match self.status_snapshot_inner().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "Status read failed; reporting it in-band");
                StatusSnapshot {
                    status: SyncState::Error,
                    is_running: self.is_running(),
                    last_sync_date: None,
                    last_page_synced: 0,
                    total_pages: 0,
                    total_records: 0,
                    total_products: 0,
                    total_suppliers: 0,
                    last_product_update: None,
                    next_sync_scheduled: None,
                    execution_time_ms: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    async fn status_snapshot_inner(&self) -> SyncResult<StatusSnapshot> {
        let status = self.database().sync_status().load_or_init(Utc::now()).await?;
        let total_products = self.database().products().count().await?;
        let total_suppliers = self.database().suppliers().count().await?;
        let last_product_update = self.database().products().latest_update().await?;

        Ok(StatusSnapshot {
            status: status.status,
            is_running: self.is_running(),
            last_sync_date: status.last_sync_date,
            last_page_synced: status.last_page_synced,
            total_pages: status.total_pages,
            total_records: status.total_records,
            total_products,
            total_suppliers,
            last_product_update,
            next_sync_scheduled: status.next_sync_scheduled,
            execution_time_ms: status.execution_time_ms,
            error: status.error_message,
        })
    }

    /// Catalog aggregates, infallible in the same way as
    /// [`Self::status_snapshot`].
    pub async fn data_statistics(&self) -> DataStatistics {
        match self.data_statistics_inner().await {
            Ok(statistics) => statistics,
            Err(err) => {
                warn!(error = %err, "Statistics read failed; reporting it in-band");
                DataStatistics {
                    error: Some(err.to_string()),
                    ..DataStatistics::default()
                }
            }
        }
    }

    async fn data_statistics_inner(&self) -> SyncResult<DataStatistics> {
        let products = self.database().products();
        let total_products = products.count().await?;
        let active_products = products.count_active().await?;
        let low_stock_products = products.low_stock_count(LOW_STOCK_THRESHOLD).await?;
        let total_suppliers = self.database().suppliers().count_active().await?;
        let branches = products.distinct_branches().await?;
        let last_update = products.latest_update().await?;
        let recent_products = products
            .recently_updated(RECENT_PRODUCT_LIMIT)
            .await?
            .into_iter()
            .map(RecentProduct::from)
            .collect();

        Ok(DataStatistics {
            total_products,
            active_products,
            low_stock_products,
            total_suppliers,
            branches,
            last_update,
            recent_products,
            error: None,
        })
    }

    /// Newest-first slice of the run journal. A failed read logs and
    /// returns an empty history.
    pub async fn recent_runs(&self, limit: i64) -> Vec<SyncRun> {
        match self.database().sync_runs().recent(limit).await {
            Ok(runs) => runs,
            Err(err) => {
                warn!(error = %err, "Run journal read failed; returning an empty history");
                Vec::new()
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
