//! # Batch Processor
//!
//! Walks one batch of provider items through mapping and upsert.
//!
//! Fault handling follows one rule: a bad item never takes the batch down.
//! Mapping failures and data-shaped store rejections are logged and
//! counted; only infrastructure failures (lost connection, exhausted pool)
//! abort, because after those every remaining item would fail the same way.

use std::sync::Arc;

use apteka_core::{Product, RawItem};
use apteka_db::{Database, DbError};
use chrono::Utc;
use tracing::warn;

use crate::error::{SyncError, SyncResult};

/// How an incoming item lands on an existing row with the same external id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertMode {
    /// Take every incoming value, including absent optionals. Used by full
    /// syncs, where each page is an authoritative snapshot.
    Overwrite,
    /// Absent optionals keep their stored values. Used by incremental
    /// runs and pushes, which may see partial rows.
    Merge,
}

pub struct BatchProcessor {
    db: Arc<Database>,
}

impl BatchProcessor {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store a batch, returning how many items made it in.
    pub async fn process(&self, items: &[RawItem], mode: UpsertMode) -> SyncResult<u64> {
        let repo = self.db.products();
        let now = Utc::now();
        let mut processed = 0u64;
        let mut skipped = 0u64;

        for raw in items {
            let product = match Product::from_raw(raw, now) {
                Ok(product) => product,
                Err(reason) => {
                    let item_error = SyncError::Item {
                        id: raw.id.clone().unwrap_or_else(|| "unknown".to_string()),
                        reason: reason.to_string(),
                    };
                    warn!(error = %item_error, "Skipping inventory item");
                    skipped += 1;
                    continue;
                }
            };

            let stored = match mode {
                UpsertMode::Overwrite => repo.upsert_overwrite(&product).await,
                UpsertMode::Merge => repo.upsert_merge(&product).await,
            };

            match stored {
                Ok(()) => processed += 1,
                Err(err @ (DbError::ConnectionFailed(_) | DbError::PoolExhausted)) => {
                    return Err(err.into());
                }
                Err(err) => {
                    warn!(
                        external_id = %product.external_id,
                        error = %err,
                        "Failed to store inventory item"
                    );
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            warn!(processed, skipped, "Batch finished with skipped items");
        }
        Ok(processed)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Arc<Database> {
        Arc::new(Database::in_memory().await.unwrap())
    }

    fn raw(external_id: &str, name: &str, quantity: f64) -> RawItem {
        RawItem {
            id: Some(external_id.to_string()),
            product: Some(name.to_string()),
            supplier: Some("Acme".to_string()),
            quantity,
            ..RawItem::default()
        }
    }

    #[tokio::test]
    async fn test_bad_item_does_not_sink_the_batch() {
        let db = test_db().await;
        let processor = BatchProcessor::new(db.clone());

        let mut nameless = raw("ext-2", "unused", 1.0);
        nameless.product = None;
        let items = vec![raw("ext-1", "Analgin", 4.0), nameless, raw("ext-3", "Citramon", 2.0)];

        let processed = processor
            .process(&items, UpsertMode::Overwrite)
            .await
            .unwrap();

        assert_eq!(processed, 2);
        assert_eq!(db.products().count().await.unwrap(), 2);
        assert!(db
            .products()
            .get_by_external_id("ext-2")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_ids_in_one_batch_collapse() {
        let db = test_db().await;
        let processor = BatchProcessor::new(db.clone());

        let items = vec![raw("ext-1", "Analgin", 4.0), raw("ext-1", "Analgin", 9.0)];
        let processed = processor
            .process(&items, UpsertMode::Overwrite)
            .await
            .unwrap();

        assert_eq!(processed, 2);
        assert_eq!(db.products().count().await.unwrap(), 1);
        let stored = db
            .products()
            .get_by_external_id("ext-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.quantity, 9.0);
    }

    #[tokio::test]
    async fn test_merge_mode_reaches_the_store() {
        let db = test_db().await;
        let processor = BatchProcessor::new(db.clone());

        let mut seeded = raw("ext-1", "Analgin", 4.0);
        seeded.manufacturer = Some("Acme Pharma".to_string());
        processor
            .process(&[seeded], UpsertMode::Overwrite)
            .await
            .unwrap();

        // Sparse re-send: merge keeps the manufacturer, moves the quantity.
        processor
            .process(&[raw("ext-1", "Analgin", 7.0)], UpsertMode::Merge)
            .await
            .unwrap();

        let stored = db
            .products()
            .get_by_external_id("ext-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.manufacturer.as_deref(), Some("Acme Pharma"));
        assert_eq!(stored.quantity, 7.0);
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_noop() {
        let db = test_db().await;
        let processor = BatchProcessor::new(db);
        assert_eq!(
            processor.process(&[], UpsertMode::Overwrite).await.unwrap(),
            0
        );
    }
}
