//! # Supplier Statistics Aggregator
//!
//! Rebuilds every supplier's aggregate block from the product table and
//! provisions an account for any supplier name seen for the first time.
//!
//! The rebuild is a full recomputation, never an in-place adjustment, so a
//! shrinking catalog shrinks the numbers too. The rollup query itself is
//! load-bearing and fails the run if it fails; a single supplier's upsert
//! going wrong is logged and skipped so one odd name cannot starve the
//! rest of the rebuild.

use std::sync::Arc;

use apteka_core::{Supplier, SupplierStatistics};
use apteka_db::{Database, SupplierRepository, SupplierRollup};
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::credentials::{hash_password, CredentialGenerator};
use crate::error::{SyncError, SyncResult};

pub struct StatisticsAggregator {
    db: Arc<Database>,
    credentials: Arc<dyn CredentialGenerator>,
}

impl StatisticsAggregator {
    pub fn new(db: Arc<Database>, credentials: Arc<dyn CredentialGenerator>) -> Self {
        Self { db, credentials }
    }

    /// Recompute aggregates for every supplier in the product table.
    /// Returns the number of suppliers whose block was written.
    pub async fn rebuild(&self) -> SyncResult<u64> {
        let rollups = self.db.products().supplier_rollups().await?;
        let suppliers = self.db.suppliers();
        let now = Utc::now();
        let mut updated = 0u64;

        for rollup in &rollups {
            match self.apply_rollup(&suppliers, rollup, now).await {
                Ok(()) => updated += 1,
                Err(SyncError::Database(db_err)) if db_err.is_unique_violation() => {
                    warn!(
                        supplier = %rollup.supplier,
                        "Derived username collides with an existing account; skipping"
                    );
                }
                Err(err) => {
                    warn!(
                        supplier = %rollup.supplier,
                        error = %err,
                        "Skipping supplier statistics update"
                    );
                }
            }
        }

        info!(suppliers = updated, "Supplier statistics rebuilt");
        Ok(updated)
    }

    async fn apply_rollup(
        &self,
        suppliers: &SupplierRepository,
        rollup: &SupplierRollup,
        now: DateTime<Utc>,
    ) -> SyncResult<()> {
        let statistics = SupplierStatistics {
            total_products: rollup.total_products,
            total_branches: rollup.total_branches,
            total_quantity: rollup.total_quantity,
            total_value: rollup.total_value,
            last_sync: Some(now),
        };

        if suppliers.find_by_name(&rollup.supplier).await?.is_some() {
            suppliers
                .update_statistics(&rollup.supplier, &statistics, now)
                .await?;
            return Ok(());
        }

        let credentials = self.credentials.generate(&rollup.supplier);
        let supplier = Supplier {
            id: Uuid::new_v4().to_string(),
            name: rollup.supplier.clone(),
            username: credentials.username,
            password_hash: hash_password(&credentials.password)?,
            is_active: true,
            statistics,
            created_at: now,
            updated_at: now,
        };
        suppliers.insert(&supplier).await?;
        info!(
            supplier = %supplier.name,
            username = %supplier.username,
            "Provisioned supplier account"
        );
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{verify_password, FixedCredentials};
    use apteka_core::{Product, RawItem};

    async fn test_db() -> Arc<Database> {
        Arc::new(Database::in_memory().await.unwrap())
    }

    fn aggregator(db: &Arc<Database>) -> StatisticsAggregator {
        StatisticsAggregator::new(db.clone(), Arc::new(FixedCredentials::new("pw12345x")))
    }

    async fn seed_product(
        db: &Arc<Database>,
        external_id: &str,
        supplier: &str,
        branch: &str,
        quantity: f64,
        sale_price: f64,
    ) {
        let raw = RawItem {
            id: Some(external_id.to_string()),
            product: Some(format!("Item {external_id}")),
            supplier: Some(supplier.to_string()),
            branch: Some(branch.to_string()),
            quantity,
            sale_price,
            ..RawItem::default()
        };
        let product = Product::from_raw(&raw, Utc::now()).unwrap();
        db.products().upsert_overwrite(&product).await.unwrap();
    }

    #[tokio::test]
    async fn test_rebuild_provisions_accounts_with_hashed_passwords() {
        let db = test_db().await;
        seed_product(&db, "a", "Grand Pharm Trade", "Main", 5.0, 100.0).await;
        seed_product(&db, "b", "Grand Pharm Trade", "Depot", 3.0, 200.0).await;
        seed_product(&db, "c", "Nika Pharm", "Main", 1.0, 50.0).await;

        let updated = aggregator(&db).rebuild().await.unwrap();
        assert_eq!(updated, 2);

        let grand = db
            .suppliers()
            .find_by_name("Grand Pharm Trade")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(grand.username, "grand_pharm_trade");
        assert!(grand.is_active);
        assert_eq!(grand.statistics.total_products, 2);
        assert_eq!(grand.statistics.total_branches, 2);
        assert_eq!(grand.statistics.total_quantity, 8.0);
        assert_eq!(grand.statistics.total_value, 1_100.0);
        assert!(grand.statistics.last_sync.is_some());
        // Only the Argon2 hash is stored, and it verifies the cleartext.
        assert_ne!(grand.password_hash, "pw12345x");
        assert!(verify_password("pw12345x", &grand.password_hash));
    }

    #[tokio::test]
    async fn test_rebuild_overwrites_shrunken_aggregates() {
        let db = test_db().await;
        for n in 0..5 {
            seed_product(&db, &format!("p{n}"), "Acme", "Main", 1.0, 10.0).await;
        }
        aggregator(&db).rebuild().await.unwrap();

        // Two products move to another supplier in the next snapshot.
        seed_product(&db, "p0", "Other", "Main", 1.0, 10.0).await;
        seed_product(&db, "p1", "Other", "Main", 1.0, 10.0).await;
        aggregator(&db).rebuild().await.unwrap();

        let acme = db.suppliers().find_by_name("Acme").await.unwrap().unwrap();
        assert_eq!(acme.statistics.total_products, 3);
        assert_eq!(acme.statistics.total_quantity, 3.0);
    }

    #[tokio::test]
    async fn test_rebuild_does_not_reprovision_existing_accounts() {
        let db = test_db().await;
        seed_product(&db, "a", "Acme", "Main", 1.0, 10.0).await;

        aggregator(&db).rebuild().await.unwrap();
        let before = db.suppliers().find_by_name("Acme").await.unwrap().unwrap();

        aggregator(&db).rebuild().await.unwrap();
        let after = db.suppliers().find_by_name("Acme").await.unwrap().unwrap();

        assert_eq!(db.suppliers().count().await.unwrap(), 1);
        // The account, including its password hash, survives rebuilds.
        assert_eq!(after.id, before.id);
        assert_eq!(after.password_hash, before.password_hash);
    }

    #[tokio::test]
    async fn test_username_collision_is_contained() {
        let db = test_db().await;
        // Distinct feed names, identical derived username "acme".
        seed_product(&db, "a", "Acme", "Main", 1.0, 10.0).await;
        seed_product(&db, "b", "ACME", "Main", 2.0, 10.0).await;

        let updated = aggregator(&db).rebuild().await.unwrap();

        // One of the two wins; the other is skipped without failing the run.
        assert_eq!(updated, 1);
        assert_eq!(db.suppliers().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rebuild_on_empty_catalog() {
        let db = test_db().await;
        assert_eq!(aggregator(&db).rebuild().await.unwrap(), 0);
        assert_eq!(db.suppliers().count().await.unwrap(), 0);
    }
}
