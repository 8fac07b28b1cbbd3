//! # Supplier Repository
//!
//! All access to the `suppliers` table. Suppliers are keyed by display
//! name: the statistics aggregator looks accounts up by the exact name the
//! feed uses, provisioning a new row on first sight.

use apteka_core::{Supplier, SupplierStatistics};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::DbResult;

const SUPPLIER_COLUMNS: &str = "id, name, username, password_hash, is_active, \
     total_products, total_branches, total_quantity, total_value, last_sync, \
     created_at, updated_at";

pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Supplier>> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE name = ?1");
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(supplier)
    }

    /// Insert a freshly provisioned supplier.
    ///
    /// Fails with [`crate::DbError::UniqueViolation`] when the name or the
    /// derived username already exists.
    pub async fn insert(&self, supplier: &Supplier) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO suppliers (id, name, username, password_hash, is_active, \
                 total_products, total_branches, total_quantity, total_value, \
                 last_sync, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.username)
        .bind(&supplier.password_hash)
        .bind(supplier.is_active)
        .bind(supplier.statistics.total_products)
        .bind(supplier.statistics.total_branches)
        .bind(supplier.statistics.total_quantity)
        .bind(supplier.statistics.total_value)
        .bind(supplier.statistics.last_sync)
        .bind(supplier.created_at)
        .bind(supplier.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Overwrite the statistics block for `name`. The account columns
    /// (username, password hash, activity) are never touched here.
    pub async fn update_statistics(
        &self,
        name: &str,
        statistics: &SupplierStatistics,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            "UPDATE suppliers SET total_products = ?1, total_branches = ?2, \
                 total_quantity = ?3, total_value = ?4, last_sync = ?5, \
                 updated_at = ?6 \
             WHERE name = ?7",
        )
        .bind(statistics.total_products)
        .bind(statistics.total_branches)
        .bind(statistics.total_quantity)
        .bind(statistics.total_value)
        .bind(statistics.last_sync)
        .bind(now)
        .bind(name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM suppliers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM suppliers WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
