//! # Product Repository
//!
//! All access to the `products` table.
//!
//! The two upsert flavors are the core of the sync pipeline:
//! - **overwrite**: every synced column takes the incoming value, including
//!   absent optionals (a full sync is the provider's authoritative snapshot)
//! - **merge**: absent optionals keep their stored value, numerics and
//!   activity always overwrite (incremental runs see partial rows)
//!
//! Neither flavor ever touches `id`, `external_id` or `created_at` on an
//! existing row, so local identity survives any number of re-syncs.

use apteka_core::Product;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

// =============================================================================
// SQL
// =============================================================================

const PRODUCT_COLUMNS: &str = "id, external_id, name, manufacturer, country, \
     international_name, pharm_group, category, unit, barcode, \
     classification_code, product_code, series, quantity, booked_quantity, \
     piece_count, buy_price, sale_price, vat, markup, supply_quantity, \
     branch_id, branch, supplier, supply_date, shelf_life, location, \
     temperature, provider_product_id, provider_batch_id, is_active, \
     created_at, last_updated";

const INSERT_PRODUCT: &str = "INSERT INTO products (id, external_id, name, \
     manufacturer, country, international_name, pharm_group, category, unit, \
     barcode, classification_code, product_code, series, quantity, \
     booked_quantity, piece_count, buy_price, sale_price, vat, markup, \
     supply_quantity, branch_id, branch, supplier, supply_date, shelf_life, \
     location, temperature, provider_product_id, provider_batch_id, \
     is_active, created_at, last_updated) VALUES (?1, ?2, ?3, ?4, ?5, ?6, \
     ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, \
     ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32, ?33)";

const ON_CONFLICT_OVERWRITE: &str = " ON CONFLICT(external_id) DO UPDATE SET \
     name = excluded.name, \
     manufacturer = excluded.manufacturer, \
     country = excluded.country, \
     international_name = excluded.international_name, \
     pharm_group = excluded.pharm_group, \
     category = excluded.category, \
     unit = excluded.unit, \
     barcode = excluded.barcode, \
     classification_code = excluded.classification_code, \
     product_code = excluded.product_code, \
     series = excluded.series, \
     quantity = excluded.quantity, \
     booked_quantity = excluded.booked_quantity, \
     piece_count = excluded.piece_count, \
     buy_price = excluded.buy_price, \
     sale_price = excluded.sale_price, \
     vat = excluded.vat, \
     markup = excluded.markup, \
     supply_quantity = excluded.supply_quantity, \
     branch_id = excluded.branch_id, \
     branch = excluded.branch, \
     supplier = excluded.supplier, \
     supply_date = excluded.supply_date, \
     shelf_life = excluded.shelf_life, \
     location = excluded.location, \
     temperature = excluded.temperature, \
     provider_product_id = excluded.provider_product_id, \
     provider_batch_id = excluded.provider_batch_id, \
     is_active = excluded.is_active, \
     last_updated = excluded.last_updated";

const ON_CONFLICT_MERGE: &str = " ON CONFLICT(external_id) DO UPDATE SET \
     name = excluded.name, \
     manufacturer = COALESCE(excluded.manufacturer, manufacturer), \
     country = COALESCE(excluded.country, country), \
     international_name = COALESCE(excluded.international_name, international_name), \
     pharm_group = COALESCE(excluded.pharm_group, pharm_group), \
     category = COALESCE(excluded.category, category), \
     unit = COALESCE(excluded.unit, unit), \
     barcode = COALESCE(excluded.barcode, barcode), \
     classification_code = COALESCE(excluded.classification_code, classification_code), \
     product_code = COALESCE(excluded.product_code, product_code), \
     series = COALESCE(excluded.series, series), \
     quantity = excluded.quantity, \
     booked_quantity = excluded.booked_quantity, \
     piece_count = excluded.piece_count, \
     buy_price = excluded.buy_price, \
     sale_price = excluded.sale_price, \
     vat = excluded.vat, \
     markup = excluded.markup, \
     supply_quantity = excluded.supply_quantity, \
     branch_id = COALESCE(excluded.branch_id, branch_id), \
     branch = COALESCE(excluded.branch, branch), \
     supplier = COALESCE(excluded.supplier, supplier), \
     supply_date = COALESCE(excluded.supply_date, supply_date), \
     shelf_life = COALESCE(excluded.shelf_life, shelf_life), \
     location = COALESCE(excluded.location, location), \
     temperature = COALESCE(excluded.temperature, temperature), \
     provider_product_id = COALESCE(excluded.provider_product_id, provider_product_id), \
     provider_batch_id = COALESCE(excluded.provider_batch_id, provider_batch_id), \
     is_active = excluded.is_active, \
     last_updated = excluded.last_updated";

// =============================================================================
// Rollup Row
// =============================================================================

/// Per-supplier aggregates computed straight off the product table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SupplierRollup {
    pub supplier: String,
    pub total_products: i64,
    pub total_branches: i64,
    pub total_quantity: f64,
    pub total_value: f64,
}

// =============================================================================
// Repository
// =============================================================================

pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ===== Upserts =====

    /// Insert or fully overwrite by `external_id`.
    pub async fn upsert_overwrite(&self, product: &Product) -> DbResult<()> {
        let sql = format!("{INSERT_PRODUCT}{ON_CONFLICT_OVERWRITE}");
        self.execute_upsert(&sql, product).await
    }

    /// Insert or merge by `external_id`: absent optional fields keep their
    /// stored values.
    pub async fn upsert_merge(&self, product: &Product) -> DbResult<()> {
        let sql = format!("{INSERT_PRODUCT}{ON_CONFLICT_MERGE}");
        self.execute_upsert(&sql, product).await
    }

    async fn execute_upsert(&self, sql: &str, product: &Product) -> DbResult<()> {
        sqlx::query(sql)
            .bind(&product.id)
            .bind(&product.external_id)
            .bind(&product.name)
            .bind(&product.manufacturer)
            .bind(&product.country)
            .bind(&product.international_name)
            .bind(&product.pharm_group)
            .bind(&product.category)
            .bind(&product.unit)
            .bind(&product.barcode)
            .bind(&product.classification_code)
            .bind(&product.product_code)
            .bind(&product.series)
            .bind(product.quantity)
            .bind(product.booked_quantity)
            .bind(product.piece_count)
            .bind(product.buy_price)
            .bind(product.sale_price)
            .bind(product.vat)
            .bind(product.markup)
            .bind(product.supply_quantity)
            .bind(&product.branch_id)
            .bind(&product.branch)
            .bind(&product.supplier)
            .bind(product.supply_date)
            .bind(product.shelf_life)
            .bind(&product.location)
            .bind(&product.temperature)
            .bind(&product.provider_product_id)
            .bind(&product.provider_batch_id)
            .bind(product.is_active)
            .bind(product.created_at)
            .bind(product.last_updated)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ===== Lookups =====

    pub async fn get_by_external_id(&self, external_id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE external_id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Most recently synced products, newest first.
    pub async fn recently_updated(&self, limit: i64) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY last_updated DESC LIMIT ?1"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    // ===== Aggregates =====

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Products in stock but below `threshold` units.
    pub async fn low_stock_count(&self, threshold: f64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE quantity > 0 AND quantity < ?1",
        )
        .bind(threshold)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Timestamp of the most recent product write, if any rows exist.
    pub async fn latest_update(&self) -> DbResult<Option<DateTime<Utc>>> {
        let latest: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT MAX(last_updated) FROM products")
                .fetch_one(&self.pool)
                .await?;
        Ok(latest)
    }

    /// Distinct non-blank branch names across active products, sorted.
    pub async fn distinct_branches(&self) -> DbResult<Vec<String>> {
        let branches: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT branch FROM products \
             WHERE is_active = 1 AND branch IS NOT NULL AND TRIM(branch) != '' \
             ORDER BY branch",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(branches)
    }

    /// Per-supplier aggregates over the whole table, blank suppliers
    /// excluded. Computed fresh on every call, never cached.
    pub async fn supplier_rollups(&self) -> DbResult<Vec<SupplierRollup>> {
        let rollups = sqlx::query_as::<_, SupplierRollup>(
            "SELECT supplier, \
                    COUNT(*) AS total_products, \
                    COUNT(DISTINCT branch) AS total_branches, \
                    COALESCE(SUM(quantity), 0) AS total_quantity, \
                    COALESCE(SUM(quantity * sale_price), 0) AS total_value \
             FROM products \
             WHERE supplier IS NOT NULL AND TRIM(supplier) != '' \
             GROUP BY supplier \
             ORDER BY supplier",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rollups)
    }

    // ===== Retention =====

    /// Delete zero-quantity products last touched before `cutoff`.
    /// Returns the number of rows removed.
    pub async fn delete_stale(&self, cutoff: DateTime<Utc>) -> DbResult<u64> {
        let result =
            sqlx::query("DELETE FROM products WHERE quantity = 0 AND last_updated < ?1")
                .bind(cutoff)
                .execute(&self.pool)
                .await?;
        let deleted = result.rows_affected();
        if deleted > 0 {
            info!(deleted, "Removed stale zero-quantity products");
        }
        Ok(deleted)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
