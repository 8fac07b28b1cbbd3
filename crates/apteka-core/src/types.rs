//! # Core Domain Types
//!
//! Shared type definitions used across the workspace.
//!
//! ## Type Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Inventory:    RawItem, Product, Page                                   │
//! │  Suppliers:    Supplier, SupplierStatistics                             │
//! │  Sync State:   SyncState, SyncStatus                                    │
//! │  Run History:  RunKind, RunOutcome, SyncRun                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization
//! All types serialize to camelCase JSON. `RawItem` additionally tolerates
//! the provider's loose typing via [`crate::coerce`]: every numeric field
//! accepts numbers or numeric strings, every optional field accepts null or
//! absence. Database-facing structs derive `sqlx::FromRow` behind the `sqlx`
//! feature so this crate stays I/O-free by default.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::coerce;
use crate::error::{CoreError, CoreResult};

// =============================================================================
// Provider Wire Types
// =============================================================================

/// One inventory row exactly as the provider sends it.
///
/// Field names mirror the provider's camelCase payload. Everything is
/// optional or zero-defaulted because the feed routinely omits fields,
/// sends numbers as strings, and nulls out prices. Coercion rules live in
/// [`crate::coerce`]; structural validation happens in
/// [`Product::from_raw`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawItem {
    /// Provider-wide stable identifier. Becomes `Product::external_id`.
    #[serde(deserialize_with = "coerce::lenient_opt_string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "coerce::lenient_opt_string")]
    pub branch_id: Option<String>,
    #[serde(deserialize_with = "coerce::lenient_opt_string")]
    pub branch: Option<String>,
    /// Provider's internal product reference (distinct from `id`).
    #[serde(deserialize_with = "coerce::lenient_opt_string")]
    pub product_id: Option<String>,
    #[serde(deserialize_with = "coerce::lenient_opt_string")]
    pub batch_id: Option<String>,
    /// Short article code shown on shelf labels.
    #[serde(deserialize_with = "coerce::lenient_opt_string")]
    pub code: Option<String>,
    /// Display name. Becomes `Product::name`; required downstream.
    #[serde(deserialize_with = "coerce::lenient_opt_string")]
    pub product: Option<String>,
    #[serde(deserialize_with = "coerce::lenient_opt_string")]
    pub manufacturer: Option<String>,
    #[serde(deserialize_with = "coerce::lenient_opt_string")]
    pub country: Option<String>,
    #[serde(deserialize_with = "coerce::lenient_opt_string")]
    pub international_name: Option<String>,
    #[serde(deserialize_with = "coerce::lenient_opt_string")]
    pub pharm_group: Option<String>,
    #[serde(deserialize_with = "coerce::lenient_opt_string")]
    pub category: Option<String>,
    #[serde(deserialize_with = "coerce::lenient_opt_string")]
    pub unit: Option<String>,
    #[serde(deserialize_with = "coerce::lenient_f64")]
    pub piece_count: f64,
    #[serde(deserialize_with = "coerce::lenient_opt_string")]
    pub barcode: Option<String>,
    /// National product classification code.
    #[serde(deserialize_with = "coerce::lenient_opt_string")]
    pub mxik: Option<String>,
    #[serde(deserialize_with = "coerce::lenient_f64")]
    pub quantity: f64,
    #[serde(deserialize_with = "coerce::lenient_f64")]
    pub booked_quantity: f64,
    #[serde(deserialize_with = "coerce::lenient_f64")]
    pub buy_price: f64,
    #[serde(deserialize_with = "coerce::lenient_f64")]
    pub sale_price: f64,
    #[serde(deserialize_with = "coerce::lenient_f64")]
    pub vat: f64,
    #[serde(deserialize_with = "coerce::lenient_f64")]
    pub markup: f64,
    #[serde(deserialize_with = "coerce::lenient_opt_string")]
    pub series: Option<String>,
    #[serde(deserialize_with = "coerce::lenient_opt_datetime")]
    pub shelf_life: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "coerce::lenient_f64")]
    pub supply_quantity: f64,
    #[serde(deserialize_with = "coerce::lenient_opt_datetime")]
    pub supply_date: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "coerce::lenient_opt_string")]
    pub supplier: Option<String>,
    #[serde(deserialize_with = "coerce::lenient_opt_string")]
    pub location: Option<String>,
    #[serde(deserialize_with = "coerce::lenient_opt_string")]
    pub temperature: Option<String>,
}

/// One page of the provider's inventory listing.
///
/// Doubles as the wire shape of the response's `page` object and as the
/// unit of work the batch processor consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    pub items: Vec<RawItem>,
    /// Total page count for the current page size. Zero until known.
    pub total_pages: u32,
    /// Total item count across all pages.
    pub total_count: u64,
}

// =============================================================================
// Inventory
// =============================================================================

/// A synchronized inventory record.
///
/// `id` is a locally generated UUID; `external_id` is the provider's key
/// and the natural upsert key. Everything the provider did not send is
/// `None` or `0.0`, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// UUID v4, generated locally on first insert.
    pub id: String,
    /// Provider-wide stable identifier (unique).
    pub external_id: String,
    pub name: String,
    pub manufacturer: Option<String>,
    pub country: Option<String>,
    pub international_name: Option<String>,
    pub pharm_group: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub barcode: Option<String>,
    /// National classification code (`mxik` on the wire).
    pub classification_code: Option<String>,
    /// Short article code (`code` on the wire).
    pub product_code: Option<String>,
    pub series: Option<String>,
    pub quantity: f64,
    pub booked_quantity: f64,
    pub piece_count: f64,
    pub buy_price: f64,
    pub sale_price: f64,
    pub vat: f64,
    pub markup: f64,
    pub supply_quantity: f64,
    pub branch_id: Option<String>,
    pub branch: Option<String>,
    pub supplier: Option<String>,
    pub supply_date: Option<DateTime<Utc>>,
    pub shelf_life: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub temperature: Option<String>,
    pub provider_product_id: Option<String>,
    pub provider_batch_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Product {
    /// Map a provider row into a domain record.
    ///
    /// Fails only when the row is structurally unusable (no external id,
    /// no name). Every other irregularity was already absorbed during
    /// deserialization. Synced rows are always marked active; deactivation
    /// is a local decision that the feed must not overwrite.
    pub fn from_raw(raw: &RawItem, now: DateTime<Utc>) -> CoreResult<Self> {
        let external_id = raw.id.clone().ok_or(CoreError::MissingExternalId)?;
        let name = raw.product.clone().ok_or_else(|| CoreError::MissingName {
            external_id: external_id.clone(),
        })?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            external_id,
            name,
            manufacturer: raw.manufacturer.clone(),
            country: raw.country.clone(),
            international_name: raw.international_name.clone(),
            pharm_group: raw.pharm_group.clone(),
            category: raw.category.clone(),
            unit: raw.unit.clone(),
            barcode: raw.barcode.clone(),
            classification_code: raw.mxik.clone(),
            product_code: raw.code.clone(),
            series: raw.series.clone(),
            quantity: raw.quantity,
            booked_quantity: raw.booked_quantity,
            piece_count: raw.piece_count,
            buy_price: raw.buy_price,
            sale_price: raw.sale_price,
            vat: raw.vat,
            markup: raw.markup,
            supply_quantity: raw.supply_quantity,
            branch_id: raw.branch_id.clone(),
            branch: raw.branch.clone(),
            supplier: raw.supplier.clone(),
            supply_date: raw.supply_date,
            shelf_life: raw.shelf_life,
            location: raw.location.clone(),
            temperature: raw.temperature.clone(),
            provider_product_id: raw.product_id.clone(),
            provider_batch_id: raw.batch_id.clone(),
            is_active: true,
            created_at: now,
            last_updated: now,
        })
    }
}

// =============================================================================
// Sync State
// =============================================================================

/// Lifecycle state of the synchronization subsystem.
///
/// ```text
/// idle ──► syncing ──► completed
///             │
///             └──────► error
/// ```
/// `completed` and `error` are both rest states; the next run moves the
/// machine back through `syncing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
pub enum SyncState {
    #[default]
    Idle,
    Syncing,
    Completed,
    Error,
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyncState::Idle => "idle",
            SyncState::Syncing => "syncing",
            SyncState::Completed => "completed",
            SyncState::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// The singleton sync status record.
///
/// One row, updated in place as a run progresses. `last_page_synced` is
/// the resume cursor: an incremental run re-fetches exactly that page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SyncStatus {
    pub status: SyncState,
    /// When the most recent run started.
    pub last_sync_date: Option<DateTime<Utc>>,
    /// Highest fully persisted page of the most recent full sync.
    pub last_page_synced: i64,
    pub total_pages: i64,
    pub total_records: i64,
    /// Failure description from the most recent errored run.
    pub error_message: Option<String>,
    pub next_sync_scheduled: Option<DateTime<Utc>>,
    /// Wall-clock duration of the most recent completed run.
    pub execution_time_ms: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

impl SyncStatus {
    /// Fresh status for a system that has never synced.
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            status: SyncState::Idle,
            last_sync_date: None,
            last_page_synced: 0,
            total_pages: 0,
            total_records: 0,
            error_message: None,
            next_sync_scheduled: None,
            execution_time_ms: None,
            updated_at: now,
        }
    }
}

// =============================================================================
// Run History
// =============================================================================

/// What triggered a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
pub enum RunKind {
    /// Complete re-walk of every provider page.
    Full,
    /// Re-fetch of the resume page only.
    Incremental,
    /// Caller-supplied batch, no provider traffic.
    Push,
}

impl std::fmt::Display for RunKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunKind::Full => "full",
            RunKind::Incremental => "incremental",
            RunKind::Push => "push",
        };
        write!(f, "{s}")
    }
}

/// How a sync run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
pub enum RunOutcome {
    Completed,
    Error,
}

/// One line of the sync run journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SyncRun {
    pub id: i64,
    pub kind: RunKind,
    pub status: RunOutcome,
    pub records_updated: i64,
    pub error_message: Option<String>,
    pub execution_time_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Suppliers
// =============================================================================

/// Aggregates recomputed from the product table after each full sync.
///
/// Never incremented in place: the aggregator overwrites the whole block,
/// so deletions and shrinking feeds are reflected immediately.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SupplierStatistics {
    /// Count of product rows naming this supplier.
    pub total_products: i64,
    /// Count of distinct branches those rows span.
    pub total_branches: i64,
    /// Sum of on-hand quantity.
    pub total_quantity: f64,
    /// Sum of quantity times sale price.
    pub total_value: f64,
    /// When the aggregates were last rebuilt.
    pub last_sync: Option<DateTime<Utc>>,
}

/// A supplier account, auto-provisioned when its name first appears in
/// the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: String,
    /// Display name exactly as the feed spells it.
    pub name: String,
    /// Derived login, see [`crate::username::derive_username`].
    pub username: String,
    /// Argon2 hash. The cleartext password exists only at provisioning.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_active: bool,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub statistics: SupplierStatistics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_raw() -> RawItem {
        RawItem {
            id: Some("ext-100".to_string()),
            product: Some("Paracetamol 500mg".to_string()),
            manufacturer: Some("Acme Pharma".to_string()),
            supplier: Some("Grand Pharm Trade".to_string()),
            branch: Some("Main Warehouse".to_string()),
            code: Some("P-500".to_string()),
            mxik: Some("03808001001000000".to_string()),
            quantity: 42.0,
            sale_price: 1500.0,
            ..RawItem::default()
        }
    }

    #[test]
    fn test_raw_item_tolerates_sloppy_payload() {
        let json = r#"{
            "id": 9001,
            "product": "Ibuprofen 200mg",
            "quantity": "15",
            "salePrice": null,
            "buyPrice": "not-a-number",
            "shelfLife": "2027-06-30",
            "quantities": [{"branch": "A", "quantity": 15}],
            "somethingNew": true
        }"#;

        let raw: RawItem = serde_json::from_str(json).unwrap();
        assert_eq!(raw.id.as_deref(), Some("9001"));
        assert_eq!(raw.product.as_deref(), Some("Ibuprofen 200mg"));
        assert_eq!(raw.quantity, 15.0);
        assert_eq!(raw.sale_price, 0.0);
        assert_eq!(raw.buy_price, 0.0);
        assert!(raw.shelf_life.is_some());
    }

    #[test]
    fn test_page_defaults_when_fields_missing() {
        let page: Page = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.total_count, 0);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_from_raw_maps_fields() {
        let now = Utc::now();
        let product = Product::from_raw(&sample_raw(), now).unwrap();

        assert_eq!(product.external_id, "ext-100");
        assert_eq!(product.name, "Paracetamol 500mg");
        assert_eq!(product.classification_code.as_deref(), Some("03808001001000000"));
        assert_eq!(product.product_code.as_deref(), Some("P-500"));
        assert_eq!(product.quantity, 42.0);
        assert!(product.is_active);
        assert_eq!(product.created_at, now);
        assert_eq!(product.last_updated, now);
        assert!(!product.id.is_empty());
    }

    #[test]
    fn test_from_raw_generates_distinct_ids() {
        let now = Utc::now();
        let a = Product::from_raw(&sample_raw(), now).unwrap();
        let b = Product::from_raw(&sample_raw(), now).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_from_raw_rejects_missing_external_id() {
        let mut raw = sample_raw();
        raw.id = None;
        let err = Product::from_raw(&raw, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::MissingExternalId));
    }

    #[test]
    fn test_from_raw_rejects_missing_name() {
        let mut raw = sample_raw();
        raw.product = None;
        let err = Product::from_raw(&raw, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::MissingName { .. }));
    }

    #[test]
    fn test_sync_state_serialization() {
        assert_eq!(
            serde_json::to_string(&SyncState::Syncing).unwrap(),
            "\"syncing\""
        );
        let state: SyncState = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(state, SyncState::Completed);
        assert_eq!(SyncState::Error.to_string(), "error");
    }

    #[test]
    fn test_sync_status_initial() {
        let status = SyncStatus::initial(Utc::now());
        assert_eq!(status.status, SyncState::Idle);
        assert_eq!(status.last_page_synced, 0);
        assert_eq!(status.total_records, 0);
        assert!(status.error_message.is_none());
        assert!(status.execution_time_ms.is_none());
    }

    #[test]
    fn test_run_kind_serialization() {
        assert_eq!(serde_json::to_string(&RunKind::Full).unwrap(), "\"full\"");
        assert_eq!(RunKind::Incremental.to_string(), "incremental");
    }

    #[test]
    fn test_supplier_hash_never_serialized() {
        let supplier = Supplier {
            id: "s-1".to_string(),
            name: "Grand Pharm Trade".to_string(),
            username: "grand_pharm_trade".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            is_active: true,
            statistics: SupplierStatistics::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&supplier).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("passwordHash"));
    }
}
