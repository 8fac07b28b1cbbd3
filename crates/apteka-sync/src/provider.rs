//! # Provider HTTP Client
//!
//! Talks to the wholesale provider's API.
//!
//! ## Wire Contract
//! Inventory pages come from `POST {base_url}/report/inventory/remains`
//! with a bearer token and this body:
//!
//! ```json
//! {
//!   "pageNumber": 1,
//!   "pageSize": 100,
//!   "searchText": "",
//!   "sortOrders": [{"property": "product", "direction": "asc"}],
//!   "source": 0,
//!   "onlyActiveItems": true,
//!   "manufacturerIds": []
//! }
//! ```
//!
//! The response wraps the page in an envelope:
//! `{ "page": { "items": [...], "totalPages": N, "totalCount": M } }`.
//!
//! The stable sort order keeps the page walk consistent while the full
//! sync steps through it.
//!
//! [`PageSource`] is the seam the orchestrator consumes; tests substitute
//! an in-memory source and never open a socket.

use std::time::{Duration, Instant};

use apteka_core::Page;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ProviderSettings;
use crate::error::SyncResult;

// =============================================================================
// Page Source Seam
// =============================================================================

/// Anything that can produce inventory pages, 1-based.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, page_number: u32) -> SyncResult<Page>;
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageRequest {
    page_number: u32,
    page_size: u32,
    search_text: String,
    sort_orders: Vec<SortOrder>,
    source: u32,
    only_active_items: bool,
    manufacturer_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
struct SortOrder {
    property: String,
    direction: String,
}

impl PageRequest {
    fn inventory(page_number: u32, page_size: u32) -> Self {
        Self {
            page_number,
            page_size,
            search_text: String::new(),
            sort_orders: vec![SortOrder {
                property: "product".to_string(),
                direction: "asc".to_string(),
            }],
            source: 0,
            only_active_items: true,
            manufacturer_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PageEnvelope {
    page: Page,
}

// =============================================================================
// Health Probe
// =============================================================================

/// Result of the provider health probe. Produced for reporting, never as
/// an error: an unreachable provider is a state, not a failure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderHealth {
    pub healthy: bool,
    pub status_code: Option<u16>,
    pub response_time_ms: u64,
    pub checked_at: chrono::DateTime<Utc>,
    pub error: Option<String>,
}

// =============================================================================
// HTTP Client
// =============================================================================

/// Real provider client over HTTPS.
pub struct ProviderClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
    page_size: u32,
    health_timeout: Duration,
}

impl ProviderClient {
    pub fn new(settings: &ProviderSettings) -> SyncResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| crate::error::SyncError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_token: settings.api_token.clone(),
            page_size: settings.page_size,
            health_timeout: settings.health_timeout(),
        })
    }

    /// Probe `GET {base_url}/api/health`. Infallible by design: every
    /// outcome, including timeouts, becomes a report.
    pub async fn health(&self) -> ProviderHealth {
        let started = Instant::now();
        let result = self
            .http
            .get(format!("{}/api/health", self.base_url))
            .bearer_auth(&self.api_token)
            .timeout(self.health_timeout)
            .send()
            .await;
        let response_time_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(response) => ProviderHealth {
                healthy: response.status().is_success(),
                status_code: Some(response.status().as_u16()),
                response_time_ms,
                checked_at: Utc::now(),
                error: None,
            },
            Err(err) => ProviderHealth {
                healthy: false,
                status_code: err.status().map(|s| s.as_u16()),
                response_time_ms,
                checked_at: Utc::now(),
                error: Some(err.to_string()),
            },
        }
    }
}

#[async_trait]
impl PageSource for ProviderClient {
    async fn fetch_page(&self, page_number: u32) -> SyncResult<Page> {
        let body = PageRequest::inventory(page_number, self.page_size);
        let response = self
            .http
            .post(format!("{}/report/inventory/remains", self.base_url))
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let envelope: PageEnvelope = response.json().await?;
        debug!(
            page = page_number,
            items = envelope.page.items.len(),
            total_pages = envelope.page.total_pages,
            "Fetched inventory page"
        );
        Ok(envelope.page)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_request_wire_shape() {
        let body = serde_json::to_value(PageRequest::inventory(3, 100)).unwrap();
        assert_eq!(
            body,
            json!({
                "pageNumber": 3,
                "pageSize": 100,
                "searchText": "",
                "sortOrders": [{"property": "product", "direction": "asc"}],
                "source": 0,
                "onlyActiveItems": true,
                "manufacturerIds": []
            })
        );
    }

    #[test]
    fn test_envelope_parses() {
        let envelope: PageEnvelope = serde_json::from_str(
            r#"{
                "page": {
                    "items": [{"id": "ext-1", "product": "Analgin", "quantity": "4"}],
                    "totalPages": 12,
                    "totalCount": 1185
                }
            }"#,
        )
        .unwrap();

        assert_eq!(envelope.page.total_pages, 12);
        assert_eq!(envelope.page.total_count, 1185);
        assert_eq!(envelope.page.items.len(), 1);
        assert_eq!(envelope.page.items[0].quantity, 4.0);
    }

    #[test]
    fn test_envelope_without_page_is_an_error() {
        assert!(serde_json::from_str::<PageEnvelope>(r#"{"ok": true}"#).is_err());
    }

    #[test]
    fn test_client_strips_trailing_slash() {
        let settings = ProviderSettings {
            base_url: "https://partner.example.uz/".to_string(),
            api_token: "t".to_string(),
            ..ProviderSettings::default()
        };
        let client = ProviderClient::new(&settings).unwrap();
        assert_eq!(client.base_url, "https://partner.example.uz");
    }
}
