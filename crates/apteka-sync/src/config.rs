//! # Sync Configuration
//!
//! TOML-backed configuration with environment overrides.
//!
//! ## Sources, in order
//! 1. Defaults (compiled in)
//! 2. Config file (`sync.toml`, path from CLI arg or the platform config dir)
//! 3. `APTEKA_*` environment variables
//!
//! A file is optional: container deployments set everything through the
//! environment. `validate` runs after all three layers, so a missing
//! provider URL is caught at startup, not at the first request.
//!
//! ## Example
//! ```toml
//! [provider]
//! base_url = "https://partner.example.uz"
//! api_token = "..."
//!
//! [schedule]
//! incremental_interval_secs = 600
//!
//! [database]
//! path = "/var/lib/apteka/apteka.db"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Default Values
// =============================================================================

fn default_page_size() -> u32 {
    apteka_core::DEFAULT_PAGE_SIZE
}

fn default_request_timeout_secs() -> u64 {
    apteka_core::PROVIDER_REQUEST_TIMEOUT_SECS
}

fn default_health_timeout_secs() -> u64 {
    10
}

fn default_incremental_interval_secs() -> u64 {
    apteka_core::DEFAULT_SYNC_INTERVAL_SECS
}

fn default_page_delay_ms() -> u64 {
    apteka_core::DEFAULT_PAGE_DELAY_MS
}

fn default_max_connections() -> u32 {
    5
}

// =============================================================================
// Configuration Sections
// =============================================================================

/// Provider API endpoint and paging behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Base URL of the provider API, without a trailing path.
    pub base_url: String,
    /// Bearer token for every provider request.
    pub api_token: String,
    /// Items per page for the inventory listing.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Per-request timeout for inventory pages.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Timeout for the lightweight health probe.
    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: String::new(),
            page_size: default_page_size(),
            request_timeout_secs: default_request_timeout_secs(),
            health_timeout_secs: default_health_timeout_secs(),
        }
    }
}

impl ProviderSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }
}

/// When and how fast sync runs happen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    /// Pause between scheduled incremental runs.
    #[serde(default = "default_incremental_interval_secs")]
    pub incremental_interval_secs: u64,
    /// Pause between consecutive pages of a full sync, to stay polite to
    /// the provider.
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            incremental_interval_secs: default_incremental_interval_secs(),
            page_delay_ms: default_page_delay_ms(),
        }
    }
}

impl ScheduleSettings {
    pub fn incremental_interval(&self) -> Duration {
        Duration::from_secs(self.incremental_interval_secs)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

/// Where the local store lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Database file path. Defaults to the platform data directory.
    pub path: Option<PathBuf>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Top-Level Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub provider: ProviderSettings,
    pub schedule: ScheduleSettings,
    pub database: DatabaseSettings,
}

impl SyncConfig {
    /// Parse a config file.
    pub fn load(path: &Path) -> SyncResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: SyncConfig = toml::from_str(&raw)?;
        info!(path = %path.display(), "Loaded sync configuration");
        Ok(config)
    }

    /// Load from `path` if given, else from the default location if a file
    /// exists there, else start from defaults (environment fills the rest).
    pub fn load_or_default(path: Option<&Path>) -> SyncResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        if let Some(default_path) = Self::default_config_path() {
            if default_path.exists() {
                return Self::load(&default_path);
            }
        }
        debug!("No config file found; using defaults plus environment");
        Ok(Self::default())
    }

    /// Platform config file location, e.g.
    /// `~/.config/apteka-sync/sync.toml` on Linux.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("uz", "apteka", "apteka-sync")
            .map(|dirs| dirs.config_dir().join("sync.toml"))
    }

    /// Resolved database file path: configured value or the platform data
    /// directory, with a working-directory fallback for odd environments.
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.database.path {
            return path.clone();
        }
        ProjectDirs::from("uz", "apteka", "apteka-sync")
            .map(|dirs| dirs.data_dir().join("apteka.db"))
            .unwrap_or_else(|| PathBuf::from("apteka.db"))
    }

    /// Apply `APTEKA_*` environment overrides on top of the file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("APTEKA_PROVIDER_URL") {
            self.provider.base_url = value;
        }
        if let Ok(value) = std::env::var("APTEKA_PROVIDER_TOKEN") {
            self.provider.api_token = value;
        }
        if let Ok(value) = std::env::var("APTEKA_PAGE_SIZE") {
            if let Ok(parsed) = value.parse() {
                self.provider.page_size = parsed;
            }
        }
        if let Ok(value) = std::env::var("APTEKA_SYNC_INTERVAL_SECS") {
            if let Ok(parsed) = value.parse() {
                self.schedule.incremental_interval_secs = parsed;
            }
        }
        if let Ok(value) = std::env::var("APTEKA_DB_PATH") {
            self.database.path = Some(PathBuf::from(value));
        }
    }

    /// Reject configurations that cannot work before any I/O happens.
    pub fn validate(&self) -> SyncResult<()> {
        if self.provider.base_url.trim().is_empty() {
            return Err(SyncError::InvalidConfig(
                "provider.base_url is required".to_string(),
            ));
        }
        let url = Url::parse(&self.provider.base_url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(SyncError::InvalidConfig(format!(
                "provider.base_url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.provider.api_token.trim().is_empty() {
            return Err(SyncError::InvalidConfig(
                "provider.api_token is required".to_string(),
            ));
        }
        if self.provider.page_size == 0 {
            return Err(SyncError::InvalidConfig(
                "provider.page_size must be at least 1".to_string(),
            ));
        }
        if self.schedule.incremental_interval_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "schedule.incremental_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> SyncConfig {
        let mut config = SyncConfig::default();
        config.provider.base_url = "https://partner.example.uz".to_string();
        config.provider.api_token = "token-123".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.provider.page_size, 100);
        assert_eq!(config.provider.request_timeout_secs, 30);
        assert_eq!(config.provider.health_timeout_secs, 10);
        assert_eq!(config.schedule.incremental_interval_secs, 600);
        assert_eq!(config.schedule.page_delay_ms, 1_000);
        assert_eq!(config.database.max_connections, 5);
        assert!(config.database.path.is_none());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: SyncConfig = toml::from_str(
            r#"
            [provider]
            base_url = "https://partner.example.uz"
            api_token = "secret"

            [schedule]
            incremental_interval_secs = 120
            "#,
        )
        .unwrap();

        assert_eq!(config.provider.base_url, "https://partner.example.uz");
        // Unspecified fields keep their defaults.
        assert_eq!(config.provider.page_size, 100);
        assert_eq!(config.schedule.incremental_interval_secs, 120);
        assert_eq!(config.schedule.page_delay_ms, 1_000);
    }

    #[test]
    fn test_validate_accepts_good_config() {
        valid_config().validate().unwrap();
    }

    #[test]
    fn test_validate_requires_base_url() {
        let mut config = valid_config();
        config.provider.base_url = String::new();
        assert!(config.validate().unwrap_err().is_config());
    }

    #[test]
    fn test_validate_rejects_non_http_scheme() {
        let mut config = valid_config();
        config.provider.base_url = "ftp://partner.example.uz".to_string();
        assert!(config.validate().unwrap_err().is_config());
    }

    #[test]
    fn test_validate_rejects_unparseable_url() {
        let mut config = valid_config();
        config.provider.base_url = "not a url".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            SyncError::InvalidConfig(_)
        ));
    }

    #[test]
    fn test_validate_requires_token_and_page_size() {
        let mut config = valid_config();
        config.provider.api_token = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.provider.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duration_accessors() {
        let config = valid_config();
        assert_eq!(config.provider.request_timeout(), Duration::from_secs(30));
        assert_eq!(
            config.schedule.incremental_interval(),
            Duration::from_secs(600)
        );
        assert_eq!(config.schedule.page_delay(), Duration::from_millis(1_000));
    }

    #[test]
    fn test_database_path_prefers_configured_value() {
        let mut config = valid_config();
        config.database.path = Some(PathBuf::from("/tmp/apteka-test.db"));
        assert_eq!(config.database_path(), PathBuf::from("/tmp/apteka-test.db"));
    }

    #[test]
    fn test_env_overrides_win_over_file_values() {
        // No other test touches these variables.
        std::env::set_var("APTEKA_PROVIDER_URL", "https://override.example.uz");
        std::env::set_var("APTEKA_SYNC_INTERVAL_SECS", "90");

        let mut config = valid_config();
        config.apply_env_overrides();

        assert_eq!(config.provider.base_url, "https://override.example.uz");
        assert_eq!(config.schedule.incremental_interval_secs, 90);

        std::env::remove_var("APTEKA_PROVIDER_URL");
        std::env::remove_var("APTEKA_SYNC_INTERVAL_SECS");
    }
}
