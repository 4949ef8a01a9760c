//! Configuration structures
//!
//! Loaded from TOML/JSON by `qdmsync-infra::config`; every field that has a
//! sensible default may be omitted from the file.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    API_PREFIX, DEFAULT_BATCH_SIZE, DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_TICK_INTERVAL,
};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub qdm: QdmConfig,
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Remote API connection settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QdmConfig {
    /// Host of the API (e.g. `ecapis.qdm.cloud`). A value that already carries
    /// a scheme is used verbatim.
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl QdmConfig {
    /// Fully qualified API root, e.g. `https://ecapis.qdm.cloud/api/v1`.
    pub fn api_url(&self) -> String {
        let host = self.base_url.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{host}{API_PREFIX}")
        } else {
            format!("https://{host}{API_PREFIX}")
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

impl fmt::Debug for QdmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QdmConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("page_size", &self.page_size)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Document store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// SQLite database file
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

/// Sync driver settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Capacity of a stream's record channel; derived from the page size when
    /// absent.
    #[serde(default)]
    pub channel_capacity: Option<usize>,
}

impl SyncConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            batch_size: default_batch_size(),
            channel_capacity: None,
        }
    }
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

fn default_pool_size() -> u32 {
    4
}

fn default_tick_interval_ms() -> u64 {
    u64::try_from(DEFAULT_TICK_INTERVAL.as_millis()).unwrap_or(500)
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qdm(base_url: &str) -> QdmConfig {
        QdmConfig {
            base_url: base_url.to_string(),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            page_size: 300,
            request_timeout_secs: 30,
        }
    }

    #[test]
    fn api_url_adds_https_scheme_to_bare_host() {
        assert_eq!(qdm("ecapis.qdm.cloud").api_url(), "https://ecapis.qdm.cloud/api/v1");
    }

    #[test]
    fn api_url_keeps_explicit_scheme() {
        assert_eq!(qdm("http://127.0.0.1:8080/").api_url(), "http://127.0.0.1:8080/api/v1");
    }

    #[test]
    fn debug_output_redacts_secret() {
        let rendered = format!("{:?}", qdm("ecapis.qdm.cloud"));
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("\"secret\""));
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let config: Config = toml::from_str(
            r#"
[qdm]
base_url = "ecapis.qdm.cloud"
client_id = "id"
client_secret = "secret"

[persistence]
path = "qdm.db"
"#,
        )
        .unwrap();

        assert_eq!(config.qdm.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.persistence.pool_size, 4);
        assert_eq!(config.sync.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.sync.tick_interval(), DEFAULT_TICK_INTERVAL);
        assert_eq!(config.sync.channel_capacity, None);
    }
}
