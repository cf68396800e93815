//! Application configuration.
//!
//! Every field has a default, so an empty file (or no file at all) yields a working
//! configuration pointing at a local development server.
//!
//! ```toml
//! [api]
//! base_url = "https://orders.example.com"
//!
//! [polling]
//! order_status_ms = 10000
//!
//! [pricing]
//! delivery_fee = "5.00"
//! ```

use crate::model::Money;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub routing: RoutingConfig,
    pub polling: PollingConfig,
    pub pricing: PricingConfig,
    pub storage: StorageConfig,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server root, without the `/api` suffix.
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub login_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_ms: 15_000,
            login_timeout_ms: 15_000,
        }
    }
}

impl ApiConfig {
    pub fn api_url(&self) -> String {
        format!("{}/api", self.base_url.trim_end_matches('/'))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_millis(self.login_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://router.project-osrm.org".to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl RoutingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Timer periods. Each loop is configured independently.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Driver dashboard counters and active delivery.
    pub badges_ms: u64,
    /// Order/delivery snapshot refresh on the tracking view.
    pub order_status_ms: u64,
    /// Local position sampling while a delivery is in transit.
    pub location_sample_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            badges_ms: 30_000,
            order_status_ms: 15_000,
            location_sample_ms: 5_000,
        }
    }
}

impl PollingConfig {
    pub fn badges(&self) -> Duration {
        Duration::from_millis(self.badges_ms.max(1))
    }

    pub fn order_status(&self) -> Duration {
        Duration::from_millis(self.order_status_ms.max(1))
    }

    pub fn location_sample(&self) -> Duration {
        Duration::from_millis(self.location_sample_ms.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Flat surcharge on DELIVERY orders.
    pub delivery_fee: Money,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            delivery_fee: Decimal::new(500, 2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file backing the local key-value store.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("order-tracker-state.json"),
        }
    }
}
