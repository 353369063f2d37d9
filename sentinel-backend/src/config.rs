use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use sentinel_core::feed::{FeedConfig, DEFAULT_DAYS_BACK, DEMO_API_KEY, DONKI_BASE_URL};
use sentinel_core::orbit::{default_catalog, parse_catalog, CatalogEntry};

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "SENTINEL_CONFIG";
/// Environment variable overriding `donki.api_key`
pub const API_KEY_ENV: &str = "NASA_API_KEY";
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentinelConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Celestrak-style TLE file; the built-in catalog is used when unset
    #[serde(default)]
    pub catalog_path: Option<String>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub donki: DonkiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonkiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_api_key")]
    pub api_key: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Look-back used when a request has no usable `days`
    #[serde(default = "default_days")]
    pub default_days: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_enable_cors() -> bool {
    true
}

fn default_base_url() -> String {
    DONKI_BASE_URL.to_string()
}

fn default_api_key() -> String {
    DEMO_API_KEY.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_days() -> u32 {
    DEFAULT_DAYS_BACK
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: default_enable_cors(),
        }
    }
}

impl Default for DonkiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: default_api_key(),
            timeout_secs: default_timeout_secs(),
            default_days: default_days(),
        }
    }
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_dir: default_log_dir(),
            catalog_path: None,
            server: ServerConfig::default(),
            donki: DonkiConfig::default(),
        }
    }
}

/// Config path from `SENTINEL_CONFIG`, else `config.toml`
pub fn config_path() -> String {
    std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

impl SentinelConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path))?;
        let config: SentinelConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file '{}'", path))?;
        Ok(config)
    }

    /// Read `path` if it exists (defaults otherwise), then apply the
    /// environment overrides.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        config.override_api_key(std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    /// Replace the DONKI key with a non-blank override
    pub fn override_api_key(&mut self, key: Option<String>) {
        if let Some(key) = key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()) {
            self.donki.api_key = key;
        }
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            base_url: self.donki.base_url.clone(),
            api_key: self.donki.api_key.clone(),
            timeout: Duration::from_secs(self.donki.timeout_secs),
        }
    }

    /// Catalog from `catalog_path`, or the built-in one
    pub fn load_catalog(&self) -> anyhow::Result<Vec<CatalogEntry>> {
        let Some(path) = &self.catalog_path else {
            return Ok(default_catalog());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read satellite catalog '{}'", path))?;
        let catalog = parse_catalog(&text);
        if catalog.is_empty() {
            anyhow::bail!("Satellite catalog '{}' contains no element sets", path);
        }
        Ok(catalog)
    }
}
