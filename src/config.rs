// Application configuration.
// Defaults, overridden by the TOML file. Environment variables and flags
// are applied on top by the command line parser.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Environment variable read for `--server`.
pub const SERVER_URL_ENV: &str = "RR_SERVER_URL";
/// Environment variable read for `--assets`.
pub const ASSET_ORIGIN_ENV: &str = "RR_ASSET_ORIGIN";

/// Files placed in the static cache on install.
const DEFAULT_PRECACHE: [&str; 10] = [
    "/",
    "index.html",
    "restaurant.html",
    "js/main_bundle.js",
    "js/restaurant_info_bundle.js",
    "css/common.css",
    "css/main.css",
    "css/restaurant.css",
    "css/normalize.min.css",
    "icons/favi.ico",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the restaurants backend.
    pub server_url: String,
    /// Origin serving static assets and photographs.
    pub asset_origin: String,
    /// Seconds between connectivity polls while a review is pending.
    pub poll_interval_secs: u64,
    /// Timeout for the connectivity probe.
    pub probe_timeout_ms: u64,
    /// Name of the current static asset cache.
    pub static_cache: String,
    /// Name of the photograph cache.
    pub image_cache: String,
    /// Prefix shared by every cache this application owns.
    pub cache_prefix: String,
    /// Paths fetched into the static cache on install.
    pub precache: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:1337".to_string(),
            asset_origin: "http://localhost:8000".to_string(),
            poll_interval_secs: 5,
            probe_timeout_ms: 1500,
            static_cache: "rr-static-v8".to_string(),
            image_cache: "rr-content-imgs".to_string(),
            cache_prefix: "rr-".to_string(),
            precache: DEFAULT_PRECACHE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    /// Load from the default config file, if any.
    pub fn load() -> Result<Self> {
        match crate::store::paths::config_path() {
            Some(path) if path.exists() => Self::from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Apply `--server`/`--assets` (or their environment variables).
    pub fn with_overrides(mut self, server: Option<String>, assets: Option<String>) -> Self {
        if let Some(url) = server.filter(|v| !v.is_empty()) {
            self.server_url = url;
        }
        if let Some(origin) = assets.filter(|v| !v.is_empty()) {
            self.asset_origin = origin;
        }
        self
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Caches that survive activation.
    pub fn allowed_caches(&self) -> Vec<String> {
        vec![self.static_cache.clone(), self.image_cache.clone()]
    }
}
