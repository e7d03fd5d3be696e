//! Application configuration management.
//!
//! Configuration is stored at `~/.config/salonbook/config.json` and can be
//! overridden from the environment:
//!
//! - `SALONBOOK_API_URL`: backend base URL
//! - `SALONBOOK_MAPS_KEY`: key for the nearby salon lookup
//! - `SALONBOOK_ON_UNAUTHORIZED`: `leave` or `logout`

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::api::SessionConfig;
use crate::cache::{DEFAULT_CAPACITY, MAX_CAPACITY};

/// Application name used for the config directory path
const APP_NAME: &str = "salonbook";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_API_URL: &str = "SALONBOOK_API_URL";
pub const ENV_MAPS_KEY: &str = "SALONBOOK_MAPS_KEY";
pub const ENV_ON_UNAUTHORIZED: &str = "SALONBOOK_ON_UNAUTHORIZED";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not find config directory")]
    NoConfigDir,

    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("API base URL is not configured (set {ENV_API_URL})")]
    MissingApiUrl,

    #[error("Invalid API base URL {url}: {reason}")]
    InvalidApiUrl { url: String, reason: String },

    #[error("cache_capacity must be between 1 and {MAX_CAPACITY}, got {0}")]
    InvalidCacheCapacity(usize),
}

/// What the session client does when the server answers 401
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnauthorizedPolicy {
    /// Clear the stored token only; the caller decides what happens to the auth state
    #[default]
    LeaveToCaller,
    /// Clear the stored token and log the auth state out
    AutoLogout,
}

impl UnauthorizedPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "leave" | "leave_to_caller" => Some(UnauthorizedPolicy::LeaveToCaller),
            "logout" | "auto_logout" => Some(UnauthorizedPolicy::AutoLogout),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub maps_api_key: Option<String>,
    pub on_unauthorized: UnauthorizedPolicy,
    pub cache_capacity: usize,
    /// Age after which cached responses are refetched; none means never
    pub cache_ttl_minutes: Option<i64>,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            maps_api_key: None,
            on_unauthorized: UnauthorizedPolicy::default(),
            cache_capacity: DEFAULT_CAPACITY,
            cache_ttl_minutes: None,
            last_email: None,
        }
    }
}

impl Config {
    /// Load from disk, falling back to defaults, then apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = Some(url);
        }
        if let Some(key) = var(ENV_MAPS_KEY).filter(|v| !v.trim().is_empty()) {
            self.maps_api_key = Some(key);
        }
        if let Some(raw) = var(ENV_ON_UNAUTHORIZED) {
            match UnauthorizedPolicy::parse(&raw) {
                Some(policy) => self.on_unauthorized = policy,
                None => warn!(value = %raw, "Ignoring unknown unauthorized policy"),
            }
        }
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_ttl(&self) -> Option<chrono::Duration> {
        self.cache_ttl_minutes
            .filter(|m| *m > 0)
            .map(chrono::Duration::minutes)
    }

    /// Validated settings for building session clients
    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        let raw = self
            .api_base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingApiUrl)?;
        let base_url = Url::parse(raw).map_err(|e| ConfigError::InvalidApiUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidApiUrl {
                url: raw.to_string(),
                reason: "not a base URL".to_string(),
            });
        }
        if !(1..=MAX_CAPACITY).contains(&self.cache_capacity) {
            return Err(ConfigError::InvalidCacheCapacity(self.cache_capacity));
        }

        Ok(SessionConfig {
            base_url,
            timeout: Duration::from_millis(crate::api::REQUEST_TIMEOUT_MS),
            on_unauthorized: self.on_unauthorized,
            cache_capacity: self.cache_capacity,
            cache_ttl: self.cache_ttl(),
        })
    }
}
