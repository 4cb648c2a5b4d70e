//! Client configuration
//!
//! Defaults target the public Google Translate v2 endpoint. Every value can
//! be overridden through environment variables or CLI flags.

use crate::cache::{DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Host of the Google Translate API
pub const DEFAULT_HOST: &str = "translation.googleapis.com";

/// Path of the v2 translate method (the API key is appended as `?key=`)
pub const DEFAULT_PATH: &str = "/language/translate/v2";

/// Environment variable holding the API key used by `--auto-init`
pub const API_KEY_ENV: &str = "GOOGLE_TRANSLATE_API_KEY";

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable or flag held a value that could not be parsed
    InvalidValue { name: String, value: String },
    /// A required value was missing
    Missing(String),
    /// A config file could not be read or parsed
    Unreadable { path: String, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { name, value } => {
                write!(f, "Invalid value for {}: '{}'", name, value)
            }
            ConfigError::Missing(name) => write!(f, "{} is not set", name),
            ConfigError::Unreadable { path, reason } => {
                write!(f, "Failed to load config '{}': {}", path, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings for [`TranslationClient`](crate::client::TranslationClient)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub path: String,
    pub timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub max_cache_entries: usize,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            path: DEFAULT_PATH.to_string(),
            timeout_secs: 30,
            cache_ttl_secs: DEFAULT_TTL.as_secs(),
            max_cache_entries: DEFAULT_MAX_ENTRIES,
            user_agent: format!("CET Translator/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `CET_*` environment variables
    ///
    /// Recognized: `CET_TRANSLATE_HOST`, `CET_TRANSLATE_TIMEOUT_SECS`,
    /// `CET_CACHE_TTL_SECS`, `CET_CACHE_MAX_ENTRIES`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("CET_TRANSLATE_HOST") {
            config.host = host;
        }
        if let Some(value) = lookup("CET_TRANSLATE_TIMEOUT_SECS") {
            config.timeout_secs = parse_number("CET_TRANSLATE_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = lookup("CET_CACHE_TTL_SECS") {
            config.cache_ttl_secs = parse_number("CET_CACHE_TTL_SECS", &value)?;
        }
        if let Some(value) = lookup("CET_CACHE_MAX_ENTRIES") {
            config.max_cache_entries = parse_number("CET_CACHE_MAX_ENTRIES", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load settings from a JSON file; absent fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the client cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Missing("host".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }
        if self.max_cache_entries == 0 {
            return Err(ConfigError::InvalidValue {
                name: "max_cache_entries".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Parse a numeric setting, naming it in the error
pub fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        })
}
