//! Application configuration management.
//!
//! This module handles loading the configuration: API base
//! URL and token, cache directory, TTLs and the persistent storage
//! budget. Environment variables override file values.
//!
//! Configuration is stored at `~/.config/tmstats/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_API_BASE_URL;
use crate::cache::entry::{TtlPolicy, COLLECTION_TTL_MINUTES, OPTIONS_TTL_MINUTES};
use crate::cache::store::DEFAULT_BUDGET_BYTES;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "tmstats";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_API_URL: &str = "TMSTATS_API_URL";
pub const ENV_API_TOKEN: &str = "TMSTATS_API_TOKEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub api_token: Option<String>,
    /// Overrides the platform cache directory.
    pub cache_dir: Option<PathBuf>,
    pub collection_ttl_secs: i64,
    pub options_ttl_secs: i64,
    pub storage_budget_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            cache_dir: None,
            collection_ttl_secs: COLLECTION_TTL_MINUTES * 60,
            options_ttl_secs: OPTIONS_TTL_MINUTES * 60,
            storage_budget_bytes: DEFAULT_BUDGET_BYTES,
        }
    }
}

impl Config {
    /// Load from the config file (defaults if absent), then apply env overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        Ok(config.with_env_overrides(|name| std::env::var(name).ok()))
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.api_base_url = url;
        }
        if let Some(token) = lookup(ENV_API_TOKEN).filter(|v| !v.is_empty()) {
            self.api_token = Some(token);
        }
        self
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn ttl_policy(&self) -> TtlPolicy {
        TtlPolicy {
            collection: ttl_from_secs(self.collection_ttl_secs),
            options: ttl_from_secs(self.options_ttl_secs),
        }
    }
}

/// Out-of-range TTLs saturate instead of panicking.
fn ttl_from_secs(secs: i64) -> Duration {
    Duration::try_seconds(secs).unwrap_or(if secs < 0 {
        Duration::MIN
    } else {
        Duration::MAX
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.ttl_policy(), TtlPolicy::default());
        assert_eq!(config.storage_budget_bytes, 2_400_000);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"collection_ttl_secs": 60, "cache_dir": "/tmp/tm"}"#).unwrap();
        assert_eq!(config.ttl_policy().collection, Duration::minutes(1));
        assert_eq!(config.ttl_policy().options, Duration::minutes(30));
        assert_eq!(config.cache_dir().unwrap(), PathBuf::from("/tmp/tm"));
    }

    #[test]
    fn test_huge_ttls_saturate() {
        let config: Config = serde_json::from_str(&format!(
            r#"{{"collection_ttl_secs": {}, "options_ttl_secs": {}}}"#,
            i64::MAX,
            i64::MIN
        ))
        .unwrap();
        let policy = config.ttl_policy();
        assert_eq!(policy.collection, Duration::MAX);
        assert_eq!(policy.options, Duration::MIN);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default().with_env_overrides(|name| match name {
            ENV_API_URL => Some("http://localhost:8080".to_string()),
            ENV_API_TOKEN => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.api_token, None);
    }
}
