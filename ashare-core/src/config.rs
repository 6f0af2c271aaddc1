//! Feed configuration.
//!
//! Loaded from an optional TOML file; every field has a default so an empty
//! file (or no file) is a valid configuration.

use crate::data::RangePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Directory holding cached history envelopes.
    pub cache_dir: PathBuf,
    pub history_ttl_secs: u64,
    pub realtime_ttl_secs: u64,
    pub max_range_days: i64,
    pub fallback_range_days: i64,
    /// Minute points returned by `tick`.
    pub tick_count: usize,
    pub provider: ProviderConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(".cache"),
            history_ttl_secs: 60 * 60,
            realtime_ttl_secs: 60,
            max_range_days: 730,
            fallback_range_days: 30,
            tick_count: 50,
            provider: ProviderConfig::default(),
        }
    }
}

impl FeedConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn history_ttl(&self) -> Duration {
        Duration::from_secs(self.history_ttl_secs)
    }

    pub fn realtime_ttl(&self) -> Duration {
        Duration::from_secs(self.realtime_ttl_secs)
    }

    pub fn range_policy(&self) -> RangePolicy {
        RangePolicy {
            max_span_days: self.max_range_days,
            fallback_days: self.fallback_range_days,
        }
    }
}

/// Upstream provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub history_url: String,
    pub quote_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            history_url: "https://push2his.eastmoney.com".into(),
            quote_url: "https://push2.eastmoney.com".into(),
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
        }
    }
}
