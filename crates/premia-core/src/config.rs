//! Runtime configuration with environment overrides.
//!
//! Every setting has a default; `PREMIA_*` environment variables override
//! individual fields. File-based configuration is a collaborator concern,
//! so all structs carry serde derives and a caller can deserialize them
//! from whatever source it owns.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::cache::DEFAULT_FAST_CAPACITY;

/// Cache TTLs and fast-tier bound.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Quote cache TTL in seconds.
    pub quote_ttl_secs: u64,
    /// Option chain cache TTL in seconds.
    pub option_chain_ttl_secs: u64,
    /// Historical data cache TTL in seconds.
    pub historical_ttl_secs: u64,
    /// Fast-tier LRU capacity.
    pub fast_capacity: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            quote_ttl_secs: 300,
            option_chain_ttl_secs: 900,
            historical_ttl_secs: 86_400,
            fast_capacity: DEFAULT_FAST_CAPACITY,
        }
    }
}

impl CacheSettings {
    pub fn quote_ttl(&self) -> Duration {
        Duration::from_secs(self.quote_ttl_secs)
    }

    pub fn option_chain_ttl(&self) -> Duration {
        Duration::from_secs(self.option_chain_ttl_secs)
    }

    pub fn historical_ttl(&self) -> Duration {
        Duration::from_secs(self.historical_ttl_secs)
    }
}

/// Screening fan-out bounds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScreeningSettings {
    /// Maximum concurrently screened symbols.
    pub max_concurrent: usize,
}

impl Default for ScreeningSettings {
    fn default() -> Self {
        Self { max_concurrent: 5 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Text,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            other => Err(format!("invalid log format '{other}', expected json or text")),
        }
    }
}

/// Logging level and format.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Level filter directive, e.g. "info" or "premia_screener=debug".
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: LogFormat::Json,
        }
    }
}

/// Combined application configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub cache: CacheSettings,
    pub screening: ScreeningSettings,
    pub logging: LogSettings,
}

impl AppConfig {
    /// Defaults overridden by `PREMIA_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        override_from_env("PREMIA_CACHE_QUOTE_TTL_SECS", &mut config.cache.quote_ttl_secs);
        override_from_env(
            "PREMIA_CACHE_OPTION_CHAIN_TTL_SECS",
            &mut config.cache.option_chain_ttl_secs,
        );
        override_from_env(
            "PREMIA_CACHE_HISTORICAL_TTL_SECS",
            &mut config.cache.historical_ttl_secs,
        );
        override_from_env("PREMIA_CACHE_FAST_CAPACITY", &mut config.cache.fast_capacity);
        override_from_env(
            "PREMIA_SCREENING_MAX_CONCURRENT",
            &mut config.screening.max_concurrent,
        );
        override_from_env("PREMIA_LOG_LEVEL", &mut config.logging.level);
        override_from_env("PREMIA_LOG_FORMAT", &mut config.logging.format);

        config
    }
}

fn override_from_env<T: FromStr>(name: &str, target: &mut T) {
    if let Ok(raw) = env::var(name) {
        if let Ok(parsed) = raw.parse() {
            *target = parsed;
        }
    }
}
