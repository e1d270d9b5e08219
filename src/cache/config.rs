//! Cache configuration.
//!
//! Controls which backend serves the task cache and how long entries live.

use std::str::FromStr;
use std::time::Duration;

const DEFAULT_TTL_SECS: u64 = 300;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
pub(crate) const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/0";

/// Backend selected for the task cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
    Redis,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(format!("unknown cache backend `{other}`")),
        }
    }
}

/// Cache configuration resolved from the `[cache]` settings section.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Connection string used by the Redis backend.
    pub redis_url: String,
    /// Lifetime of every populated entry.
    pub ttl: Duration,
    /// Namespace prepended to every key, joined with `:`.
    pub key_prefix: Option<String>,
    /// How often the memory backend drops expired entries.
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            key_prefix: None,
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            backend: settings.backend,
            redis_url: settings.redis_url.clone(),
            ttl: settings.ttl,
            key_prefix: settings.key_prefix.clone(),
            sweep_interval: settings.sweep_interval,
        }
    }
}
