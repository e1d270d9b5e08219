//! Task cache backends.
//!
//! The task service talks to a [`CacheStore`]: a byte-oriented key/value store with
//! per-key expiry and prefix invalidation. Two backends are provided:
//!
//! - **`MemoryCache`**: in-process map, suitable for a single instance
//! - **`RedisCache`**: shared Redis instance through a `deadpool-redis` pool
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! backend = "redis"
//! redis_url = "redis://127.0.0.1:6379/0"
//! ttl_seconds = 300
//! key_prefix = "taskcache"
//! ```

mod config;
mod keys;
mod memory;
mod redis_cache;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub(crate) use config::DEFAULT_REDIS_URL;
pub use config::{CacheBackend, CacheConfig};
pub use keys::{CacheKey, CacheKeys};
pub use memory::MemoryCache;
pub use redis_cache::{RedisCache, scan_pattern};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection failed: {0}")]
    Connection(String),
    #[error("cache command `{command}` failed: {message}")]
    Command {
        command: &'static str,
        message: String,
    },
}

impl CacheError {
    pub fn connection(err: impl std::fmt::Display) -> Self {
        Self::Connection(err.to_string())
    }

    pub fn command(command: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Command {
            command,
            message: err.to_string(),
        }
    }
}

/// Key/value cache with per-entry expiry.
///
/// Each call is atomic per key. Nothing spans calls: `scan_delete` may race with a
/// concurrent `set` under the same prefix.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the stored bytes, or `None` when the key is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError>;

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Delete every entry whose key starts with `prefix`, returning how many were removed.
    async fn scan_delete(&self, prefix: &str) -> Result<u64, CacheError>;
}
