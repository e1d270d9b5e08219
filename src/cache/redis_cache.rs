//! Redis cache backend.
//!
//! Values are stored as raw bytes with `SET .. EX`. Prefix invalidation walks the
//! keyspace with incremental `SCAN MATCH` and deletes each batch it sees, so keys
//! written under the prefix while the walk is in progress may survive it.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use deadpool_redis::{Config, Connection, Pool, Runtime};
use redis::AsyncCommands;
use tracing::debug;

use super::{CacheError, CacheStore};

const SCAN_BATCH: usize = 200;

/// Cache stored in Redis and shared by every instance pointing at it.
#[derive(Clone)]
pub struct RedisCache {
    pool: Pool,
}

impl RedisCache {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Build a pooled client; no connection is opened until first use.
    pub fn from_url(url: &str) -> Result<Self, CacheError> {
        let pool = Config::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(CacheError::connection)?;
        Ok(Self { pool })
    }

    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut connection = self.connection().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(|err| CacheError::command("PING", err))?;
        Ok(())
    }

    async fn connection(&self) -> Result<Connection, CacheError> {
        self.pool.get().await.map_err(CacheError::connection)
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        let mut connection = self.connection().await?;
        let value: Option<Vec<u8>> = connection
            .get(key)
            .await
            .map_err(|err| CacheError::command("GET", err))?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        let mut connection = self.connection().await?;
        // EX rejects zero, so sub-second TTLs round up.
        let seconds = ttl.as_secs().max(1);
        let _: () = connection
            .set_ex(key, &value[..], seconds)
            .await
            .map_err(|err| CacheError::command("SET", err))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut connection = self.connection().await?;
        let _: u64 = connection
            .del(key)
            .await
            .map_err(|err| CacheError::command("DEL", err))?;
        Ok(())
    }

    async fn scan_delete(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut connection = self.connection().await?;
        let pattern = scan_pattern(prefix);
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut connection)
                .await
                .map_err(|err| CacheError::command("SCAN", err))?;

            if !keys.is_empty() {
                let deleted: u64 = connection
                    .del(&keys)
                    .await
                    .map_err(|err| CacheError::command("DEL", err))?;
                removed += deleted;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!(pattern = %pattern, removed, "redis prefix scan complete");
        Ok(removed)
    }
}

/// `SCAN MATCH` pattern selecting every key that starts with `prefix`.
///
/// Glob metacharacters in the prefix are escaped so they match literally.
pub fn scan_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for ch in prefix.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('*');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_prefix_gets_trailing_wildcard() {
        assert_eq!(scan_pattern("tasks:all"), "tasks:all*");
    }

    #[test]
    fn glob_metacharacters_are_escaped() {
        assert_eq!(scan_pattern("ns[1]*:tasks?"), r"ns\[1\]\*:tasks\?*");
        assert_eq!(scan_pattern(r"a\b"), r"a\\b*");
    }

    #[test]
    fn from_url_rejects_unparsable_url() {
        assert!(RedisCache::from_url("not a redis url").is_err());
    }

    #[test]
    fn from_url_does_not_connect_eagerly() {
        assert!(RedisCache::from_url("redis://127.0.0.1:1/0").is_ok());
    }
}
