//! Cache store implementations for the cache-aside stats read path.
//!
//! The cache contract distinguishes three outcomes on a read: a hit
//! (`Ok(Some(value))`), a clean miss (`Ok(None)`), and a backend failure
//! (`Err`). Callers must never treat a failure as a miss; see
//! [`crate::stats::StatsReader`] for why a broken cache is a hard failure
//! on that path.
//!
//! Two backends are provided: [`RedisCache`] for a shared
//! Redis-compatible instance, and [`InMemoryCache`] for single-process
//! deployments and tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use fred::prelude::*;
use fred::types::Expiration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::{CacheError, DbError};

/// A pluggable cache backend with TTL-bearing writes.
pub trait CacheStore {
    /// Look up `key`. `Ok(None)` is a clean miss, distinct from `Err`.
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, CacheError>> + Send;

    /// Store `value` at `key`, expiring after `ttl`.
    fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), CacheError>> + Send;
}

// ---------------------------------------------------------------------------
// Redis-compatible backend
// ---------------------------------------------------------------------------

/// Connection handle to a Redis-compatible cache instance.
#[derive(Clone)]
pub struct RedisCache {
    client: Client,
}

impl RedisCache {
    /// Connect to the cache at the given URL.
    ///
    /// The URL follows the Redis URL scheme: `redis://host:port` or
    /// `redis://host:port/db`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed, or
    /// [`DbError::Cache`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let config =
            Config::from_url(url).map_err(|e| DbError::Config(format!("invalid cache URL: {e}")))?;

        let client = Builder::from_config(config)
            .build()
            .map_err(CacheError::Redis)?;
        client.init().await.map_err(CacheError::Redis)?;

        tracing::info!("connected to cache");
        Ok(Self { client })
    }

    /// Return a reference to the underlying [`Client`].
    pub const fn client(&self) -> &Client {
        &self.client
    }
}

impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let value: Option<String> = self.client.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let seconds = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let _: () = self
            .client
            .set(key, value, Some(Expiration::EX(seconds)), None, false)
            .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// A process-local cache store with per-entry expiry.
///
/// Serves the `inmem` cache mode of the demo and the unit tests. Expired
/// entries are dropped lazily on read.
#[derive(Clone, Default)]
pub struct InMemoryCache {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl InMemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let entry = CacheEntry {
            value: value.to_string(),
            expires_at: Instant::now().checked_add(ttl).unwrap_or_else(Instant::now),
        };
        self.entries.lock().await.insert(key.to_string(), entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_is_a_clean_miss() {
        let cache = InMemoryCache::new();
        let got = cache.get("absent").await;
        assert!(matches!(got, Ok(None)));
    }

    #[tokio::test]
    async fn set_then_get_within_ttl_hits() {
        let cache = InMemoryCache::new();
        let set = cache.set("k", "v", Duration::from_secs(60)).await;
        assert!(set.is_ok());
        let got = cache.get("k").await;
        assert!(matches!(got, Ok(Some(v)) if v == "v"));
    }

    #[tokio::test]
    async fn expired_entry_reads_as_miss() {
        let cache = InMemoryCache::new();
        let set = cache.set("k", "v", Duration::from_millis(10)).await;
        assert!(set.is_ok());
        tokio::time::sleep(Duration::from_millis(30)).await;
        let got = cache.get("k").await;
        assert!(matches!(got, Ok(None)));
    }
}
