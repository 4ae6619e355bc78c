//! Aggregate shop statistics and the cache-aside read path.
//!
//! The stats aggregate is the one expensive read in the system, so it is
//! served through a cache with a fixed one-minute freshness window. The
//! protocol is strict cache-aside: hit serves the cached value without
//! touching the store; a clean miss computes from the store and writes
//! the result back with the TTL. Any cache failure, on read or on the
//! write-back after a successful compute, fails the whole operation. The
//! contract here is "cache successfully maintained", not merely "data
//! served", so a broken cache is never silently downgraded to an
//! uncached read.
//!
//! Concurrent misses are not coalesced; each one recomputes and writes
//! back independently. See the known thundering-herd note in DESIGN.md.

use std::time::Duration;

use sqlx::Row;
use storefront_types::{Stats, StatsNumbers};

use crate::cache::CacheStore;
use crate::error::DbError;
use crate::pool::StorePool;

/// The single well-known cache key for the stats aggregate.
pub const STATS_CACHE_KEY: &str = "shop-stats";

/// Freshness window for cached stats.
pub const STATS_CACHE_TTL: Duration = Duration::from_secs(60);

const NUMBERS_QUERY: &str = "SELECT \
    CAST(SUM(selling_price) AS BIGINT), \
    CAST(SUM(cost) AS BIGINT), \
    CAST(SUM(selling_price-cost) AS BIGINT) \
    FROM products JOIN order_lines ON products.id=order_lines.product_id";

/// Compute the stats aggregate directly from the store.
///
/// Three independent row counts plus one sum query. A `SUM` over zero
/// rows comes back `NULL` and is coalesced to zero before it reaches the
/// result; the aggregate never carries absent numeric fields.
///
/// # Errors
///
/// Returns [`DbError::Store`] on any driver failure.
pub async fn query_stats(pool: &StorePool) -> Result<Stats, DbError> {
    let products = count_rows(pool, "SELECT COUNT(*) FROM products", "counting products").await?;
    let customers =
        count_rows(pool, "SELECT COUNT(*) FROM customers", "counting customers").await?;
    let orders = count_rows(pool, "SELECT COUNT(*) FROM orders", "counting orders").await?;

    let row = sqlx::query(NUMBERS_QUERY)
        .fetch_one(pool.pool())
        .await
        .map_err(|e| DbError::store("querying numbers", e))?;
    let map = |e| DbError::store("decoding numbers row", e);
    let revenue: Option<i64> = row.try_get(0).map_err(map)?;
    let cost: Option<i64> = row.try_get(1).map_err(map)?;
    let profit: Option<i64> = row.try_get(2).map_err(map)?;

    Ok(Stats {
        products,
        customers,
        orders,
        numbers: StatsNumbers {
            revenue: revenue.unwrap_or(0),
            cost: cost.unwrap_or(0),
            profit: profit.unwrap_or(0),
        },
    })
}

async fn count_rows(
    pool: &StorePool,
    sql: &str,
    operation: &'static str,
) -> Result<i64, DbError> {
    sqlx::query_scalar(sql)
        .fetch_one(pool.pool())
        .await
        .map_err(|e| DbError::store(operation, e))
}

/// Cache-aside reader for the stats aggregate.
///
/// The cache backend is an explicit constructor dependency so tests can
/// inject a fake; nothing here reaches into ambient process state.
pub struct StatsReader<'a, C> {
    pool: &'a StorePool,
    cache: C,
    ttl: Duration,
}

impl<'a, C: CacheStore> StatsReader<'a, C> {
    /// Create a reader over a pool and a cache backend, with the default
    /// one-minute freshness window.
    pub const fn new(pool: &'a StorePool, cache: C) -> Self {
        Self {
            pool,
            cache,
            ttl: STATS_CACHE_TTL,
        }
    }

    /// Override the freshness window. Used by tests.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Serve the stats aggregate, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Cache`] on any cache failure, including a
    /// failed write-back after a successful compute; [`DbError::Store`]
    /// if the compute itself fails.
    pub async fn get_stats(&self) -> Result<Stats, DbError> {
        match self.cache.get(STATS_CACHE_KEY).await {
            Ok(Some(cached)) => {
                tracing::debug!("serving stats from cache");
                return Ok(serde_json::from_str(&cached)?);
            }
            Ok(None) => {
                // Clean miss; compute and populate below.
            }
            Err(e) => return Err(DbError::Cache(e)),
        }

        let stats = query_stats(self.pool).await?;
        let encoded = serde_json::to_string(&stats)?;
        self.cache
            .set(STATS_CACHE_KEY, &encoded, self.ttl)
            .await
            .map_err(DbError::Cache)?;
        tracing::debug!("cached stats");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;

    /// A cache that fails every operation, for exercising the
    /// hard-failure policy.
    struct BrokenCache;

    impl CacheStore for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Unavailable("get refused".to_string()))
        }

        async fn set(
            &self,
            _key: &str,
            _value: &str,
            _ttl: Duration,
        ) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("set refused".to_string()))
        }
    }

    #[tokio::test]
    async fn broken_cache_fails_the_read_before_the_store_is_touched() {
        // The pool is never reached: the cache error aborts first, so a
        // pool pointing at nothing is fine here.
        #[allow(clippy::expect_used)]
        let pool = StorePool::connect_url("sqlite::memory:")
            .await
            .expect("in-memory store should connect");
        let reader = StatsReader::new(&pool, BrokenCache);
        let result = reader.get_stats().await;
        assert!(matches!(result, Err(DbError::Cache(_))));
    }
}
