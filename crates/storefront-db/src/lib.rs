//! Data-access and consistency layer for the storefront demo backend.
//!
//! The HTTP layer above this crate is plain glue: it parses request
//! parameters, calls one of the operations here, and serializes the
//! returned data. Everything that touches the relational store or the
//! cache lives in this crate.
//!
//! # Architecture
//!
//! ```text
//! HTTP layer (external)
//!     |
//!     +-- reads ----------> customers / products / orders (SelectQuery)
//!     +-- stats ----------> StatsReader (cache-aside over CacheStore)
//!     +-- create order ---> orders::create_order (one transaction)
//!     +-- startup --------> seed::init_store (schema + random orders)
//!                               |
//!                               +-- Dialect (placeholders, generated ids)
//! ```
//!
//! The store runs under either `PostgreSQL` or `SQLite`; the [`dialect`]
//! module is the only place that knows the difference.
//!
//! # Modules
//!
//! - [`pool`] -- store connection pool and configuration
//! - [`dialect`] -- placeholder rebinding and generated-id retrieval
//! - [`query`] -- filter/limit composition for the read paths
//! - [`customers`], [`products`], [`orders`] -- entity operations
//! - [`stats`] -- aggregate statistics behind the cache-aside reader
//! - [`cache`] -- cache backends (Redis-compatible and in-memory)
//! - [`seed`] -- cold-store initialization and bulk order generation
//! - [`error`] -- shared error types

pub mod cache;
pub mod customers;
pub mod dialect;
pub mod error;
pub mod orders;
pub mod pool;
pub mod products;
pub mod query;
pub mod seed;
pub mod stats;

// Re-export primary types for convenience.
pub use cache::{CacheStore, InMemoryCache, RedisCache};
pub use dialect::Dialect;
pub use error::{CacheError, DbError};
pub use pool::{StoreConfig, StorePool};
pub use query::{Filter, SelectQuery};
pub use stats::{STATS_CACHE_KEY, STATS_CACHE_TTL, StatsReader};
