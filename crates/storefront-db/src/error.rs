//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! [`sqlx`] and [`fred`] errors with additional context about which
//! operation failed. A legitimate empty result on a detail lookup is not
//! an error; those paths return `Ok(None)`.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A store operation failed. Carries the name of the attempted
    /// operation so the boundary layer can report what was going on.
    #[error("{operation}: {source}")]
    Store {
        /// The operation being attempted when the store failed.
        operation: &'static str,
        /// The underlying driver error.
        #[source]
        source: sqlx::Error,
    },

    /// A cache operation failed. A clean miss is not an error; see
    /// [`crate::cache::CacheStore`].
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The configured database dialect tag is not one of the supported
    /// values. This surfaces at startup, never per request.
    #[error("unsupported database dialect: {0:?}")]
    UnsupportedDialect(String),

    /// An insert completed but the driver reported no generated row id.
    #[error("insert reported no generated id")]
    MissingInsertId,

    /// The store returned a timestamp in a shape we cannot parse.
    #[error("invalid timestamp from store: {0:?}")]
    InvalidTimestamp(String),

    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DbError {
    /// Wrap a driver error with the name of the attempted operation.
    pub const fn store(operation: &'static str, source: sqlx::Error) -> Self {
        Self::Store { operation, source }
    }
}

/// Errors from the cache backend.
///
/// Distinct from a miss: a miss is expected control flow and is signalled
/// as `Ok(None)` by [`crate::cache::CacheStore::get`].
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The Redis-compatible backend failed.
    #[error("redis error: {0}")]
    Redis(#[from] fred::error::Error),

    /// The cache backend is unavailable or misbehaving.
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_carries_operation_name() {
        let err = DbError::store("querying products", sqlx::Error::RowNotFound);
        let msg = format!("{err}");
        assert!(msg.contains("querying products"));
    }

    #[test]
    fn cache_error_display() {
        let err = DbError::from(CacheError::Unavailable("boom".to_string()));
        let msg = format!("{err}");
        assert!(msg.contains("boom"));
    }
}
