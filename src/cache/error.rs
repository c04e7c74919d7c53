use thiserror::Error;

#[derive(Debug, Error)]
/// Failures of a cache backing store.
///
/// [`super::ResultCache`] logs these and degrades to a miss; they never reach callers of
/// the orchestrator.
pub enum CacheError {
    /// Backing store could not be reached or refused the operation.
    #[error("cache store unavailable: {reason}")]
    Unavailable {
        /// Backend-specific description.
        reason: String,
    },

    /// Value could not be converted to or from JSON.
    #[error("cache value serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience result type for cache store operations.
pub type CacheResult<T> = Result<T, CacheError>;
