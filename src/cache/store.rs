//! Key/value backends behind [`super::ResultCache`].

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use tokio::time::Instant;

use super::error::CacheResult;
#[cfg(any(test, feature = "mock"))]
use super::error::CacheError;
use crate::constants::DEFAULT_CACHE_CAPACITY;

/// Minimal `GET` / `SET EX` / `DEL` contract over JSON strings.
pub trait CacheStore: Send + Sync {
    /// Short backend label for stats and logs.
    fn backend(&self) -> &'static str;

    /// Returns the live value for `key`, if any.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = CacheResult<Option<String>>> + Send;

    /// Stores `value` under `key` for `ttl`.
    fn set(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> impl std::future::Future<Output = CacheResult<()>> + Send;

    /// Removes `key`. Missing keys are not an error.
    fn delete(&self, key: &str) -> impl std::future::Future<Output = CacheResult<()>> + Send;

    /// Number of live entries, when the backend can tell.
    fn entry_count(&self) -> Option<u64>;
}

#[derive(Debug)]
struct StoredValue {
    value: String,
    expires_at: Instant,
}

impl StoredValue {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process store on a bounded moka cache.
///
/// Expiry is tracked per entry against `tokio::time::Instant`, so paused test time
/// drives it. Expired entries are dropped on the read that observes them.
#[derive(Clone)]
pub struct MemoryStore {
    entries: Cache<String, Arc<StoredValue>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl MemoryStore {
    /// Creates a store holding at most `capacity` entries.
    pub fn new(capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).build(),
        }
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

impl CacheStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let Some(stored) = self.entries.get(key) else {
            return Ok(None);
        };

        if stored.is_live(Instant::now()) {
            Ok(Some(stored.value.clone()))
        } else {
            self.entries.invalidate(key);
            Ok(None)
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).unwrap_or(now + Duration::from_secs(86_400 * 365));
        self.entries
            .insert(key.to_string(), Arc::new(StoredValue { value, expires_at }));
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.invalidate(key);
        Ok(())
    }

    fn entry_count(&self) -> Option<u64> {
        let now = Instant::now();
        Some(self.entries.iter().filter(|(_, v)| v.is_live(now)).count() as u64)
    }
}

/// Store that fails every operation, for degradation tests.
#[cfg(any(test, feature = "mock"))]
#[derive(Debug, Clone, Default)]
pub struct UnavailableStore;

#[cfg(any(test, feature = "mock"))]
impl CacheStore for UnavailableStore {
    fn backend(&self) -> &'static str {
        "unavailable"
    }

    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(CacheError::Unavailable {
            reason: "connection refused".to_string(),
        })
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> CacheResult<()> {
        Err(CacheError::Unavailable {
            reason: "connection refused".to_string(),
        })
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Err(CacheError::Unavailable {
            reason: "connection refused".to_string(),
        })
    }

    fn entry_count(&self) -> Option<u64> {
        None
    }
}
