use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument, warn};

use super::namespace::{CacheNamespace, CacheTtls};
use super::store::{CacheStore, MemoryStore};
use crate::gateway::ChatMessage;
use crate::hashing::hash_canonical;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Snapshot of the backing store.
pub struct CacheStats {
    pub backend: &'static str,
    /// `None` when the backend cannot report a count.
    pub entries: Option<u64>,
}

/// Content-addressed, TTL-bounded JSON cache.
///
/// Keys are `<namespace>:<blake3 of canonical JSON input>`. Every backing-store failure
/// is logged and treated as a miss, so callers never see cache errors.
#[derive(Debug)]
pub struct ResultCache<S: CacheStore = MemoryStore> {
    store: S,
    ttls: CacheTtls,
}

impl Default for ResultCache<MemoryStore> {
    fn default() -> Self {
        Self::new(MemoryStore::default(), CacheTtls::default())
    }
}

impl<S: CacheStore> ResultCache<S> {
    pub fn new(store: S, ttls: CacheTtls) -> Self {
        Self { store, ttls }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ttls(&self) -> &CacheTtls {
        &self.ttls
    }

    /// Store key for `input` in `namespace`.
    ///
    /// Inputs that differ only in object field order map to the same key.
    pub fn key<K: Serialize + ?Sized>(namespace: CacheNamespace, input: &K) -> Option<String> {
        match hash_canonical(input) {
            Ok(digest) => Some(namespace.key(&digest)),
            Err(e) => {
                warn!(%namespace, error = %e, "Cache key input not serializable");
                None
            }
        }
    }

    /// Looks up `input`; any failure is reported as a miss.
    #[instrument(skip(self, input), fields(namespace = %namespace))]
    pub async fn get<K, V>(&self, namespace: CacheNamespace, input: &K) -> Option<V>
    where
        K: Serialize + ?Sized,
        V: DeserializeOwned,
    {
        let key = Self::key(namespace, input)?;

        let raw = match self.store.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Cache miss");
                return None;
            }
            Err(e) => {
                warn!(
                    error = %e,
                    backend = self.store.backend(),
                    "Cache read failed, treating as miss"
                );
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!("Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(error = %e, "Cached value has unexpected shape, treating as miss");
                None
            }
        }
    }

    /// Stores `value` under `input` for `ttl`. Best effort.
    #[instrument(
        skip(self, input, value),
        fields(namespace = %namespace, ttl_secs = ttl.as_secs())
    )]
    pub async fn set<K, V>(&self, namespace: CacheNamespace, input: &K, value: &V, ttl: Duration)
    where
        K: Serialize + ?Sized,
        V: Serialize + ?Sized,
    {
        let Some(key) = Self::key(namespace, input) else {
            return;
        };

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Cache value not serializable, skipping write");
                return;
            }
        };

        if let Err(e) = self.store.set(&key, raw, ttl).await {
            warn!(error = %e, backend = self.store.backend(), "Cache write failed");
        }
    }

    /// Stores `value` with the namespace's configured TTL.
    pub async fn put<K, V>(&self, namespace: CacheNamespace, input: &K, value: &V)
    where
        K: Serialize + ?Sized,
        V: Serialize + ?Sized,
    {
        let ttl = self.ttls.for_namespace(namespace);
        self.set(namespace, input, value, ttl).await;
    }

    /// Removes `input`. Best effort.
    pub async fn delete<K: Serialize + ?Sized>(&self, namespace: CacheNamespace, input: &K) {
        let Some(key) = Self::key(namespace, input) else {
            return;
        };
        if let Err(e) = self.store.delete(&key).await {
            warn!(%namespace, error = %e, "Cache delete failed");
        }
    }

    pub async fn get_task<V: DeserializeOwned>(&self, level: &str, domain: &str) -> Option<V> {
        self.get(CacheNamespace::Task, &task_key(level, domain)).await
    }

    pub async fn cache_task<V: Serialize + ?Sized>(&self, level: &str, domain: &str, task: &V) {
        self.put(CacheNamespace::Task, &task_key(level, domain), task)
            .await;
    }

    pub async fn get_evaluation<K, V>(&self, input: &K) -> Option<V>
    where
        K: Serialize + ?Sized,
        V: DeserializeOwned,
    {
        self.get(CacheNamespace::Evaluation, input).await
    }

    pub async fn cache_evaluation<K, V>(&self, input: &K, verdict: &V)
    where
        K: Serialize + ?Sized,
        V: Serialize + ?Sized,
    {
        self.put(CacheNamespace::Evaluation, input, verdict).await;
    }

    /// Dialogue history for `session_id`, oldest first. Empty on miss.
    pub async fn get_conversation(&self, session_id: &str) -> Vec<ChatMessage> {
        self.get(CacheNamespace::Conversation, session_id)
            .await
            .unwrap_or_default()
    }

    pub async fn cache_conversation(&self, session_id: &str, history: &[ChatMessage]) {
        self.put(CacheNamespace::Conversation, session_id, history)
            .await;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            backend: self.store.backend(),
            entries: self.store.entry_count(),
        }
    }
}

fn task_key(level: &str, domain: &str) -> serde_json::Value {
    json!({ "level": level, "domain": domain })
}
