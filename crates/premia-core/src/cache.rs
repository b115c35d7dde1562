//! Two-tier cache-aside store for provider responses.
//!
//! Lookup order is fast tier, then (when requested) the durable tier, then
//! the caller-supplied fetch. Payloads cross the cache as JSON strings.
//! There is no request coalescing: concurrent callers missing on the same
//! key may each invoke their fetch independently, which is acceptable
//! because fetches are idempotent reads.

use std::future::Future;
use std::num::NonZeroUsize;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::UtcDateTime;

/// Default fast-tier capacity when none is configured.
pub const DEFAULT_FAST_CAPACITY: usize = 1024;

/// Error reported by a durable-tier backend. Never escapes the cache
/// manager; read/write failures degrade to fast-tier-only operation.
#[derive(Debug, Error)]
pub enum DurableCacheError {
    #[error("durable cache backend error: {0}")]
    Backend(String),
}

/// Durable key→(payload, expiry) tier contract.
///
/// Lookups must treat rows past their expiry as absent.
pub trait DurableCache: Send + Sync {
    fn get<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, DurableCacheError>> + Send + 'a>>;

    fn put<'a>(
        &'a self,
        key: &'a str,
        payload: String,
        expires_at: UtcDateTime,
    ) -> Pin<Box<dyn Future<Output = Result<(), DurableCacheError>> + Send + 'a>>;
}

impl DurableCache for premia_store::DurableStore {
    fn get<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, DurableCacheError>> + Send + 'a>>
    {
        let store = self.clone();
        let key = key.to_owned();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || store.get(&key))
                .await
                .map_err(|err| DurableCacheError::Backend(err.to_string()))?
                .map_err(|err| DurableCacheError::Backend(err.to_string()))
        })
    }

    fn put<'a>(
        &'a self,
        key: &'a str,
        payload: String,
        expires_at: UtcDateTime,
    ) -> Pin<Box<dyn Future<Output = Result<(), DurableCacheError>> + Send + 'a>> {
        let store = self.clone();
        let key = key.to_owned();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || {
                store.put(&key, &payload, expires_at.into_inner())
            })
            .await
            .map_err(|err| DurableCacheError::Backend(err.to_string()))?
            .map_err(|err| DurableCacheError::Backend(err.to_string()))
        })
    }
}

#[derive(Debug, Clone)]
struct FastEntry {
    payload: String,
    expires_at: Instant,
}

/// Thread-safe two-tier cache manager.
///
/// The fast tier is a capacity-bounded LRU of TTL-stamped JSON payloads;
/// the optional durable tier survives process restarts.
#[derive(Clone)]
pub struct CacheManager {
    fast: Arc<tokio::sync::RwLock<LruCache<String, FastEntry>>>,
    durable: Option<Arc<dyn DurableCache>>,
}

impl CacheManager {
    /// Create a fast-tier-only cache with the given LRU capacity.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least one");
        Self {
            fast: Arc::new(tokio::sync::RwLock::new(LruCache::new(capacity))),
            durable: None,
        }
    }

    /// Create a cache with the default fast-tier capacity.
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_FAST_CAPACITY)
    }

    /// Attach a durable tier used by `get_or_fetch` calls that request it.
    pub fn with_durable(mut self, durable: Arc<dyn DurableCache>) -> Self {
        self.durable = Some(durable);
        self
    }

    /// Resolve `key` through the cache, invoking `fetch` on a miss.
    ///
    /// On a successful fetch the value is stored in the fast tier
    /// unconditionally and, when `use_durable` is set, written through to
    /// the durable tier, both stamped `now + ttl`. Expired entries are
    /// misses. Durable-tier failures are logged and never fail the call.
    pub async fn get_or_fetch<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        use_durable: bool,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(payload) = self.fast_get(key).await {
            match serde_json::from_str(&payload) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    warn!(key, error = %err, "cached_payload_undeserializable");
                }
            }
        }

        if use_durable {
            if let Some(durable) = &self.durable {
                match durable.get(key).await {
                    Ok(Some(payload)) => match serde_json::from_str(&payload) {
                        Ok(value) => {
                            self.fast_put(key.to_owned(), payload, ttl).await;
                            return Ok(value);
                        }
                        Err(err) => {
                            warn!(key, error = %err, "durable_payload_undeserializable");
                        }
                    },
                    Ok(None) => {}
                    Err(err) => {
                        warn!(key, error = %err, "durable_cache_read_failed");
                    }
                }
            }
        }

        let value = fetch().await?;

        match serde_json::to_string(&value) {
            Ok(payload) => {
                self.fast_put(key.to_owned(), payload.clone(), ttl).await;
                if use_durable {
                    if let Some(durable) = &self.durable {
                        let expires_at = UtcDateTime::now() + ttl;
                        if let Err(err) = durable.put(key, payload, expires_at).await {
                            warn!(key, error = %err, "durable_cache_write_failed");
                        }
                    }
                }
            }
            Err(err) => {
                warn!(key, error = %err, "cache_payload_unserializable");
            }
        }

        Ok(value)
    }

    /// Drop all fast-tier entries. The durable tier is untouched.
    pub async fn clear(&self) {
        let mut fast = self.fast.write().await;
        fast.clear();
    }

    /// Number of fast-tier entries, expired entries included.
    pub async fn len(&self) -> usize {
        let fast = self.fast.read().await;
        fast.len()
    }

    // LRU promotion mutates on read, so lookups take the write lock.
    async fn fast_get(&self, key: &str) -> Option<String> {
        let mut fast = self.fast.write().await;
        match fast.get(key) {
            Some(entry) if Instant::now() <= entry.expires_at => Some(entry.payload.clone()),
            Some(_) => {
                fast.pop(key);
                None
            }
            None => None,
        }
    }

    async fn fast_put(&self, key: String, payload: String, ttl: Duration) {
        let entry = FastEntry {
            payload,
            expires_at: Instant::now() + ttl,
        };
        let mut fast = self.fast.write().await;
        fast.put(key, entry);
    }
}
