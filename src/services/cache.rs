use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::error::Result;

/// Boxed fetch handed to a [`FetchCache`] on a miss.
pub type FetchFuture<'a, V> = Pin<Box<dyn Future<Output = Result<V>> + Send + 'a>>;

/// Memoizes fetches by key.
///
/// `fetch` is only awaited when no live entry exists for `key`. Failed
/// fetches are not cached.
#[axum::async_trait]
pub trait FetchCache<V>: Send + Sync {
    async fn get_or_fetch<'a>(&'a self, key: &'a str, fetch: FetchFuture<'a, V>) -> Result<V>;

    /// Drop entries whose TTL has passed.
    fn evict_expired(&self);
}

/// A thread-safe cache with TTL support.
pub struct Cache<V> {
    data: DashMap<String, CacheEntry<V>>,
    default_ttl: Duration,
}

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V: Clone> Cache<V> {
    /// Create a new cache with the given default TTL.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            data: DashMap::new(),
            default_ttl,
        }
    }

    /// Get a live value, removing it if it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.data.get(key)?;
        if entry.expires_at > Instant::now() {
            Some(entry.value.clone())
        } else {
            drop(entry);
            self.data.remove(key);
            None
        }
    }

    /// Set a value in the cache with the default TTL.
    pub fn set(&self, key: String, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    pub fn set_with_ttl(&self, key: String, value: V, ttl: Duration) {
        self.data.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Remove all expired entries from the cache.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.data.retain(|_, entry| entry.expires_at > now);
    }

    /// Number of entries, expired ones included until the next cleanup.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[axum::async_trait]
impl<V> FetchCache<V> for Cache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get_or_fetch<'a>(&'a self, key: &'a str, fetch: FetchFuture<'a, V>) -> Result<V> {
        if let Some(value) = self.get(key) {
            debug!("Fetch cache hit: {}", key);
            return Ok(value);
        }

        debug!("Fetch cache miss: {}", key);
        let value = fetch.await?;
        self.set(key.to_string(), value.clone());
        Ok(value)
    }

    fn evict_expired(&self) {
        let before = self.len();
        self.cleanup();
        let evicted = before.saturating_sub(self.len());
        if evicted > 0 {
            debug!("Evicted {} expired fetch cache entries", evicted);
        }
    }
}
