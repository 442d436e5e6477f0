//! In-memory cache backend: per-process TTL store.
//!
//! Entries expire lazily: an expired entry is dropped on the `get` that
//! finds it. Good enough for a single long-running process; durability
//! beyond the process lifetime is explicitly out of scope.

use async_trait::async_trait;
use runelore_core::cache::PageCache;
use runelore_core::error::CacheError;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

struct CachedPage {
    payload: Vec<u8>,
    expires_at: Instant,
}

/// A TTL key-value store backed by a HashMap.
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, CachedPage>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageCache for InMemoryCache {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, url: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut entries = self.entries.write().await;
        match entries.get(url) {
            Some(page) if page.expires_at > Instant::now() => {
                debug!(url, "Cache hit");
                Ok(Some(page.payload.clone()))
            }
            Some(_) => {
                debug!(url, "Cache entry expired");
                entries.remove(url);
                Ok(None)
            }
            None => {
                debug!(url, "Cache miss");
                Ok(None)
            }
        }
    }

    async fn set(&self, url: &str, payload: Vec<u8>, ttl_secs: u64) -> Result<(), CacheError> {
        debug!(url, ttl_secs, "Caching page");
        self.entries.write().await.insert(
            url.to_string(),
            CachedPage {
                payload,
                expires_at: Instant::now() + Duration::from_secs(ttl_secs),
            },
        );
        Ok(())
    }

    async fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_and_get_roundtrip() {
        let cache = InMemoryCache::new();
        cache
            .set("https://w.example/w/Abyssal_whip", b"payload".to_vec(), 60)
            .await
            .unwrap();

        let hit = cache.get("https://w.example/w/Abyssal_whip").await.unwrap();
        assert_eq!(hit.as_deref(), Some(b"payload".as_slice()));

        let miss = cache.get("https://w.example/w/Other").await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn zero_ttl_expires_immediately() {
        let cache = InMemoryCache::new();
        cache.set("k", b"v".to_vec(), 0).await.unwrap();
        assert!(cache.get("k").await.unwrap().is_none());
        // and the expired entry was dropped
        assert!(cache.entries.read().await.is_empty());
    }

    #[tokio::test]
    async fn newer_set_replaces_payload() {
        let cache = InMemoryCache::new();
        cache.set("k", b"old".to_vec(), 60).await.unwrap();
        cache.set("k", b"new".to_vec(), 60).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some(b"new".as_slice()));
    }
}
