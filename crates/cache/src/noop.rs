//! No-op cache backend: disables page caching entirely.

use async_trait::async_trait;
use runelore_core::cache::PageCache;
use runelore_core::error::CacheError;

/// A cache that stores nothing and never errors.
pub struct NoopCache;

#[async_trait]
impl PageCache for NoopCache {
    fn name(&self) -> &str {
        "none"
    }

    async fn get(&self, _url: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _url: &str, _payload: Vec<u8>, _ttl_secs: u64) -> Result<(), CacheError> {
        Ok(())
    }

    async fn is_available(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_misses() {
        let cache = NoopCache;
        cache.set("k", b"v".to_vec(), 60).await.unwrap();
        assert!(cache.get("k").await.unwrap().is_none());
        assert!(!cache.is_available().await);
    }
}
