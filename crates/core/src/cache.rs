//! PageCache trait: key-value store with TTL for processed pages.
//!
//! Keyed by canonical resource URL, storing the serialized, fully
//! distilled retrieval result. Failures are never fatal: callers treat a
//! failed `get` as a miss and a failed `set` as a no-op.

use async_trait::async_trait;
use crate::error::CacheError;

/// The page-cache capability.
#[async_trait]
pub trait PageCache: Send + Sync {
    /// The backend name (e.g., "memory", "none").
    fn name(&self) -> &str;

    /// Look up a cached page by canonical URL.
    async fn get(&self, url: &str) -> std::result::Result<Option<Vec<u8>>, CacheError>;

    /// Store a page under a canonical URL with a TTL in seconds.
    async fn set(
        &self,
        url: &str,
        payload: Vec<u8>,
        ttl_secs: u64,
    ) -> std::result::Result<(), CacheError>;

    /// Liveness probe.
    async fn is_available(&self) -> bool;
}
