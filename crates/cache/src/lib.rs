//! Page cache backends for Runelore.
//!
//! All backends implement the `runelore_core::PageCache` trait. The
//! cache stores fully processed retrieval results keyed by canonical
//! URL; it is best-effort everywhere: callers treat failures as misses.

pub mod in_memory;
pub mod noop;

pub use in_memory::InMemoryCache;
pub use noop::NoopCache;

use runelore_core::cache::PageCache;
use runelore_core::error::Error;
use std::sync::Arc;

/// Construct the cache backend named by the configuration.
pub fn from_config(config: &runelore_config::CacheConfig) -> Result<Arc<dyn PageCache>, Error> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryCache::new())),
        "none" => Ok(Arc::new(NoopCache)),
        other => Err(Error::Config {
            message: format!("unknown cache backend '{other}'"),
        }),
    }
}
