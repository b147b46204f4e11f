//! Caching layer for fare search pages.
//!
//! A stitched query re-requests overlapping windows, and the web pages
//! issue the same searches repeatedly while a user adjusts a range. Pages
//! are cached per search form for a short TTL. Nothing is persisted; the
//! cache dies with the process.

use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::remote::{FareSource, RemoteError, SearchForm, Session};

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_capacity: 500,
        }
    }
}

/// Search pages keyed by the submitted form.
pub struct FareCache {
    pages: MokaCache<SearchForm, String>,
}

impl FareCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let pages = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { pages }
    }

    pub async fn get(&self, form: &SearchForm) -> Option<String> {
        self.pages.get(form).await
    }

    pub async fn insert(&self, form: SearchForm, page: String) {
        self.pages.insert(form, page).await;
    }

    /// Get cache statistics (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.pages.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.pages.invalidate_all();
    }

    #[cfg(test)]
    async fn sync(&self) {
        self.pages.run_pending_tasks().await;
    }
}

/// A fare source with a page cache in front of it.
///
/// Sessions are never cached: a fresh one is opened per query, so the
/// remote sees a normal browsing pattern even when pages come from cache.
pub struct CachedFareClient<S> {
    source: S,
    cache: FareCache,
}

impl<S> CachedFareClient<S> {
    /// Create a new cached client.
    pub fn new(source: S, cache_config: &CacheConfig) -> Self {
        Self {
            source,
            cache: FareCache::new(cache_config),
        }
    }

    /// Get cache statistics.
    pub fn cache_entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
    }
}

impl<S> FareSource for CachedFareClient<S>
where
    S: FareSource + Send + Sync,
{
    async fn open_session(&self) -> Result<Session, RemoteError> {
        self.source.open_session().await
    }

    async fn search(&self, session: &Session, form: &SearchForm) -> Result<String, RemoteError> {
        if let Some(page) = self.cache.get(form).await {
            debug!(departure = %form.departure(), "fare page cache hit");
            return Ok(page);
        }

        let page = self.source.search(session, form).await?;
        self.cache.insert(*form, page.clone()).await;
        Ok(page)
    }
}
