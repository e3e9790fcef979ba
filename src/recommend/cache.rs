//! Bounded, TTL'd cache for recommendation reads.
//!
//! Owned explicitly by the recommender and invalidated by the batch jobs
//! that change the underlying data, rather than hidden behind a
//! cross-cutting annotation.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use tracing::debug;

use crate::models::ScoredItem;

#[derive(Debug, Clone)]
struct CachedEntry {
    items: Vec<ScoredItem>,
    cached_at: DateTime<Utc>,
}

/// LRU cache of ranked item lists keyed by request shape.
#[derive(Debug)]
pub struct RecommendationCache {
    inner: Mutex<LruCache<String, CachedEntry>>,
    ttl: Duration,
}

impl RecommendationCache {
    /// Create a cache holding at most `capacity` entries, each valid for
    /// `ttl_seconds` after insertion.
    pub fn new(capacity: usize, ttl_seconds: u64) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN),
            )),
            ttl: Duration::seconds(ttl_seconds as i64),
        }
    }

    /// Fetch a live entry; expired entries are evicted on read.
    pub fn get(&self, key: &str) -> Option<Vec<ScoredItem>> {
        let mut cache = self.inner.lock().ok()?;
        match cache.get(key) {
            Some(entry) if Utc::now() - entry.cached_at <= self.ttl => Some(entry.items.clone()),
            Some(_) => {
                cache.pop(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: impl Into<String>, items: Vec<ScoredItem>) {
        if let Ok(mut cache) = self.inner.lock() {
            cache.put(
                key.into(),
                CachedEntry {
                    items,
                    cached_at: Utc::now(),
                },
            );
        }
    }

    /// Drop every entry; called when a batch job rewrites underlying data.
    pub fn invalidate_all(&self) {
        if let Ok(mut cache) = self.inner.lock() {
            debug!(entries = cache.len(), "recommendation cache invalidated");
            cache.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
