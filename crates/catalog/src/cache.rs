// ABOUTME: Single-slot feed cache holding the last downloaded document with a fetch timestamp.
// ABOUTME: Freshness is checked lazily against a caller-supplied TTL; entries are replaced wholesale.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, MutexGuard, RwLock};

/// The one key the cache answers to.
pub const FEED_CACHE_KEY: &str = "SOCD_XML_CACHE";

/// A downloaded feed document. Immutable once stored.
#[derive(Debug, Clone)]
pub struct FeedCacheEntry {
    pub fetched_at: Instant,
    pub raw_text: Arc<str>,
}

impl FeedCacheEntry {
    /// Fresh while strictly younger than `ttl`.
    pub fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

/// Holds at most one feed document.
///
/// Reads and writes go through a lock, so a reader sees either the previous
/// entry or the new one, never a partial write. Stale entries are not removed;
/// they are ignored until the next store overwrites them.
#[derive(Debug, Default)]
pub struct FeedCache {
    slot: RwLock<Option<FeedCacheEntry>>,
    refill: Mutex<()>,
}

impl FeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached text if it is still fresh at `now`.
    pub async fn fresh_at(&self, ttl: Duration, now: Instant) -> Option<Arc<str>> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|entry| entry.is_fresh(ttl, now))
            .map(|entry| Arc::clone(&entry.raw_text))
    }

    /// Replaces the entry.
    pub async fn store_at(&self, raw_text: Arc<str>, now: Instant) {
        *self.slot.write().await = Some(FeedCacheEntry {
            fetched_at: now,
            raw_text,
        });
    }

    /// The current entry, fresh or not.
    pub async fn entry(&self) -> Option<FeedCacheEntry> {
        self.slot.read().await.clone()
    }

    /// Serializes refills so that concurrent misses can wait for one download.
    pub async fn lock_refill(&self) -> MutexGuard<'_, ()> {
        self.refill.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn test_empty_cache_misses() {
        let cache = FeedCache::new();
        assert!(cache.fresh_at(TTL, Instant::now()).await.is_none());
        assert!(cache.entry().await.is_none());
    }

    #[tokio::test]
    async fn test_ttl_boundary() {
        let cache = FeedCache::new();
        let t0 = Instant::now();
        cache.store_at(Arc::from("<rss/>"), t0).await;

        assert_eq!(
            cache.fresh_at(TTL, t0 + Duration::from_secs(299)).await.as_deref(),
            Some("<rss/>")
        );
        assert!(cache.fresh_at(TTL, t0 + TTL).await.is_none());
        assert!(cache.fresh_at(TTL, t0 + Duration::from_secs(301)).await.is_none());
        // Stale entries stay until overwritten.
        assert!(cache.entry().await.is_some());
    }

    #[tokio::test]
    async fn test_zero_ttl_is_always_stale() {
        let cache = FeedCache::new();
        let t0 = Instant::now();
        cache.store_at(Arc::from("x"), t0).await;
        assert!(cache.fresh_at(Duration::ZERO, t0).await.is_none());
    }

    #[tokio::test]
    async fn test_store_replaces_entry() {
        let cache = FeedCache::new();
        let t0 = Instant::now();
        cache.store_at(Arc::from("old"), t0).await;
        let t1 = t0 + Duration::from_secs(400);
        cache.store_at(Arc::from("new"), t1).await;

        let entry = cache.entry().await.unwrap();
        assert_eq!(&*entry.raw_text, "new");
        assert_eq!(entry.fetched_at, t1);
        assert_eq!(cache.fresh_at(TTL, t1).await.as_deref(), Some("new"));
    }
}
