//! In-process cache store with per-entry expiry.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use super::pattern::glob_matches;

/// Expiry horizon for TTLs too large to add to the current instant
const NEVER_EXPIRES: Duration = Duration::from_secs(100 * 365 * 86_400);

/// A stored payload and its absolute expiry
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub value: String,
    pub expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    expired: AtomicU64,
    invalidated: AtomicU64,
}

/// Point-in-time cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub expired: u64,
    pub invalidated: u64,
}

impl CacheStats {
    /// Fraction of lookups served from cache (0.0 to 1.0)
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            return 0.0;
        }
        self.hits as f64 / lookups as f64
    }
}

/// Process-local key/value store
///
/// Cloning shares the underlying map. Per-key operations are atomic; there
/// are no cross-key transactions. No operation fails: a missing or expired
/// key is a normal outcome.
#[derive(Debug, Clone, Default)]
pub struct CacheStore {
    entries: Arc<DashMap<String, CacheEntry>>,
    counters: Arc<CacheCounters>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a live payload; expired entries are purged and reported absent
    pub fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();

        let lookup = self.entries.get(key).map(|entry| {
            if entry.is_expired(now) {
                None
            } else {
                Some(entry.value.clone())
            }
        });

        match lookup {
            Some(Some(value)) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = key, "Cache HIT");
                Some(value)
            }
            Some(None) => {
                // Only drop the entry if no writer replaced it in the meantime
                if self
                    .entries
                    .remove_if(key, |_, entry| entry.is_expired(now))
                    .is_some()
                {
                    self.counters.expired.fetch_add(1, Ordering::Relaxed);
                }
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key = key, "Cache MISS (expired)");
                None
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key = key, "Cache MISS");
                None
            }
        }
    }

    /// Store a payload, overwriting any previous value
    ///
    /// A zero TTL stores nothing; any previous entry is removed.
    pub fn set(&self, key: &str, value: impl Into<String>, ttl: Duration) {
        if ttl.is_zero() {
            self.entries.remove(key);
            return;
        }

        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .or_else(|| now.checked_add(NEVER_EXPIRES))
            .unwrap_or(now);
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                key: key.to_string(),
                value: value.into(),
                expires_at,
            },
        );
        self.counters.sets.fetch_add(1, Ordering::Relaxed);

        debug!(key = key, ttl_ms = ttl.as_millis() as u64, "Cache SET");
    }

    /// Remove a key; removing an absent key is a no-op
    pub fn remove(&self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.counters.invalidated.fetch_add(1, Ordering::Relaxed);
            debug!(key = key, "Cache DEL");
        }
    }

    /// Remove every key matching a glob pattern, returning how many were removed
    pub fn remove_by_pattern(&self, pattern: &str) -> u64 {
        let mut removed = 0u64;
        self.entries.retain(|key, _| {
            let matched = glob_matches(pattern, key);
            if matched {
                removed += 1;
            }
            !matched
        });

        self.counters
            .invalidated
            .fetch_add(removed, Ordering::Relaxed);
        debug!(pattern = pattern, removed = removed, "Cache DEL pattern");
        removed
    }

    /// Drop all expired entries eagerly
    pub fn purge_expired(&self) -> u64 {
        let now = Instant::now();
        let mut purged = 0u64;
        self.entries.retain(|_, entry| {
            let expired = entry.is_expired(now);
            if expired {
                purged += 1;
            }
            !expired
        });
        self.counters.expired.fetch_add(purged, Ordering::Relaxed);
        purged
    }

    /// Remove everything
    pub fn clear(&self) {
        let count = self.entries.len() as u64;
        self.entries.clear();
        self.counters.invalidated.fetch_add(count, Ordering::Relaxed);
    }

    /// Number of stored entries, including ones not yet purged after expiry
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            sets: self.counters.sets.load(Ordering::Relaxed),
            expired: self.counters.expired.load(Ordering::Relaxed),
            invalidated: self.counters.invalidated.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_returns_none_on_miss() {
        let cache = CacheStore::new();
        assert_eq!(cache.get("nonexistent"), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = CacheStore::new();
        let value = r#"{"id":"1","name":"Ada"}"#;

        cache.set("customers:get:1", value, Duration::from_secs(60));

        assert_eq!(cache.get("customers:get:1"), Some(value.to_string()));
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let cache = CacheStore::new();
        cache.set("key", "first", Duration::from_secs(60));
        cache.set("key", "second", Duration::from_secs(60));
        assert_eq!(cache.get("key"), Some("second".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry() {
        let cache = CacheStore::new();
        cache.set("expiring", "value", Duration::from_millis(50));

        assert!(cache.get("expiring").is_some());

        tokio::time::advance(Duration::from_millis(50)).await;

        assert!(cache.get("expiring").is_none());
        // Lazily purged on read
        assert!(cache.is_empty());
        assert_eq!(cache.stats().expired, 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_stores_nothing() {
        let cache = CacheStore::new();
        cache.set("key", "value", Duration::from_secs(60));
        cache.set("key", "value", Duration::ZERO);
        assert!(cache.get("key").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_ttl_never_expires() {
        let cache = CacheStore::new();
        cache.set("forever", "value", Duration::MAX);

        tokio::time::advance(Duration::from_secs(365 * 86_400)).await;

        assert_eq!(cache.get("forever"), Some("value".to_string()));
        assert_eq!(cache.purge_expired(), 0);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let cache = CacheStore::new();
        cache.set("to_delete", "value", Duration::from_secs(60));

        cache.remove("to_delete");
        cache.remove("to_delete");
        cache.remove("never_written");

        assert!(cache.get("to_delete").is_none());
    }

    #[tokio::test]
    async fn test_remove_by_pattern() {
        let cache = CacheStore::new();
        for key in ["customers_page_1", "customers_page_2", "other"] {
            cache.set(key, "payload", Duration::from_secs(60));
        }

        let removed = cache.remove_by_pattern("customers_page_*");

        assert_eq!(removed, 2);
        assert!(cache.get("customers_page_1").is_none());
        assert!(cache.get("customers_page_2").is_none());
        assert_eq!(cache.get("other"), Some("payload".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired_keeps_live_entries() {
        let cache = CacheStore::new();
        cache.set("short", "a", Duration::from_millis(10));
        cache.set("long", "b", Duration::from_secs(10));

        tokio::time::advance(Duration::from_millis(20)).await;

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("long").is_some());
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = CacheStore::new();
        let shared = cache.clone();
        shared.set("key", "value", Duration::from_secs(60));
        assert!(cache.get("key").is_some());

        cache.clear();
        assert!(shared.is_empty());
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            entries: 0,
            hits: 3,
            misses: 1,
            sets: 0,
            expired: 0,
            invalidated: 0,
        };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }
}
