//! Concurrent map whose entries expire a fixed time after insertion.
//!
//! Reads never extend an entry's lifetime. Expired entries are evicted lazily
//! on lookup and in bulk by [`TtlCache::purge_expired`].

use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// A thread-safe TTL store keyed by string.
#[derive(Debug)]
pub struct TtlCache<V> {
    inner: DashMap<String, Entry<V>>,
    ttl: Duration,
    capacity: Option<usize>,
}

impl<V: Clone> TtlCache<V> {
    /// Create a new empty cache.
    pub fn new(ttl: Duration) -> Self {
        Self { inner: DashMap::new(), ttl, capacity: None }
    }

    /// Create a cache holding at most `capacity` entries.
    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        Self { inner: DashMap::new(), ttl, capacity: Some(capacity) }
    }

    /// Live value for `key` and the time it has left.
    pub fn get(&self, key: &str) -> Option<(V, Duration)> {
        let now = Instant::now();
        if let Some(entry) = self.inner.get(key) {
            if entry.expires_at > now {
                return Some((entry.value.clone(), entry.expires_at - now));
            }
        }
        // The read guard is gone; drop the stale entry if nobody refreshed it.
        self.inner.remove_if(key, |_, e| e.expires_at <= now);
        None
    }

    /// Insert or replace `key`, restarting its TTL.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        if let Some(capacity) = self.capacity {
            if self.inner.len() >= capacity {
                self.purge_expired();
                if self.inner.len() >= capacity {
                    self.evict_oldest();
                }
            }
        }
        let expires_at = Instant::now() + self.ttl;
        self.inner.insert(key.into(), Entry { value, expires_at });
    }

    /// Remove every expired entry, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.inner.len();
        self.inner.retain(|_, e| e.expires_at > now);
        before.saturating_sub(self.inner.len())
    }

    fn evict_oldest(&self) {
        let oldest = self
            .inner
            .iter()
            .min_by_key(|r| r.value().expires_at)
            .map(|r| r.key().clone());
        if let Some(key) = oldest {
            self.inner.remove(&key);
        }
    }

    /// Count entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
