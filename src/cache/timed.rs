//! Write-time expiring cache with a hard entry bound.
//!
//! An entry is observable while `now - written_at < ttl`. Reads never extend that
//! lifetime, and a read that finds an expired entry removes it. When a write pushes
//! the entry count past capacity, the entry with the oldest `written_at` is evicted
//! (expired or not), which makes eviction first-in-first-out by write time.
//!
//! All state sits behind one mutex, so a single instance can be shared by any number
//! of concurrent queries. Time comes from [`tokio::time::Instant`], which follows a
//! paused test clock.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use super::types::CacheStats;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    written_at: Instant,
    // Breaks `written_at` ties so eviction order is the exact write order.
    seq: u64,
}

#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    next_seq: u64,
}

/// String-keyed cache with write-time TTL and FIFO capacity eviction.
pub struct TimedCache<V> {
    inner: Mutex<Inner<V>>,
    capacity: usize,
    ttl: Duration,
}

impl<V: Clone> TimedCache<V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                next_seq: 0,
            }),
            capacity,
            ttl,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[inline]
    fn is_live(&self, written_at: Instant, now: Instant) -> bool {
        now.saturating_duration_since(written_at) < self.ttl
    }

    /// Inserts or overwrites `key`, stamping it with the current time.
    ///
    /// Evicts the oldest-written entry if the cache is now over capacity.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let mut inner = self.inner.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            key.into(),
            CacheEntry {
                value,
                written_at: Instant::now(),
                seq,
            },
        );

        if inner.entries.len() > self.capacity {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| (entry.written_at, entry.seq))
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                inner.entries.remove(&key);
            }
        }
    }

    /// Returns the value if present and unexpired. Expired entries are removed.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        match inner.entries.get(key) {
            Some(entry) if self.is_live(entry.written_at, now) => Some(entry.value.clone()),
            Some(_) => {
                inner.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Same expiry semantics as [`get`](Self::get) without cloning the value.
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        match inner.entries.get(key) {
            Some(entry) if self.is_live(entry.written_at, now) => true,
            Some(_) => {
                inner.entries.remove(key);
                false
            }
            None => false,
        }
    }

    /// Writes every pair in order, applying eviction after each one.
    pub fn extend<K, I>(&self, items: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in items {
            self.set(key, value);
        }
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    /// Number of unexpired entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.inner
            .lock()
            .entries
            .values()
            .filter(|entry| self.is_live(entry.written_at, now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<String> {
        self.items().into_iter().map(|(key, _)| key).collect()
    }

    pub fn values(&self) -> Vec<V> {
        self.items().into_iter().map(|(_, value)| value).collect()
    }

    /// Unexpired `(key, value)` pairs, in no particular order.
    pub fn items(&self) -> Vec<(String, V)> {
        let now = Instant::now();
        self.inner
            .lock()
            .entries
            .iter()
            .filter(|(_, entry)| self.is_live(entry.written_at, now))
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect()
    }

    /// Physically removes every expired entry and returns how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner
            .entries
            .retain(|_, entry| now.saturating_duration_since(entry.written_at) < self.ttl);
        before - inner.entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let inner = self.inner.lock();
        let total_entries = inner.entries.len();
        let valid_entries = inner
            .entries
            .values()
            .filter(|entry| self.is_live(entry.written_at, now))
            .count();
        CacheStats {
            valid_entries,
            total_entries,
            expired_entries: total_entries - valid_entries,
            capacity: self.capacity,
            ttl_secs: self.ttl.as_secs(),
        }
    }
}

impl<V> std::fmt::Debug for TimedCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedCache")
            .field("entries", &self.inner.lock().entries.len())
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .finish()
    }
}
