//! Injected TTL cache
//!
//! An explicit key → (value, inserted-at) cache with TTL eviction,
//! owned and injected by the caller rather than living in module
//! globals, so callers can test and mock it in isolation. Backs the
//! destination-keyed vision-verdict cache in `validate::vision`.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, (V, Instant)>,
}

impl<K: Eq + Hash, V> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.get_at(key, Instant::now())
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|(value, _)| value)
    }

    /// Number of live entries, counting any not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry older than the TTL.
    pub fn evict_expired(&mut self) {
        self.evict_expired_at(Instant::now());
    }

    fn insert_at(&mut self, key: K, value: V, now: Instant) {
        self.entries.insert(key, (value, now));
    }

    fn get_at(&mut self, key: &K, now: Instant) -> Option<&V> {
        let expired = match self.entries.get(key) {
            Some((_, inserted)) => now.duration_since(*inserted) >= self.ttl,
            None => return None,
        };
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|(value, _)| value)
    }

    fn evict_expired_at(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, (_, inserted)| now.duration_since(*inserted) < ttl);
    }
}
