//! TTL-based cache for short-lived memoization.
//!
//! Expiry is measured against the injected [`ClockPort`] so tests can move
//! time instead of sleeping.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::infrastructure::ports::ClockPort;

/// A thread-safe cache with time-to-live expiration.
///
/// Entries are considered expired after the TTL but are not removed until
/// `cleanup_expired()` or one of the invalidation methods is called.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, TtlEntry<V>>>,
    ttl: RwLock<Duration>,
    clock: Arc<dyn ClockPort>,
}

struct TtlEntry<V> {
    value: V,
    inserted_at: DateTime<Utc>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    pub fn new(ttl: Duration, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: RwLock::new(ttl),
            clock,
        }
    }

    /// Change the TTL. Existing entries are judged against the new value.
    pub async fn set_ttl(&self, ttl: Duration) {
        *self.ttl.write().await = ttl;
    }

    /// Insert a value, replacing any existing entry and resetting the TTL.
    pub async fn insert(&self, key: K, value: V) {
        let entry = TtlEntry {
            value,
            inserted_at: self.clock.now(),
        };
        self.entries.write().await.insert(key, entry);
    }

    /// Get a value if it exists and hasn't expired.
    pub async fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let ttl = *self.ttl.read().await;
        let guard = self.entries.read().await;
        guard
            .get(key)
            .filter(|entry| now - entry.inserted_at < ttl)
            .map(|entry| entry.value.clone())
    }

    /// Remove every entry whose key matches `predicate`, returning the count.
    pub async fn remove_where(&self, predicate: impl Fn(&K) -> bool) -> usize {
        let mut guard = self.entries.write().await;
        let before = guard.len();
        guard.retain(|key, _| !predicate(key));
        before - guard.len()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Remove all expired entries and return the count of removed entries.
    pub async fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let ttl = *self.ttl.read().await;
        let mut guard = self.entries.write().await;
        let before_count = guard.len();
        guard.retain(|_, entry| now - entry.inserted_at < ttl);
        before_count - guard.len()
    }
}
