use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Default number of responses kept per session
pub const DEFAULT_CAPACITY: usize = 10;

/// Largest capacity a configured cache may ask for
pub const MAX_CAPACITY: usize = 1_000;

#[derive(Debug, Clone)]
pub struct CachedEntry<V> {
    pub value: V,
    pub cached_at: DateTime<Utc>,
    last_access: u64,
}

impl<V> CachedEntry<V> {
    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        match ttl {
            Some(ttl) => Utc::now() - self.cached_at > ttl,
            None => false,
        }
    }
}

/// Fixed-capacity cache that evicts the least recently accessed entry.
///
/// Entries never expire unless a TTL is configured.
#[derive(Debug)]
pub struct LruCache<V> {
    capacity: usize,
    ttl: Option<Duration>,
    entries: HashMap<String, CachedEntry<V>>,
    /// Access tick -> key, oldest first. Holds exactly one tick per entry.
    recency: BTreeMap<u64, String>,
    clock: u64,
}

impl<V: Clone> LruCache<V> {
    /// Storage grows on demand; only a small slice of `capacity` is reserved up front.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl: None,
            entries: HashMap::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            recency: BTreeMap::new(),
            clock: 0,
        }
    }

    pub fn with_ttl(capacity: usize, ttl: Option<Duration>) -> Self {
        let mut cache = Self::new(capacity);
        cache.ttl = ttl;
        cache
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Look up a key, marking it most recently used
    pub fn get(&mut self, key: &str) -> Option<V> {
        let expired = self.entries.get(key)?.is_expired(self.ttl);
        if expired {
            debug!(key = key, "Cache entry expired");
            self.remove(key);
            return None;
        }
        let now = self.tick();
        let entry = self.entries.get_mut(key)?;
        let previous = std::mem::replace(&mut entry.last_access, now);
        let value = entry.value.clone();
        if let Some(key) = self.recency.remove(&previous) {
            self.recency.insert(now, key);
        }
        Some(value)
    }

    /// Insert or replace a value, evicting the least recently used entry when full
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_lru();
        }
        let now = self.tick();
        self.recency.insert(now, key.clone());
        let replaced = self.entries.insert(
            key,
            CachedEntry {
                value,
                cached_at: Utc::now(),
                last_access: now,
            },
        );
        if let Some(old) = replaced {
            self.recency.remove(&old.last_access);
        }
    }

    fn evict_lru(&mut self) {
        if let Some((_, key)) = self.recency.pop_first() {
            debug!(key = %key, "Evicting least recently used cache entry");
            self.entries.remove(&key);
        }
    }

    /// Check for a key without touching its recency
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(&entry.last_access);
        Some(entry.value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
