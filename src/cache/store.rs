//! In-memory TTL store for API responses.
//!
//! Holds the most recent successful value per key. Entries are immutable once
//! created and replaced wholesale on update. Expired entries are removed
//! lazily at read time; there is no background sweep. Time is measured with
//! `tokio::time::Instant` so tests can drive expiry on a paused runtime.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

/// A single cached response.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached JSON value.
    pub data: Value,
    /// When the entry was created.
    pub created_at: Instant,
    /// When the entry stops being fresh.
    pub expires_at: Instant,
}

/// Key-value store with per-entry expiry.
#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    max_entries: usize,
}

impl CacheStore {
    /// Create an empty store bounded to `max_entries` (clamped to at least 1
    /// to keep the eviction loop finite).
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Look up a fresh value. Returns `None` for missing keys; expired
    /// entries are removed and reported as absent (lazy eviction).
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if now <= entry.expires_at => Some(entry.data.clone()),
            Some(_) => {
                debug!(key = %key, "cache entry expired, removing");
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Look up a value regardless of expiry. Never evicts.
    pub fn get_stale(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|entry| entry.data.clone())
    }

    /// Store `data` under `key` for `ttl`, overwriting any prior entry.
    ///
    /// At capacity, expired entries are evicted first and then the oldest by
    /// creation time.
    pub fn set(&mut self, key: &str, data: Value, ttl: Duration) {
        let now = Instant::now();
        if !self.entries.contains_key(key) {
            self.evict_expired(now);
            while self.entries.len() >= self.max_entries {
                if !self.evict_oldest() {
                    break;
                }
            }
        }
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                data,
                created_at: now,
                expires_at: now + ttl,
            },
        );
    }

    /// Remove a single key. Returns whether an entry was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Remove every entry whose key starts with `prefix`. Returns the number
    /// removed; a no-op when nothing matches.
    pub fn delete_by_prefix(&mut self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        before - self.entries.len()
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries currently stored (fresh and stale alike).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // -- private helpers ---------------------------------------------------

    fn evict_expired(&mut self, now: Instant) {
        self.entries.retain(|_, entry| now <= entry.expires_at);
    }

    fn evict_oldest(&mut self) -> bool {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.created_at)
            .map(|(key, _)| key.clone());
        match oldest {
            Some(key) => {
                debug!(key = %key, "evicting oldest cache entry at capacity");
                self.entries.remove(&key);
                true
            }
            None => false,
        }
    }
}
