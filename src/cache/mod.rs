//! Response cache with TTL expiry, request de-duplication, and
//! stale-while-revalidate.
//!
//! [`ResponseCache`] sits between resource modules and the network client.
//! [`ResponseCache::fetch_with_cache`] is the single read entry point:
//!
//! 1. a fresh cached value is returned without touching the network;
//! 2. with stale-while-revalidate enabled, an expired value is returned
//!    immediately while a detached task refreshes the entry;
//! 3. a fetch already in flight for the key is shared with every caller;
//! 4. otherwise the supplied fetcher runs once and populates the cache.
//!
//! The cache is an explicitly constructed object, cheap to clone, and injected
//! into the modules that need it. It performs no retries, no timeouts, and no
//! negative caching; resilience belongs to the injected fetcher.

pub mod inflight;
pub mod keys;
pub mod store;

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::error::Result;

use inflight::{InflightTracker, SharedFetch};
use store::CacheStore;

pub use keys::cache_key;

/// Per-request options for [`ResponseCache::fetch_with_cache`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// TTL for the entry written on success. `None` uses the configured
    /// default.
    pub ttl: Option<Duration>,
    /// Serve an expired entry immediately and refresh it in the background.
    pub stale_while_revalidate: bool,
}

impl FetchOptions {
    /// Override the TTL for this request.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Enable stale-while-revalidate for this request.
    pub fn with_stale_while_revalidate(mut self) -> Self {
        self.stale_while_revalidate = true;
        self
    }
}

/// Aggregate counters, readable at any time via [`ResponseCache::stats`].
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    /// Entries currently stored (fresh and stale alike).
    pub entries: usize,
    /// Fetches answered from a fresh entry.
    pub hits: u64,
    /// Fetches answered from a stale entry while revalidating.
    pub stale_hits: u64,
    /// Fetches that had to go to the network (or join an in-flight fetch).
    pub misses: u64,
    /// Fetches that joined an already in-flight fetch instead of starting
    /// their own.
    pub coalesced: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    stale_hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
}

struct CacheInner {
    store: Mutex<CacheStore>,
    inflight: Mutex<InflightTracker>,
    counters: Counters,
    default_ttl: Duration,
    enabled: bool,
}

/// Shared response cache. Cloning is cheap and clones observe the same
/// entries.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Arc<CacheInner>,
}

impl ResponseCache {
    /// Create a cache from config.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                store: Mutex::new(CacheStore::new(config.max_entries)),
                inflight: Mutex::new(InflightTracker::new()),
                counters: Counters::default(),
                default_ttl: Duration::from_secs(config.ttl_secs),
                enabled: config.enabled,
            }),
        }
    }

    /// Create a cache with default config.
    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default())
    }

    /// Fetch the value for `key`, preferring the cache over the network.
    ///
    /// `fetcher` is only invoked when no fresh value and no in-flight fetch
    /// exist for `key`. Its error is surfaced unchanged to the caller and
    /// never cached. Once started, a fetch runs to completion and populates
    /// the cache even if every caller stops awaiting; the in-flight entry is
    /// cleared on every settle path so a failure never wedges the key.
    pub async fn fetch_with_cache<F, Fut>(
        &self,
        key: &str,
        fetcher: F,
        options: FetchOptions,
    ) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        if !self.inner.enabled {
            return fetcher().await;
        }
        let ttl = options.ttl.unwrap_or(self.inner.default_ttl);

        if let Some(value) = self.lock_store().get(key) {
            self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "cache hit");
            return Ok(value);
        }

        if options.stale_while_revalidate {
            if let Some(stale) = self.lock_store().get_stale(key) {
                self.inner
                    .counters
                    .stale_hits
                    .fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "serving stale value, revalidating in background");
                let revalidation = self.join_or_start(key, fetcher, ttl);
                let owned_key = key.to_string();
                tokio::spawn(async move {
                    // Callers on the stale path already got their answer; a
                    // late failure is logged, never thrown, and the stale
                    // entry stays in place.
                    if let Err(err) = revalidation.await {
                        warn!(key = %owned_key, error = %err, "background revalidation failed");
                    }
                });
                return Ok(stale);
            }
        }

        self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);
        self.join_or_start(key, fetcher, ttl).await
    }

    /// Invalidate cached entries. Each pattern is either an exact key or a
    /// `prefix*` wildcard matching every key that starts with the prefix.
    ///
    /// Mutation paths call this after a successful write so cached list and
    /// pagination variants of the resource are all dropped at once.
    pub fn invalidate(&self, patterns: &[&str]) {
        let mut store = self.lock_store();
        for pattern in patterns {
            match pattern.strip_suffix('*') {
                Some(prefix) => {
                    let removed = store.delete_by_prefix(prefix);
                    debug!(prefix = %prefix, removed, "invalidated cache entries by prefix");
                }
                None => {
                    if store.delete(pattern) {
                        debug!(key = %pattern, "invalidated cache entry");
                    }
                }
            }
        }
    }

    /// Read a fresh value without fetching.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock_store().get(key)
    }

    /// Read a value regardless of expiry, without fetching.
    pub fn get_stale(&self, key: &str) -> Option<Value> {
        self.lock_store().get_stale(key)
    }

    /// Store a value directly. Mostly useful for seeding caches in tests and
    /// for write-through after mutations that return the updated entity.
    pub fn set(&self, key: &str, value: Value, ttl: Duration) {
        self.lock_store().set(key, value, ttl);
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock_store().clear();
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.lock_store().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock_store().is_empty()
    }

    /// Current counters and entry count.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.inner.counters.hits.load(Ordering::Relaxed),
            stale_hits: self.inner.counters.stale_hits.load(Ordering::Relaxed),
            misses: self.inner.counters.misses.load(Ordering::Relaxed),
            coalesced: self.inner.counters.coalesced.load(Ordering::Relaxed),
        }
    }

    // -- private helpers ---------------------------------------------------

    /// Join the in-flight fetch for `key`, or start one.
    ///
    /// Foreground fetches and background revalidations both come through
    /// here, so the two always collapse into a single network call per key.
    fn join_or_start<F, Fut>(&self, key: &str, fetcher: F, ttl: Duration) -> SharedFetch
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let mut inflight = self
            .inner
            .inflight
            .lock()
            .expect("inflight tracker lock poisoned");
        if let Some(pending) = inflight.lookup(key) {
            self.inner.counters.coalesced.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "joining in-flight fetch");
            return pending;
        }

        let fut = fetcher();
        let inner = Arc::clone(&self.inner);
        let owned_key = key.to_string();
        let shared: SharedFetch = async move {
            let result = fut.await;
            if let Ok(value) = &result {
                inner
                    .store
                    .lock()
                    .expect("cache store lock poisoned")
                    .set(&owned_key, value.clone(), ttl);
            }
            // Runs for success and failure alike; a leaked entry would block
            // every future fetch for this key.
            inner
                .inflight
                .lock()
                .expect("inflight tracker lock poisoned")
                .clear(&owned_key);
            result
        }
        .boxed()
        .shared();

        inflight.register(key, shared.clone());
        // Drive the fetch to completion even if every caller stops awaiting;
        // late arrivals still benefit from the populated entry.
        tokio::spawn(shared.clone().map(|_| ()));
        shared
    }

    fn lock_store(&self) -> std::sync::MutexGuard<'_, CacheStore> {
        self.inner.store.lock().expect("cache store lock poisoned")
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entries", &self.len())
            .field("enabled", &self.inner.enabled)
            .finish_non_exhaustive()
    }
}
