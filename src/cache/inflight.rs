//! Bookkeeping for in-flight fetches.
//!
//! At most one network fetch per cache key is outstanding at a time. A fetch
//! is stored as a `Shared` future so every concurrent caller for the same key
//! awaits the same eventual result. Entries are cleared on every settle path
//! (success and failure); a leaked entry would permanently block re-fetching
//! its key.

use std::collections::HashMap;

use futures::future::{BoxFuture, Shared};
use serde_json::Value;
use tracing::debug;

use crate::error::ClientError;

/// A cloneable handle to a pending fetch.
pub(crate) type SharedFetch = Shared<BoxFuture<'static, Result<Value, ClientError>>>;

/// Map of cache key to pending fetch.
#[derive(Default)]
pub(crate) struct InflightTracker {
    pending: HashMap<String, SharedFetch>,
}

impl InflightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate a pending fetch with `key`.
    pub fn register(&mut self, key: &str, fetch: SharedFetch) {
        debug!(key = %key, "registering in-flight fetch");
        self.pending.insert(key.to_string(), fetch);
    }

    /// Return the pending fetch for `key`, if any.
    pub fn lookup(&self, key: &str) -> Option<SharedFetch> {
        self.pending.get(key).cloned()
    }

    /// Remove the entry for `key`, whether or not one exists.
    pub fn clear(&mut self, key: &str) {
        self.pending.remove(key);
    }

    /// Number of fetches currently outstanding.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use serde_json::json;
    use tokio_test::assert_ok;

    fn dummy_fetch() -> SharedFetch {
        async { Ok(json!("value")) }.boxed().shared()
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let mut tracker = InflightTracker::new();
        assert!(tracker.lookup("k").is_none());

        tracker.register("k", dummy_fetch());
        assert_eq!(tracker.len(), 1);

        let pending = tracker.lookup("k").expect("registered fetch");
        let value = tokio_test::assert_ok!(pending.await);
        assert_eq!(value, json!("value"));
    }

    #[tokio::test]
    async fn test_shared_handles_resolve_to_same_value() {
        let mut tracker = InflightTracker::new();
        tracker.register("k", dummy_fetch());

        let a = tracker.lookup("k").unwrap();
        let b = tracker.lookup("k").unwrap();
        let (ra, rb) = tokio::join!(a, b);
        assert_eq!(ra.unwrap(), rb.unwrap());
    }

    #[tokio::test]
    async fn test_clear_is_unconditional() {
        let mut tracker = InflightTracker::new();
        tracker.register("k", dummy_fetch());
        tracker.clear("k");
        assert!(tracker.is_empty());
        // Clearing an absent key is a no-op
        tracker.clear("k");
        assert!(tracker.is_empty());
    }
}
