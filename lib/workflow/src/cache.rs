//! Short-lived store of the latest result per node.
//!
//! Entries expire a fixed time after they are written. Expired entries are
//! never returned; they are dropped on the next read of that key or by
//! [`ResultCache::purge_expired`].

use callflow_core::{Clock, NodeId, SystemClock};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::trace;

/// Default entry lifetime, in seconds.
pub const DEFAULT_TTL_SECONDS: u64 = 3600;

/// A cached node result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResult {
    /// The step result.
    pub result: JsonValue,
    /// When the result was written.
    pub timestamp: DateTime<Utc>,
    /// When the entry stops being served.
    pub expires_at: DateTime<Utc>,
}

impl CachedResult {
    /// Returns true once `now` has reached the expiry time.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Returns the lifetime left at `now`, zero once expired.
    #[must_use]
    pub fn remaining_ttl(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }
}

/// Result cache keyed by node ID.
///
/// Cloning shares the underlying entries.
#[derive(Clone)]
pub struct ResultCache {
    entries: Arc<RwLock<HashMap<NodeId, CachedResult>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ResultCache {
    /// Creates a cache with the default lifetime and the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(std::time::Duration::from_secs(DEFAULT_TTL_SECONDS))
    }

    /// Creates a cache with the given entry lifetime.
    #[must_use]
    pub fn with_ttl(ttl: std::time::Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::from_std(ttl).unwrap_or(Duration::MAX),
            clock: Arc::new(SystemClock),
        }
    }

    /// Uses the given clock for timestamps and expiry.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the entry lifetime.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stores a result, replacing any earlier one for the node.
    pub fn put(&self, node_id: &NodeId, result: JsonValue) -> CachedResult {
        let now = self.clock.now();
        let entry = CachedResult {
            result,
            timestamp: now,
            expires_at: now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(node_id.clone(), entry.clone());
        trace!(%node_id, expires_at = %entry.expires_at, "result cached");
        entry
    }

    /// Returns the live entry for a node, if any.
    #[must_use]
    pub fn get(&self, node_id: &NodeId) -> Option<CachedResult> {
        let now = self.clock.now();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(node_id) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.clone()),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // A concurrent put may have refreshed the entry since the read.
        if entries.get(node_id).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(node_id);
            trace!(%node_id, "expired result evicted");
        }
        entries.get(node_id).filter(|entry| !entry.is_expired(now)).cloned()
    }

    /// Removes every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Returns the number of stored entries, including expired ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callflow_core::ManualClock;
    use serde_json::json;

    fn cache_with_clock() -> (ResultCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        (ResultCache::new().with_clock(clock.clone()), clock)
    }

    #[test]
    fn miss_when_absent() {
        let (cache, _) = cache_with_clock();
        assert!(cache.get(&NodeId::new("n1")).is_none());
    }

    #[test]
    fn hit_until_ttl_then_miss() {
        let (cache, clock) = cache_with_clock();
        let node_id = NodeId::new("n1");
        cache.put(&node_id, json!({"status": "generated"}));

        clock.advance_secs(3599);
        let hit = cache.get(&node_id).expect("still live");
        assert_eq!(hit.result["status"], "generated");
        assert_eq!(hit.remaining_ttl(clock.now()), Duration::seconds(1));

        clock.advance_secs(1);
        assert!(cache.get(&node_id).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn put_overwrites_and_restarts_ttl() {
        let (cache, clock) = cache_with_clock();
        let node_id = NodeId::new("n1");
        cache.put(&node_id, json!(1));
        clock.advance_secs(3000);
        cache.put(&node_id, json!(2));
        clock.advance_secs(3000);

        let entry = cache.get(&node_id).expect("refreshed entry");
        assert_eq!(entry.result, json!(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn purge_removes_only_expired() {
        let (cache, clock) = cache_with_clock();
        cache.put(&NodeId::new("old"), json!("old"));
        clock.advance_secs(1800);
        cache.put(&NodeId::new("new"), json!("new"));
        clock.advance_secs(1800);

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&NodeId::new("new")).is_some());
    }

    #[test]
    fn custom_ttl() {
        let clock = Arc::new(ManualClock::default());
        let cache = ResultCache::with_ttl(std::time::Duration::from_secs(10)).with_clock(clock.clone());
        let entry = cache.put(&NodeId::new("n1"), JsonValue::Null);

        assert_eq!(entry.expires_at - entry.timestamp, Duration::seconds(10));
        clock.advance_secs(10);
        assert!(cache.get(&NodeId::new("n1")).is_none());
    }

    #[test]
    fn clones_share_entries() {
        let (cache, _) = cache_with_clock();
        let other = cache.clone();
        cache.put(&NodeId::new("n1"), json!(true));
        assert!(other.get(&NodeId::new("n1")).is_some());
    }

    #[test]
    fn entry_serializes_timestamps() {
        let (cache, _) = cache_with_clock();
        let entry = cache.put(&NodeId::new("n1"), json!({"a": 1}));
        let value = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(value["result"]["a"], 1);
        assert!(value["timestamp"].is_string());
        assert!(value["expires_at"].is_string());
    }
}
