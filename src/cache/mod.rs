//! Injected valuation cache.
//!
//! The pure engine owns no state; caching is a service-layer concern with
//! an explicit interface and TTL policy, so callers can swap or disable it.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::core::types::ValuationResult;

pub trait ValuationCache: Send + Sync {
    fn get(&self, key: &str) -> Option<ValuationResult>;
    fn put(&self, key: String, value: ValuationResult);
}

/// Bounded LRU cache whose entries expire after a fixed TTL.
pub struct TtlValuationCache {
    entries: Mutex<LruCache<String, CachedValuation>>,
    ttl: Duration,
}

struct CachedValuation {
    value: ValuationResult,
    stored_at: Instant,
}

impl TtlValuationCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity clamped to >= 1");
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }
}

impl ValuationCache for TtlValuationCache {
    fn get(&self, key: &str) -> Option<ValuationResult> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let hit = entries
            .get(key)
            .map(|cached| (cached.stored_at.elapsed() < self.ttl, cached.value.clone()));
        match hit {
            Some((true, value)) => Some(value),
            Some((false, _)) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    fn put(&self, key: String, value: ValuationResult) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.put(
            key,
            CachedValuation {
                value,
                stored_at: Instant::now(),
            },
        );
    }
}

/// Cache disabled: every lookup misses.
pub struct NoopValuationCache;

impl ValuationCache for NoopValuationCache {
    fn get(&self, _key: &str) -> Option<ValuationResult> {
        None
    }

    fn put(&self, _key: String, _value: ValuationResult) {}
}
