//! Explanation cache.
//!
//! [`ExplanationCache`] is a fixed-capacity, strictly least-recently-used
//! map from a [`Fingerprint`] to a finished explanation. It lives for the
//! lifetime of the hosting process and starts empty on every restart.
//!
//! There is no TTL and no invalidation API: eviction is purely capacity
//! driven. Recency is refreshed by [`get`](ExplanationCache::get) hits and by
//! re-inserting an existing key; [`contains`](ExplanationCache::contains)
//! never touches recency.

pub mod key;

pub use key::{Fingerprint, derive_key};

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use lru::LruCache;

use crate::telemetry;
use crate::{ClarityError, Result};

/// Default number of cached explanations.
pub const DEFAULT_CACHE_CAPACITY: usize = 200;

const DEFAULT_CAPACITY: NonZeroUsize = NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap();

/// Bounded LRU cache of explanations keyed by [`Fingerprint`].
///
/// Interior mutability makes the cache shareable behind an `Arc` across
/// concurrent requests; every operation holds the lock only for the map
/// access itself.
pub struct ExplanationCache {
    entries: Mutex<LruCache<Fingerprint, String>>,
}

impl ExplanationCache {
    /// Create a cache with the default capacity (200).
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(LruCache::new(DEFAULT_CAPACITY)),
        }
    }

    /// Create a cache holding at most `capacity` entries.
    ///
    /// A zero capacity is rejected.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            ClarityError::Configuration("cache capacity must be greater than zero".to_string())
        })?;
        Ok(Self {
            entries: Mutex::new(LruCache::new(capacity)),
        })
    }

    /// Look up an explanation, marking it most-recently-used on a hit.
    pub fn get(&self, key: &Fingerprint) -> Option<String> {
        let hit = self.lock().get(key).cloned();
        if hit.is_some() {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
        } else {
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
        }
        hit
    }

    /// Insert (or overwrite) an explanation.
    ///
    /// An existing key is refreshed to most-recently-used with the new
    /// value. A new key on a full cache evicts the least-recently-used entry
    /// first.
    pub fn insert(&self, key: Fingerprint, value: String) {
        if let Some((evicted, _)) = self.lock().push(key.clone(), value) {
            if evicted != key {
                tracing::debug!(key = %evicted, "evicted least recently used explanation");
            }
        }
    }

    /// Whether `key` is cached. Does not affect recency.
    pub fn contains(&self, key: &Fingerprint) -> bool {
        self.lock().contains(key)
    }

    /// Number of cached explanations.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fixed maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    // A poisoned lock only means another request panicked mid-access; the
    // map itself is still structurally valid.
    fn lock(&self) -> MutexGuard<'_, LruCache<Fingerprint, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ExplanationCache {
    fn default() -> Self {
        Self::new()
    }
}
