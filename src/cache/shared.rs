//! Shared Cache Handle
//!
//! Cloneable handle serializing every operation through one lock. A put that
//! evicts, or a get that promotes, completes before the next call starts.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use super::file_system::FileSystemTier;
use super::manager::{CacheManager, CacheTier};
use super::memory::MemoryTier;
use super::metrics::MetricsSnapshot;
use super::Cache;
use crate::error::Result;

/// Thread-safe handle to a [`CacheManager`]
pub struct SharedCache<K, V, F = MemoryTier<K, V>, S = FileSystemTier<K, V>> {
    inner: Arc<Mutex<CacheManager<K, V, F, S>>>,
}

impl<K, V, F, S> Clone for SharedCache<K, V, F, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V, F, S> SharedCache<K, V, F, S>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
    F: Cache<K, V>,
    S: Cache<K, V>,
{
    /// Wrap a manager
    pub fn new(manager: CacheManager<K, V, F, S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }

    pub fn put(&self, key: K, value: V) -> Result<()> {
        self.inner.lock().put(key, value)
    }

    /// Put an entry and report which tier received it
    pub fn put_routed(&self, key: K, value: V) -> Result<CacheTier> {
        self.inner.lock().put_routed(key, value)
    }

    pub fn get(&self, key: &K) -> Result<Option<V>> {
        self.inner.lock().get(key)
    }

    pub fn remove(&self, key: &K) -> Result<()> {
        self.inner.lock().remove(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.lock().contains_key(key)
    }

    pub fn clear(&self) -> Result<()> {
        self.inner.lock().clear()
    }

    pub fn size(&self) -> usize {
        self.inner.lock().size()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    pub fn has_capacity(&self) -> bool {
        self.inner.lock().has_capacity()
    }

    pub fn tier_of(&self, key: &K) -> Option<CacheTier> {
        self.inner.lock().tier_of(key)
    }

    /// Get metrics snapshot
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.lock().metrics()
    }

    pub fn reset_metrics(&self) {
        self.inner.lock().reset_metrics()
    }

    /// Lock the manager for inspection across several reads
    pub fn lock(&self) -> MutexGuard<'_, CacheManager<K, V, F, S>> {
        self.inner.lock()
    }
}

// =============================================================================
// Tests
// =============================================================================
