//! Cache Manager - Unified Two-Tier Cache
//!
//! Orchestrates the fast (memory) and slow (file system) tiers behind one
//! [`Cache`] contract. Puts fill the fast tier before the slow tier; once both
//! are full the globally least valuable key is evicted. A slow-tier hit
//! is promoted when it has overtaken the least valuable fast-tier resident.

use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info};

use super::file_system::FileSystemTier;
use super::memory::MemoryTier;
use super::metrics::{CacheMetrics, MetricsSnapshot};
use super::policy::EvictionPolicy;
use super::tracker::PriorityTracker;
use super::Cache;
use crate::config::CacheConfig;
use crate::error::{Error, Result};

/// Cache tier enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTier {
    /// Fast - memory
    Fast,
    /// Slow - file system
    Slow,
}

impl std::fmt::Display for CacheTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheTier::Fast => write!(f, "fast (memory)"),
            CacheTier::Slow => write!(f, "slow (file system)"),
        }
    }
}

/// Unified cache manager
///
/// Owns both tiers and the priority tracker exclusively; the accessors only
/// hand out shared references.
pub struct CacheManager<K, V, F = MemoryTier<K, V>, S = FileSystemTier<K, V>> {
    /// Fast tier
    fast: F,
    /// Slow tier
    slow: S,
    /// Priority table for every resident key
    tracker: PriorityTracker<K>,
    /// Metrics collector
    metrics: CacheMetrics,
    _value: PhantomData<fn() -> V>,
}

impl<K, V> CacheManager<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone + Serialize + DeserializeOwned,
{
    /// Build a memory + file-system cache from configuration
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        let fast = MemoryTier::new(config.size.memory);
        let slow = FileSystemTier::with_config(config.file_tier())?;
        info!(
            memory = config.size.memory,
            file_system = config.size.file_system,
            dir = %config.storage_dir.display(),
            "Tiered cache created"
        );
        Ok(Self::new(fast, slow, config.eviction_policy()))
    }
}

impl<K, V, F, S> CacheManager<K, V, F, S>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
    F: Cache<K, V>,
    S: Cache<K, V>,
{
    /// Create a cache manager over two tiers
    pub fn new(fast: F, slow: S, policy: EvictionPolicy) -> Self {
        Self {
            fast,
            slow,
            tracker: PriorityTracker::new(policy),
            metrics: CacheMetrics::new(),
            _value: PhantomData,
        }
    }

    /// Get reference to the fast tier
    pub fn fast_tier(&self) -> &F {
        &self.fast
    }

    /// Get reference to the slow tier
    pub fn slow_tier(&self) -> &S {
        &self.slow
    }

    /// Get reference to the priority tracker
    pub fn tracker(&self) -> &PriorityTracker<K> {
        &self.tracker
    }

    /// Active eviction policy
    pub fn policy(&self) -> EvictionPolicy {
        self.tracker.policy()
    }

    /// Get metrics snapshot
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Zero every counter
    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    /// Tier currently holding `key`
    pub fn tier_of(&self, key: &K) -> Option<CacheTier> {
        if self.fast.contains_key(key) {
            Some(CacheTier::Fast)
        } else if self.slow.contains_key(key) {
            Some(CacheTier::Slow)
        } else {
            None
        }
    }

    /// Put an entry and report which tier received it
    pub fn put_routed(&mut self, key: K, value: V) -> Result<CacheTier> {
        let result = self.route_put(key.clone(), value);
        let tier = self.observe("put", &key, result)?;

        self.tracker.put(&key);
        self.metrics.record_put();
        debug!(key = ?key, tier = %tier, "Entry cached");
        Ok(tier)
    }

    fn route_put(&mut self, key: K, value: V) -> Result<CacheTier> {
        if self.fast.contains_key(&key) {
            self.fast.put(key, value)?;
            return Ok(CacheTier::Fast);
        }

        if self.fast.has_capacity() {
            let stale_copy = self.slow.contains_key(&key);
            self.fast.put(key.clone(), value)?;
            if stale_copy {
                // The key moves up; drop the slow copy so only one tier owns it
                if let Err(e) = self.slow.remove(&key) {
                    self.undo_write(CacheTier::Fast, &key);
                    return Err(e);
                }
                debug!(key = ?key, "Overwrite moved entry into the fast tier");
            }
            return Ok(CacheTier::Fast);
        }

        if self.slow.contains_key(&key) || self.slow.has_capacity() {
            self.slow.put(key, value)?;
            return Ok(CacheTier::Slow);
        }

        self.recache(key, value)
    }

    /// Evict the globally least valuable key and store the new entry in the
    /// tier it occupied.
    fn recache(&mut self, key: K, value: V) -> Result<CacheTier> {
        let victim = self.tracker.key_for_replace()?;
        let tier = self.tier_of(&victim).ok_or_else(|| {
            Error::PreconditionViolation(format!(
                "eviction candidate {:?} is not resident in either tier",
                victim
            ))
        })?;

        // New entry first: a failed write leaves the victim in place
        self.tier_mut_put(tier, key.clone(), value)?;
        if let Err(e) = self.tier_mut_remove(tier, &victim) {
            self.undo_write(tier, &key);
            return Err(e);
        }

        self.tracker.remove(&victim);
        self.metrics.record_eviction();
        info!(victim = ?victim, key = ?key, tier = %tier, "Evicted least valuable entry");
        Ok(tier)
    }

    /// Promote `slow_key` if its priority beats a fast-tier resident from the
    /// global rarely-used set.
    fn maybe_promote(&mut self, slow_key: &K) -> Result<()> {
        let candidate = self
            .tracker
            .rarely_used()
            .into_iter()
            .find(|key| self.fast.contains_key(key));
        let Some(candidate) = candidate else {
            return Ok(());
        };

        let priority = self.tracker.priority(slow_key)?;
        let candidate_priority = self.tracker.priority(&candidate)?;
        if priority <= candidate_priority {
            return Ok(());
        }

        self.swap(&candidate, slow_key)?;
        self.metrics.record_promotion();
        info!(
            promoted = ?slow_key,
            demoted = ?candidate,
            "Entry transferred from slow tier to fast tier"
        );
        Ok(())
    }

    /// Exchange a fast-tier entry with a slow-tier entry.
    ///
    /// Both values are read before anything changes. Copies are written into
    /// their new tiers before the originals are removed, and every applied
    /// step is undone if a later one fails.
    fn swap(&mut self, fast_key: &K, slow_key: &K) -> Result<()> {
        let fast_value = self.fast.get(fast_key)?.ok_or_else(|| {
            Error::PreconditionViolation(format!("{:?} is not in the fast tier", fast_key))
        })?;
        let slow_value = self.slow.get(slow_key)?.ok_or_else(|| {
            Error::PreconditionViolation(format!("{:?} is not in the slow tier", slow_key))
        })?;

        self.slow.put(fast_key.clone(), fast_value.clone())?;

        if let Err(e) = self.fast.put(slow_key.clone(), slow_value) {
            self.undo_write(CacheTier::Slow, fast_key);
            return Err(e);
        }

        if let Err(e) = self.fast.remove(fast_key) {
            self.undo_write(CacheTier::Fast, slow_key);
            self.undo_write(CacheTier::Slow, fast_key);
            return Err(e);
        }

        if let Err(e) = self.slow.remove(slow_key) {
            self.undo_write(CacheTier::Fast, slow_key);
            self.undo_write(CacheTier::Slow, fast_key);
            if let Err(restore) = self.fast.put(fast_key.clone(), fast_value) {
                error!(key = ?fast_key, error = %restore, "Failed to restore fast-tier entry");
            }
            return Err(e);
        }

        Ok(())
    }

    fn tier_mut_put(&mut self, tier: CacheTier, key: K, value: V) -> Result<()> {
        match tier {
            CacheTier::Fast => self.fast.put(key, value),
            CacheTier::Slow => self.slow.put(key, value),
        }
    }

    fn tier_mut_remove(&mut self, tier: CacheTier, key: &K) -> Result<()> {
        match tier {
            CacheTier::Fast => self.fast.remove(key),
            CacheTier::Slow => self.slow.remove(key),
        }
    }

    /// Roll back a write made earlier in the current operation
    fn undo_write(&mut self, tier: CacheTier, key: &K) {
        if let Err(e) = self.tier_mut_remove(tier, key) {
            error!(key = ?key, tier = %tier, error = %e, "Rollback failed");
        }
    }

    /// Log and count a failed operation before handing it back
    fn observe<T>(&self, operation: &str, key: &K, result: Result<T>) -> Result<T> {
        result.map_err(|e| {
            if e.is_storage_failure() {
                self.metrics.record_storage_failure();
            }
            error!(operation, key = ?key, error = %e, "Cache operation failed");
            e
        })
    }

    fn lookup(&mut self, key: &K) -> Result<Option<V>> {
        if self.fast.contains_key(key) {
            let value = self.fast.get(key)?;
            self.tracker.put(key);
            self.metrics.record_fast_hit();
            return Ok(value);
        }

        if self.slow.contains_key(key) {
            let previous = self.tracker.priority(key)?;
            let value = self.slow.get(key)?;
            self.tracker.put(key);
            if let Err(e) = self.maybe_promote(key) {
                // A failed get leaves the priority table as it was
                self.tracker.restore(key, previous);
                return Err(e);
            }
            self.metrics.record_slow_hit();
            return Ok(value);
        }

        self.metrics.record_miss();
        debug!(key = ?key, "Cache miss");
        Ok(None)
    }

    fn evict_key(&mut self, key: &K) -> Result<()> {
        if self.fast.contains_key(key) {
            self.fast.remove(key)?;
        }
        if self.slow.contains_key(key) {
            self.slow.remove(key)?;
        }
        self.tracker.remove(key);
        Ok(())
    }
}

impl<K, V, F, S> Cache<K, V> for CacheManager<K, V, F, S>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
    F: Cache<K, V>,
    S: Cache<K, V>,
{
    fn put(&mut self, key: K, value: V) -> Result<()> {
        self.put_routed(key, value).map(|_| ())
    }

    fn get(&mut self, key: &K) -> Result<Option<V>> {
        let result = self.lookup(key);
        self.observe("get", key, result)
    }

    fn remove(&mut self, key: &K) -> Result<()> {
        let result = self.evict_key(key);
        self.observe("remove", key, result)?;
        debug!(key = ?key, "Entry removed");
        Ok(())
    }

    fn contains_key(&self, key: &K) -> bool {
        self.fast.contains_key(key) || self.slow.contains_key(key)
    }

    /// Clear both tiers and the tracker, even if one tier fails.
    ///
    /// Keys that survive a failed tier clear stay tracked; the first failure
    /// is returned once everything has been attempted.
    fn clear(&mut self) -> Result<()> {
        let fast = self.fast.clear();
        let slow = self.slow.clear();

        if fast.is_ok() && slow.is_ok() {
            self.tracker.clear();
            info!("Cache was successfully cleared");
            return Ok(());
        }

        let (fast_tier, slow_tier) = (&self.fast, &self.slow);
        self.tracker
            .retain(|key| fast_tier.contains_key(key) || slow_tier.contains_key(key));

        let result = fast.and(slow);
        if let Err(e) = &result {
            if e.is_storage_failure() {
                self.metrics.record_storage_failure();
            }
            error!(error = %e, "Failed to clear cache");
        }
        result
    }

    fn size(&self) -> usize {
        self.fast.size() + self.slow.size()
    }

    fn capacity(&self) -> usize {
        self.fast.capacity() + self.slow.capacity()
    }

    fn has_capacity(&self) -> bool {
        self.fast.has_capacity() || self.slow.has_capacity()
    }
}

// =============================================================================
// Tests
// =============================================================================
