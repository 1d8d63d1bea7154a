//! Memory Tier - RAM-based Fast Cache
//!
//! Plain hashmap store. Capacity is reported, not enforced: deciding what to
//! do when the tier is full is the manager's job.

use std::collections::HashMap;
use std::hash::Hash;

use super::Cache;
use crate::error::Result;

/// Fast tier backed by a `HashMap`
#[derive(Debug, Clone)]
pub struct MemoryTier<K, V> {
    /// Stored values
    storage: HashMap<K, V>,
    /// Maximum number of entries
    capacity: usize,
}

impl<K, V> MemoryTier<K, V>
where
    K: Eq + Hash,
{
    /// Create an empty memory tier holding up to `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            storage: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    /// Iterate over resident keys
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.storage.keys()
    }
}

impl<K, V> Cache<K, V> for MemoryTier<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn put(&mut self, key: K, value: V) -> Result<()> {
        self.storage.insert(key, value);
        Ok(())
    }

    fn get(&mut self, key: &K) -> Result<Option<V>> {
        Ok(self.storage.get(key).cloned())
    }

    fn remove(&mut self, key: &K) -> Result<()> {
        self.storage.remove(key);
        Ok(())
    }

    fn contains_key(&self, key: &K) -> bool {
        self.storage.contains_key(key)
    }

    fn clear(&mut self) -> Result<()> {
        self.storage.clear();
        Ok(())
    }

    fn size(&self) -> usize {
        self.storage.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

// =============================================================================
// Tests
// =============================================================================
