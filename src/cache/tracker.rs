//! Priority Tracker
//!
//! Keeps the key → priority table for every key resident in either tier and
//! answers which keys are the least valuable.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use super::policy::EvictionPolicy;
use crate::error::{Error, Result};

/// Key → priority table driven by an [`EvictionPolicy`]
#[derive(Debug, Clone)]
pub struct PriorityTracker<K> {
    /// Current priority per tracked key
    table: HashMap<K, u64>,
    /// Active policy
    policy: EvictionPolicy,
}

impl<K> PriorityTracker<K>
where
    K: Eq + Hash + Clone + Debug,
{
    /// Create an empty tracker
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            table: HashMap::new(),
            policy,
        }
    }

    /// Register an access to `key` under the active policy
    pub fn put(&mut self, key: &K) {
        self.policy.touch(key, &mut self.table);
    }

    /// Check if `key` is tracked
    pub fn contains_key(&self, key: &K) -> bool {
        self.table.contains_key(key)
    }

    /// Stop tracking `key`
    pub fn remove(&mut self, key: &K) {
        self.table.remove(key);
    }

    /// Drop every tracked key
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Keep only the keys for which `keep` returns true
    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) {
        self.table.retain(|key, _| keep(key));
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Check if nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Active policy
    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Iterate over tracked keys
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.table.keys()
    }

    /// Priority of a tracked key
    pub fn priority(&self, key: &K) -> Result<u64> {
        self.table.get(key).copied().ok_or_else(|| {
            Error::PreconditionViolation(format!("key {:?} is not tracked", key))
        })
    }

    /// Put back a priority read earlier with [`priority`](Self::priority)
    pub fn restore(&mut self, key: &K, priority: u64) {
        if let Some(current) = self.table.get_mut(key) {
            *current = priority;
        }
    }

    /// Smallest priority in the table
    fn min_priority(&self) -> Option<u64> {
        self.table.values().copied().min()
    }

    /// One key holding the minimum priority.
    ///
    /// Among ties the first minimum in iteration order wins, which is stable
    /// for a given table state. Callers must not rely on which tied key it is.
    pub fn key_for_replace(&self) -> Result<K> {
        self.table
            .iter()
            .min_by_key(|(_, priority)| **priority)
            .map(|(key, _)| key.clone())
            .ok_or_else(|| {
                Error::PreconditionViolation("no tracked key to replace".to_string())
            })
    }

    /// Every key tied at the minimum priority
    pub fn rarely_used(&self) -> HashSet<K> {
        let Some(min) = self.min_priority() else {
            return HashSet::new();
        };
        self.table
            .iter()
            .filter(|(_, priority)| **priority == min)
            .map(|(key, _)| key.clone())
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
