//! Cache Eviction Policies
//!
//! Recency (LRU) and frequency (LFU) priority assignment. A policy never
//! keeps per-key state of its own: everything it knows about a key lives in
//! the priority table it is handed on each touch.

use std::collections::HashMap;
use std::hash::Hash;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use once_cell::sync::Lazy;

use crate::error::{Error, Result};

/// Process-wide epoch for recency readings
static CLOCK_EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// Last reading handed out by [`monotonic_nanos`]
static LAST_READING: AtomicU64 = AtomicU64::new(0);

/// Nanoseconds since [`CLOCK_EPOCH`], strictly increasing across calls.
///
/// Two calls inside the same clock tick would otherwise return the same
/// value; the second one is bumped past the first.
pub fn monotonic_nanos() -> u64 {
    let now = CLOCK_EPOCH.elapsed().as_nanos() as u64;
    let mut last = LAST_READING.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_READING.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(observed) => last = observed,
        }
    }
}

/// Eviction policy
///
/// Selected once when the cache is built. Larger priority means more
/// valuable, so the key with the smallest priority is evicted first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EvictionPolicy {
    /// Least recently used: priority is the time of the last touch
    #[default]
    Recency,
    /// Least frequently used: priority is the number of touches
    Frequency,
}

impl EvictionPolicy {
    /// Configuration selector for the recency policy
    pub const LRU: &'static str = "LRU";
    /// Configuration selector for the frequency policy
    pub const LFU: &'static str = "LFU";

    /// Resolve a configuration selector, falling back to LRU on anything
    /// that is not exactly `"LRU"` or `"LFU"`.
    pub fn from_selector(selector: &str) -> Self {
        match selector.parse() {
            Ok(policy) => policy,
            Err(_) => {
                tracing::warn!(
                    selector,
                    "Unknown eviction strategy, expected \"LFU\" or \"LRU\"; using \"LRU\""
                );
                EvictionPolicy::Recency
            }
        }
    }

    /// Selector string for this policy
    pub fn name(&self) -> &'static str {
        match self {
            EvictionPolicy::Recency => Self::LRU,
            EvictionPolicy::Frequency => Self::LFU,
        }
    }

    /// Record an access to `key`, creating its table entry if needed
    pub fn touch<K>(&self, key: &K, table: &mut HashMap<K, u64>)
    where
        K: Eq + Hash + Clone,
    {
        match self {
            EvictionPolicy::Recency => {
                let now = monotonic_nanos();
                match table.get_mut(key) {
                    Some(priority) => *priority = now,
                    None => {
                        table.insert(key.clone(), now);
                    }
                }
            }
            EvictionPolicy::Frequency => match table.get_mut(key) {
                Some(count) => *count = count.saturating_add(1),
                None => {
                    table.insert(key.clone(), 1);
                }
            },
        }
    }
}

impl FromStr for EvictionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            Self::LRU => Ok(EvictionPolicy::Recency),
            Self::LFU => Ok(EvictionPolicy::Frequency),
            other => Err(Error::Config(format!(
                "unknown eviction strategy {:?}, expected \"LFU\" or \"LRU\"",
                other
            ))),
        }
    }
}

impl std::fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Tests
// =============================================================================
