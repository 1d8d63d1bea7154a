//! Two-Tier Object Cache
//!
//! A bounded key → value cache split across two tiers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    CacheManager                      │
//! │  ┌──────────────┐              ┌──────────────────┐ │
//! │  │  Fast tier   │  ◄─ swap ─►  │    Slow tier     │ │
//! │  │ (MemoryTier) │              │ (FileSystemTier) │ │
//! │  └──────────────┘              └──────────────────┘ │
//! │            ▲                            ▲            │
//! │            └──── PriorityTracker ───────┘            │
//! │                  (LRU / LFU)                         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Every store implements [`Cache`], so the manager itself can be used
//! wherever a single tier can.

pub mod compression;
mod file_system;
mod manager;
mod memory;
mod metrics;
mod policy;
mod shared;
mod tracker;

pub use compression::CompressionAlgorithm;
pub use file_system::{FileSystemTier, FileTierConfig};
pub use manager::{CacheManager, CacheTier};
pub use memory::MemoryTier;
pub use metrics::{CacheMetrics, MetricsSnapshot};
pub use policy::{monotonic_nanos, EvictionPolicy};
pub use shared::SharedCache;
pub use tracker::PriorityTracker;

use crate::error::Result;

/// Contract shared by both tiers and the manager.
///
/// `size` and `capacity` count entries. Removing an absent key is a no-op,
/// and `get` distinguishes "absent" (`Ok(None)`) from a failed read.
pub trait Cache<K, V> {
    /// Insert or overwrite an entry
    fn put(&mut self, key: K, value: V) -> Result<()>;

    /// Look up an entry
    fn get(&mut self, key: &K) -> Result<Option<V>>;

    /// Remove an entry if present
    fn remove(&mut self, key: &K) -> Result<()>;

    /// Check if an entry is resident
    fn contains_key(&self, key: &K) -> bool;

    /// Remove every entry
    fn clear(&mut self) -> Result<()>;

    /// Number of resident entries
    fn size(&self) -> usize;

    /// Maximum number of entries
    fn capacity(&self) -> usize;

    /// Room for at least one more entry
    fn has_capacity(&self) -> bool {
        self.size() < self.capacity()
    }
}
