//! tiercache - Two-Tier Object Cache
//!
//! A bounded key → value cache with a fast memory tier and a slow file-system
//! tier. One priority table (recency or frequency) drives eviction across
//! both tiers and promotes slow-tier entries that have become more valuable
//! than the least valuable fast-tier entry.
//!
//! # Modules
//!
//! - [`cache`] - Tier contract, tiers, policies and the cache manager
//! - [`config`] - YAML configuration
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```
//! use tiercache::cache::{Cache, CacheManager, CacheTier, EvictionPolicy, MemoryTier};
//!
//! let mut cache: CacheManager<&str, u32, MemoryTier<&str, u32>, MemoryTier<&str, u32>> =
//!     CacheManager::new(MemoryTier::new(1), MemoryTier::new(1), EvictionPolicy::Frequency);
//!
//! assert_eq!(cache.put_routed("a", 1).unwrap(), CacheTier::Fast);
//! assert_eq!(cache.put_routed("b", 2).unwrap(), CacheTier::Slow);
//!
//! // "b" is now used more often than "a" and moves up
//! assert_eq!(cache.get(&"b").unwrap(), Some(2));
//! assert_eq!(cache.tier_of(&"b"), Some(CacheTier::Fast));
//! ```

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{Cache, CacheManager, CacheTier, EvictionPolicy, SharedCache};
pub use config::CacheConfig;
pub use error::{Error, ErrorKind, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
