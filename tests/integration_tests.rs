//! tiercache Integration Tests
//!
//! End-to-end scenarios over a memory tier and a real file-system tier:
//! - Routing and saturation
//! - LFU / LRU promotion and eviction
//! - Idempotence and storage-failure atomicity
//! - Property tests for the cross-tier invariants

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use tiercache::cache::{
    Cache, CacheManager, CacheTier, EvictionPolicy, FileSystemTier, MemoryTier, SharedCache,
};
use tiercache::{CacheConfig, Error};
use uuid::Uuid;

type DiskManager = CacheManager<String, String>;

fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("tiercache-it-{}", Uuid::new_v4()))
}

/// Cache over a fresh directory, removed again on drop
struct Fixture {
    cache: DiskManager,
    dir: PathBuf,
}

impl Fixture {
    fn new(fast: usize, slow: usize, policy: EvictionPolicy) -> Self {
        let dir = temp_dir();
        let slow_tier = FileSystemTier::open(slow, &dir).unwrap();
        Self {
            cache: CacheManager::new(MemoryTier::new(fast), slow_tier, policy),
            dir,
        }
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

fn key(i: u32) -> String {
    format!("Key{}", i)
}

fn value(i: u32) -> String {
    format!("Value{}", i)
}

fn put_all(cache: &mut DiskManager, keys: impl IntoIterator<Item = u32>) {
    for i in keys {
        cache.put(key(i), value(i)).unwrap();
    }
}

fn get_times(cache: &mut DiskManager, i: u32, times: usize) {
    for _ in 0..times {
        assert_eq!(cache.get(&key(i)).unwrap(), Some(value(i)));
    }
}

fn keys(list: &[u32]) -> HashSet<String> {
    list.iter().map(|i| key(*i)).collect()
}

// =============================================================================
// Routing Scenarios
// =============================================================================

mod routing_tests {
    use super::*;

    #[test]
    fn test_one_by_one_lru_saturation() {
        let mut fx = Fixture::new(1, 1, EvictionPolicy::Recency);
        let cache = &mut fx.cache;

        cache.put(key(0), value(0)).unwrap();
        cache.put(key(1), value(1)).unwrap();

        assert_eq!(cache.fast_tier().size(), 1);
        assert_eq!(cache.slow_tier().size(), 1);
        assert!(!cache.has_capacity());
        assert!(!cache.contains_key(&key(2)));

        cache.put(key(2), value(2)).unwrap();
        assert_eq!(cache.get(&key(2)).unwrap(), Some(value(2)));
        assert_eq!(cache.size(), 2);
    }

    #[test]
    fn test_slow_tier_entry_is_a_file() {
        let mut fx = Fixture::new(1, 1, EvictionPolicy::Recency);
        assert_eq!(fx.cache.put_routed(key(0), value(0)).unwrap(), CacheTier::Fast);
        assert_eq!(fx.cache.put_routed(key(1), value(1)).unwrap(), CacheTier::Slow);

        let path = fx.cache.slow_tier().entry_path(&key(1)).unwrap();
        assert!(path.starts_with(&fx.dir));
        assert!(path.exists());
    }

    #[test]
    fn test_from_config_builds_disk_cache() {
        let dir = temp_dir();
        let yaml = format!(
            "configurable-cache:\n  size:\n    memory: 1\n    file-system: 2\n  strategy: LFU\n  storage-dir: {}\n  compression: lz4\n",
            dir.display()
        );
        let config = CacheConfig::from_yaml_str(&yaml).unwrap();

        let mut cache: DiskManager = CacheManager::from_config(&config).unwrap();
        assert_eq!(cache.policy(), EvictionPolicy::Frequency);
        assert_eq!(cache.capacity(), 3);
        assert!(dir.is_dir());

        put_all(&mut cache, 0..3);
        assert_eq!(cache.get(&key(2)).unwrap(), Some(value(2)));

        fs::remove_dir_all(dir).unwrap();
    }
}

// =============================================================================
// LFU Scenarios
// =============================================================================

mod lfu_tests {
    use super::*;

    #[test]
    fn test_frequent_slow_entries_are_promoted() {
        let mut fx = Fixture::new(2, 2, EvictionPolicy::Frequency);
        let cache = &mut fx.cache;

        put_all(cache, 1..=4);
        assert_eq!(cache.tier_of(&key(1)), Some(CacheTier::Fast));
        assert_eq!(cache.tier_of(&key(2)), Some(CacheTier::Fast));
        assert_eq!(cache.tier_of(&key(3)), Some(CacheTier::Slow));
        assert_eq!(cache.tier_of(&key(4)), Some(CacheTier::Slow));

        get_times(cache, 3, 2);
        get_times(cache, 4, 2);

        assert_eq!(cache.tier_of(&key(3)), Some(CacheTier::Fast));
        assert_eq!(cache.tier_of(&key(4)), Some(CacheTier::Fast));
        assert_eq!(cache.tier_of(&key(1)), Some(CacheTier::Slow));
        assert_eq!(cache.tier_of(&key(2)), Some(CacheTier::Slow));

        let tracker = cache.tracker();
        assert_eq!(tracker.priority(&key(1)).unwrap(), 1);
        assert_eq!(tracker.priority(&key(2)).unwrap(), 1);
        assert_eq!(tracker.priority(&key(3)).unwrap(), 3);
        assert_eq!(tracker.priority(&key(4)).unwrap(), 3);
        assert_eq!(cache.metrics().promotions, 2);
    }

    #[test]
    fn test_rarely_used_set() {
        let mut fx = Fixture::new(2, 2, EvictionPolicy::Frequency);
        let cache = &mut fx.cache;

        put_all(cache, 1..=4);
        get_times(cache, 1, 2);
        get_times(cache, 2, 2);
        get_times(cache, 3, 1);

        assert_eq!(cache.tracker().rarely_used(), keys(&[4]));
    }

    #[test]
    fn test_least_frequent_entry_is_evicted() {
        let mut fx = Fixture::new(2, 2, EvictionPolicy::Frequency);
        let cache = &mut fx.cache;

        put_all(cache, 1..=4);
        get_times(cache, 4, 2);
        get_times(cache, 1, 2);
        get_times(cache, 2, 2);
        get_times(cache, 3, 1);

        cache.put(key(5), value(5)).unwrap();

        assert!(!cache.contains_key(&key(3)));
        for i in [1, 2, 4, 5] {
            assert!(cache.contains_key(&key(i)), "{} missing", key(i));
        }
        assert_eq!(cache.size(), 4);
        assert_eq!(cache.metrics().evictions, 1);
    }

    #[test]
    fn test_frequency_counts_touches() {
        let mut fx = Fixture::new(2, 2, EvictionPolicy::Frequency);
        let cache = &mut fx.cache;

        put_all(cache, 1..=1);
        get_times(cache, 1, 4);
        cache.put(key(1), value(1)).unwrap();

        assert_eq!(cache.tracker().priority(&key(1)).unwrap(), 6);
    }
}

// =============================================================================
// LRU Scenarios
// =============================================================================

mod lru_tests {
    use super::*;

    #[test]
    fn test_oldest_entry_is_evicted() {
        let mut fx = Fixture::new(2, 2, EvictionPolicy::Recency);
        let cache = &mut fx.cache;

        put_all(cache, 1..=5);
        assert!(!cache.contains_key(&key(1)));
        for i in 2..=5 {
            assert!(cache.contains_key(&key(i)));
        }

        cache.clear().unwrap();
        assert_eq!(cache.size(), 0);
        assert!(cache.tracker().is_empty());

        put_all(cache, 1..=4);
        get_times(cache, 1, 1);
        cache.put(key(5), value(5)).unwrap();

        assert!(cache.contains_key(&key(1)));
        assert!(!cache.contains_key(&key(2)));
    }

    #[test]
    fn test_recency_priorities_increase() {
        let mut fx = Fixture::new(2, 2, EvictionPolicy::Recency);
        let cache = &mut fx.cache;

        put_all(cache, 1..=2);
        let before = cache.tracker().priority(&key(1)).unwrap();
        get_times(cache, 1, 1);
        let after = cache.tracker().priority(&key(1)).unwrap();

        assert!(after > before);
        assert!(after > cache.tracker().priority(&key(2)).unwrap());
    }

    #[test]
    fn test_clear_removes_entry_files() {
        let mut fx = Fixture::new(1, 3, EvictionPolicy::Recency);
        put_all(&mut fx.cache, 0..4);
        assert_eq!(fs::read_dir(&fx.dir).unwrap().count(), 3);

        fx.cache.clear().unwrap();
        assert_eq!(fs::read_dir(&fx.dir).unwrap().count(), 0);
    }
}

// =============================================================================
// Idempotence and Failure Tests
// =============================================================================

mod failure_tests {
    use super::*;
    use assert_matches::assert_matches;

    /// Slow tier whose writes always fail
    struct ReadOnlyTier {
        inner: MemoryTier<String, String>,
    }

    impl Cache<String, String> for ReadOnlyTier {
        fn put(&mut self, _key: String, _value: String) -> tiercache::Result<()> {
            Err(Error::Storage {
                operation: "write",
                path: PathBuf::from("/read-only"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }

        fn get(&mut self, key: &String) -> tiercache::Result<Option<String>> {
            self.inner.get(key)
        }

        fn remove(&mut self, key: &String) -> tiercache::Result<()> {
            self.inner.remove(key)
        }

        fn contains_key(&self, key: &String) -> bool {
            self.inner.contains_key(key)
        }

        fn clear(&mut self) -> tiercache::Result<()> {
            self.inner.clear()
        }

        fn size(&self) -> usize {
            self.inner.size()
        }

        fn capacity(&self) -> usize {
            self.inner.capacity()
        }
    }

    #[test]
    fn test_remove_and_clear_are_idempotent() {
        let mut fx = Fixture::new(1, 1, EvictionPolicy::Recency);
        let cache = &mut fx.cache;

        cache.remove(&key(9)).unwrap();
        cache.clear().unwrap();
        assert_eq!(cache.size(), 0);

        put_all(cache, 0..2);
        cache.remove(&key(1)).unwrap();
        cache.remove(&key(1)).unwrap();
        assert_eq!(cache.size(), 1);
        assert!(!cache.tracker().contains_key(&key(1)));
    }

    #[test]
    fn test_failed_slow_write_changes_nothing() {
        let mut cache = CacheManager::new(
            MemoryTier::new(1),
            ReadOnlyTier {
                inner: MemoryTier::new(1),
            },
            EvictionPolicy::Frequency,
        );
        cache.put(key(0), value(0)).unwrap();

        let err = cache.put(key(1), value(1)).unwrap_err();
        assert!(err.is_storage_failure());
        assert_eq!(cache.size(), 1);
        assert!(!cache.contains_key(&key(1)));
        assert_eq!(cache.tracker().len(), 1);
        assert_eq!(cache.tracker().priority(&key(0)).unwrap(), 1);
        assert_eq!(cache.metrics().storage_failures, 1);
    }

    #[test]
    fn test_lost_entry_file_is_a_storage_failure() {
        let mut fx = Fixture::new(1, 1, EvictionPolicy::Recency);
        put_all(&mut fx.cache, 0..2);

        let path = fx.cache.slow_tier().entry_path(&key(1)).unwrap();
        fs::write(&path, b"\x00not json").unwrap();

        let err = fx.cache.get(&key(1)).unwrap_err();
        assert_matches!(err, Error::Codec { .. });
        assert!(fx.cache.contains_key(&key(1)));
    }

    #[test]
    fn test_both_tiers_empty_capacity_rejects_put() {
        let mut fx = Fixture::new(0, 0, EvictionPolicy::Recency);
        assert_matches!(
            fx.cache.put(key(0), value(0)),
            Err(Error::PreconditionViolation(_))
        );
    }
}

// =============================================================================
// Shared Handle Tests
// =============================================================================

mod shared_tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_shared_disk_cache_across_threads() {
        let dir = temp_dir();
        let slow_tier = FileSystemTier::open(4, &dir).unwrap();
        let shared: SharedCache<String, String> = SharedCache::new(CacheManager::new(
            MemoryTier::new(2),
            slow_tier,
            EvictionPolicy::Recency,
        ));

        let handles: Vec<_> = (0..3u32)
            .map(|t| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for i in 0..30u32 {
                        let k = key((t + i) % 10);
                        shared.put(k.clone(), value(i)).unwrap();
                        shared.get(&k).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.size(), 6);
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 4);
        fs::remove_dir_all(dir).unwrap();
    }
}

// =============================================================================
// Property Tests
// =============================================================================

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Put(u8, u16),
        Get(u8),
        Remove(u8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            5 => (0u8..12, any::<u16>()).prop_map(|(k, v)| Op::Put(k, v)),
            4 => (0u8..12).prop_map(Op::Get),
            1 => (0u8..12).prop_map(Op::Remove),
        ]
    }

    fn policy_strategy() -> impl Strategy<Value = EvictionPolicy> {
        prop_oneof![Just(EvictionPolicy::Recency), Just(EvictionPolicy::Frequency)]
    }

    type Memory = CacheManager<u8, u16, MemoryTier<u8, u16>, MemoryTier<u8, u16>>;

    fn check_invariants(cache: &Memory) -> Result<(), TestCaseError> {
        let fast = cache.fast_tier();
        let slow = cache.slow_tier();
        prop_assert!(fast.size() <= fast.capacity());
        prop_assert!(slow.size() <= slow.capacity());

        for key in fast.keys() {
            prop_assert!(!slow.contains_key(key), "{} in both tiers", key);
        }

        let resident: HashSet<u8> = fast.keys().chain(slow.keys()).copied().collect();
        let tracked: HashSet<u8> = cache.tracker().keys().copied().collect();
        prop_assert_eq!(resident, tracked);
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_invariants_hold(
            fast in 1usize..4,
            slow in 0usize..4,
            policy in policy_strategy(),
            ops in prop::collection::vec(op_strategy(), 1..80),
        ) {
            let mut cache: Memory =
                CacheManager::new(MemoryTier::new(fast), MemoryTier::new(slow), policy);
            let mut model = std::collections::HashMap::new();

            for op in ops {
                match op {
                    Op::Put(k, v) => {
                        let before: Vec<(u8, u64)> = cache
                            .tracker()
                            .keys()
                            .map(|key| (*key, cache.tracker().priority(key).unwrap()))
                            .collect();
                        let min = before.iter().map(|(_, p)| *p).min();

                        cache.put(k, v).unwrap();
                        model.insert(k, v);

                        // At most one key was evicted and it held the minimum
                        let evicted: Vec<_> = before
                            .iter()
                            .filter(|(key, _)| !cache.contains_key(key))
                            .collect();
                        prop_assert!(evicted.len() <= 1);
                        for (key, priority) in evicted {
                            prop_assert_eq!(Some(*priority), min);
                            model.remove(key);
                        }
                        prop_assert_eq!(cache.get(&k).unwrap(), Some(v));
                    }
                    Op::Get(k) => {
                        let got = cache.get(&k).unwrap();
                        prop_assert_eq!(got, model.get(&k).copied());
                    }
                    Op::Remove(k) => {
                        cache.remove(&k).unwrap();
                        model.remove(&k);
                        prop_assert!(!cache.contains_key(&k));
                    }
                }
                check_invariants(&cache)?;
            }
        }

        #[test]
        fn prop_frequency_counts_every_touch(touches in 1usize..50) {
            let mut cache: Memory = CacheManager::new(
                MemoryTier::new(2),
                MemoryTier::new(2),
                EvictionPolicy::Frequency,
            );
            cache.put(7, 0).unwrap();
            for _ in 1..touches {
                cache.get(&7).unwrap();
            }
            prop_assert_eq!(cache.tracker().priority(&7).unwrap(), touches as u64);
        }
    }
}
