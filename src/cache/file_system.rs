//! File-System Tier - Durable Slow Cache
//!
//! Each value is serialized to JSON, framed by the compression manager and
//! written to its own file under the tier directory.
//!
//! # Design
//!
//! - In-memory index (key -> file name) is the visible mapping
//! - New file is written before the index changes, so a failed write never
//!   leaves a partial entry behind
//! - File names are random UUIDs; a key never reuses an old file
//! - The index is not persisted. Entry files the index does not know about
//!   (left over from an earlier process) are deleted on open and on clear

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::fs;
use std::hash::Hash;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::compression::{CompressionAlgorithm, CompressionManager};
use super::Cache;
use crate::error::{Error, Result};

/// File extension for entry files
const ENTRY_EXTENSION: &str = "entry";

/// File-system tier configuration
#[derive(Debug, Clone)]
pub struct FileTierConfig {
    /// Maximum number of entries
    pub capacity: usize,
    /// Directory holding entry files
    pub dir: PathBuf,
    /// Compression for newly written entries
    pub compression: CompressionAlgorithm,
}

impl Default for FileTierConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            dir: PathBuf::from("./temp"),
            compression: CompressionAlgorithm::None,
        }
    }
}

/// Slow tier storing one file per entry
pub struct FileSystemTier<K, V> {
    /// Location handle (file name) per key
    index: HashMap<K, String>,
    /// Entry directory
    dir: PathBuf,
    /// Maximum number of entries
    capacity: usize,
    /// Payload framing
    compression: CompressionManager,
    _value: PhantomData<fn() -> V>,
}

impl<K, V> FileSystemTier<K, V>
where
    K: Eq + Hash + Debug,
    V: Serialize + DeserializeOwned,
{
    /// Open an uncompressed tier over `dir`, creating the directory if needed
    pub fn open(capacity: usize, dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(FileTierConfig {
            capacity,
            dir: dir.into(),
            compression: CompressionAlgorithm::None,
        })
    }

    /// Open a tier with custom configuration
    pub fn with_config(config: FileTierConfig) -> Result<Self> {
        fs::create_dir_all(&config.dir)
            .map_err(|e| Error::storage("create directory", &config.dir, e))?;

        let tier = Self {
            index: HashMap::with_capacity(config.capacity),
            dir: config.dir,
            capacity: config.capacity,
            compression: CompressionManager::new(config.compression),
            _value: PhantomData,
        };

        let swept = tier.sweep_orphans()?;
        if swept > 0 {
            info!(dir = %tier.dir.display(), swept, "Deleted stale entry files");
        }
        Ok(tier)
    }

    /// Entry directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Compression used for new entries
    pub fn compression(&self) -> CompressionAlgorithm {
        self.compression.algorithm()
    }

    /// Iterate over resident keys
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.index.keys()
    }

    /// Path of the file backing `key`, if resident
    pub fn entry_path(&self, key: &K) -> Option<PathBuf> {
        self.index.get(key).map(|name| self.dir.join(name))
    }

    /// Delete every entry file in the directory that no key maps to.
    ///
    /// Only `*.entry` files are touched. Returns how many were deleted.
    fn sweep_orphans(&self) -> Result<usize> {
        let known: HashSet<&str> = self.index.values().map(String::as_str).collect();
        let listing = match fs::read_dir(&self.dir) {
            Ok(listing) => listing,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(Error::storage("list", &self.dir, e)),
        };

        let mut swept = 0;
        for entry in listing {
            let entry = entry.map_err(|e| Error::storage("list", &self.dir, e))?;
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != ENTRY_EXTENSION) {
                continue;
            }
            let tracked = path
                .file_name()
                .and_then(|name| name.to_str())
                .map_or(false, |name| known.contains(name));
            if !tracked && path.is_file() {
                delete_entry_file(&path)?;
                swept += 1;
            }
        }
        Ok(swept)
    }

    fn encode(&self, value: &V) -> Result<bytes::Bytes> {
        let json = serde_json::to_vec(value).map_err(|e| Error::codec("encode", e))?;
        self.compression.compress(&json)
    }

    fn decode(&self, frame: &[u8]) -> Result<V> {
        let json = self.compression.decompress(frame)?;
        serde_json::from_slice(&json).map_err(|e| Error::codec("decode", e))
    }
}

/// Delete an entry file. A file that is already gone counts as deleted.
fn delete_entry_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Entry file deleted");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "Entry file was already missing");
            Ok(())
        }
        Err(e) => Err(Error::storage("delete", path, e)),
    }
}

impl<K, V> Cache<K, V> for FileSystemTier<K, V>
where
    K: Eq + Hash + Debug,
    V: Serialize + DeserializeOwned,
{
    fn put(&mut self, key: K, value: V) -> Result<()> {
        let frame = self.encode(&value)?;

        let file_name = format!("{}.{}", Uuid::new_v4(), ENTRY_EXTENSION);
        let path = self.dir.join(&file_name);
        if let Err(e) = fs::write(&path, &frame) {
            // Best effort: do not leave a truncated file behind
            let _ = fs::remove_file(&path);
            return Err(Error::storage("write", path, e));
        }

        if let Some(superseded) = self.index.insert(key, file_name) {
            let old_path = self.dir.join(superseded);
            if let Err(e) = delete_entry_file(&old_path) {
                warn!(error = %e, "Failed to delete superseded entry file");
            }
        }

        Ok(())
    }

    fn get(&mut self, key: &K) -> Result<Option<V>> {
        let Some(path) = self.entry_path(key) else {
            return Ok(None);
        };
        let frame = fs::read(&path).map_err(|e| Error::storage("read", &path, e))?;
        self.decode(&frame).map(Some)
    }

    fn remove(&mut self, key: &K) -> Result<()> {
        if let Some(path) = self.entry_path(key) {
            delete_entry_file(&path)?;
            self.index.remove(key);
        }
        Ok(())
    }

    fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    fn clear(&mut self) -> Result<()> {
        let dir = &self.dir;
        let mut first_error = None;

        // Entries whose file survives stay mapped
        self.index.retain(|_, file_name| match delete_entry_file(&dir.join(file_name.as_str())) {
            Ok(()) => false,
            Err(e) => {
                first_error.get_or_insert(e);
                true
            }
        });

        if let Err(e) = self.sweep_orphans() {
            first_error.get_or_insert(e);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn size(&self) -> usize {
        self.index.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

// =============================================================================
// Tests
// =============================================================================
