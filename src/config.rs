//! Cache configuration
//!
//! Loaded from YAML under a `configurable-cache` root:
//!
//! ```yaml
//! configurable-cache:
//!   size:
//!     memory: 100
//!     file-system: 1000
//!   strategy: LRU
//!   storage-dir: ./temp
//!   compression: none
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cache::{CompressionAlgorithm, EvictionPolicy, FileTierConfig};
use crate::error::{Error, Result};

/// Default fast-tier capacity
pub const DEFAULT_MEMORY_SIZE: usize = 100;

/// Default slow-tier capacity
pub const DEFAULT_FILE_SYSTEM_SIZE: usize = 1000;

/// Default slow-tier directory
pub const DEFAULT_STORAGE_DIR: &str = "./temp";

/// Per-tier capacities
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SizeConfig {
    /// Fast-tier capacity
    pub memory: usize,
    /// Slow-tier capacity
    pub file_system: usize,
}

impl Default for SizeConfig {
    fn default() -> Self {
        Self {
            memory: DEFAULT_MEMORY_SIZE,
            file_system: DEFAULT_FILE_SYSTEM_SIZE,
        }
    }
}

/// Tiered cache configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CacheConfig {
    /// Tier capacities
    pub size: SizeConfig,

    /// Policy selector, `LRU` or `LFU`
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Directory holding slow-tier entry files
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Compression for slow-tier entries
    #[serde(default)]
    pub compression: CompressionAlgorithm,
}

fn default_strategy() -> String {
    EvictionPolicy::LRU.to_string()
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STORAGE_DIR)
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(rename = "configurable-cache")]
    cache: CacheConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            size: SizeConfig::default(),
            strategy: default_strategy(),
            storage_dir: default_storage_dir(),
            compression: CompressionAlgorithm::None,
        }
    }
}

impl CacheConfig {
    /// Parse configuration from a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(yaml)
            .map_err(|e| Error::Config(format!("invalid configuration: {}", e)))?;
        Ok(file.cache)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path)?;
        let file: ConfigFile = serde_yaml::from_str(&yaml).map_err(|source| Error::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(file.cache)
    }

    /// Reject configurations that can never hold an entry
    pub fn validate(&self) -> Result<()> {
        if self.size.memory == 0 && self.size.file_system == 0 {
            return Err(Error::Config(
                "size.memory and size.file-system cannot both be 0".to_string(),
            ));
        }
        if self.storage_dir.as_os_str().is_empty() {
            return Err(Error::Config("storage-dir cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Policy named by `strategy`, falling back to LRU
    pub fn eviction_policy(&self) -> EvictionPolicy {
        EvictionPolicy::from_selector(&self.strategy)
    }

    /// Slow-tier settings
    pub fn file_tier(&self) -> FileTierConfig {
        FileTierConfig {
            capacity: self.size.file_system,
            dir: self.storage_dir.clone(),
            compression: self.compression,
        }
    }
}
