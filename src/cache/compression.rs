//! Slow-Tier Payload Compression
//!
//! Values written to the file-system tier are framed as one tag byte naming
//! the algorithm followed by the (possibly compressed) payload, so a tier can
//! always read back files written with a different setting.
//!
//! # Example
//!
//! ```
//! use tiercache::cache::compression::{CompressionAlgorithm, CompressionManager};
//!
//! let manager = CompressionManager::new(CompressionAlgorithm::Lz4);
//!
//! let data = b"Hello, this is test data that should compress well!";
//! let frame = manager.compress(data).unwrap();
//!
//! let decompressed = manager.decompress(&frame).unwrap();
//! assert_eq!(decompressed.as_slice(), data);
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use serde::Deserialize;

use crate::error::{Error, Result};

// =============================================================================
// Compression Algorithm
// =============================================================================

/// Supported compression algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionAlgorithm {
    /// No compression
    #[default]
    None,
    /// LZ4 - fast compression
    Lz4,
}

impl CompressionAlgorithm {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            CompressionAlgorithm::None => "none",
            CompressionAlgorithm::Lz4 => "lz4",
        }
    }

    /// Frame tag byte
    fn tag(&self) -> u8 {
        match self {
            CompressionAlgorithm::None => 0,
            CompressionAlgorithm::Lz4 => 1,
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(CompressionAlgorithm::None),
            1 => Some(CompressionAlgorithm::Lz4),
            _ => None,
        }
    }
}

impl std::str::FromStr for CompressionAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(CompressionAlgorithm::None),
            "lz4" => Ok(CompressionAlgorithm::Lz4),
            other => Err(Error::Config(format!(
                "unknown compression {:?}, expected \"none\" or \"lz4\"",
                other
            ))),
        }
    }
}

impl std::fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// Compressor Trait
// =============================================================================

/// Trait for compression implementations
pub trait Compressor: Send + Sync {
    /// Get the algorithm identifier
    fn algorithm(&self) -> CompressionAlgorithm;

    /// Compress data
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Decompress data
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// Pass-through compressor (no compression)
pub struct NoopCompressor;

impl Compressor for NoopCompressor {
    fn algorithm(&self) -> CompressionAlgorithm {
        CompressionAlgorithm::None
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }
}

/// LZ4 block compressor
pub struct Lz4Compressor;

impl Compressor for Lz4Compressor {
    fn algorithm(&self) -> CompressionAlgorithm {
        CompressionAlgorithm::Lz4
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        lz4::block::compress(data, Some(lz4::block::CompressionMode::DEFAULT), true)
            .map_err(|e| Error::codec("compress", format!("LZ4: {}", e)))
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        lz4::block::decompress(data, None)
            .map_err(|e| Error::codec("decompress", format!("LZ4: {}", e)))
    }
}

// =============================================================================
// Compression Manager
// =============================================================================

/// Frames payloads with the configured algorithm
pub struct CompressionManager {
    algorithm: CompressionAlgorithm,
    noop: NoopCompressor,
    lz4: Lz4Compressor,
}

impl CompressionManager {
    /// Create a manager writing frames with `algorithm`
    pub fn new(algorithm: CompressionAlgorithm) -> Self {
        Self {
            algorithm,
            noop: NoopCompressor,
            lz4: Lz4Compressor,
        }
    }

    /// Algorithm used for new frames
    pub fn algorithm(&self) -> CompressionAlgorithm {
        self.algorithm
    }

    fn compressor(&self, algorithm: CompressionAlgorithm) -> &dyn Compressor {
        match algorithm {
            CompressionAlgorithm::None => &self.noop,
            CompressionAlgorithm::Lz4 => &self.lz4,
        }
    }

    /// Compress `data` into a tagged frame
    pub fn compress(&self, data: &[u8]) -> Result<Bytes> {
        let payload = self.compressor(self.algorithm).compress(data)?;
        let mut frame = BytesMut::with_capacity(payload.len() + 1);
        frame.put_u8(self.algorithm.tag());
        frame.put_slice(&payload);
        Ok(frame.freeze())
    }

    /// Decompress a tagged frame, whatever algorithm wrote it
    pub fn decompress(&self, frame: &[u8]) -> Result<Vec<u8>> {
        let (&tag, payload) = frame
            .split_first()
            .ok_or_else(|| Error::codec("decompress", "empty frame"))?;
        let algorithm = CompressionAlgorithm::from_tag(tag)
            .ok_or_else(|| Error::codec("decompress", format!("unknown frame tag {}", tag)))?;
        self.compressor(algorithm).decompress(payload)
    }
}

impl Default for CompressionManager {
    fn default() -> Self {
        Self::new(CompressionAlgorithm::default())
    }
}

// =============================================================================
// Tests
// =============================================================================
