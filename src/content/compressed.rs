//! Compressed content blobs.
//!
//! Mapping and filter fragments are held zstd-compressed so that templates
//! stay cheap to clone, compare and ship. A SHA-256 digest of the
//! uncompressed bytes is computed once and backs equality and hashing.
//!
//! Wire format: the compressed frame as a length-prefixed blob.

use crate::core::constants::{DEFAULT_COMPRESSION_LEVEL, MAX_DECOMPRESSED_SIZE, ZSTD_MAGIC};
use crate::core::{ContentError, DecodeError, Readable, Writeable};
use crate::wire::{StreamInput, StreamOutput};
use sha2::{Digest, Sha256};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::Read;
use std::sync::Arc;

/// Compression configuration
#[derive(Debug, Clone)]
pub struct CompressionConfig {
    /// Compression level (1-22)
    pub level: i32,
    /// Maximum decompressed size (for DoS protection)
    pub max_decompressed_size: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_COMPRESSION_LEVEL,
            max_decompressed_size: MAX_DECOMPRESSED_SIZE,
        }
    }
}

/// zstd compressor for content blobs
#[derive(Debug, Clone, Default)]
pub struct Compressor {
    config: CompressionConfig,
}

impl Compressor {
    /// Create a compressor with custom config
    pub fn with_config(config: CompressionConfig) -> Self {
        Self { config }
    }

    /// Set compression level
    pub fn set_level(&mut self, level: i32) {
        self.config.level = level.clamp(1, 22);
    }

    /// Get compression level
    pub fn level(&self) -> i32 {
        self.config.level
    }

    /// Largest output [`Compressor::decompress`] accepts
    pub fn max_decompressed_size(&self) -> usize {
        self.config.max_decompressed_size
    }

    /// Compress data into a single zstd frame
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>, ContentError> {
        zstd::encode_all(data, self.config.level)
            .map_err(|e| ContentError::CompressionFailed(e.to_string()))
    }

    /// Decompress data, enforcing the configured size limit
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, ContentError> {
        self.decompress_with_limit(data, self.config.max_decompressed_size)
    }

    /// Decompress data with explicit size limit
    pub fn decompress_with_limit(&self, data: &[u8], max_size: usize) -> Result<Vec<u8>, ContentError> {
        let decoder = zstd::Decoder::new(data)
            .map_err(|e| ContentError::DecompressionFailed(e.to_string()))?;

        // Read one byte past the limit so oversize input is detected without
        // inflating all of it.
        let mut output = Vec::new();
        decoder
            .take(max_size as u64 + 1)
            .read_to_end(&mut output)
            .map_err(|e| ContentError::DecompressionFailed(e.to_string()))?;

        if output.len() > max_size {
            return Err(ContentError::SizeExceeded {
                size: output.len(),
                limit: max_size,
            });
        }

        Ok(output)
    }
}

/// An immutable compressed JSON fragment.
///
/// The decompression limit of the compressor that built the blob travels
/// with it, so [`CompressedContent::uncompressed`] honours the same bound.
#[derive(Clone)]
pub struct CompressedContent {
    compressed: Arc<[u8]>,
    digest: [u8; 32],
    max_decompressed_size: usize,
}

impl CompressedContent {
    /// Compress a structured tree.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ContentError> {
        let raw = serde_json::to_vec(value)?;
        Self::from_uncompressed(&Compressor::default(), &raw)
    }

    /// Accept either a zstd frame or raw JSON bytes.
    ///
    /// Raw bytes are validated as JSON and then compressed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ContentError> {
        Self::from_bytes_with(&Compressor::default(), bytes)
    }

    /// [`CompressedContent::from_bytes`] with an explicit compressor.
    pub fn from_bytes_with(compressor: &Compressor, bytes: &[u8]) -> Result<Self, ContentError> {
        if is_compressed(bytes) {
            Self::from_compressed_with(compressor, bytes)
        } else {
            serde_json::from_slice::<serde_json::Value>(bytes)?;
            Self::from_uncompressed(compressor, bytes)
        }
    }

    /// Wrap an existing zstd frame, verifying that it inflates.
    pub fn from_compressed(bytes: &[u8]) -> Result<Self, ContentError> {
        Self::from_compressed_with(&Compressor::default(), bytes)
    }

    fn from_compressed_with(compressor: &Compressor, bytes: &[u8]) -> Result<Self, ContentError> {
        if !is_compressed(bytes) {
            return Err(ContentError::DecompressionFailed(
                "missing zstd frame header".to_string(),
            ));
        }
        let raw = compressor.decompress(bytes)?;
        Ok(Self {
            compressed: Arc::from(bytes),
            digest: Sha256::digest(&raw).into(),
            max_decompressed_size: compressor.max_decompressed_size(),
        })
    }

    fn from_uncompressed(compressor: &Compressor, raw: &[u8]) -> Result<Self, ContentError> {
        let compressed = compressor.compress(raw)?;
        Ok(Self {
            compressed: Arc::from(compressed),
            digest: Sha256::digest(raw).into(),
            max_decompressed_size: compressor.max_decompressed_size().max(raw.len()),
        })
    }

    /// The compressed frame.
    pub fn compressed(&self) -> &[u8] {
        &self.compressed
    }

    /// Inflate to the original JSON bytes.
    pub fn uncompressed(&self) -> Result<Vec<u8>, ContentError> {
        Compressor::default().decompress_with_limit(&self.compressed, self.max_decompressed_size)
    }

    /// Inflate and parse.
    pub fn to_json(&self) -> Result<serde_json::Value, ContentError> {
        Ok(serde_json::from_slice(&self.uncompressed()?)?)
    }

    /// True if both handles share the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.compressed, &other.compressed)
    }
}

/// True if `bytes` start with a zstd frame header.
pub fn is_compressed(bytes: &[u8]) -> bool {
    bytes.starts_with(&ZSTD_MAGIC)
}

impl PartialEq for CompressedContent {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.digest == other.digest
    }
}

impl Eq for CompressedContent {}

impl Hash for CompressedContent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.digest.hash(state);
    }
}

impl fmt::Debug for CompressedContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.digest[..6].iter().map(|b| format!("{b:02x}")).collect();
        f.debug_struct("CompressedContent")
            .field("compressed_len", &self.compressed.len())
            .field("digest", &prefix)
            .finish()
    }
}

impl Writeable for CompressedContent {
    fn write_to(&self, out: &mut StreamOutput) {
        out.write_bytes(&self.compressed);
    }
}

impl Readable for CompressedContent {
    fn read_from(input: &mut StreamInput<'_>) -> Result<Self, DecodeError> {
        Ok(Self::from_compressed(input.read_bytes()?)?)
    }
}
