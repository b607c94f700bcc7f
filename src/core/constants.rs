//! Protocol constants for the template wire and content formats.
//!
//! Transport version ids are fixed once released and MUST NOT be changed;
//! new thresholds are only ever appended above [`CURRENT`].

use super::version::TransportVersion;

// =============================================================================
// TRANSPORT VERSIONS
// =============================================================================

/// Oldest peer dialect still supported. Templates carry settings, mappings
/// and aliases only.
pub const MINIMUM_COMPATIBLE: TransportVersion = TransportVersion::from_id(8_000_099);

/// Lifecycle added to templates. "Disabled" is carried by the explicit-null
/// flag because the lifecycle has no enabled field yet.
pub const LIFECYCLE_ADDED: TransportVersion = TransportVersion::from_id(8_500_020);

/// Lifecycle gains its own enabled flag; written as a plain optional value.
pub const LIFECYCLE_ENABLED_FLAG: TransportVersion = TransportVersion::from_id(8_500_057);

/// Data stream options added to templates (tri-state encoded).
pub const DATA_STREAM_OPTIONS_ADDED: TransportVersion = TransportVersion::from_id(8_805_000);

/// Version spoken by this build.
pub const CURRENT: TransportVersion = TransportVersion::from_id(8_810_000);

// =============================================================================
// CONTENT NAMES
// =============================================================================

/// Reserved single-type envelope name; reduced away before mapping comparison.
pub const SINGLE_MAPPING_NAME: &str = "_doc";

/// Structured-text field names, in emission order.
pub const SETTINGS_FIELD: &str = "settings";
/// See [`SETTINGS_FIELD`].
pub const MAPPINGS_FIELD: &str = "mappings";
/// See [`SETTINGS_FIELD`].
pub const ALIASES_FIELD: &str = "aliases";
/// See [`SETTINGS_FIELD`].
pub const LIFECYCLE_FIELD: &str = "lifecycle";
/// See [`SETTINGS_FIELD`].
pub const DATA_STREAM_OPTIONS_FIELD: &str = "data_stream_options";

// =============================================================================
// COMPRESSION
// =============================================================================

/// zstd frame magic (little-endian 0xFD2FB528).
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Default zstd compression level.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Maximum decompressed blob size accepted from the wire.
pub const MAX_DECOMPRESSED_SIZE: usize = 64 * 1024 * 1024;

// =============================================================================
// WIRE LIMITS
// =============================================================================

/// Upper bound on any single length prefix read from the wire.
pub const MAX_WIRE_LENGTH: usize = 256 * 1024 * 1024;
