//! Transport version identifiers.

use std::fmt;

/// Wire dialect spoken by a peer.
///
/// Ids grow monotonically with each release that changes a wire layout.
/// Codecs compare against named thresholds in [`crate::core::constants`]
/// and never against raw numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransportVersion(u32);

impl TransportVersion {
    /// Wrap a raw version id.
    pub const fn from_id(id: u32) -> Self {
        Self(id)
    }

    /// Raw version id.
    pub const fn id(self) -> u32 {
        self.0
    }

    /// True if this version is `other` or newer.
    pub const fn on_or_after(self, other: TransportVersion) -> bool {
        self.0 >= other.0
    }

    /// True if this version predates `other`.
    pub const fn before(self, other: TransportVersion) -> bool {
        self.0 < other.0
    }
}

impl fmt::Display for TransportVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
