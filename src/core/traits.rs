//! Core traits for the template protocol.
//!
//! These traits define the seams between the template aggregate and its
//! collaborators: binary encoding, structured-text emission and diffing.

use super::error::{ApplyError, ContentError, DecodeError};
use super::version::TransportVersion;
use crate::content::ContentParams;
use crate::wire::{StreamInput, StreamOutput};

/// A value with a binary wire form.
///
/// Implementations may branch on [`StreamOutput::version`] but MUST keep
/// the layout of every previously released version unchanged.
pub trait Writeable {
    /// Append this value to the stream.
    fn write_to(&self, out: &mut StreamOutput);
}

/// The decoding half of [`Writeable`].
pub trait Readable: Sized {
    /// Read one value from the stream.
    fn read_from(input: &mut StreamInput<'_>) -> Result<Self, DecodeError>;
}

/// A value with a structured-text (JSON) form.
pub trait ToContent {
    /// Render this value as a structured tree.
    fn to_content(&self, params: &ContentParams) -> Result<serde_json::Value, ContentError>;
}

/// Core trait for any value replicated by diff.
///
/// # Requirements
///
/// - `old.apply_diff(&new.diff_from(&old))` MUST reproduce `new` exactly
/// - a diff of a value against itself MUST be empty
/// - `encode_diff`/`decode_diff` at the same version MUST roundtrip
///
/// # Example
///
/// ```ignore
/// #[derive(Clone)]
/// struct Counter { value: u64 }
///
/// impl Diffable for Counter {
///     type Diff = Option<u64>;
///     const TYPE_ID: &'static str = "example.counter.v1";
///
///     fn diff_from(&self, old: &Self) -> Self::Diff {
///         (self.value != old.value).then_some(self.value)
///     }
///
///     fn apply_diff(&self, diff: &Self::Diff) -> Result<Self, ApplyError> {
///         Ok(Counter { value: diff.unwrap_or(self.value) })
///     }
///     // encode_diff / decode_diff elided
/// }
/// ```
pub trait Diffable: Clone + Send + Sync + 'static {
    /// Diff representation.
    type Diff: Clone + Send + Sync;

    /// Unique type identifier (e.g., "cluster.template.v1").
    const TYPE_ID: &'static str;

    /// Create the diff that turns `old` into `self`.
    fn diff_from(&self, old: &Self) -> Self::Diff;

    /// Apply a diff to `self`, producing the new value.
    fn apply_diff(&self, diff: &Self::Diff) -> Result<Self, ApplyError>;

    /// Serialize a diff for a peer speaking `version`.
    fn encode_diff(diff: &Self::Diff, version: TransportVersion) -> Vec<u8>;

    /// Deserialize a diff written at `version`.
    fn decode_diff(data: &[u8], version: TransportVersion) -> Result<Self::Diff, DecodeError>;

    /// Serialize the full value for a peer speaking `version`.
    fn encode_full(&self, version: TransportVersion) -> Vec<u8>;

    /// Deserialize a full value written at `version`.
    fn decode_full(data: &[u8], version: TransportVersion) -> Result<Self, DecodeError>;

    /// Check if diff is empty.
    ///
    /// Returns `true` if the diff represents no change.
    fn is_diff_empty(diff: &Self::Diff) -> bool {
        let _ = diff;
        false
    }
}
