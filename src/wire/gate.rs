//! Table-driven version gates.
//!
//! Each wire field owns an ordered list of eras, newest first. An era names
//! the first transport version that uses its layout plus the encode/decode
//! pair for that layout. A peer older than every era does not know the
//! field: encoders skip it and decoders fall back to the field's default.
//!
//! Adding a field or a new layout means adding an era above [`CURRENT`]
//! (see [`crate::core::constants`]); existing eras are never edited.
//!
//! [`CURRENT`]: crate::core::constants::CURRENT

use super::stream::{StreamInput, StreamOutput};
use crate::core::{DecodeError, TransportVersion};
use tracing::trace;

/// Encoder for one era.
pub type WriteFn<T> = fn(&T, &mut StreamOutput);

/// Decoder for one era.
pub type ReadFn<T> = fn(&mut StreamInput<'_>) -> Result<T, DecodeError>;

/// One wire layout of a field.
pub struct Era<T: 'static> {
    /// First version using this layout.
    pub since: TransportVersion,
    /// Encoder.
    pub write: WriteFn<T>,
    /// Decoder.
    pub read: ReadFn<T>,
}

/// All layouts of a field, newest first.
pub struct FieldGates<T: 'static> {
    field: &'static str,
    eras: &'static [Era<T>],
}

impl<T> FieldGates<T> {
    /// Declare a field's eras. `eras` MUST be sorted newest first.
    pub const fn new(field: &'static str, eras: &'static [Era<T>]) -> Self {
        Self { field, eras }
    }

    /// The era a peer at `version` speaks, if any.
    pub fn era(&self, version: TransportVersion) -> Option<&'static Era<T>> {
        self.eras.iter().find(|era| version.on_or_after(era.since))
    }

    /// True if a peer at `version` knows this field.
    pub fn is_supported(&self, version: TransportVersion) -> bool {
        self.era(version).is_some()
    }

    /// Encode `value` in the layout of the stream's version.
    ///
    /// Returns `false` if the field was skipped.
    pub fn write(&self, value: &T, out: &mut StreamOutput) -> bool {
        match self.era(out.version()) {
            Some(era) => {
                (era.write)(value, out);
                true
            }
            None => {
                trace!(field = self.field, version = %out.version(), "field unknown to peer, not written");
                false
            }
        }
    }

    /// Decode in the layout of the stream's version.
    ///
    /// Returns `Ok(None)` if the peer does not know the field.
    pub fn read(&self, input: &mut StreamInput<'_>) -> Result<Option<T>, DecodeError> {
        match self.era(input.version()) {
            Some(era) => (era.read)(input).map(Some),
            None => {
                trace!(field = self.field, version = %input.version(), "field unknown to peer, not read");
                Ok(None)
            }
        }
    }

    /// Decode, substituting the default for fields the peer does not know.
    pub fn read_or_default(&self, input: &mut StreamInput<'_>) -> Result<T, DecodeError>
    where
        T: Default,
    {
        Ok(self.read(input)?.unwrap_or_default())
    }

    /// True if eras are strictly newest first.
    pub fn is_ordered(&self) -> bool {
        self.eras.windows(2).all(|pair| pair[0].since > pair[1].since)
    }
}
