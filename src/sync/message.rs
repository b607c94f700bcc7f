//! Update messages exchanged between template replicas.

use crate::core::TransportVersion;
use thiserror::Error;

/// What an update carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// Acknowledgment only; empty payload.
    Ack,
    /// Complete encoded value.
    Full,
    /// Diff against `base_state_num`.
    Diff,
}

impl UpdateKind {
    fn tag(self) -> u8 {
        match self {
            UpdateKind::Ack => 0,
            UpdateKind::Full => 1,
            UpdateKind::Diff => 2,
        }
    }

    fn from_tag(tag: u8) -> Result<Self, MessageError> {
        match tag {
            0 => Ok(UpdateKind::Ack),
            1 => Ok(UpdateKind::Full),
            2 => Ok(UpdateKind::Diff),
            other => Err(MessageError::UnknownKind(other)),
        }
    }
}

/// One published update.
///
/// Wire format:
/// ```text
/// +0   Kind (1 byte: 0 ack, 1 full, 2 diff)
/// +1   Sender State Num (8 bytes LE64)
/// +9   Acked State Num (8 bytes LE64)
/// +17  Base State Num (8 bytes LE64)
/// +25  Transport Version of payload (4 bytes LE32)
/// +29  Payload Length (4 bytes LE32)
/// +33  Payload (variable)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateUpdate {
    /// Payload kind.
    pub kind: UpdateKind,
    /// Sender's state number after this update.
    pub sender_state_num: u64,
    /// Highest peer state number the sender holds.
    pub acked_state_num: u64,
    /// State number a diff was computed against (0 for full and ack).
    pub base_state_num: u64,
    /// Version the payload was encoded at.
    pub version: TransportVersion,
    /// Encoded value or diff.
    pub payload: Vec<u8>,
}

/// Fixed header size in bytes.
pub const UPDATE_HEADER_SIZE: usize = 33;

impl TemplateUpdate {
    /// A full-value update.
    pub fn full(sender_state_num: u64, acked_state_num: u64, version: TransportVersion, payload: Vec<u8>) -> Self {
        Self {
            kind: UpdateKind::Full,
            sender_state_num,
            acked_state_num,
            base_state_num: 0,
            version,
            payload,
        }
    }

    /// A diff update against `base_state_num`.
    pub fn diff(
        sender_state_num: u64,
        acked_state_num: u64,
        base_state_num: u64,
        version: TransportVersion,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            kind: UpdateKind::Diff,
            sender_state_num,
            acked_state_num,
            base_state_num,
            version,
            payload,
        }
    }

    /// An acknowledgment with no payload.
    pub fn ack(sender_state_num: u64, acked_state_num: u64, version: TransportVersion) -> Self {
        Self {
            kind: UpdateKind::Ack,
            sender_state_num,
            acked_state_num,
            base_state_num: 0,
            version,
            payload: Vec::new(),
        }
    }

    /// True for acknowledgments.
    pub fn is_ack_only(&self) -> bool {
        self.kind == UpdateKind::Ack
    }

    /// Encoded size.
    pub fn wire_size(&self) -> usize {
        UPDATE_HEADER_SIZE + self.payload.len()
    }

    /// Encode header and payload.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.wire_size());
        buf.push(self.kind.tag());
        buf.extend_from_slice(&self.sender_state_num.to_le_bytes());
        buf.extend_from_slice(&self.acked_state_num.to_le_bytes());
        buf.extend_from_slice(&self.base_state_num.to_le_bytes());
        buf.extend_from_slice(&self.version.id().to_le_bytes());
        buf.extend_from_slice(&(self.payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Decode one update; trailing bytes are ignored.
    pub fn decode(data: &[u8]) -> Result<Self, MessageError> {
        if data.len() < UPDATE_HEADER_SIZE {
            return Err(MessageError::TooShort {
                expected: UPDATE_HEADER_SIZE,
                actual: data.len(),
            });
        }

        let kind = UpdateKind::from_tag(data[0])?;
        let sender_state_num = u64::from_le_bytes(array_at(data, 1));
        let acked_state_num = u64::from_le_bytes(array_at(data, 9));
        let base_state_num = u64::from_le_bytes(array_at(data, 17));
        let version = TransportVersion::from_id(u32::from_le_bytes(array_at(data, 25)));
        let payload_len = u32::from_le_bytes(array_at(data, 29)) as usize;

        let end = UPDATE_HEADER_SIZE + payload_len;
        if data.len() < end {
            return Err(MessageError::TooShort {
                expected: end,
                actual: data.len(),
            });
        }
        if kind == UpdateKind::Ack && payload_len != 0 {
            return Err(MessageError::InvalidFormat("ack carries a payload".to_string()));
        }

        Ok(Self {
            kind,
            sender_state_num,
            acked_state_num,
            base_state_num,
            version,
            payload: data[UPDATE_HEADER_SIZE..end].to_vec(),
        })
    }
}

/// Copy `N` bytes at `offset`. The caller has checked the length.
fn array_at<const N: usize>(data: &[u8], offset: usize) -> [u8; N] {
    let mut array = [0u8; N];
    array.copy_from_slice(&data[offset..offset + N]);
    array
}

/// Update framing errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// Input data is shorter than required.
    #[error("update too short: expected {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum bytes required.
        expected: usize,
        /// Actual bytes received.
        actual: usize,
    },

    /// Unknown kind byte.
    #[error("unknown update kind: {0}")]
    UnknownKind(u8),

    /// Header fields are inconsistent.
    #[error("invalid format: {0}")]
    InvalidFormat(String),
}
