//! Binary stream primitives.
//!
//! Both directions carry the peer's [`TransportVersion`] so that nested
//! values can gate their own layout without extra plumbing.
//!
//! Encodings:
//! ```text
//! bool        1 byte, 0x00 | 0x01
//! vint        7-bit groups, little-endian, high bit = continuation
//! i64 / f64   8 bytes LE
//! string      vint length + UTF-8 bytes
//! bytes       vint length + raw bytes
//! optional    bool presence + value
//! opt. bool   1 byte, 0x00 false | 0x01 true | 0x02 absent
//! ```

use crate::core::constants::MAX_WIRE_LENGTH;
use crate::core::{DecodeError, Readable, TransportVersion, Writeable};

/// Growable output buffer bound to a peer version.
#[derive(Debug, Clone)]
pub struct StreamOutput {
    buf: Vec<u8>,
    version: TransportVersion,
}

impl StreamOutput {
    /// Create an empty stream for a peer speaking `version`.
    pub fn new(version: TransportVersion) -> Self {
        Self {
            buf: Vec::new(),
            version,
        }
    }

    /// Peer version this stream is written for.
    pub fn version(&self) -> TransportVersion {
        self.version
    }

    /// Bytes written so far.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if nothing was written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume into the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Write a boolean.
    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    /// Write a variable-length unsigned integer.
    pub fn write_vlong(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value as u8 & 0x7F) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    /// Write a variable-length length or count.
    pub fn write_vint(&mut self, value: usize) {
        self.write_vlong(value as u64);
    }

    /// Write a signed 64-bit integer (LE).
    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a 64-bit float (LE).
    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a length-prefixed UTF-8 string.
    pub fn write_string(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
    }

    /// Write a length-prefixed byte blob.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.write_vint(value.len());
        self.buf.extend_from_slice(value);
    }

    /// Write an optional string.
    pub fn write_optional_string(&mut self, value: Option<&str>) {
        match value {
            Some(value) => {
                self.write_bool(true);
                self.write_string(value);
            }
            None => self.write_bool(false),
        }
    }

    /// Write an optional boolean as a single byte.
    pub fn write_optional_bool(&mut self, value: Option<bool>) {
        self.buf.push(match value {
            Some(false) => 0,
            Some(true) => 1,
            None => 2,
        });
    }

    /// Write an optional value.
    pub fn write_optional<T: Writeable>(&mut self, value: Option<&T>) {
        match value {
            Some(value) => {
                self.write_bool(true);
                value.write_to(self);
            }
            None => self.write_bool(false),
        }
    }

    /// Write a count-prefixed sequence.
    pub fn write_collection<'a, T: Writeable + 'a>(
        &mut self,
        items: impl ExactSizeIterator<Item = &'a T>,
    ) {
        self.write_vint(items.len());
        for item in items {
            item.write_to(self);
        }
    }
}

/// Borrowed input cursor bound to a peer version.
#[derive(Debug, Clone)]
pub struct StreamInput<'a> {
    data: &'a [u8],
    pos: usize,
    version: TransportVersion,
}

impl<'a> StreamInput<'a> {
    /// Wrap `data` written by a peer speaking `version`.
    pub fn new(data: &'a [u8], version: TransportVersion) -> Self {
        Self {
            data,
            pos: 0,
            version,
        }
    }

    /// Peer version the data was written at.
    pub fn version(&self) -> TransportVersion {
        self.version
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// True if every byte was consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Fail if bytes are left over.
    pub fn ensure_consumed(&self) -> Result<(), DecodeError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(DecodeError::TrailingBytes(n)),
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::UnexpectedEof {
                offset: self.pos,
                needed: len - self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    /// Read a boolean; any byte other than 0 or 1 is rejected.
    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError::InvalidEncoding(format!(
                "unexpected byte [{other:#04x}] for boolean"
            ))),
        }
    }

    /// Read a variable-length unsigned integer.
    pub fn read_vlong(&mut self) -> Result<u64, DecodeError> {
        let mut value = 0u64;
        for shift in (0..64).step_by(7) {
            let byte = self.read_u8()?;
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(DecodeError::InvalidEncoding("vlong too long".to_string()))
    }

    /// Read a length or count, bounded by the wire limit.
    pub fn read_vint(&mut self) -> Result<usize, DecodeError> {
        let value = self.read_vlong()?;
        let length = usize::try_from(value).unwrap_or(usize::MAX);
        if length > MAX_WIRE_LENGTH {
            return Err(DecodeError::LengthExceeded {
                length,
                limit: MAX_WIRE_LENGTH,
            });
        }
        Ok(length)
    }

    /// Read a signed 64-bit integer (LE).
    pub fn read_i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.take_array()?))
    }

    /// Read a 64-bit float (LE).
    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_le_bytes(self.take_array()?))
    }

    /// Read a length-prefixed byte blob.
    pub fn read_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_vint()?;
        self.take(len)
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| DecodeError::InvalidEncoding(format!("invalid utf-8 string: {e}")))
    }

    /// Read an optional string.
    pub fn read_optional_string(&mut self) -> Result<Option<String>, DecodeError> {
        if self.read_bool()? {
            Ok(Some(self.read_string()?))
        } else {
            Ok(None)
        }
    }

    /// Read an optional boolean.
    pub fn read_optional_bool(&mut self) -> Result<Option<bool>, DecodeError> {
        match self.read_u8()? {
            0 => Ok(Some(false)),
            1 => Ok(Some(true)),
            2 => Ok(None),
            tag => Err(DecodeError::UnknownTag {
                kind: "optional boolean",
                tag,
            }),
        }
    }

    /// Read an optional value.
    pub fn read_optional<T: Readable>(&mut self) -> Result<Option<T>, DecodeError> {
        if self.read_bool()? {
            Ok(Some(T::read_from(self)?))
        } else {
            Ok(None)
        }
    }

    /// Read a count-prefixed sequence.
    pub fn read_collection<T: Readable>(&mut self) -> Result<Vec<T>, DecodeError> {
        let count = self.read_vint()?;
        // Each element takes at least one byte; bound the allocation by what is left.
        let mut items = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            items.push(T::read_from(self)?);
        }
        Ok(items)
    }
}

impl Writeable for String {
    fn write_to(&self, out: &mut StreamOutput) {
        out.write_string(self);
    }
}

impl Readable for String {
    fn read_from(input: &mut StreamInput<'_>) -> Result<Self, DecodeError> {
        input.read_string()
    }
}

impl Writeable for bool {
    fn write_to(&self, out: &mut StreamOutput) {
        out.write_bool(*self);
    }
}

impl Readable for bool {
    fn read_from(input: &mut StreamInput<'_>) -> Result<Self, DecodeError> {
        input.read_bool()
    }
}
