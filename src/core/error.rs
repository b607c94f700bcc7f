//! Error types for the template protocol.

use thiserror::Error;

/// Errors that can occur when decoding from the wire.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Unexpected end of data.
    #[error("unexpected end of data: needed {needed} more bytes at offset {offset}")]
    UnexpectedEof {
        /// Read position when the input ran out.
        offset: usize,
        /// Bytes still required.
        needed: usize,
    },

    /// Invalid encoding.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// A length prefix exceeded the wire limit.
    #[error("length {length} exceeds limit {limit}")]
    LengthExceeded {
        /// Declared length.
        length: usize,
        /// Maximum allowed length.
        limit: usize,
    },

    /// Unknown tag byte for an enumerated value.
    #[error("unknown {kind} tag: {tag}")]
    UnknownTag {
        /// What was being decoded.
        kind: &'static str,
        /// Tag byte received.
        tag: u8,
    },

    /// Bytes left over after a complete message.
    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),

    /// Embedded content blob was unreadable.
    #[error("content error: {0}")]
    Content(#[from] ContentError),

    /// Decoded fields violate a template invariant.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Errors in structured content handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// Token shape not accepted at this position.
    #[error("unexpected token for [{field}]: {found}")]
    UnexpectedToken {
        /// Field being parsed.
        field: String,
        /// Description of what was found.
        found: String,
    },

    /// Unknown field in a strict object.
    #[error("unknown field [{field}] in [{object}]")]
    UnknownField {
        /// Object being parsed.
        object: &'static str,
        /// Offending field name.
        field: String,
    },

    /// Invalid field value.
    #[error("invalid value for [{field}]: {reason}")]
    InvalidValue {
        /// Field being parsed.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Base64 payload could not be decoded.
    #[error("invalid base64: {0}")]
    Base64(String),

    /// Payload is not valid JSON.
    #[error("invalid json: {0}")]
    Json(String),

    /// zstd compression failed.
    #[error("compression failed: {0}")]
    CompressionFailed(String),

    /// zstd decompression failed.
    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    /// Decompressed size exceeds safety limit.
    #[error("decompressed size exceeded limit: {size} > {limit}")]
    SizeExceeded {
        /// Actual decompressed size.
        size: usize,
        /// Maximum allowed size.
        limit: usize,
    },
}

impl ContentError {
    pub(crate) fn unexpected(field: impl Into<String>, found: &serde_json::Value) -> Self {
        ContentError::UnexpectedToken {
            field: field.into(),
            found: describe_token(found).to_string(),
        }
    }

    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ContentError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ContentError {
    fn from(err: serde_json::Error) -> Self {
        ContentError::Json(err.to_string())
    }
}

fn describe_token(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "VALUE_NULL",
        serde_json::Value::Bool(_) => "VALUE_BOOLEAN",
        serde_json::Value::Number(_) => "VALUE_NUMBER",
        serde_json::Value::String(_) => "VALUE_STRING",
        serde_json::Value::Array(_) => "START_ARRAY",
        serde_json::Value::Object(_) => "START_OBJECT",
    }
}

/// Template construction invariant violations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Templates only carry data lifecycles.
    #[error("invalid lifecycle type for data lifecycle: template lifecycle must not target the failure store")]
    LifecycleTargetsFailureStore,
}

/// Errors that can occur when applying a diff.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// Applied result violates a template invariant.
    #[error("diff produces invalid template: {0}")]
    Invalid(#[from] ValidationError),

    /// Diff version mismatch.
    #[error("diff version mismatch: expected base {expected}, got {actual}")]
    VersionMismatch {
        /// Expected base state number.
        expected: u64,
        /// Actual base state number.
        actual: u64,
    },
}

/// Top-level template errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Wire decode error.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Structured content error.
    #[error("content error: {0}")]
    Content(#[from] ContentError),

    /// Invariant violation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Diff application error.
    #[error("apply error: {0}")]
    Apply(#[from] ApplyError),
}
