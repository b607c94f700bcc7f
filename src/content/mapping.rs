//! Mapping fragments: parsing, emission and semantic comparison.
//!
//! A mapping arrives in one of three shapes and is normalized to a
//! [`CompressedContent`]:
//!
//! | Token | Meaning |
//! |---|---|
//! | string | base64 of a zstd frame or of raw JSON |
//! | array of bytes | embedded binary (zstd frame or raw JSON) |
//! | object | inline mapping |
//!
//! Alias filters share the same token shapes through [`parse_compressed`].
//!
//! Two mappings are semantically equal when their trees match after
//! [`reduce_mapping`] strips a redundant single-type envelope.

use super::compressed::CompressedContent;
use super::params::ContentParams;
use crate::core::constants::{MAPPINGS_FIELD, SINGLE_MAPPING_NAME};
use crate::core::ContentError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value};
use tracing::debug;

/// Parse a mapping token into a compressed blob.
///
/// Encoded forms must inflate to a JSON object.
pub fn parse_mappings(token: &Value) -> Result<CompressedContent, ContentError> {
    let mapping = parse_compressed(MAPPINGS_FIELD, token)?;
    if !token.is_object() {
        normalized_mapping(&mapping)?;
    }
    Ok(mapping)
}

/// Parse any compressed-content token (mapping, alias filter).
pub fn parse_compressed(field: &str, token: &Value) -> Result<CompressedContent, ContentError> {
    match token {
        Value::String(encoded) => {
            let bytes = STANDARD
                .decode(encoded)
                .map_err(|e| ContentError::Base64(e.to_string()))?;
            CompressedContent::from_bytes(&bytes)
        }
        Value::Array(items) => {
            let bytes = embedded_bytes(items).ok_or_else(|| ContentError::unexpected(field, token))?;
            CompressedContent::from_bytes(&bytes)
        }
        Value::Object(_) => CompressedContent::from_json(token),
        other => Err(ContentError::unexpected(field, other)),
    }
}

/// Interpret an array as embedded binary; `None` unless every item is a byte.
fn embedded_bytes(items: &[Value]) -> Option<Vec<u8>> {
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
        .collect()
}

/// Strip the single-type envelope: `{"_doc": {...}}` becomes `{...}`.
pub fn reduce_mapping(mut mapping: Map<String, Value>) -> Map<String, Value> {
    if mapping.len() == 1 {
        if let Some(Value::Object(inner)) = mapping.get_mut(SINGLE_MAPPING_NAME) {
            return std::mem::take(inner);
        }
    }
    mapping
}

/// Inflate, parse and reduce a mapping blob.
pub fn normalized_mapping(mapping: &CompressedContent) -> Result<Map<String, Value>, ContentError> {
    match mapping.to_json()? {
        Value::Object(tree) => Ok(reduce_mapping(tree)),
        other => Err(ContentError::unexpected(MAPPINGS_FIELD, &other)),
    }
}

/// Semantic equality of two optional mapping blobs.
///
/// Identity and digest equality are checked first; only when both fail
/// are the blobs inflated and compared as reduced trees, ignoring key
/// order. A blob that cannot be inflated only equals itself.
pub fn mappings_equal(a: Option<&CompressedContent>, b: Option<&CompressedContent>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            if a == b {
                return true;
            }
            match (normalized_mapping(a), normalized_mapping(b)) {
                (Ok(a), Ok(b)) => a == b,
                (Err(e), _) | (_, Err(e)) => {
                    debug!(error = %e, "mapping not comparable, treating as unequal");
                    false
                }
            }
        }
        _ => false,
    }
}

/// Render a mapping blob for structured text.
///
/// Expanded renderings return the reduced tree, or `None` when it is empty;
/// binary renderings return the base64 of the compressed frame.
pub fn mappings_to_content(
    mapping: &CompressedContent,
    params: &ContentParams,
) -> Result<Option<Value>, ContentError> {
    if params.expand_compressed() {
        let tree = normalized_mapping(mapping)?;
        Ok((!tree.is_empty()).then_some(Value::Object(tree)))
    } else {
        Ok(Some(Value::String(STANDARD.encode(mapping.compressed()))))
    }
}
