//! Structured-text emission parameters.

use crate::core::ContentError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Audience of a structured-text rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextMode {
    /// Human-facing API response. Always expands compressed content.
    #[default]
    Api,
    /// Persisted cluster state.
    Gateway,
    /// Snapshot metadata.
    Snapshot,
}

impl ContextMode {
    /// Wire/query name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextMode::Api => "api",
            ContextMode::Gateway => "gateway",
            ContextMode::Snapshot => "snapshot",
        }
    }
}

impl fmt::Display for ContextMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextMode {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api" => Ok(ContextMode::Api),
            "gateway" => Ok(ContextMode::Gateway),
            "snapshot" => Ok(ContextMode::Snapshot),
            other => Err(ContentError::invalid(
                "context_mode",
                format!("unknown context mode [{other}]"),
            )),
        }
    }
}

/// Caller-selected rendering options.
///
/// The default renders for the API: compressed content expanded, reset
/// values shown as `null`, settings nested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentParams {
    /// Audience of the rendering.
    pub context: ContextMode,
    /// Keep compressed content in its binary (base64) form where allowed.
    pub binary: bool,
    /// Suppress `Reset` tri-state values instead of rendering `null`.
    pub hide_reset_values: bool,
    /// Render settings as flat dotted keys.
    pub flat_settings: bool,
}

impl ContentParams {
    /// Parameters for an API response.
    pub fn api() -> Self {
        Self::default()
    }

    /// Parameters for persisted cluster state: binary content kept as is.
    pub fn gateway() -> Self {
        Self {
            context: ContextMode::Gateway,
            binary: true,
            ..Self::default()
        }
    }

    /// Set [`ContentParams::binary`].
    pub fn with_binary(mut self, binary: bool) -> Self {
        self.binary = binary;
        self
    }

    /// Set [`ContentParams::hide_reset_values`].
    pub fn with_hide_reset_values(mut self, hide: bool) -> Self {
        self.hide_reset_values = hide;
        self
    }

    /// Set [`ContentParams::flat_settings`].
    pub fn with_flat_settings(mut self, flat: bool) -> Self {
        self.flat_settings = flat;
        self
    }

    /// Whether compressed content renders as an inline object.
    ///
    /// The API context always expands, regardless of `binary`.
    pub fn expand_compressed(&self) -> bool {
        self.context == ContextMode::Api || !self.binary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_always_expands() {
        assert!(ContentParams::api().expand_compressed());
        assert!(ContentParams::api().with_binary(true).expand_compressed());
    }

    #[test]
    fn test_gateway_binary() {
        assert!(!ContentParams::gateway().expand_compressed());
        assert!(ContentParams::gateway().with_binary(false).expand_compressed());
    }

    #[test]
    fn test_context_mode_parse() {
        assert_eq!("gateway".parse::<ContextMode>().unwrap(), ContextMode::Gateway);
        assert_eq!(ContextMode::Snapshot.to_string(), "snapshot");
        assert!("disk".parse::<ContextMode>().is_err());
    }

    #[test]
    fn test_params_deserialize_with_defaults() {
        let params: ContentParams =
            serde_json::from_str(r#"{"context": "snapshot", "binary": true}"#).unwrap();
        assert_eq!(params.context, ContextMode::Snapshot);
        assert!(params.binary);
        assert!(!params.hide_reset_values);
    }
}
