//! # cluster-template
//!
//! Versioned, composable configuration templates for indices and data
//! streams.
//!
//! A [`Template`] is an immutable fragment of index configuration: settings,
//! mappings, aliases, a lifecycle and a data stream options block. Templates
//! are layered, diffed and replicated across a cluster whose nodes may run
//! different releases at the same time. It provides:
//!
//! - **Tri-state fields**: [`ResettableValue`] tells "not specified",
//!   "explicitly cleared" and "set" apart everywhere
//! - **Version-gated wire codec**: each field declares the transport
//!   versions that carry it; older peers neither see nor send newer fields
//! - **Semantic equality**: mappings compare by content, ignoring a
//!   redundant `_doc` envelope and key order
//! - **Diffs**: field-wise [`TemplateDiff`]s that reproduce the target
//!   template byte for byte
//!
//! ## Feature Flags
//!
//! - `sync` (default): update framing and replica tracking
//!
//! ## Modules
//!
//! - [`core`]: traits, constants, tri-state values and errors
//! - [`wire`]: binary stream primitives and version gates
//! - [`content`]: structured-text parameters, compressed blobs and mappings
//! - [`metadata`]: settings, aliases, lifecycle and data stream options
//! - [`template`]: the template aggregate, builder, codecs and diffs
//! - [`sync`]: replication of templates between peers (requires `sync`)
//!
//! ## Example Usage
//!
//! ```rust
//! use cluster_template::prelude::*;
//! use serde_json::json;
//!
//! let template = Template::from_content(&json!({
//!     "settings": {"index": {"number_of_replicas": 1}},
//!     "mappings": {"_doc": {"properties": {"host": {"type": "keyword"}}}},
//!     "data_stream_options": null
//! }))
//! .unwrap();
//! assert!(template.resettable_data_stream_options().is_reset());
//!
//! // An older peer does not know data stream options: they decode as undefined.
//! let bytes = template.encode(LIFECYCLE_ENABLED_FLAG);
//! let decoded = Template::decode(&bytes, LIFECYCLE_ENABLED_FLAG).unwrap();
//! assert!(decoded.resettable_data_stream_options().is_undefined());
//!
//! // Emission hides the envelope and, on request, reset values.
//! let rendered = template
//!     .to_content(&ContentParams::api().with_hide_reset_values(true))
//!     .unwrap();
//! assert_eq!(
//!     rendered,
//!     json!({
//!         "settings": {"index": {"number_of_replicas": 1}},
//!         "mappings": {"properties": {"host": {"type": "keyword"}}}
//!     })
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

pub mod content;
pub mod metadata;
pub mod template;
pub mod wire;

// Replication (feature-gated)
#[cfg(feature = "sync")]
#[cfg_attr(docsrs, doc(cfg(feature = "sync")))]
pub mod sync;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::content::{CompressedContent, ContentParams, ContextMode};
    pub use crate::core::constants::*;
    pub use crate::core::*;
    pub use crate::metadata::{
        AliasMap, AliasMetadata, DISABLED_LIFECYCLE, DataStreamOptionsTemplate, FailureStoreTemplate,
        LifecycleTemplate, RolloverConfiguration, Settings, TimeValue,
    };
    pub use crate::template::{Template, TemplateBuilder, TemplateDiff};

    #[cfg(feature = "sync")]
    pub use crate::sync::{TemplateReplica, TemplateUpdate};
}

// Re-export commonly used items at crate root
pub use crate::core::{ResettableValue, TemplateError, TransportVersion};
pub use crate::template::{Template, TemplateBuilder, TemplateDiff};
