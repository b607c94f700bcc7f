//! The template aggregate.

use super::builder::TemplateBuilder;
use crate::content::{CompressedContent, ContentParams, mappings_equal, mappings_to_content};
use crate::core::constants::{
    ALIASES_FIELD, DATA_STREAM_OPTIONS_FIELD, LIFECYCLE_FIELD, MAPPINGS_FIELD, SETTINGS_FIELD,
};
use crate::core::{ContentError, ResettableValue, ToContent, ValidationError};
use crate::metadata::{AliasMap, DataStreamOptionsTemplate, LifecycleTemplate, RolloverConfiguration, Settings};
use serde_json::{Map, Value};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A reusable, immutable fragment of index configuration.
///
/// Templates are value objects: every edit produces a new instance through
/// [`Template::builder_from`] or a diff. Equality treats mappings
/// semantically; see [`mappings_equal`].
#[derive(Debug, Clone)]
pub struct Template {
    pub(super) settings: Option<Settings>,
    pub(super) mappings: Option<CompressedContent>,
    pub(super) aliases: Option<AliasMap>,
    pub(super) lifecycle: Option<LifecycleTemplate>,
    pub(super) data_stream_options: ResettableValue<DataStreamOptionsTemplate>,
}

impl Template {
    /// Build from all five fragments.
    ///
    /// # Errors
    ///
    /// [`ValidationError::LifecycleTargetsFailureStore`] if `lifecycle`
    /// manages failure store indices; templates only carry data lifecycles.
    pub fn new(
        settings: Option<Settings>,
        mappings: Option<CompressedContent>,
        aliases: Option<AliasMap>,
        lifecycle: Option<LifecycleTemplate>,
        data_stream_options: ResettableValue<DataStreamOptionsTemplate>,
    ) -> Result<Self, ValidationError> {
        if lifecycle.as_ref().is_some_and(LifecycleTemplate::targets_failure_store) {
            return Err(ValidationError::LifecycleTargetsFailureStore);
        }
        Ok(Self {
            settings,
            mappings,
            aliases,
            lifecycle,
            data_stream_options,
        })
    }

    /// Like [`Template::new`], lifting plain options through
    /// [`ResettableValue::create`] (`None` is undefined, never reset).
    pub fn with_options(
        settings: Option<Settings>,
        mappings: Option<CompressedContent>,
        aliases: Option<AliasMap>,
        lifecycle: Option<LifecycleTemplate>,
        data_stream_options: Option<DataStreamOptionsTemplate>,
    ) -> Result<Self, ValidationError> {
        Self::new(
            settings,
            mappings,
            aliases,
            lifecycle,
            ResettableValue::create(data_stream_options),
        )
    }

    /// Settings, mappings and aliases only.
    pub fn with_basics(
        settings: Option<Settings>,
        mappings: Option<CompressedContent>,
        aliases: Option<AliasMap>,
    ) -> Self {
        Self {
            settings,
            mappings,
            aliases,
            lifecycle: None,
            data_stream_options: ResettableValue::Undefined,
        }
    }

    /// Empty builder.
    pub fn builder() -> TemplateBuilder {
        TemplateBuilder::default()
    }

    /// Builder seeded with every field of `template`, if given.
    pub fn builder_from(template: Option<&Template>) -> TemplateBuilder {
        template.map(TemplateBuilder::from).unwrap_or_default()
    }

    /// Index settings.
    pub fn settings(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }

    /// Compressed mapping blob.
    pub fn mappings(&self) -> Option<&CompressedContent> {
        self.mappings.as_ref()
    }

    /// Aliases keyed by name.
    pub fn aliases(&self) -> Option<&AliasMap> {
        self.aliases.as_ref()
    }

    /// Data stream lifecycle.
    pub fn lifecycle(&self) -> Option<&LifecycleTemplate> {
        self.lifecycle.as_ref()
    }

    /// Data stream options, with undefined and reset both reading as `None`.
    pub fn data_stream_options(&self) -> Option<&DataStreamOptionsTemplate> {
        self.data_stream_options.get()
    }

    /// Data stream options with the undefined/reset distinction kept.
    pub fn resettable_data_stream_options(&self) -> &ResettableValue<DataStreamOptionsTemplate> {
        &self.data_stream_options
    }

    /// Render, passing `rollover` to the lifecycle for display.
    pub fn to_content_with_rollover(
        &self,
        params: &ContentParams,
        rollover: Option<&RolloverConfiguration>,
    ) -> Result<Value, ContentError> {
        let mut object = Map::new();
        if let Some(settings) = &self.settings {
            object.insert(SETTINGS_FIELD.to_string(), settings.to_content(params)?);
        }
        if let Some(mappings) = &self.mappings {
            if let Some(rendered) = mappings_to_content(mappings, params)? {
                object.insert(MAPPINGS_FIELD.to_string(), rendered);
            }
        }
        if let Some(aliases) = &self.aliases {
            let mut rendered = Map::new();
            for (name, alias) in aliases {
                rendered.insert(name.clone(), alias.to_content(params)?);
            }
            object.insert(ALIASES_FIELD.to_string(), Value::Object(rendered));
        }
        if let Some(lifecycle) = &self.lifecycle {
            object.insert(
                LIFECYCLE_FIELD.to_string(),
                lifecycle.to_content_with_rollover(params, rollover)?,
            );
        }
        self.data_stream_options
            .write_field(&mut object, DATA_STREAM_OPTIONS_FIELD, params, |options| {
                options.to_content(params)
            })?;
        Ok(Value::Object(object))
    }
}

impl ToContent for Template {
    fn to_content(&self, params: &ContentParams) -> Result<Value, ContentError> {
        self.to_content_with_rollover(params, None)
    }
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        self.settings == other.settings
            && mappings_equal(self.mappings.as_ref(), other.mappings.as_ref())
            && self.aliases == other.aliases
            && self.lifecycle == other.lifecycle
            && self.data_stream_options == other.data_stream_options
    }
}

impl Eq for Template {}

impl Hash for Template {
    // Mappings contribute presence only: semantically equal blobs may
    // differ in bytes and must still hash alike.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.settings.hash(state);
        self.mappings.is_some().hash(state);
        self.aliases.hash(state);
        self.lifecycle.hash(state);
        self.data_stream_options.hash(state);
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_content(&ContentParams::api()) {
            Ok(rendered) => write!(f, "{rendered}"),
            Err(e) => write!(f, "<unrenderable template: {e}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ResettableValue;
    use crate::metadata::{AliasMetadata, LifecycleType};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::hash_map::DefaultHasher;

    fn mapping(value: Value) -> CompressedContent {
        CompressedContent::from_json(&value).unwrap()
    }

    fn hash_of(template: &Template) -> u64 {
        let mut hasher = DefaultHasher::new();
        template.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_rejects_failure_store_lifecycle() {
        let lifecycle = LifecycleTemplate::data().with_lifecycle_type(LifecycleType::Failures);
        let result = Template::with_options(None, None, None, Some(lifecycle), None);
        assert_eq!(result, Err(ValidationError::LifecycleTargetsFailureStore));
    }

    #[test]
    fn test_with_options_lifts_none_to_undefined() {
        let template = Template::with_options(None, None, None, None, None).unwrap();
        assert!(template.resettable_data_stream_options().is_undefined());

        let reset = Template::new(None, None, None, None, ResettableValue::Reset).unwrap();
        assert!(reset.resettable_data_stream_options().is_reset());
        assert_eq!(reset.data_stream_options(), None);
        assert_ne!(template, reset);
    }

    #[test]
    fn test_envelope_equality_and_hash() {
        let properties = json!({"properties": {"host": {"type": "keyword"}}});
        let wrapped = Template::with_basics(None, Some(mapping(json!({"_doc": properties.clone()}))), None);
        let bare = Template::with_basics(None, Some(mapping(properties)), None);
        let other = Template::with_basics(
            None,
            Some(mapping(json!({"properties": {"host": {"type": "ip"}}}))),
            None,
        );

        assert_eq!(wrapped, bare);
        assert_eq!(hash_of(&wrapped), hash_of(&bare));
        assert_ne!(wrapped, other);
    }

    #[test]
    fn test_emission_order_and_shape() {
        let mut aliases = AliasMap::new();
        aliases.insert("logs".to_string(), AliasMetadata::builder("logs").hidden(true).build());
        let template = Template::new(
            Some(Settings::builder().put("index.number_of_replicas", 1).build()),
            Some(mapping(json!({"_doc": {"dynamic": false}}))),
            Some(aliases),
            Some(LifecycleTemplate::data()),
            ResettableValue::Defined(DataStreamOptionsTemplate::failure_store_enabled(true)),
        )
        .unwrap();

        let rendered = template.to_content(&ContentParams::api()).unwrap();
        let keys: Vec<_> = rendered.as_object().unwrap().keys().cloned().collect();
        assert_eq!(
            keys,
            vec!["settings", "mappings", "aliases", "lifecycle", "data_stream_options"]
        );
        assert_eq!(
            rendered,
            json!({
                "settings": {"index": {"number_of_replicas": 1}},
                "mappings": {"dynamic": false},
                "aliases": {"logs": {"is_hidden": true}},
                "lifecycle": {"enabled": true},
                "data_stream_options": {"failure_store": {"enabled": true}}
            })
        );
    }

    #[test]
    fn test_empty_mapping_not_rendered() {
        let template = Template::with_basics(None, Some(mapping(json!({"_doc": {}}))), None);
        assert_eq!(template.to_content(&ContentParams::api()).unwrap(), json!({}));
    }

    #[test]
    fn test_display_is_compact_json() {
        let template = Template::with_basics(Some(Settings::builder().put("a", "b").build()), None, None);
        assert_eq!(template.to_string(), r#"{"settings":{"a":"b"}}"#);
    }

    #[test]
    fn test_builder_from_keeps_tri_state() {
        let template = Template::new(None, None, None, None, ResettableValue::Reset).unwrap();
        let copy = Template::builder_from(Some(&template)).build().unwrap();
        assert!(copy.resettable_data_stream_options().is_reset());
        assert_eq!(copy, template);

        let empty = Template::builder_from(None).build().unwrap();
        assert_eq!(empty, Template::with_basics(None, None, None));
    }
}
