//! Structured-text parser for [`Template`].

use super::template::Template;
use crate::content::parse_mappings;
use crate::core::constants::{
    ALIASES_FIELD, DATA_STREAM_OPTIONS_FIELD, LIFECYCLE_FIELD, MAPPINGS_FIELD, SETTINGS_FIELD,
};
use crate::core::{ContentError, ResettableValue, TemplateError};
use crate::metadata::{AliasMetadata, DataStreamOptionsTemplate, LifecycleTemplate, Settings};
use serde_json::Value;

impl Template {
    /// Parse a template object.
    ///
    /// Unknown keys are rejected. `null` for settings, mappings, aliases or
    /// lifecycle reads as absent; `data_stream_options: null` reads as reset.
    pub fn from_content(value: &Value) -> Result<Self, TemplateError> {
        let Value::Object(object) = value else {
            return Err(ContentError::unexpected("template", value).into());
        };

        let mut settings = None;
        let mut mappings = None;
        let mut aliases = None;
        let mut lifecycle = None;
        for (key, field) in object {
            if field.is_null() {
                if !is_known(key) {
                    return Err(unknown(key).into());
                }
                continue;
            }
            match key.as_str() {
                SETTINGS_FIELD => settings = Some(Settings::from_content(field)?),
                MAPPINGS_FIELD => mappings = Some(parse_mappings(field)?),
                ALIASES_FIELD => aliases = Some(AliasMetadata::map_from_content(field)?),
                LIFECYCLE_FIELD => lifecycle = Some(LifecycleTemplate::from_content(field)?),
                DATA_STREAM_OPTIONS_FIELD => {}
                _ => return Err(unknown(key).into()),
            }
        }
        let data_stream_options =
            ResettableValue::from_field(object, DATA_STREAM_OPTIONS_FIELD, DataStreamOptionsTemplate::from_content)?;

        Ok(Template::new(settings, mappings, aliases, lifecycle, data_stream_options)?)
    }

    /// Parse a template from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, TemplateError> {
        let value: Value = serde_json::from_str(json).map_err(ContentError::from)?;
        Self::from_content(&value)
    }
}

fn is_known(key: &str) -> bool {
    matches!(
        key,
        SETTINGS_FIELD | MAPPINGS_FIELD | ALIASES_FIELD | LIFECYCLE_FIELD | DATA_STREAM_OPTIONS_FIELD
    )
}

fn unknown(key: &str) -> ContentError {
    ContentError::UnknownField {
        object: "template",
        field: key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentParams;
    use crate::core::ToContent;
    use crate::metadata::{SettingValue, TimeValue};
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_all_fields() {
        let template = Template::from_content(&json!({
            "settings": {"index": {"number_of_replicas": 1}},
            "mappings": {"properties": {"foo": {"type": "keyword"}}},
            "aliases": {"logs": {"is_hidden": true}},
            "lifecycle": {"data_retention": "7d"},
            "data_stream_options": {"failure_store": {"enabled": true}}
        }))
        .unwrap();

        assert_eq!(
            template.settings().unwrap().get("index.number_of_replicas"),
            Some(&SettingValue::from(1))
        );
        assert_eq!(
            template.mappings().unwrap().to_json().unwrap(),
            json!({"properties": {"foo": {"type": "keyword"}}})
        );
        assert_eq!(template.aliases().unwrap()["logs"].hidden(), Some(true));
        assert_eq!(
            template.lifecycle().unwrap().data_retention().get(),
            Some(&TimeValue::from_days(7))
        );
        assert_eq!(
            template.data_stream_options(),
            Some(&DataStreamOptionsTemplate::failure_store_enabled(true))
        );
    }

    #[test]
    fn test_options_null_versus_absent() {
        let reset = Template::from_content(&json!({"data_stream_options": null})).unwrap();
        assert!(reset.resettable_data_stream_options().is_reset());

        let absent = Template::from_content(&json!({})).unwrap();
        assert!(absent.resettable_data_stream_options().is_undefined());
    }

    #[test]
    fn test_base64_mappings() {
        let raw = br#"{"_doc":{"properties":{}}}"#;
        let template = Template::from_content(&json!({"mappings": STANDARD.encode(raw)})).unwrap();
        let inline = Template::from_content(&json!({"mappings": {"properties": {}}})).unwrap();
        assert_eq!(template, inline);
    }

    #[test]
    fn test_rejects_unknown_and_malformed() {
        assert!(matches!(
            Template::from_content(&json!({"index_patterns": ["a*"]})),
            Err(TemplateError::Content(ContentError::UnknownField { .. }))
        ));
        assert!(matches!(
            Template::from_content(&json!({"bogus": null})),
            Err(TemplateError::Content(ContentError::UnknownField { .. }))
        ));
        assert!(matches!(
            Template::from_content(&json!({"mappings": 3})),
            Err(TemplateError::Content(ContentError::UnexpectedToken { .. }))
        ));
        assert!(matches!(
            Template::from_content(&json!({"mappings": STANDARD.encode(b"5")})),
            Err(TemplateError::Content(ContentError::UnexpectedToken { .. }))
        ));
        assert!(matches!(
            Template::from_content(&json!({"mappings": [91, 93]})),
            Err(TemplateError::Content(ContentError::UnexpectedToken { .. }))
        ));
        assert!(Template::from_content(&json!([])).is_err());
        assert!(Template::from_json_str("{").is_err());
    }

    #[test]
    fn test_content_roundtrip_in_both_contexts() {
        let json = r#"{
            "settings": {"index": {"codec": "best_compression"}},
            "mappings": {"properties": {"ts": {"type": "date"}}},
            "aliases": {"a": {"filter": {"term": {"k": "v"}}, "routing": "r"}},
            "lifecycle": {"enabled": false, "data_retention": null},
            "data_stream_options": {"failure_store": null}
        }"#;
        let template = Template::from_json_str(json).unwrap();

        for params in [ContentParams::api(), ContentParams::gateway()] {
            let rendered = template.to_content(&params).unwrap();
            assert_eq!(Template::from_content(&rendered).unwrap(), template);
        }
    }
}
