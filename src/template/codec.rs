//! Versioned wire codec for [`Template`].
//!
//! Field order is fixed. Each field is declared as a [`FieldGates`] table;
//! a peer older than a field's first era neither writes nor reads it.
//!
//! ```text
//! settings             optional                       since MINIMUM_COMPATIBLE
//! mappings             optional compressed blob       since MINIMUM_COMPATIBLE
//! aliases              optional (count, (name, alias)*)  since MINIMUM_COMPATIBLE
//! lifecycle            optional                       since LIFECYCLE_ENABLED_FLAG
//!                      explicit_null + optional       LIFECYCLE_ADDED .. LIFECYCLE_ENABLED_FLAG
//! data_stream_options  tri-state                      since DATA_STREAM_OPTIONS_ADDED
//! ```

use super::template::Template;
use crate::content::CompressedContent;
use crate::core::constants::{
    DATA_STREAM_OPTIONS_ADDED, LIFECYCLE_ADDED, LIFECYCLE_ENABLED_FLAG, MINIMUM_COMPATIBLE,
};
use crate::core::{DecodeError, Readable, ResettableValue, TransportVersion, Writeable};
use crate::metadata::{AliasMap, AliasMetadata, DISABLED_LIFECYCLE, DataStreamOptionsTemplate, LifecycleTemplate, Settings};
use crate::wire::{Era, FieldGates, StreamInput, StreamOutput};
use tracing::debug;

fn write_optional<T: Writeable>(value: &Option<T>, out: &mut StreamOutput) {
    out.write_optional(value.as_ref());
}

fn read_optional<T: Readable>(input: &mut StreamInput<'_>) -> Result<Option<T>, DecodeError> {
    input.read_optional()
}

fn write_aliases(aliases: &Option<AliasMap>, out: &mut StreamOutput) {
    out.write_bool(aliases.is_some());
    if let Some(aliases) = aliases {
        out.write_vint(aliases.len());
        for (name, alias) in aliases {
            out.write_string(name);
            alias.write_to(out);
        }
    }
}

fn read_aliases(input: &mut StreamInput<'_>) -> Result<Option<AliasMap>, DecodeError> {
    if !input.read_bool()? {
        return Ok(None);
    }
    let count = input.read_vint()?;
    let mut aliases = AliasMap::new();
    for _ in 0..count {
        let name = input.read_string()?;
        let alias = AliasMetadata::read_from(input)?;
        aliases.insert(name, alias);
    }
    Ok(Some(aliases))
}

/// Lifecycle before it had an enabled flag: a disabled lifecycle travels as
/// `explicit_null = true` with no payload.
fn write_legacy_lifecycle(lifecycle: &Option<LifecycleTemplate>, out: &mut StreamOutput) {
    let explicit_null = lifecycle.as_ref().is_some_and(|l| !l.enabled());
    out.write_bool(explicit_null);
    if !explicit_null {
        out.write_optional(lifecycle.as_ref());
    }
}

fn read_legacy_lifecycle(input: &mut StreamInput<'_>) -> Result<Option<LifecycleTemplate>, DecodeError> {
    if input.read_bool()? {
        debug!(version = %input.version(), "explicit-null lifecycle, substituting disabled lifecycle");
        return Ok(Some(DISABLED_LIFECYCLE.clone()));
    }
    input.read_optional()
}

fn write_resettable<T: Writeable>(value: &ResettableValue<T>, out: &mut StreamOutput) {
    value.write_to(out);
}

fn read_resettable<T: Readable>(input: &mut StreamInput<'_>) -> Result<ResettableValue<T>, DecodeError> {
    ResettableValue::read_from(input)
}

pub(super) static SETTINGS: FieldGates<Option<Settings>> = FieldGates::new(
    "settings",
    &[Era {
        since: MINIMUM_COMPATIBLE,
        write: write_optional::<Settings>,
        read: read_optional::<Settings>,
    }],
);

pub(super) static MAPPINGS: FieldGates<Option<CompressedContent>> = FieldGates::new(
    "mappings",
    &[Era {
        since: MINIMUM_COMPATIBLE,
        write: write_optional::<CompressedContent>,
        read: read_optional::<CompressedContent>,
    }],
);

pub(super) static ALIASES: FieldGates<Option<AliasMap>> = FieldGates::new(
    "aliases",
    &[Era {
        since: MINIMUM_COMPATIBLE,
        write: write_aliases,
        read: read_aliases,
    }],
);

pub(super) static LIFECYCLE: FieldGates<Option<LifecycleTemplate>> = FieldGates::new(
    "lifecycle",
    &[
        Era {
            since: LIFECYCLE_ENABLED_FLAG,
            write: write_optional::<LifecycleTemplate>,
            read: read_optional::<LifecycleTemplate>,
        },
        Era {
            since: LIFECYCLE_ADDED,
            write: write_legacy_lifecycle,
            read: read_legacy_lifecycle,
        },
    ],
);

pub(super) static DATA_STREAM_OPTIONS: FieldGates<ResettableValue<DataStreamOptionsTemplate>> = FieldGates::new(
    "data_stream_options",
    &[Era {
        since: DATA_STREAM_OPTIONS_ADDED,
        write: write_resettable::<DataStreamOptionsTemplate>,
        read: read_resettable::<DataStreamOptionsTemplate>,
    }],
);

impl Writeable for Template {
    fn write_to(&self, out: &mut StreamOutput) {
        SETTINGS.write(&self.settings, out);
        MAPPINGS.write(&self.mappings, out);
        ALIASES.write(&self.aliases, out);
        LIFECYCLE.write(&self.lifecycle, out);
        DATA_STREAM_OPTIONS.write(&self.data_stream_options, out);
    }
}

impl Readable for Template {
    /// Fields the peer does not know decode as absent (options as
    /// undefined). The result is validated like any constructed template.
    fn read_from(input: &mut StreamInput<'_>) -> Result<Self, DecodeError> {
        let settings = SETTINGS.read_or_default(input)?;
        let mappings = MAPPINGS.read_or_default(input)?;
        let aliases = ALIASES.read_or_default(input)?;
        let lifecycle = LIFECYCLE.read_or_default(input)?;
        let data_stream_options = DATA_STREAM_OPTIONS.read_or_default(input)?;
        Ok(Template::new(settings, mappings, aliases, lifecycle, data_stream_options)?)
    }
}

impl Template {
    /// Encode for a peer speaking `version`.
    pub fn encode(&self, version: TransportVersion) -> Vec<u8> {
        let mut out = StreamOutput::new(version);
        self.write_to(&mut out);
        out.into_bytes()
    }

    /// Decode a complete message written at `version`.
    pub fn decode(data: &[u8], version: TransportVersion) -> Result<Self, DecodeError> {
        let mut input = StreamInput::new(data, version);
        let template = Template::read_from(&mut input)?;
        input.ensure_consumed()?;
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::CURRENT;
    use crate::metadata::{FailureStoreTemplate, TimeValue};
    use serde_json::json;

    const ALL_VERSIONS: [TransportVersion; 5] = [
        MINIMUM_COMPATIBLE,
        LIFECYCLE_ADDED,
        LIFECYCLE_ENABLED_FLAG,
        DATA_STREAM_OPTIONS_ADDED,
        CURRENT,
    ];

    fn full_template() -> Template {
        Template::builder()
            .settings(Some(Settings::builder().put("index.number_of_shards", 2).build()))
            .mappings(Some(
                CompressedContent::from_json(&json!({"properties": {"ts": {"type": "date"}}})).unwrap(),
            ))
            .alias(AliasMetadata::builder("current").write_index(true).build())
            .lifecycle(Some(
                LifecycleTemplate::data()
                    .with_data_retention(ResettableValue::Defined(TimeValue::from_days(30))),
            ))
            .resettable_data_stream_options(ResettableValue::Defined(DataStreamOptionsTemplate::new(
                ResettableValue::Defined(FailureStoreTemplate::new(ResettableValue::Reset)),
            )))
            .build()
            .unwrap()
    }

    /// What a peer at `version` can hold of `template`.
    fn visible_at(template: &Template, version: TransportVersion) -> Template {
        let mut builder = Template::builder_from(Some(template));
        if !LIFECYCLE.is_supported(version) {
            builder = builder.lifecycle(None);
        }
        if !DATA_STREAM_OPTIONS.is_supported(version) {
            builder = builder.resettable_data_stream_options(ResettableValue::Undefined);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_gates_ordered() {
        assert!(SETTINGS.is_ordered());
        assert!(LIFECYCLE.is_ordered());
        assert!(DATA_STREAM_OPTIONS.is_ordered());
    }

    #[test]
    fn test_roundtrip_every_version() {
        let template = full_template();
        for version in ALL_VERSIONS {
            let decoded = Template::decode(&template.encode(version), version).unwrap();
            assert_eq!(decoded, visible_at(&template, version), "at {version}");
        }
    }

    #[test]
    fn test_empty_template_layout() {
        let empty = Template::with_basics(None, None, None);
        assert_eq!(hex::encode(empty.encode(MINIMUM_COMPATIBLE)), "000000");
        assert_eq!(hex::encode(empty.encode(LIFECYCLE_ADDED)), "0000000000");
        assert_eq!(hex::encode(empty.encode(LIFECYCLE_ENABLED_FLAG)), "00000000");
        assert_eq!(hex::encode(empty.encode(CURRENT)), "0000000000");
    }

    #[test]
    fn test_legacy_disabled_lifecycle_has_no_payload() {
        let template = Template::builder()
            .lifecycle(Some(DISABLED_LIFECYCLE.clone()))
            .build()
            .unwrap();

        let bytes = template.encode(LIFECYCLE_ADDED);
        // settings, mappings, aliases absent; explicit_null set
        assert_eq!(hex::encode(&bytes), "00000001");

        let decoded = Template::decode(&bytes, LIFECYCLE_ADDED).unwrap();
        assert_eq!(decoded.lifecycle(), Some(&DISABLED_LIFECYCLE));
    }

    #[test]
    fn test_legacy_enabled_lifecycle_keeps_payload() {
        let lifecycle = LifecycleTemplate::data()
            .with_data_retention(ResettableValue::Defined(TimeValue::from_days(7)));
        let template = Template::builder().lifecycle(Some(lifecycle.clone())).build().unwrap();

        let decoded = Template::decode(&template.encode(LIFECYCLE_ADDED), LIFECYCLE_ADDED).unwrap();
        assert_eq!(decoded.lifecycle(), Some(&lifecycle));
    }

    #[test]
    fn test_options_truncated_for_old_peers() {
        let template = Template::with_options(
            None,
            None,
            None,
            None,
            Some(DataStreamOptionsTemplate::failure_store_enabled(true)),
        )
        .unwrap();

        let version = LIFECYCLE_ENABLED_FLAG;
        let decoded = Template::decode(&template.encode(version), version).unwrap();
        assert!(decoded.resettable_data_stream_options().is_undefined());
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let mut bytes = Template::with_basics(None, None, None).encode(CURRENT);
        bytes.push(0);
        assert_eq!(Template::decode(&bytes, CURRENT), Err(DecodeError::TrailingBytes(1)));
    }

    #[test]
    fn test_decode_rejects_failure_store_lifecycle() {
        let mut out = StreamOutput::new(CURRENT);
        out.write_bool(false);
        out.write_bool(false);
        out.write_bool(false);
        out.write_bool(true);
        LifecycleTemplate::data()
            .with_lifecycle_type(crate::metadata::LifecycleType::Failures)
            .write_to(&mut out);
        ResettableValue::<DataStreamOptionsTemplate>::Undefined.write_to(&mut out);

        let result = Template::decode(&out.into_bytes(), CURRENT);
        assert!(matches!(result, Err(DecodeError::Validation(_))));
    }

    #[test]
    fn test_truncated_input() {
        let bytes = full_template().encode(CURRENT);
        let result = Template::decode(&bytes[..bytes.len() - 1], CURRENT);
        assert!(matches!(result, Err(DecodeError::UnexpectedEof { .. })));
    }
}
