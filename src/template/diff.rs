//! Field-wise diffs between two templates.
//!
//! A diff names each field as unchanged or as replaced by a new value.
//! Unchanged never means cleared: clearing is a change to `None` (or to
//! `Reset` for data stream options).
//!
//! Wire format, per field in template order, for fields the peer knows:
//! ```text
//! 0x00            unchanged
//! 0x01 + value    changed, value in the field's template layout
//! ```

use super::codec::{ALIASES, DATA_STREAM_OPTIONS, LIFECYCLE, MAPPINGS, SETTINGS};
use super::template::Template;
use crate::content::CompressedContent;
use crate::core::{ApplyError, DecodeError, Diffable, ResettableValue, TransportVersion};
use crate::metadata::{AliasMap, DataStreamOptionsTemplate, LifecycleTemplate, Settings};
use crate::wire::{FieldGates, StreamInput, StreamOutput};
use tracing::debug;

/// Change to one field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldDiff<T> {
    /// Keep the current value.
    #[default]
    Unchanged,
    /// Replace with this value.
    Changed(T),
}

impl<T: Clone + 'static> FieldDiff<T> {
    fn between(old: &T, new: &T, same: impl FnOnce(&T, &T) -> bool) -> Self {
        if same(old, new) {
            FieldDiff::Unchanged
        } else {
            FieldDiff::Changed(new.clone())
        }
    }

    /// The value after applying to `current`.
    pub fn apply_to(&self, current: &T) -> T {
        match self {
            FieldDiff::Unchanged => current.clone(),
            FieldDiff::Changed(value) => value.clone(),
        }
    }

    /// True for [`FieldDiff::Unchanged`].
    pub fn is_unchanged(&self) -> bool {
        matches!(self, FieldDiff::Unchanged)
    }

    fn write(&self, gate: &FieldGates<T>, out: &mut StreamOutput) {
        if !gate.is_supported(out.version()) {
            return;
        }
        match self {
            FieldDiff::Unchanged => out.write_u8(0),
            FieldDiff::Changed(value) => {
                out.write_u8(1);
                gate.write(value, out);
            }
        }
    }

    fn read(gate: &FieldGates<T>, input: &mut StreamInput<'_>) -> Result<Self, DecodeError> {
        if !gate.is_supported(input.version()) {
            return Ok(FieldDiff::Unchanged);
        }
        match input.read_u8()? {
            0 => Ok(FieldDiff::Unchanged),
            1 => Ok(gate.read(input)?.map_or(FieldDiff::Unchanged, FieldDiff::Changed)),
            tag => Err(DecodeError::UnknownTag {
                kind: "field diff",
                tag,
            }),
        }
    }
}

/// Diff turning one template into another.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TemplateDiff {
    /// Settings change.
    pub settings: FieldDiff<Option<Settings>>,
    /// Mappings change; compared by bytes so the result is byte-exact.
    pub mappings: FieldDiff<Option<CompressedContent>>,
    /// Aliases change.
    pub aliases: FieldDiff<Option<AliasMap>>,
    /// Lifecycle change.
    pub lifecycle: FieldDiff<Option<LifecycleTemplate>>,
    /// Data stream options change.
    pub data_stream_options: FieldDiff<ResettableValue<DataStreamOptionsTemplate>>,
}

impl TemplateDiff {
    /// True if no field changes.
    pub fn is_empty(&self) -> bool {
        self.changed_fields() == 0
    }

    fn changed_fields(&self) -> usize {
        [
            self.settings.is_unchanged(),
            self.mappings.is_unchanged(),
            self.aliases.is_unchanged(),
            self.lifecycle.is_unchanged(),
            self.data_stream_options.is_unchanged(),
        ]
        .into_iter()
        .filter(|unchanged| !unchanged)
        .count()
    }
}

fn same_bytes(a: &Option<CompressedContent>, b: &Option<CompressedContent>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.ptr_eq(b) || a.compressed() == b.compressed(),
        _ => false,
    }
}

impl Diffable for Template {
    type Diff = TemplateDiff;

    const TYPE_ID: &'static str = "cluster.template.v1";

    fn diff_from(&self, old: &Self) -> Self::Diff {
        TemplateDiff {
            settings: FieldDiff::between(&old.settings, &self.settings, PartialEq::eq),
            mappings: FieldDiff::between(&old.mappings, &self.mappings, same_bytes),
            aliases: FieldDiff::between(&old.aliases, &self.aliases, PartialEq::eq),
            lifecycle: FieldDiff::between(&old.lifecycle, &self.lifecycle, PartialEq::eq),
            data_stream_options: FieldDiff::between(
                &old.data_stream_options,
                &self.data_stream_options,
                PartialEq::eq,
            ),
        }
    }

    fn apply_diff(&self, diff: &Self::Diff) -> Result<Self, ApplyError> {
        debug!(changed = diff.changed_fields(), "applying template diff");
        Ok(Template::new(
            diff.settings.apply_to(&self.settings),
            diff.mappings.apply_to(&self.mappings),
            diff.aliases.apply_to(&self.aliases),
            diff.lifecycle.apply_to(&self.lifecycle),
            diff.data_stream_options.apply_to(&self.data_stream_options),
        )?)
    }

    fn encode_diff(diff: &Self::Diff, version: TransportVersion) -> Vec<u8> {
        let mut out = StreamOutput::new(version);
        diff.settings.write(&SETTINGS, &mut out);
        diff.mappings.write(&MAPPINGS, &mut out);
        diff.aliases.write(&ALIASES, &mut out);
        diff.lifecycle.write(&LIFECYCLE, &mut out);
        diff.data_stream_options.write(&DATA_STREAM_OPTIONS, &mut out);
        out.into_bytes()
    }

    fn decode_diff(data: &[u8], version: TransportVersion) -> Result<Self::Diff, DecodeError> {
        let mut input = StreamInput::new(data, version);
        let diff = TemplateDiff {
            settings: FieldDiff::read(&SETTINGS, &mut input)?,
            mappings: FieldDiff::read(&MAPPINGS, &mut input)?,
            aliases: FieldDiff::read(&ALIASES, &mut input)?,
            lifecycle: FieldDiff::read(&LIFECYCLE, &mut input)?,
            data_stream_options: FieldDiff::read(&DATA_STREAM_OPTIONS, &mut input)?,
        };
        input.ensure_consumed()?;
        Ok(diff)
    }

    fn encode_full(&self, version: TransportVersion) -> Vec<u8> {
        self.encode(version)
    }

    fn decode_full(data: &[u8], version: TransportVersion) -> Result<Self, DecodeError> {
        Template::decode(data, version)
    }

    fn is_diff_empty(diff: &Self::Diff) -> bool {
        diff.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::{CURRENT, LIFECYCLE_ENABLED_FLAG, MINIMUM_COMPATIBLE};
    use crate::metadata::{AliasMetadata, DISABLED_LIFECYCLE, FailureStoreTemplate, TimeValue};
    use proptest::prelude::*;
    use serde_json::json;
    use std::fmt::Debug;

    fn arb_resettable<T: Clone + Debug + 'static>(
        inner: impl Strategy<Value = T> + 'static,
    ) -> impl Strategy<Value = ResettableValue<T>> {
        prop_oneof![
            Just(ResettableValue::Undefined),
            Just(ResettableValue::Reset),
            inner.prop_map(ResettableValue::Defined),
        ]
    }

    fn arb_settings() -> impl Strategy<Value = Settings> {
        prop::collection::btree_map("[a-c]\\.[x-z]", 0i64..5, 0..3).prop_map(|entries| {
            entries
                .into_iter()
                .fold(Settings::builder(), |builder, (key, value)| builder.put(key, value))
                .build()
        })
    }

    fn arb_mappings() -> impl Strategy<Value = CompressedContent> {
        prop::sample::select(vec![
            json!({"properties": {}}),
            json!({"_doc": {"properties": {}}}),
            json!({"properties": {"f": {"type": "keyword"}}}),
            json!({"dynamic": false}),
        ])
        .prop_map(|tree| CompressedContent::from_json(&tree).unwrap())
    }

    fn arb_aliases() -> impl Strategy<Value = AliasMap> {
        prop::collection::btree_map("[a-c]", any::<Option<bool>>(), 0..3).prop_map(|entries| {
            entries
                .into_iter()
                .map(|(name, hidden)| {
                    let builder = AliasMetadata::builder(name.clone());
                    let alias = match hidden {
                        Some(hidden) => builder.hidden(hidden).build(),
                        None => builder.build(),
                    };
                    (name, alias)
                })
                .collect::<AliasMap>()
        })
    }

    fn arb_lifecycle() -> impl Strategy<Value = LifecycleTemplate> {
        (any::<bool>(), arb_resettable(1u64..400)).prop_map(|(enabled, retention)| {
            LifecycleTemplate::data()
                .with_enabled(enabled)
                .with_data_retention(retention.map(TimeValue::from_days))
        })
    }

    fn arb_options() -> impl Strategy<Value = DataStreamOptionsTemplate> {
        arb_resettable(arb_resettable(any::<bool>()).prop_map(FailureStoreTemplate::new))
            .prop_map(DataStreamOptionsTemplate::new)
    }

    fn arb_template() -> impl Strategy<Value = Template> {
        (
            prop::option::of(arb_settings()),
            prop::option::of(arb_mappings()),
            prop::option::of(arb_aliases()),
            prop::option::of(arb_lifecycle()),
            arb_resettable(arb_options()),
        )
            .prop_map(|(settings, mappings, aliases, lifecycle, options)| {
                Template::new(settings, mappings, aliases, lifecycle, options).unwrap()
            })
    }

    proptest! {
        #[test]
        fn prop_apply_reproduces_after(before in arb_template(), after in arb_template()) {
            let diff = after.diff_from(&before);
            let applied = before.apply_diff(&diff).unwrap();
            prop_assert_eq!(&applied, &after);
            prop_assert_eq!(applied.encode(CURRENT), after.encode(CURRENT));

            let wire = Template::decode_diff(&Template::encode_diff(&diff, CURRENT), CURRENT).unwrap();
            prop_assert_eq!(&wire, &diff);
        }

        #[test]
        fn prop_self_diff_is_empty(template in arb_template()) {
            let diff = template.diff_from(&template);
            prop_assert!(Template::is_diff_empty(&diff));

            let wire = Template::decode_diff(&Template::encode_diff(&diff, CURRENT), CURRENT).unwrap();
            let applied = template.apply_diff(&wire).unwrap();
            prop_assert_eq!(applied.encode(CURRENT), template.encode(CURRENT));
        }
    }

    #[test]
    fn test_clearing_is_a_change() {
        let before = Template::builder()
            .lifecycle(Some(DISABLED_LIFECYCLE.clone()))
            .data_stream_options(Some(DataStreamOptionsTemplate::failure_store_enabled(true)))
            .build()
            .unwrap();
        let after = Template::builder()
            .resettable_data_stream_options(ResettableValue::Reset)
            .build()
            .unwrap();

        let diff = after.diff_from(&before);
        assert_eq!(diff.lifecycle, FieldDiff::Changed(None));
        assert_eq!(diff.data_stream_options, FieldDiff::Changed(ResettableValue::Reset));
        assert!(diff.settings.is_unchanged());
        assert_eq!(before.apply_diff(&diff).unwrap(), after);
    }

    #[test]
    fn test_rewrapped_mapping_is_sent() {
        let bare = CompressedContent::from_json(&json!({"properties": {}})).unwrap();
        let wrapped = CompressedContent::from_json(&json!({"_doc": {"properties": {}}})).unwrap();
        let before = Template::with_basics(None, Some(bare), None);
        let after = Template::with_basics(None, Some(wrapped.clone()), None);

        assert_eq!(before, after);
        let diff = after.diff_from(&before);
        assert_eq!(diff.mappings, FieldDiff::Changed(Some(wrapped)));
    }

    #[test]
    fn test_empty_diff_layout() {
        let diff = TemplateDiff::default();
        assert_eq!(hex::encode(Template::encode_diff(&diff, CURRENT)), "0000000000");
        assert_eq!(hex::encode(Template::encode_diff(&diff, MINIMUM_COMPATIBLE)), "000000");
    }

    #[test]
    fn test_old_peer_diff_leaves_unknown_fields() {
        let before = Template::builder()
            .data_stream_options(Some(DataStreamOptionsTemplate::failure_store_enabled(false)))
            .build()
            .unwrap();
        let after = Template::builder()
            .settings(Some(Settings::builder().put("index.hidden", true).build()))
            .build()
            .unwrap();

        let version = LIFECYCLE_ENABLED_FLAG;
        let wire = Template::encode_diff(&after.diff_from(&before), version);
        let diff = Template::decode_diff(&wire, version).unwrap();
        assert!(diff.data_stream_options.is_unchanged());

        let applied = before.apply_diff(&diff).unwrap();
        assert_eq!(applied.settings(), after.settings());
        assert_eq!(applied.data_stream_options(), before.data_stream_options());
    }

    #[test]
    fn test_unknown_diff_tag() {
        let result = Template::decode_diff(&[2], MINIMUM_COMPATIBLE);
        assert!(matches!(result, Err(DecodeError::UnknownTag { tag: 2, .. })));
    }

    #[test]
    fn test_apply_rejects_invalid_result() {
        let diff = TemplateDiff {
            lifecycle: FieldDiff::Changed(Some(
                LifecycleTemplate::data().with_lifecycle_type(crate::metadata::LifecycleType::Failures),
            )),
            ..TemplateDiff::default()
        };
        let result = Template::with_basics(None, None, None).apply_diff(&diff);
        assert!(matches!(result, Err(ApplyError::Invalid(_))));
    }
}
