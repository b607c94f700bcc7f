//! Index settings container.
//!
//! Settings are held flat: nested objects in structured input are folded
//! into dotted keys (`{"index": {"number_of_replicas": 1}}` becomes
//! `index.number_of_replicas`). Leaf values keep their JSON scalar type.
//!
//! Wire format:
//! ```text
//! count (vint)
//! repeated: key (string) + tagged value
//!   0x00 null | 0x01 string | 0x02 i64 | 0x03 u64 | 0x04 f64 | 0x05 bool | 0x06 list
//! ```

use crate::content::ContentParams;
use crate::core::{ContentError, DecodeError, Readable, ToContent, Writeable};
use crate::wire::{StreamInput, StreamOutput};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Value of a single setting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SettingValue {
    /// Explicit null (unsets the setting when applied).
    Null,
    /// String value.
    String(String),
    /// Numeric value.
    Number(Number),
    /// Boolean value.
    Bool(bool),
    /// List of scalar values.
    List(Vec<SettingValue>),
}

impl SettingValue {
    fn from_json(key: &str, value: &Value, in_list: bool) -> Result<Self, ContentError> {
        match value {
            Value::Null => Ok(SettingValue::Null),
            Value::String(s) => Ok(SettingValue::String(s.clone())),
            Value::Number(n) => Ok(SettingValue::Number(n.clone())),
            Value::Bool(b) => Ok(SettingValue::Bool(*b)),
            Value::Array(items) if !in_list => items
                .iter()
                .map(|item| SettingValue::from_json(key, item, true))
                .collect::<Result<Vec<_>, _>>()
                .map(SettingValue::List),
            other => Err(ContentError::unexpected(key, other)),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            SettingValue::Null => Value::Null,
            SettingValue::String(s) => Value::String(s.clone()),
            SettingValue::Number(n) => Value::Number(n.clone()),
            SettingValue::Bool(b) => Value::Bool(*b),
            SettingValue::List(items) => Value::Array(items.iter().map(SettingValue::to_json).collect()),
        }
    }

    /// String form, as a settings consumer would read it.
    pub fn as_string(&self) -> Option<String> {
        match self {
            SettingValue::Null | SettingValue::List(_) => None,
            SettingValue::String(s) => Some(s.clone()),
            SettingValue::Number(n) => Some(n.to_string()),
            SettingValue::Bool(b) => Some(b.to_string()),
        }
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::String(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::String(value)
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<i32> for SettingValue {
    fn from(value: i32) -> Self {
        SettingValue::Number(Number::from(value))
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Number(Number::from(value))
    }
}

impl From<u64> for SettingValue {
    fn from(value: u64) -> Self {
        SettingValue::Number(Number::from(value))
    }
}

impl Writeable for SettingValue {
    fn write_to(&self, out: &mut StreamOutput) {
        match self {
            SettingValue::Null => out.write_u8(0),
            SettingValue::String(s) => {
                out.write_u8(1);
                out.write_string(s);
            }
            SettingValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    out.write_u8(2);
                    out.write_i64(i);
                } else if let Some(u) = n.as_u64() {
                    out.write_u8(3);
                    out.write_vlong(u);
                } else {
                    out.write_u8(4);
                    out.write_f64(n.as_f64().unwrap_or_default());
                }
            }
            SettingValue::Bool(b) => {
                out.write_u8(5);
                out.write_bool(*b);
            }
            SettingValue::List(items) => {
                out.write_u8(6);
                out.write_collection(items.iter());
            }
        }
    }
}

impl Readable for SettingValue {
    fn read_from(input: &mut StreamInput<'_>) -> Result<Self, DecodeError> {
        match input.read_u8()? {
            6 => {
                // List items are scalars; a nested list is malformed.
                let count = input.read_vint()?;
                let mut items = Vec::with_capacity(count.min(input.remaining()));
                for _ in 0..count {
                    match input.read_u8()? {
                        6 => {
                            return Err(DecodeError::InvalidEncoding(
                                "nested list in setting value".to_string(),
                            ));
                        }
                        tag => items.push(SettingValue::read_scalar(tag, input)?),
                    }
                }
                Ok(SettingValue::List(items))
            }
            tag => SettingValue::read_scalar(tag, input),
        }
    }
}

impl SettingValue {
    fn read_scalar(tag: u8, input: &mut StreamInput<'_>) -> Result<Self, DecodeError> {
        match tag {
            0 => Ok(SettingValue::Null),
            1 => Ok(SettingValue::String(input.read_string()?)),
            2 => Ok(SettingValue::Number(Number::from(input.read_i64()?))),
            3 => Ok(SettingValue::Number(Number::from(input.read_vlong()?))),
            4 => {
                let f = input.read_f64()?;
                Number::from_f64(f)
                    .map(SettingValue::Number)
                    .ok_or_else(|| DecodeError::InvalidEncoding(format!("non-finite setting value {f}")))
            }
            5 => Ok(SettingValue::Bool(input.read_bool()?)),
            tag => Err(DecodeError::UnknownTag {
                kind: "setting value",
                tag,
            }),
        }
    }
}

/// Immutable, key-sorted settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Settings {
    entries: BTreeMap<String, SettingValue>,
}

impl Settings {
    /// Start building settings.
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Value for a flat key.
    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.entries.get(key)
    }

    /// Number of settings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no settings are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parse a settings object, flattening nested objects to dotted keys.
    pub fn from_content(value: &Value) -> Result<Self, ContentError> {
        let Value::Object(object) = value else {
            return Err(ContentError::unexpected("settings", value));
        };
        let mut entries = BTreeMap::new();
        flatten_into(&mut entries, None, object)?;
        Ok(Self { entries })
    }
}

fn flatten_into(
    entries: &mut BTreeMap<String, SettingValue>,
    prefix: Option<&str>,
    object: &Map<String, Value>,
) -> Result<(), ContentError> {
    for (key, value) in object {
        let full_key = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(nested) => flatten_into(entries, Some(&full_key), nested)?,
            leaf => {
                let leaf = SettingValue::from_json(&full_key, leaf, false)?;
                entries.insert(full_key, leaf);
            }
        }
    }
    Ok(())
}

/// Insert `value` under the dotted `key`, nesting where the path is free.
///
/// If an intermediate segment is already a leaf, the rest of the key is kept
/// flat at that level.
fn insert_nested(root: &mut Map<String, Value>, key: &str, value: Value) {
    match key.split_once('.') {
        None => {
            root.insert(key.to_string(), value);
        }
        Some((head, rest)) => {
            let slot = root
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            match slot {
                Value::Object(child) => insert_nested(child, rest, value),
                _ => {
                    root.insert(key.to_string(), value);
                }
            }
        }
    }
}

impl ToContent for Settings {
    fn to_content(&self, params: &ContentParams) -> Result<Value, ContentError> {
        let mut object = Map::new();
        for (key, value) in &self.entries {
            if params.flat_settings {
                object.insert(key.clone(), value.to_json());
            } else {
                insert_nested(&mut object, key, value.to_json());
            }
        }
        Ok(Value::Object(object))
    }
}

impl Writeable for Settings {
    fn write_to(&self, out: &mut StreamOutput) {
        out.write_vint(self.entries.len());
        for (key, value) in &self.entries {
            out.write_string(key);
            value.write_to(out);
        }
    }
}

impl Readable for Settings {
    fn read_from(input: &mut StreamInput<'_>) -> Result<Self, DecodeError> {
        let count = input.read_vint()?;
        let mut entries = BTreeMap::new();
        for _ in 0..count {
            let key = input.read_string()?;
            let value = SettingValue::read_from(input)?;
            entries.insert(key, value);
        }
        Ok(Self { entries })
    }
}

/// Builder for [`Settings`].
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    entries: BTreeMap<String, SettingValue>,
}

impl SettingsBuilder {
    /// Set a flat key.
    pub fn put(mut self, key: impl Into<String>, value: impl Into<SettingValue>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Build the settings.
    pub fn build(self) -> Settings {
        Settings {
            entries: self.entries,
        }
    }
}
