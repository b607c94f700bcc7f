//! Data stream options carried by a template.
//!
//! Both levels are tri-state so that a composed template can clear a block
//! or a single flag set by a lower-priority template.

use crate::content::ContentParams;
use crate::core::{ContentError, DecodeError, Readable, ResettableValue, ToContent, Writeable};
use crate::wire::{StreamInput, StreamOutput};
use serde_json::{Map, Value};

const FAILURE_STORE: &str = "failure_store";
const ENABLED: &str = "enabled";

/// Failure store block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FailureStoreTemplate {
    enabled: ResettableValue<bool>,
}

impl FailureStoreTemplate {
    /// Failure store with the given enabled state.
    pub fn new(enabled: ResettableValue<bool>) -> Self {
        Self { enabled }
    }

    /// Enabled state.
    pub fn enabled(&self) -> &ResettableValue<bool> {
        &self.enabled
    }

    fn from_content(value: &Value) -> Result<Self, ContentError> {
        let object = strict_object(FAILURE_STORE, "failure_store", value, &[ENABLED])?;
        let enabled = ResettableValue::from_field(object, ENABLED, |v| {
            v.as_bool().ok_or_else(|| ContentError::unexpected(ENABLED, v))
        })?;
        Ok(Self { enabled })
    }
}

impl ToContent for FailureStoreTemplate {
    fn to_content(&self, params: &ContentParams) -> Result<Value, ContentError> {
        let mut object = Map::new();
        self.enabled
            .write_field(&mut object, ENABLED, params, |enabled| Ok(Value::Bool(*enabled)))?;
        Ok(Value::Object(object))
    }
}

impl Writeable for FailureStoreTemplate {
    fn write_to(&self, out: &mut StreamOutput) {
        self.enabled.write_to(out);
    }
}

impl Readable for FailureStoreTemplate {
    fn read_from(input: &mut StreamInput<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            enabled: ResettableValue::read_from(input)?,
        })
    }
}

/// Feature-flagged options for the data streams a template creates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DataStreamOptionsTemplate {
    failure_store: ResettableValue<FailureStoreTemplate>,
}

impl DataStreamOptionsTemplate {
    /// Options with nothing specified.
    pub const EMPTY: DataStreamOptionsTemplate = DataStreamOptionsTemplate {
        failure_store: ResettableValue::Undefined,
    };

    /// Options with the given failure store block.
    pub fn new(failure_store: ResettableValue<FailureStoreTemplate>) -> Self {
        Self { failure_store }
    }

    /// Shorthand for a defined failure store with a defined enabled flag.
    pub fn failure_store_enabled(enabled: bool) -> Self {
        Self::new(ResettableValue::Defined(FailureStoreTemplate::new(
            ResettableValue::Defined(enabled),
        )))
    }

    /// Failure store block.
    pub fn failure_store(&self) -> &ResettableValue<FailureStoreTemplate> {
        &self.failure_store
    }

    /// Parse a `data_stream_options` object.
    pub fn from_content(value: &Value) -> Result<Self, ContentError> {
        let object = strict_object("data_stream_options", "data_stream_options", value, &[FAILURE_STORE])?;
        let failure_store = ResettableValue::from_field(object, FAILURE_STORE, FailureStoreTemplate::from_content)?;
        Ok(Self { failure_store })
    }
}

fn strict_object<'v>(
    field: &str,
    object_name: &'static str,
    value: &'v Value,
    known: &[&str],
) -> Result<&'v Map<String, Value>, ContentError> {
    let Value::Object(object) = value else {
        return Err(ContentError::unexpected(field, value));
    };
    match object.keys().find(|key| !known.contains(&key.as_str())) {
        Some(unknown) => Err(ContentError::UnknownField {
            object: object_name,
            field: unknown.clone(),
        }),
        None => Ok(object),
    }
}

impl ToContent for DataStreamOptionsTemplate {
    fn to_content(&self, params: &ContentParams) -> Result<Value, ContentError> {
        let mut object = Map::new();
        self.failure_store
            .write_field(&mut object, FAILURE_STORE, params, |store| store.to_content(params))?;
        Ok(Value::Object(object))
    }
}

impl Writeable for DataStreamOptionsTemplate {
    fn write_to(&self, out: &mut StreamOutput) {
        self.failure_store.write_to(out);
    }
}

impl Readable for DataStreamOptionsTemplate {
    fn read_from(input: &mut StreamInput<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            failure_store: ResettableValue::read_from(input)?,
        })
    }
}
