//! Data stream lifecycle carried by a template.
//!
//! Wire format (by peer version):
//! ```text
//! data_retention   resettable millis (vlong)
//! enabled          bool               since LIFECYCLE_ENABLED_FLAG, else implied true
//! lifecycle_type   u8 (0 data, 1 failures)  since DATA_STREAM_OPTIONS_ADDED, else data
//! ```
//! Peers between LIFECYCLE_ADDED and LIFECYCLE_ENABLED_FLAG cannot express a
//! disabled lifecycle in the payload; the template codec carries it with an
//! explicit-null flag and [`DISABLED_LIFECYCLE`].

use crate::content::ContentParams;
use crate::core::constants::{DATA_STREAM_OPTIONS_ADDED, LIFECYCLE_ENABLED_FLAG};
use crate::core::{ContentError, DecodeError, Readable, ResettableValue, ToContent, Writeable};
use crate::wire::{Era, FieldGates, StreamInput, StreamOutput};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// The shared "explicitly disabled" lifecycle.
///
/// Compared by value; any disabled data lifecycle without retention equals it.
pub static DISABLED_LIFECYCLE: LifecycleTemplate = LifecycleTemplate::disabled();

/// Which indices of a data stream a lifecycle manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleType {
    /// Backing (data) indices.
    #[default]
    Data,
    /// Failure store indices.
    Failures,
}

impl LifecycleType {
    fn tag(self) -> u8 {
        match self {
            LifecycleType::Data => 0,
            LifecycleType::Failures => 1,
        }
    }
}

fn write_enabled(value: &bool, out: &mut StreamOutput) {
    out.write_bool(*value);
}

fn read_enabled(input: &mut StreamInput<'_>) -> Result<bool, DecodeError> {
    input.read_bool()
}

fn write_type(value: &LifecycleType, out: &mut StreamOutput) {
    out.write_u8(value.tag());
}

fn read_type(input: &mut StreamInput<'_>) -> Result<LifecycleType, DecodeError> {
    match input.read_u8()? {
        0 => Ok(LifecycleType::Data),
        1 => Ok(LifecycleType::Failures),
        tag => Err(DecodeError::UnknownTag {
            kind: "lifecycle type",
            tag,
        }),
    }
}

static ENABLED: FieldGates<bool> = FieldGates::new(
    "lifecycle.enabled",
    &[Era {
        since: LIFECYCLE_ENABLED_FLAG,
        write: write_enabled,
        read: read_enabled,
    }],
);

static LIFECYCLE_TYPE: FieldGates<LifecycleType> = FieldGates::new(
    "lifecycle.type",
    &[Era {
        since: DATA_STREAM_OPTIONS_ADDED,
        write: write_type,
        read: read_type,
    }],
);

/// A duration with millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeValue {
    millis: u64,
}

const SECOND: u64 = 1_000;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

impl TimeValue {
    /// From milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// From whole hours.
    pub const fn from_hours(hours: u64) -> Self {
        Self::from_millis(hours * HOUR)
    }

    /// From whole days.
    pub const fn from_days(days: u64) -> Self {
        Self::from_millis(days * DAY)
    }

    /// Length in milliseconds.
    pub fn millis(&self) -> u64 {
        self.millis
    }
}

impl fmt::Display for TimeValue {
    /// Largest unit that represents the value exactly.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units = [(DAY, "d"), (HOUR, "h"), (MINUTE, "m"), (SECOND, "s")];
        for (size, suffix) in units {
            if self.millis != 0 && self.millis % size == 0 {
                return write!(f, "{}{}", self.millis / size, suffix);
            }
        }
        write!(f, "{}ms", self.millis)
    }
}

impl FromStr for TimeValue {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, unit) = s.split_at(split);
        let amount: u64 = digits
            .parse()
            .map_err(|_| ContentError::invalid("time value", format!("failed to parse [{s}]")))?;
        let scale = match unit {
            "d" => DAY,
            "h" => HOUR,
            "m" => MINUTE,
            "s" => SECOND,
            "ms" => 1,
            _ => {
                return Err(ContentError::invalid(
                    "time value",
                    format!("unknown unit in [{s}]"),
                ));
            }
        };
        amount
            .checked_mul(scale)
            .map(TimeValue::from_millis)
            .ok_or_else(|| ContentError::invalid("time value", format!("[{s}] overflows")))
    }
}

impl Writeable for TimeValue {
    fn write_to(&self, out: &mut StreamOutput) {
        out.write_vlong(self.millis);
    }
}

impl Readable for TimeValue {
    fn read_from(input: &mut StreamInput<'_>) -> Result<Self, DecodeError> {
        Ok(TimeValue::from_millis(input.read_vlong()?))
    }
}

/// Rollover conditions, supplied at render time for display only.
///
/// `max_age` accepts `"auto"`, which is resolved from the data retention
/// when rendered next to a lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolloverConfiguration {
    /// Maximum index age, or `"auto"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<String>,
    /// Maximum document count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_docs: Option<u64>,
    /// Maximum primary shard size, e.g. `"50gb"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_primary_shard_size: Option<String>,
}

impl RolloverConfiguration {
    /// The automatic max age for a given retention.
    pub fn auto_max_age(retention: Option<&TimeValue>) -> TimeValue {
        match retention.map(TimeValue::millis) {
            Some(millis) if millis <= DAY => TimeValue::from_hours(1),
            Some(millis) if millis <= 14 * DAY => TimeValue::from_days(1),
            Some(millis) if millis <= 90 * DAY => TimeValue::from_days(7),
            _ => TimeValue::from_days(30),
        }
    }

    /// Copy with `"auto"` conditions made concrete.
    pub fn resolve(&self, retention: Option<&TimeValue>) -> Self {
        let mut resolved = self.clone();
        if resolved.max_age.as_deref() == Some("auto") {
            resolved.max_age = Some(format!("{} [automatic]", Self::auto_max_age(retention)));
        }
        resolved
    }
}

/// Lifecycle settings a template applies to the data streams it creates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LifecycleTemplate {
    enabled: bool,
    data_retention: ResettableValue<TimeValue>,
    lifecycle_type: LifecycleType,
}

impl Default for LifecycleTemplate {
    fn default() -> Self {
        Self::data()
    }
}

impl LifecycleTemplate {
    /// Enabled data lifecycle, retention unspecified.
    pub const fn data() -> Self {
        Self {
            enabled: true,
            data_retention: ResettableValue::Undefined,
            lifecycle_type: LifecycleType::Data,
        }
    }

    /// Disabled data lifecycle. See [`DISABLED_LIFECYCLE`].
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            data_retention: ResettableValue::Undefined,
            lifecycle_type: LifecycleType::Data,
        }
    }

    /// Set the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the retention.
    pub fn with_data_retention(mut self, retention: ResettableValue<TimeValue>) -> Self {
        self.data_retention = retention;
        self
    }

    /// Set the lifecycle type.
    pub fn with_lifecycle_type(mut self, lifecycle_type: LifecycleType) -> Self {
        self.lifecycle_type = lifecycle_type;
        self
    }

    /// Whether the lifecycle is active.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Retention of the managed indices.
    pub fn data_retention(&self) -> &ResettableValue<TimeValue> {
        &self.data_retention
    }

    /// Which indices the lifecycle manages.
    pub fn lifecycle_type(&self) -> LifecycleType {
        self.lifecycle_type
    }

    /// True if this lifecycle manages failure store indices.
    pub fn targets_failure_store(&self) -> bool {
        self.lifecycle_type == LifecycleType::Failures
    }

    /// Render, adding the effective rollover conditions when given.
    pub fn to_content_with_rollover(
        &self,
        params: &ContentParams,
        rollover: Option<&RolloverConfiguration>,
    ) -> Result<Value, ContentError> {
        let mut object = Map::new();
        object.insert("enabled".to_string(), Value::Bool(self.enabled));
        self.data_retention
            .write_field(&mut object, "data_retention", params, |retention| {
                Ok(Value::String(retention.to_string()))
            })?;
        if let Some(rollover) = rollover {
            let resolved = rollover.resolve(self.data_retention.get());
            object.insert("rollover".to_string(), serde_json::to_value(resolved)?);
        }
        Ok(Value::Object(object))
    }

    /// Parse a `lifecycle` object. Always yields a data lifecycle.
    pub fn from_content(value: &Value) -> Result<Self, ContentError> {
        let Value::Object(object) = value else {
            return Err(ContentError::unexpected("lifecycle", value));
        };
        if let Some(unknown) = object
            .keys()
            .find(|key| !matches!(key.as_str(), "enabled" | "data_retention"))
        {
            return Err(ContentError::UnknownField {
                object: "lifecycle",
                field: unknown.clone(),
            });
        }

        let enabled = match object.get("enabled") {
            None => true,
            Some(Value::Bool(enabled)) => *enabled,
            Some(other) => return Err(ContentError::unexpected("enabled", other)),
        };
        let data_retention = ResettableValue::from_field(object, "data_retention", |value| match value {
            Value::String(s) => s.parse(),
            other => Err(ContentError::unexpected("data_retention", other)),
        })?;

        Ok(Self::data()
            .with_enabled(enabled)
            .with_data_retention(data_retention))
    }
}

impl ToContent for LifecycleTemplate {
    fn to_content(&self, params: &ContentParams) -> Result<Value, ContentError> {
        self.to_content_with_rollover(params, None)
    }
}

impl Writeable for LifecycleTemplate {
    fn write_to(&self, out: &mut StreamOutput) {
        self.data_retention.write_to(out);
        ENABLED.write(&self.enabled, out);
        LIFECYCLE_TYPE.write(&self.lifecycle_type, out);
    }
}

impl Readable for LifecycleTemplate {
    fn read_from(input: &mut StreamInput<'_>) -> Result<Self, DecodeError> {
        let data_retention = ResettableValue::read_from(input)?;
        let enabled = ENABLED.read(input)?.unwrap_or(true);
        let lifecycle_type = LIFECYCLE_TYPE.read_or_default(input)?;
        Ok(Self {
            enabled,
            data_retention,
            lifecycle_type,
        })
    }
}
