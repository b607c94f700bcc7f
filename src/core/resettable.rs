//! Tri-state field values.
//!
//! A [`ResettableValue`] tells apart "not mentioned", "explicitly cleared"
//! and "set to a value". Every codec matches all three variants, so a
//! forgotten `Reset` arm is a compile error rather than a silent default.
//!
//! Wire format:
//! ```text
//! Undefined  [0x00]
//! Reset      [0x01][0x00]
//! Defined    [0x01][0x01][payload]
//! ```
//! The first flag is "specified", the second is the optional payload
//! presence flag. This is the layout older peers read, so it is kept even
//! though a single tag byte would be smaller.

use super::error::{ContentError, DecodeError};
use super::traits::{Readable, Writeable};
use crate::content::ContentParams;
use crate::wire::{StreamInput, StreamOutput};
use serde_json::{Map, Value};

/// Three-way optional value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResettableValue<T> {
    /// Never mentioned; leaves any existing value untouched.
    Undefined,
    /// Explicitly reverted to the default/absent state.
    Reset,
    /// Explicit value.
    Defined(T),
}

impl<T> Default for ResettableValue<T> {
    fn default() -> Self {
        ResettableValue::Undefined
    }
}

impl<T> ResettableValue<T> {
    /// The "not mentioned" value.
    pub const fn undefined() -> Self {
        ResettableValue::Undefined
    }

    /// The "explicitly cleared" value.
    pub const fn reset() -> Self {
        ResettableValue::Reset
    }

    /// Lift a plain optional value.
    ///
    /// `None` maps to [`ResettableValue::Undefined`], matching how template
    /// services have always lifted nullable inputs; an explicit clear must be
    /// requested with [`ResettableValue::reset`]. Parsers that see a present
    /// `null` use [`ResettableValue::from_field`], which yields `Reset`.
    pub fn create(value: Option<T>) -> Self {
        match value {
            Some(value) => ResettableValue::Defined(value),
            None => ResettableValue::Undefined,
        }
    }

    /// The payload, or `None` for both `Undefined` and `Reset`.
    pub fn get(&self) -> Option<&T> {
        match self {
            ResettableValue::Defined(value) => Some(value),
            ResettableValue::Undefined | ResettableValue::Reset => None,
        }
    }

    /// Consume into the payload, collapsing `Undefined` and `Reset`.
    pub fn into_option(self) -> Option<T> {
        match self {
            ResettableValue::Defined(value) => Some(value),
            ResettableValue::Undefined | ResettableValue::Reset => None,
        }
    }

    /// True for [`ResettableValue::Undefined`].
    pub fn is_undefined(&self) -> bool {
        matches!(self, ResettableValue::Undefined)
    }

    /// True for [`ResettableValue::Reset`].
    pub fn is_reset(&self) -> bool {
        matches!(self, ResettableValue::Reset)
    }

    /// True for [`ResettableValue::Defined`].
    pub fn is_defined(&self) -> bool {
        matches!(self, ResettableValue::Defined(_))
    }

    /// Borrow the payload.
    pub fn as_ref(&self) -> ResettableValue<&T> {
        match self {
            ResettableValue::Undefined => ResettableValue::Undefined,
            ResettableValue::Reset => ResettableValue::Reset,
            ResettableValue::Defined(value) => ResettableValue::Defined(value),
        }
    }

    /// Map the payload, keeping the discriminant.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResettableValue<U> {
        match self {
            ResettableValue::Undefined => ResettableValue::Undefined,
            ResettableValue::Reset => ResettableValue::Reset,
            ResettableValue::Defined(value) => ResettableValue::Defined(f(value)),
        }
    }

    /// Write with a caller-supplied payload writer.
    pub fn write_with(&self, out: &mut StreamOutput, write_value: impl FnOnce(&T, &mut StreamOutput)) {
        match self {
            ResettableValue::Undefined => out.write_bool(false),
            ResettableValue::Reset => {
                out.write_bool(true);
                out.write_bool(false);
            }
            ResettableValue::Defined(value) => {
                out.write_bool(true);
                out.write_bool(true);
                write_value(value, out);
            }
        }
    }

    /// Read with a caller-supplied payload reader.
    pub fn read_with(
        input: &mut StreamInput<'_>,
        read_value: impl FnOnce(&mut StreamInput<'_>) -> Result<T, DecodeError>,
    ) -> Result<Self, DecodeError> {
        if !input.read_bool()? {
            return Ok(ResettableValue::Undefined);
        }
        if !input.read_bool()? {
            return Ok(ResettableValue::Reset);
        }
        Ok(ResettableValue::Defined(read_value(input)?))
    }

    /// Emit as a named field of `object`.
    ///
    /// `Undefined` never renders. `Reset` renders as `null` unless
    /// [`ContentParams::hide_reset_values`] is set.
    pub fn write_field(
        &self,
        object: &mut Map<String, Value>,
        name: &str,
        params: &ContentParams,
        render: impl FnOnce(&T) -> Result<Value, ContentError>,
    ) -> Result<(), ContentError> {
        match self {
            ResettableValue::Undefined => {}
            ResettableValue::Reset => {
                if !params.hide_reset_values {
                    object.insert(name.to_string(), Value::Null);
                }
            }
            ResettableValue::Defined(value) => {
                object.insert(name.to_string(), render(value)?);
            }
        }
        Ok(())
    }

    /// Parse a named field of `object`: absent key is `Undefined`,
    /// explicit `null` is `Reset`.
    pub fn from_field(
        object: &Map<String, Value>,
        name: &str,
        parse: impl FnOnce(&Value) -> Result<T, ContentError>,
    ) -> Result<Self, ContentError> {
        match object.get(name) {
            None => Ok(ResettableValue::Undefined),
            Some(Value::Null) => Ok(ResettableValue::Reset),
            Some(value) => parse(value).map(ResettableValue::Defined),
        }
    }
}

impl<T: Writeable> Writeable for ResettableValue<T> {
    fn write_to(&self, out: &mut StreamOutput) {
        self.write_with(out, |value, out| value.write_to(out));
    }
}

impl<T: Readable> Readable for ResettableValue<T> {
    fn read_from(input: &mut StreamInput<'_>) -> Result<Self, DecodeError> {
        Self::read_with(input, T::read_from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::CURRENT;
    use proptest::prelude::*;

    #[test]
    fn test_get_collapses_undefined_and_reset() {
        assert_eq!(ResettableValue::<u32>::undefined().get(), None);
        assert_eq!(ResettableValue::<u32>::reset().get(), None);
        assert_eq!(ResettableValue::create(Some(7)).get(), Some(&7));
        assert_ne!(ResettableValue::<u32>::undefined(), ResettableValue::reset());
    }

    #[test]
    fn test_create_none_is_undefined() {
        assert!(ResettableValue::<u32>::create(None).is_undefined());
        assert_eq!(ResettableValue::<u32>::default(), ResettableValue::Undefined);
    }

    #[test]
    fn test_wire_layout() {
        let mut out = StreamOutput::new(CURRENT);
        ResettableValue::<String>::undefined().write_to(&mut out);
        ResettableValue::<String>::reset().write_to(&mut out);
        ResettableValue::Defined("x".to_string()).write_to(&mut out);
        // undefined | reset | defined + "x"
        assert_eq!(hex::encode(out.bytes()), "00010001010178");

        let bytes = out.into_bytes();
        let mut input = StreamInput::new(&bytes, CURRENT);
        assert!(ResettableValue::<String>::read_from(&mut input).unwrap().is_undefined());
        assert!(ResettableValue::<String>::read_from(&mut input).unwrap().is_reset());
        assert_eq!(
            ResettableValue::<String>::read_from(&mut input).unwrap(),
            ResettableValue::Defined("x".to_string())
        );
        assert!(input.is_empty());
    }

    #[test]
    fn test_write_field_hides_reset_on_request() {
        let shown = ContentParams::default();
        let hidden = ContentParams {
            hide_reset_values: true,
            ..ContentParams::default()
        };
        let reset = ResettableValue::<bool>::reset();

        let mut object = Map::new();
        reset.write_field(&mut object, "f", &shown, |v| Ok(Value::Bool(*v))).unwrap();
        assert_eq!(object.get("f"), Some(&Value::Null));

        let mut object = Map::new();
        reset.write_field(&mut object, "f", &hidden, |v| Ok(Value::Bool(*v))).unwrap();
        assert!(object.is_empty());

        let mut object = Map::new();
        ResettableValue::<bool>::undefined()
            .write_field(&mut object, "f", &shown, |v| Ok(Value::Bool(*v)))
            .unwrap();
        assert!(object.is_empty());
    }

    #[test]
    fn test_from_field_distinguishes_null_and_absent() {
        let object: Map<String, Value> = serde_json::from_str(r#"{"a": null, "b": true}"#).unwrap();
        let parse = |v: &Value| v.as_bool().ok_or_else(|| ContentError::invalid("b", "not a bool"));

        assert!(ResettableValue::from_field(&object, "a", parse).unwrap().is_reset());
        assert_eq!(
            ResettableValue::from_field(&object, "b", parse).unwrap(),
            ResettableValue::Defined(true)
        );
        assert!(ResettableValue::from_field(&object, "c", parse).unwrap().is_undefined());
    }

    proptest! {
        #[test]
        fn prop_create_some_roundtrips(value in any::<i64>()) {
            let rv = ResettableValue::create(Some(value));
            prop_assert_eq!(rv.get(), Some(&value));
            prop_assert!(rv.is_defined());
        }
    }
}
