//! Serialization of the data model.
//!
//! Two formats live here:
//! - The array format: `serde_json::Value` trees produced by
//!   [`ArrayCodec::to_array`] and read back by [`ArrayCodec::from_array`].
//!   This is what storage and the API layer persist, so it must round-trip
//!   losslessly, GUIDs included.
//! - The change envelope: a binary frame (`WBCH`/`WBCHZ`) around a JSON
//!   encoded [`Change`](crate::change::Change), optionally zstd compressed.
//!
//! [`canonical`] holds the byte encoding that content hashes are computed
//! over; it is not meant to be decoded.

pub mod canonical;
pub mod change;
pub mod diff;
pub mod entity;
pub mod primitives;
pub mod statement;
pub mod value;

use serde_json::{Map, Value};

use crate::error::DecodeError;

pub use canonical::{content_hash, CanonicalEncode};
pub use change::{decode_change, encode_change, encode_change_compressed, encode_change_with_options, ChangeEncodeOptions};
pub use entity::entity_hash;
pub use primitives::{Reader, Writer};

/// Conversion to and from the array format.
pub trait ArrayCodec: Sized {
    /// Returns the array form of `self`.
    fn to_array(&self) -> Value;

    /// Reads a value back from its array form.
    fn from_array(array: &Value) -> Result<Self, DecodeError>;
}

/// Implements `Serialize`/`Deserialize` by way of [`ArrayCodec`].
macro_rules! serde_via_array {
    ($($ty:ty),* $(,)?) => {$(
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                use serde::Serialize as _;
                $crate::codec::ArrayCodec::to_array(self).serialize(serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let array = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
                <$ty as $crate::codec::ArrayCodec>::from_array(&array)
                    .map_err(serde::de::Error::custom)
            }
        }
    )*};
}
pub(crate) use serde_via_array;

// =============================================================================
// Field access helpers
// =============================================================================

pub(crate) fn as_object<'a>(value: &'a Value, field: &'static str) -> Result<&'a Map<String, Value>, DecodeError> {
    value
        .as_object()
        .ok_or_else(|| DecodeError::invalid(field, "expected an object"))
}

pub(crate) fn as_array<'a>(value: &'a Value, field: &'static str) -> Result<&'a Vec<Value>, DecodeError> {
    value
        .as_array()
        .ok_or_else(|| DecodeError::invalid(field, "expected an array"))
}

pub(crate) fn as_str<'a>(value: &'a Value, field: &'static str) -> Result<&'a str, DecodeError> {
    value
        .as_str()
        .ok_or_else(|| DecodeError::invalid(field, "expected a string"))
}

pub(crate) fn as_i64(value: &Value, field: &'static str) -> Result<i64, DecodeError> {
    value
        .as_i64()
        .ok_or_else(|| DecodeError::invalid(field, "expected an integer"))
}

pub(crate) fn as_f64(value: &Value, field: &'static str) -> Result<f64, DecodeError> {
    value
        .as_f64()
        .ok_or_else(|| DecodeError::invalid(field, "expected a number"))
}

/// Returns a required member of an object.
pub(crate) fn field<'a>(map: &'a Map<String, Value>, key: &'static str) -> Result<&'a Value, DecodeError> {
    map.get(key).ok_or(DecodeError::MissingField { field: key })
}

/// Returns an optional member; JSON `null` counts as absent.
pub(crate) fn opt_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

pub(crate) fn str_field<'a>(map: &'a Map<String, Value>, key: &'static str) -> Result<&'a str, DecodeError> {
    as_str(field(map, key)?, key)
}

pub(crate) fn int_field<T: TryFrom<i64>>(map: &Map<String, Value>, key: &'static str) -> Result<T, DecodeError> {
    let raw = as_i64(field(map, key)?, key)?;
    T::try_from(raw).map_err(|_| DecodeError::invalid(key, format!("{raw} is out of range")))
}

/// Reads the `"type"` discriminant of a tagged object.
pub(crate) fn type_tag(map: &Map<String, Value>) -> Result<&str, DecodeError> {
    str_field(map, "type")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_helpers() {
        let value = json!({"a": "x", "n": 300, "z": null});
        let map = as_object(&value, "root").unwrap();
        assert_eq!(str_field(map, "a").unwrap(), "x");
        assert_eq!(int_field::<u16>(map, "n").unwrap(), 300);
        assert!(matches!(
            int_field::<u8>(map, "n"),
            Err(DecodeError::InvalidField { field: "n", .. })
        ));
        assert!(opt_field(map, "z").is_none());
        assert_eq!(field(map, "b"), Err(DecodeError::MissingField { field: "b" }));
        assert!(as_array(&value, "root").is_err());
    }
}
