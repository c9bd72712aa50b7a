//! # Native Values
//!
//! The representable shapes of the underlying platform store.
//!
//! A platform defaults database can hold booleans, numbers, strings, binary
//! blobs and dates without any help. Everything else has to be turned into
//! one of these by a coder first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Point in time stored natively by the platform store.
pub type Timestamp = DateTime<Utc>;

/// A value in the store's native representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum NativeValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Floating point number. Non-finite values persist as `"NaN"`,
    /// `"inf"` or `"-inf"`.
    Float(#[serde(with = "float_repr")] f64),
    /// UTF-8 string.
    String(String),
    /// Opaque binary blob.
    Data(Vec<u8>),
    /// Timestamp.
    Date(Timestamp),
}

impl NativeValue {
    /// The shape of this value.
    #[must_use]
    pub fn kind(&self) -> NativeKind {
        match self {
            NativeValue::Bool(_) => NativeKind::Bool,
            NativeValue::Integer(_) => NativeKind::Integer,
            NativeValue::Float(_) => NativeKind::Float,
            NativeValue::String(_) => NativeKind::String,
            NativeValue::Data(_) => NativeKind::Data,
            NativeValue::Date(_) => NativeKind::Date,
        }
    }

    /// Borrow the blob, if this is one.
    #[must_use]
    pub fn as_data(&self) -> Option<&[u8]> {
        match self {
            NativeValue::Data(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Borrow the string, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Approximate number of bytes this value occupies in the store.
    #[must_use]
    pub fn size_hint(&self) -> usize {
        match self {
            NativeValue::Bool(_) => 1,
            NativeValue::Integer(_) | NativeValue::Float(_) | NativeValue::Date(_) => 8,
            NativeValue::String(s) => s.len(),
            NativeValue::Data(bytes) => bytes.len(),
        }
    }
}

impl From<bool> for NativeValue {
    fn from(value: bool) -> Self {
        NativeValue::Bool(value)
    }
}

impl From<i64> for NativeValue {
    fn from(value: i64) -> Self {
        NativeValue::Integer(value)
    }
}

impl From<f64> for NativeValue {
    fn from(value: f64) -> Self {
        NativeValue::Float(value)
    }
}

impl From<String> for NativeValue {
    fn from(value: String) -> Self {
        NativeValue::String(value)
    }
}

impl From<&str> for NativeValue {
    fn from(value: &str) -> Self {
        NativeValue::String(value.to_owned())
    }
}

impl From<Vec<u8>> for NativeValue {
    fn from(value: Vec<u8>) -> Self {
        NativeValue::Data(value)
    }
}

impl From<Timestamp> for NativeValue {
    fn from(value: Timestamp) -> Self {
        NativeValue::Date(value)
    }
}

mod float_repr {
    use serde::{de, Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value.is_sign_positive() {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(FloatVisitor)
    }

    struct FloatVisitor;

    impl de::Visitor<'_> for FloatVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number, \"NaN\", \"inf\" or \"-inf\"")
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<f64, E> {
            Ok(value)
        }

        #[allow(clippy::cast_precision_loss)]
        fn visit_i64<E: de::Error>(self, value: i64) -> Result<f64, E> {
            Ok(value as f64)
        }

        #[allow(clippy::cast_precision_loss)]
        fn visit_u64<E: de::Error>(self, value: u64) -> Result<f64, E> {
            Ok(value as f64)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<f64, E> {
            match value {
                "NaN" => Ok(f64::NAN),
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
            }
        }
    }
}

/// Discriminant of a [`NativeValue`], used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeKind {
    Bool,
    Integer,
    Float,
    String,
    Data,
    Date,
}

impl fmt::Display for NativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NativeKind::Bool => "bool",
            NativeKind::Integer => "integer",
            NativeKind::Float => "float",
            NativeKind::String => "string",
            NativeKind::Data => "data",
            NativeKind::Date => "date",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(NativeValue::from(true).kind(), NativeKind::Bool);
        assert_eq!(NativeValue::from(3i64).kind(), NativeKind::Integer);
        assert_eq!(NativeValue::from(3.5f64).kind(), NativeKind::Float);
        assert_eq!(NativeValue::from("hi").kind(), NativeKind::String);
        assert_eq!(NativeValue::from(vec![1u8, 2]).kind(), NativeKind::Data);
        assert_eq!(NativeValue::from(Utc::now()).kind(), NativeKind::Date);
    }

    #[test]
    fn test_accessors() {
        let blob = NativeValue::Data(vec![1, 2, 3]);
        assert_eq!(blob.as_data(), Some(&[1u8, 2, 3][..]));
        assert_eq!(blob.as_str(), None);
        assert_eq!(blob.size_hint(), 3);

        let text = NativeValue::from("hello");
        assert_eq!(text.as_str(), Some("hello"));
        assert_eq!(text.as_data(), None);
    }

    #[test]
    fn test_file_representation_is_tagged() {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let json = serde_json::to_string(&NativeValue::Date(date)).unwrap();
        assert!(json.contains("\"type\":\"date\""));

        let back: NativeValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, NativeValue::Date(date));
    }

    #[test]
    fn test_non_finite_floats_survive_the_file() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let json = serde_json::to_string(&NativeValue::Float(value)).unwrap();
            let back: NativeValue = serde_json::from_str(&json).unwrap();
            match back {
                NativeValue::Float(f) if value.is_nan() => assert!(f.is_nan()),
                NativeValue::Float(f) => assert_eq!(f, value),
                other => panic!("expected a float, got {other:?}"),
            }
        }

        let json = serde_json::to_string(&NativeValue::Float(2.5)).unwrap();
        assert_eq!(json, r#"{"type":"float","value":2.5}"#);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(NativeKind::Data.to_string(), "data");
        assert_eq!(NativeKind::Integer.to_string(), "integer");
    }
}
