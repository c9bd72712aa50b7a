//! # JSON Value Coder
//!
//! Scalars the store understands are stored as themselves. Everything else
//! (null, arrays, objects, integers beyond `i64`) becomes a JSON blob.
//!
//! | JSON value             | Native shape |
//! |------------------------|--------------|
//! | `true` / `false`       | `Bool`       |
//! | number fitting `i64`   | `Integer`    |
//! | other finite number    | `Float`      |
//! | string                 | `String`     |
//! | anything else          | `Data` (JSON bytes) |
//!
//! On the way back, a `Date` native reads as an RFC 3339 string, so fields
//! typed as `DateTime<Utc>` accept dates written by other tools.
//!
//! Blob, timestamp and float fields never reach this table: the typed
//! surface stores them as `Data`, `Date` and `Float` directly.

use crate::domain::errors::CoderError;
use crate::ports::coder::ValueCoder;
use chrono::SecondsFormat;
use serde_json::{Number, Value};
use shared_types::NativeValue;

/// The default coder of every store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonValueCoder;

impl JsonValueCoder {
    /// Create the coder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ValueCoder for JsonValueCoder {
    fn encode(&self, value: Value, key: &str) -> Result<NativeValue, CoderError> {
        match value {
            Value::Bool(flag) => Ok(NativeValue::Bool(flag)),
            Value::String(text) => Ok(NativeValue::String(text)),
            Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    Ok(NativeValue::Integer(int))
                } else if number.is_u64() {
                    serde_json::to_vec(&number)
                        .map(NativeValue::Data)
                        .map_err(|e| CoderError::encode(key, e))
                } else {
                    number
                        .as_f64()
                        .map(NativeValue::Float)
                        .ok_or_else(|| CoderError::encode(key, "number has no f64 form"))
                }
            }
            other @ (Value::Null | Value::Array(_) | Value::Object(_)) => {
                serde_json::to_vec(&other)
                    .map(NativeValue::Data)
                    .map_err(|e| CoderError::encode(key, e))
            }
        }
    }

    fn decode(&self, native: NativeValue, key: &str) -> Result<Value, CoderError> {
        match native {
            NativeValue::Bool(flag) => Ok(Value::Bool(flag)),
            NativeValue::Integer(int) => Ok(Value::Number(int.into())),
            NativeValue::Float(float) => Number::from_f64(float)
                .map(Value::Number)
                .ok_or_else(|| CoderError::decode(key, format!("non-finite float {float}"))),
            NativeValue::String(text) => Ok(Value::String(text)),
            NativeValue::Date(date) => Ok(Value::String(
                date.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            )),
            NativeValue::Data(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| CoderError::decode(key, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::coder::ValueCoderExt;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum Weight {
        Regular,
        Bold,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Style {
        weight: Weight,
        size: f64,
        tags: Vec<String>,
    }

    #[test]
    fn test_scalars_stored_natively() {
        let coder = JsonValueCoder;
        assert_eq!(
            coder.encode_value(&true, "k").unwrap(),
            NativeValue::Bool(true)
        );
        assert_eq!(
            coder.encode_value(&-30i32, "k").unwrap(),
            NativeValue::Integer(-30)
        );
        assert_eq!(
            coder.encode_value(&1.5f64, "k").unwrap(),
            NativeValue::Float(1.5)
        );
        assert_eq!(
            coder.encode_value("Hello", "k").unwrap(),
            NativeValue::String("Hello".into())
        );
    }

    #[test]
    fn test_composites_stored_as_json_blob() {
        let coder = JsonValueCoder;
        let native = coder.encode_value(&json!({"a": [1, 2]}), "k").unwrap();
        assert_eq!(native, NativeValue::Data(br#"{"a":[1,2]}"#.to_vec()));

        let none: Option<u8> = None;
        assert_eq!(
            coder.encode_value(&none, "k").unwrap(),
            NativeValue::Data(b"null".to_vec())
        );
    }

    #[test]
    fn test_large_unsigned_keeps_precision() {
        let coder = JsonValueCoder;
        let native = coder.encode_value(&u64::MAX, "k").unwrap();
        assert!(matches!(native, NativeValue::Data(_)));
        assert_eq!(coder.decode_value::<u64>(native, "k").unwrap(), u64::MAX);
    }

    #[test]
    fn test_nested_struct_and_enum_round_trip() {
        let coder = JsonValueCoder;
        let style = Style {
            weight: Weight::Bold,
            size: 12.5,
            tags: vec!["title".into()],
        };
        let native = coder.encode_value(&style, "style").unwrap();
        assert_eq!(coder.decode_value::<Style>(native, "style").unwrap(), style);

        let native = coder.encode_value(&Weight::Regular, "weight").unwrap();
        assert_eq!(native, NativeValue::String("Regular".into()));
        assert_eq!(
            coder.decode_value::<Weight>(native, "weight").unwrap(),
            Weight::Regular
        );
    }

    #[test]
    fn test_optionals_round_trip() {
        let coder = JsonValueCoder;
        for value in [Some(42i64), None] {
            let native = coder.encode_value(&value, "opt").unwrap();
            assert_eq!(
                coder.decode_value::<Option<i64>>(native, "opt").unwrap(),
                value
            );
        }
    }

    #[test]
    fn test_native_date_reads_as_timestamp() {
        let coder = JsonValueCoder;
        let date = Utc.with_ymd_and_hms(2024, 2, 29, 8, 30, 0).unwrap();
        let back: DateTime<Utc> = coder.decode_value(NativeValue::Date(date), "d").unwrap();
        assert_eq!(back, date);

        // A timestamp written through the coder round-trips as well.
        let native = coder.encode_value(&date, "d").unwrap();
        assert_eq!(coder.decode_value::<DateTime<Utc>>(native, "d").unwrap(), date);
    }

    #[test]
    fn test_typed_timestamp_is_native_date() {
        let date = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        assert_eq!(
            JsonValueCoder.encode_value(&date, "d").unwrap(),
            NativeValue::Date(date)
        );
        assert_eq!(
            JsonValueCoder.encode_value(&Some(date), "d").unwrap(),
            NativeValue::Date(date)
        );

        // A timestamp string written by another tool still reads.
        let back: DateTime<Utc> = JsonValueCoder
            .decode_value(NativeValue::String("2024-07-01T00:00:00Z".into()), "d")
            .unwrap();
        assert_eq!(back, date);
    }

    #[test]
    fn test_foreign_blob_reads_as_raw_bytes() {
        let raw = vec![0xff, 0x00, 0x10];
        let back: Option<Vec<u8>> = JsonValueCoder
            .decode_value(NativeValue::Data(raw.clone()), "avatar")
            .unwrap();
        assert_eq!(back, Some(raw));
    }

    #[test]
    fn test_non_finite_float_stored_as_float() {
        let native = JsonValueCoder.encode_value(&f64::NAN, "f").unwrap();
        assert!(matches!(native, NativeValue::Float(f) if f.is_nan()));
        assert!(JsonValueCoder.decode_value::<f64>(native, "f").unwrap().is_nan());

        let native = JsonValueCoder.encode_value(&Some(f64::INFINITY), "f").unwrap();
        assert_eq!(native, NativeValue::Float(f64::INFINITY));
        assert_eq!(
            JsonValueCoder.decode_value::<Option<f64>>(native, "f").unwrap(),
            Some(f64::INFINITY)
        );
    }

    #[test]
    fn test_shape_mismatch_is_type_mismatch() {
        let coder = JsonValueCoder;
        let err = coder
            .decode_value::<i64>(NativeValue::String("thirty".into()), "age")
            .unwrap_err();
        assert!(matches!(err, CoderError::TypeMismatch { ref key, .. } if key == "age"));
    }

    #[test]
    fn test_garbage_blob_is_decode_error() {
        let err = JsonValueCoder
            .decode(NativeValue::Data(vec![0xff, 0x00]), "blob")
            .unwrap_err();
        assert!(matches!(err, CoderError::Decode { .. }));
    }

    #[test]
    fn test_non_finite_float_rejected_on_read() {
        let err = JsonValueCoder
            .decode(NativeValue::Float(f64::NAN), "f")
            .unwrap_err();
        assert!(matches!(err, CoderError::Decode { .. }));
    }

    proptest! {
        #[test]
        fn prop_integers_round_trip(v in any::<i64>()) {
            let native = JsonValueCoder.encode_value(&v, "n").unwrap();
            prop_assert_eq!(JsonValueCoder.decode_value::<i64>(native, "n").unwrap(), v);
        }

        #[test]
        fn prop_strings_round_trip(v in ".*") {
            let native = JsonValueCoder.encode_value(&v, "s").unwrap();
            prop_assert_eq!(JsonValueCoder.decode_value::<String>(native, "s").unwrap(), v);
        }

        #[test]
        fn prop_blobs_round_trip(v in proptest::collection::vec(any::<u8>(), 0..64)) {
            let native = JsonValueCoder.encode_value(&v, "b").unwrap();
            prop_assert_eq!(&native, &NativeValue::Data(v.clone()));
            prop_assert_eq!(JsonValueCoder.decode_value::<Vec<u8>>(native, "b").unwrap(), v);
        }

        #[test]
        fn prop_finite_floats_round_trip(v in -1.0e12f64..1.0e12) {
            let native = JsonValueCoder.encode_value(&v, "f").unwrap();
            prop_assert_eq!(JsonValueCoder.decode_value::<f64>(native, "f").unwrap(), v);
        }
    }
}
