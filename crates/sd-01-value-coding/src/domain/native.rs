//! # Native Forms
//!
//! Field types the store holds in a shape of their own instead of through
//! JSON:
//!
//! | Rust type                          | Native shape |
//! |------------------------------------|--------------|
//! | `Vec<u8>`, `[u8]`                  | `Data` (raw bytes) |
//! | `DateTime<Utc>`                    | `Date`       |
//! | `f64`, `f32`                       | `Float` (non-finite included) |
//!
//! The `Option` of each maps the same way when `Some`. The form is picked
//! from the static type, so an empty `Vec<u8>` still becomes `Data`.

use chrono::{DateTime, Utc};
use serde::de::value::SeqDeserializer;
use serde::de::{self, DeserializeOwned, Deserializer, Visitor};
use serde::ser::{self, Impossible, Serialize, Serializer};
use shared_types::NativeValue;
use std::any::TypeId;
use std::fmt;

/// How a field type is laid out in the store when it has a native form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NativeForm {
    Blob,
    Date,
    Float,
}

impl NativeForm {
    /// The native form of `T`, if it has one.
    pub(crate) fn of<T: ?Sized + 'static>() -> Option<Self> {
        let id = TypeId::of::<T>();
        let is = |others: &[TypeId]| others.contains(&id);

        if is(&[
            TypeId::of::<Vec<u8>>(),
            TypeId::of::<Option<Vec<u8>>>(),
            TypeId::of::<[u8]>(),
        ]) {
            Some(NativeForm::Blob)
        } else if is(&[
            TypeId::of::<DateTime<Utc>>(),
            TypeId::of::<Option<DateTime<Utc>>>(),
        ]) {
            Some(NativeForm::Date)
        } else if is(&[
            TypeId::of::<f64>(),
            TypeId::of::<Option<f64>>(),
            TypeId::of::<f32>(),
            TypeId::of::<Option<f32>>(),
        ]) {
            Some(NativeForm::Float)
        } else {
            None
        }
    }

    /// Lay `value` out in this form. `None` means the value is null.
    pub(crate) fn to_native<T: Serialize + ?Sized>(
        self,
        value: &T,
    ) -> Result<Option<NativeValue>, NativeError> {
        let native = value.serialize(NativeSerializer)?;
        match (self, native) {
            (_, None) => Ok(None),
            (NativeForm::Blob, Some(blob @ NativeValue::Data(_)))
            | (NativeForm::Float, Some(blob @ NativeValue::Float(_))) => Ok(Some(blob)),
            (NativeForm::Date, Some(NativeValue::String(text))) => DateTime::parse_from_rfc3339(&text)
                .map(|date| Some(NativeValue::Date(date.with_timezone(&Utc))))
                .map_err(|e| NativeError(format!("timestamp '{text}': {e}"))),
            (form, Some(other)) => Err(NativeError(format!(
                "{form:?} field serialized as {}",
                other.kind()
            ))),
        }
    }
}

/// Whether `value` is stored as null: `None`, `()`, or anything whose JSON
/// form is `null`. A non-finite float is not null.
pub fn serializes_to_null<T: Serialize + ?Sized + 'static>(value: &T) -> bool {
    match NativeForm::of::<T>() {
        Some(form) => matches!(form.to_native(value), Ok(None)),
        None => matches!(serde_json::to_value(value), Ok(serde_json::Value::Null)),
    }
}

/// Read a native value straight into `T` without a JSON detour.
pub(crate) fn from_native<T: DeserializeOwned>(native: NativeValue) -> Result<T, NativeError> {
    T::deserialize(NativeDeserializer(native))
}

/// Failure while laying out or reading back a native form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NativeError(String);

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for NativeError {}

impl ser::Error for NativeError {
    fn custom<M: fmt::Display>(msg: M) -> Self {
        NativeError(msg.to_string())
    }
}

impl de::Error for NativeError {
    fn custom<M: fmt::Display>(msg: M) -> Self {
        NativeError(msg.to_string())
    }
}

fn unsupported<T>(what: &str) -> Result<T, NativeError> {
    Err(NativeError(format!("{what} has no native form")))
}

/// Captures the scalar a native-form type serializes to.
struct NativeSerializer;

impl Serializer for NativeSerializer {
    type Ok = Option<NativeValue>;
    type Error = NativeError;
    type SerializeSeq = BlobBuilder;
    type SerializeTuple = Impossible<Option<NativeValue>, NativeError>;
    type SerializeTupleStruct = Impossible<Option<NativeValue>, NativeError>;
    type SerializeTupleVariant = Impossible<Option<NativeValue>, NativeError>;
    type SerializeMap = Impossible<Option<NativeValue>, NativeError>;
    type SerializeStruct = Impossible<Option<NativeValue>, NativeError>;
    type SerializeStructVariant = Impossible<Option<NativeValue>, NativeError>;

    fn serialize_bool(self, _v: bool) -> Result<Self::Ok, NativeError> {
        unsupported("bool")
    }

    fn serialize_i8(self, v: i8) -> Result<Self::Ok, NativeError> {
        Ok(Some(NativeValue::Integer(v.into())))
    }

    fn serialize_i16(self, v: i16) -> Result<Self::Ok, NativeError> {
        Ok(Some(NativeValue::Integer(v.into())))
    }

    fn serialize_i32(self, v: i32) -> Result<Self::Ok, NativeError> {
        Ok(Some(NativeValue::Integer(v.into())))
    }

    fn serialize_i64(self, v: i64) -> Result<Self::Ok, NativeError> {
        Ok(Some(NativeValue::Integer(v)))
    }

    fn serialize_u8(self, v: u8) -> Result<Self::Ok, NativeError> {
        Ok(Some(NativeValue::Integer(v.into())))
    }

    fn serialize_u16(self, v: u16) -> Result<Self::Ok, NativeError> {
        Ok(Some(NativeValue::Integer(v.into())))
    }

    fn serialize_u32(self, v: u32) -> Result<Self::Ok, NativeError> {
        Ok(Some(NativeValue::Integer(v.into())))
    }

    fn serialize_u64(self, v: u64) -> Result<Self::Ok, NativeError> {
        i64::try_from(v)
            .map(|v| Some(NativeValue::Integer(v)))
            .map_err(|e| NativeError(e.to_string()))
    }

    fn serialize_f32(self, v: f32) -> Result<Self::Ok, NativeError> {
        Ok(Some(NativeValue::Float(v.into())))
    }

    fn serialize_f64(self, v: f64) -> Result<Self::Ok, NativeError> {
        Ok(Some(NativeValue::Float(v)))
    }

    fn serialize_char(self, v: char) -> Result<Self::Ok, NativeError> {
        Ok(Some(NativeValue::String(v.to_string())))
    }

    fn serialize_str(self, v: &str) -> Result<Self::Ok, NativeError> {
        Ok(Some(NativeValue::String(v.to_owned())))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Self::Ok, NativeError> {
        Ok(Some(NativeValue::Data(v.to_vec())))
    }

    fn serialize_none(self) -> Result<Self::Ok, NativeError> {
        Ok(None)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Self::Ok, NativeError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Self::Ok, NativeError> {
        Ok(None)
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Self::Ok, NativeError> {
        unsupported(name)
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _index: u32,
        _variant: &'static str,
    ) -> Result<Self::Ok, NativeError> {
        unsupported(name)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Self::Ok, NativeError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Self::Ok, NativeError> {
        unsupported(name)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq, NativeError> {
        Ok(BlobBuilder(Vec::with_capacity(len.unwrap_or_default())))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, NativeError> {
        unsupported("tuple")
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, NativeError> {
        unsupported(name)
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, NativeError> {
        unsupported(name)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, NativeError> {
        unsupported("map")
    }

    fn serialize_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, NativeError> {
        unsupported(name)
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, NativeError> {
        unsupported(name)
    }
}

/// Collects a sequence of bytes into one blob.
struct BlobBuilder(Vec<u8>);

impl ser::SerializeSeq for BlobBuilder {
    type Ok = Option<NativeValue>;
    type Error = NativeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), NativeError> {
        match value.serialize(NativeSerializer)? {
            Some(NativeValue::Integer(byte)) => {
                let byte = u8::try_from(byte).map_err(|e| NativeError(e.to_string()))?;
                self.0.push(byte);
                Ok(())
            }
            _ => unsupported("non-byte sequence element"),
        }
    }

    fn end(self) -> Result<Self::Ok, NativeError> {
        Ok(Some(NativeValue::Data(self.0)))
    }
}

/// Feeds a native value to a `Deserialize` impl.
struct NativeDeserializer(NativeValue);

impl<'de> Deserializer<'de> for NativeDeserializer {
    type Error = NativeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, NativeError> {
        match self.0 {
            NativeValue::Bool(flag) => visitor.visit_bool(flag),
            NativeValue::Integer(int) => visitor.visit_i64(int),
            NativeValue::Float(float) => visitor.visit_f64(float),
            NativeValue::String(text) => visitor.visit_string(text),
            NativeValue::Data(bytes) => visitor.visit_seq(SeqDeserializer::new(bytes.into_iter())),
            NativeValue::Date(date) => visitor.visit_string(date.to_rfc3339()),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, NativeError> {
        visitor.visit_some(self)
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}
