use std::fmt;
use std::sync::Arc;

use bytes::{Buf, BufMut};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::trace;

use crate::error::{RecordError, Result};
use crate::layout::{fix16_from_raw, fix16_to_raw, FieldKind, FieldSpec, RecordLayout};

/// A field value.
///
/// Integer kinds hold [`Value::Int`], `bool` holds [`Value::Bool`] and
/// `fix16` holds [`Value::Fix16`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Fix16(f64),
}

impl Value {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_i64(self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Numeric value as a real number. Integers widen.
    pub fn as_f64(self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(v as f64),
            Value::Fix16(v) => Some(v),
            Value::Bool(_) => None,
        }
    }

    /// Convert a JSON scalar. Objects, arrays, strings and null give `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Some(Value::Int(v))
                } else {
                    n.as_f64().map(Value::Fix16)
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Fix16(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Fix16(value)
    }
}

/// One value per field of a [`RecordLayout`].
///
/// Every stored value has already been checked against its field kind, so
/// packing cannot fail.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    layout: Arc<RecordLayout>,
    values: Vec<Value>,
}

impl Record {
    /// A record holding every field's default.
    pub fn new(layout: Arc<RecordLayout>) -> Self {
        let values = layout.fields().iter().map(FieldSpec::default_value).collect();
        Self { layout, values }
    }

    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    /// Shared handle to the layout.
    pub fn layout_arc(&self) -> Arc<RecordLayout> {
        Arc::clone(&self.layout)
    }

    /// Current value of a field.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.layout.index_of(name).map(|index| self.values[index])
    }

    /// Replace a field's value after checking it against the field kind.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let index = self
            .layout
            .index_of(name)
            .ok_or_else(|| self.unknown_field(name))?;
        let field = &self.layout.fields()[index];
        self.values[index] = field.kind.coerce(&field.name, value.into())?;
        Ok(())
    }

    /// Fields and values in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldSpec, Value)> + '_ {
        self.layout.fields().iter().zip(self.values.iter().copied())
    }

    /// Pack into exactly `layout.packed_size()` big-endian bytes.
    pub fn pack(&self) -> Vec<u8> {
        let mut dst = Vec::with_capacity(self.layout.packed_size());
        for (field, value) in self.iter() {
            put_value(field.kind, value, &mut dst);
        }
        trace!(layout = self.layout.name(), len = dst.len(), "packed record");
        dst
    }

    /// Unpack a buffer that must be exactly `layout.packed_size()` bytes.
    pub fn unpack(layout: Arc<RecordLayout>, src: &[u8]) -> Result<Self> {
        if src.len() != layout.packed_size() {
            return Err(RecordError::SizeMismatch {
                layout: layout.name().to_string(),
                expected: layout.packed_size(),
                actual: src.len(),
            });
        }

        let mut buf = src;
        let values = layout
            .fields()
            .iter()
            .map(|field| get_value(field.kind, &mut buf))
            .collect();
        Ok(Self { layout, values })
    }

    /// Build a record from a JSON object.
    ///
    /// Missing fields take their defaults. Unknown fields are rejected.
    pub fn from_json(layout: Arc<RecordLayout>, json: &serde_json::Value) -> Result<Self> {
        let mut record = Self::new(layout);
        record.update_from_json(json)?;
        Ok(record)
    }

    /// Overwrite the fields named in a JSON object, leaving the rest alone.
    ///
    /// Either every named field is applied or, on error, none is.
    pub fn update_from_json(&mut self, json: &serde_json::Value) -> Result<()> {
        let object = json.as_object().ok_or(RecordError::NotAnObject)?;
        let mut staged = self.values.clone();
        for (name, raw) in object {
            let index = self
                .layout
                .index_of(name)
                .ok_or_else(|| self.unknown_field(name))?;
            let field = &self.layout.fields()[index];
            let value = Value::from_json(raw).ok_or_else(|| RecordError::TypeMismatch {
                field: name.clone(),
                kind: field.kind.name(),
                value: raw.to_string(),
            })?;
            staged[index] = field.kind.coerce(&field.name, value)?;
        }
        self.values = staged;
        Ok(())
    }

    /// JSON object of every field.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .iter()
            .map(|(field, value)| (field.name.clone(), json_value(value)))
            .collect();
        serde_json::Value::Object(map)
    }

    /// Pretty JSON with fields in declaration order.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn unknown_field(&self, name: &str) -> RecordError {
        RecordError::UnknownField {
            layout: self.layout.name().to_string(),
            field: name.to_string(),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in self.iter() {
            map.serialize_entry(&field.name, &value)?;
        }
        map.end()
    }
}

fn json_value(value: Value) -> serde_json::Value {
    match value {
        Value::Bool(b) => serde_json::Value::Bool(b),
        Value::Int(v) => serde_json::Value::from(v),
        Value::Fix16(v) => serde_json::Value::from(v),
    }
}

fn put_value(kind: FieldKind, value: Value, dst: &mut Vec<u8>) {
    let int = value.as_i64().unwrap_or_default();
    match kind {
        FieldKind::U8 => dst.put_u8(int as u8),
        FieldKind::I8 => dst.put_i8(int as i8),
        FieldKind::U16 => dst.put_u16(int as u16),
        FieldKind::I16 => dst.put_i16(int as i16),
        FieldKind::U32 => dst.put_u32(int as u32),
        FieldKind::I32 => dst.put_i32(int as i32),
        FieldKind::Bool => dst.put_u8(u8::from(value.as_bool().unwrap_or_default())),
        FieldKind::Fix16 => {
            let raw = value.as_f64().and_then(fix16_to_raw).unwrap_or_default();
            dst.put_i32(raw);
        }
    }
}

fn get_value(kind: FieldKind, src: &mut &[u8]) -> Value {
    match kind {
        FieldKind::U8 => Value::from(src.get_u8()),
        FieldKind::I8 => Value::Int(i64::from(src.get_i8())),
        FieldKind::U16 => Value::from(src.get_u16()),
        FieldKind::I16 => Value::Int(i64::from(src.get_i16())),
        FieldKind::U32 => Value::from(src.get_u32()),
        FieldKind::I32 => Value::from(src.get_i32()),
        FieldKind::Bool => Value::Bool(src.get_u8() != 0),
        FieldKind::Fix16 => Value::Fix16(fix16_from_raw(src.get_i32())),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_layout() -> Arc<RecordLayout> {
        Arc::new(
            RecordLayout::new(
                "sample",
                vec![
                    FieldSpec::new("mode", FieldKind::U8).with_default(3u8),
                    FieldSpec::new("offset", FieldKind::I16).with_default(-2i64),
                    FieldSpec::new("enabled", FieldKind::Bool).with_default(true),
                    FieldSpec::new("pitch", FieldKind::Fix16).with_default(-1.2),
                    FieldSpec::new("period", FieldKind::U32).with_default(8_000_000u32),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn defaults_pack_big_endian() {
        let record = Record::new(sample_layout());
        assert_eq!(
            record.pack(),
            vec![
                0x03, // mode
                0xFF, 0xFE, // offset
                0x01, // enabled
                0xFF, 0xFE, 0xCC, 0xCD, // pitch
                0x00, 0x7A, 0x12, 0x00, // period
            ]
        );
    }

    #[test]
    fn unpack_reads_every_kind() {
        let layout = sample_layout();
        let bytes = [0x7F, 0x80, 0x00, 0x05, 0x00, 0x02, 0x80, 0x00, 0x00, 0x00, 0x00, 0x10];
        let record = Record::unpack(layout, &bytes).unwrap();
        assert_eq!(record.get("mode"), Some(Value::Int(127)));
        assert_eq!(record.get("offset"), Some(Value::Int(-32768)));
        assert_eq!(record.get("enabled"), Some(Value::Bool(true)));
        assert_eq!(record.get("pitch"), Some(Value::Fix16(2.5)));
        assert_eq!(record.get("period"), Some(Value::Int(16)));
    }

    #[test]
    fn unpack_requires_exact_size() {
        let err = Record::unpack(sample_layout(), &[0u8; 11]).unwrap_err();
        assert!(matches!(
            err,
            RecordError::SizeMismatch {
                expected: 12,
                actual: 11,
                ..
            }
        ));
        assert!(Record::unpack(sample_layout(), &[0u8; 13]).is_err());
    }

    #[test]
    fn pack_unpack_preserves_values() {
        let mut record = Record::new(sample_layout());
        record.set("mode", 9u8).unwrap();
        record.set("pitch", 0.25).unwrap();
        record.set("enabled", false).unwrap();

        let restored = Record::unpack(sample_layout(), &record.pack()).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn set_rejects_bad_values() {
        let mut record = Record::new(sample_layout());
        assert!(matches!(
            record.set("mode", 256i64),
            Err(RecordError::OutOfRange { .. })
        ));
        assert!(matches!(
            record.set("enabled", 1i64),
            Err(RecordError::TypeMismatch { .. })
        ));
        assert!(matches!(
            record.set("nope", 1i64),
            Err(RecordError::UnknownField { .. })
        ));
        assert_eq!(record.get("mode"), Some(Value::Int(3)));
    }

    #[test]
    fn from_json_fills_missing_fields_with_defaults() {
        let record = Record::from_json(sample_layout(), &json!({"mode": 1, "pitch": 2})).unwrap();
        assert_eq!(record.get("mode"), Some(Value::Int(1)));
        assert_eq!(record.get("pitch"), Some(Value::Fix16(2.0)));
        assert_eq!(record.get("offset"), Some(Value::Int(-2)));
    }

    #[test]
    fn from_json_rejects_unknown_fields_and_non_objects() {
        let err = Record::from_json(sample_layout(), &json!({"mode": 1, "volume": 11})).unwrap_err();
        assert!(matches!(err, RecordError::UnknownField { ref field, .. } if field == "volume"));

        assert!(matches!(
            Record::from_json(sample_layout(), &json!([1, 2])),
            Err(RecordError::NotAnObject)
        ));
        assert!(matches!(
            Record::from_json(sample_layout(), &json!({"mode": "fast"})),
            Err(RecordError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn json_output_keeps_declaration_order() {
        let record = Record::new(sample_layout());
        let text = record.to_json_pretty().unwrap();
        let mode = text.find("\"mode\"").unwrap();
        let period = text.find("\"period\"").unwrap();
        assert!(mode < period);

        let value = record.to_json();
        assert_eq!(value["enabled"], json!(true));
        assert_eq!(value["period"], json!(8_000_000));
        assert_eq!(Record::from_json(sample_layout(), &value).unwrap(), record);
    }

    #[test]
    fn update_from_json_keeps_unnamed_fields() {
        let mut record = Record::new(sample_layout());
        record.set("mode", 7u8).unwrap();
        record.update_from_json(&json!({"enabled": false})).unwrap();
        assert_eq!(record.get("mode"), Some(Value::Int(7)));
        assert_eq!(record.get("enabled"), Some(Value::Bool(false)));
    }

    #[test]
    fn failed_update_leaves_record_untouched() {
        let mut record = Record::new(sample_layout());
        let before = record.clone();

        // "enabled" sorts ahead of the out-of-range "mode".
        let err = record
            .update_from_json(&json!({"enabled": false, "mode": 999}))
            .unwrap_err();
        assert!(matches!(err, RecordError::OutOfRange { .. }));
        assert_eq!(record, before);

        let err = record
            .update_from_json(&json!({"enabled": false, "warp": 1}))
            .unwrap_err();
        assert!(matches!(err, RecordError::UnknownField { .. }));
        assert_eq!(record.get("enabled"), Some(Value::Bool(true)));
    }
}
