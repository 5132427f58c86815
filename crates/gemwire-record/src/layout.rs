use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RecordError, Result};
use crate::record::Value;

/// Scale of the signed 16.16 fixed-point format.
const FIX16_ONE: f64 = 65536.0;

/// Convert a real number to its 16.16 fixed-point representation.
///
/// Rounds half away from zero, then truncates. Returns `None` for values that
/// do not fit in an `i32` once scaled.
pub fn fix16_to_raw(value: f64) -> Option<i32> {
    if !value.is_finite() {
        return None;
    }
    let scaled = value * FIX16_ONE;
    let rounded = if scaled >= 0.0 {
        scaled + 0.5
    } else {
        scaled - 0.5
    }
    .trunc();
    if rounded < f64::from(i32::MIN) || rounded > f64::from(i32::MAX) {
        return None;
    }
    Some(rounded as i32)
}

/// Convert a 16.16 fixed-point value to a real number.
pub fn fix16_from_raw(raw: i32) -> f64 {
    f64::from(raw) / FIX16_ONE
}

/// Storage kind of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    /// One byte, nonzero is true.
    Bool,
    /// Signed 16.16 fixed point in four bytes.
    Fix16,
}

impl FieldKind {
    /// Packed size in bytes.
    pub const fn size(self) -> usize {
        match self {
            FieldKind::U8 | FieldKind::I8 | FieldKind::Bool => 1,
            FieldKind::U16 | FieldKind::I16 => 2,
            FieldKind::U32 | FieldKind::I32 | FieldKind::Fix16 => 4,
        }
    }

    /// Name used in layout files.
    pub const fn name(self) -> &'static str {
        match self {
            FieldKind::U8 => "u8",
            FieldKind::I8 => "i8",
            FieldKind::U16 => "u16",
            FieldKind::I16 => "i16",
            FieldKind::U32 => "u32",
            FieldKind::I32 => "i32",
            FieldKind::Bool => "bool",
            FieldKind::Fix16 => "fix16",
        }
    }

    fn int_range(self) -> Option<(i64, i64)> {
        match self {
            FieldKind::U8 => Some((0, i64::from(u8::MAX))),
            FieldKind::I8 => Some((i64::from(i8::MIN), i64::from(i8::MAX))),
            FieldKind::U16 => Some((0, i64::from(u16::MAX))),
            FieldKind::I16 => Some((i64::from(i16::MIN), i64::from(i16::MAX))),
            FieldKind::U32 => Some((0, i64::from(u32::MAX))),
            FieldKind::I32 => Some((i64::from(i32::MIN), i64::from(i32::MAX))),
            FieldKind::Bool | FieldKind::Fix16 => None,
        }
    }

    /// The value a field of this kind holds when no default is given.
    pub fn zero(self) -> Value {
        match self {
            FieldKind::Bool => Value::Bool(false),
            FieldKind::Fix16 => Value::Fix16(0.0),
            _ => Value::Int(0),
        }
    }

    /// Check that `value` can be stored in a field of this kind.
    ///
    /// Integers are accepted for `fix16` fields and widened. Nothing else is
    /// converted: a bool is never an integer and a fraction is never
    /// truncated into an integer field.
    pub fn coerce(self, field: &str, value: Value) -> Result<Value> {
        let mismatch = || RecordError::TypeMismatch {
            field: field.to_string(),
            kind: self.name(),
            value: value.to_string(),
        };
        let out_of_range = || RecordError::OutOfRange {
            field: field.to_string(),
            kind: self.name(),
            value: value.to_string(),
        };

        match (self, value) {
            (FieldKind::Bool, Value::Bool(_)) => Ok(value),
            (FieldKind::Bool, _) => Err(mismatch()),
            (FieldKind::Fix16, Value::Int(v)) => {
                let v = v as f64;
                fix16_to_raw(v).ok_or_else(out_of_range)?;
                Ok(Value::Fix16(v))
            }
            (FieldKind::Fix16, Value::Fix16(v)) => {
                fix16_to_raw(v).ok_or_else(out_of_range)?;
                Ok(value)
            }
            (FieldKind::Fix16, Value::Bool(_)) => Err(mismatch()),
            (kind, Value::Int(v)) => match kind.int_range() {
                Some((min, max)) if (min..=max).contains(&v) => Ok(value),
                Some(_) => Err(out_of_range()),
                None => Err(mismatch()),
            },
            _ => Err(mismatch()),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One named, typed field of a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldSpec {
    /// Field with the kind's zero value as its default.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    /// Set the default value.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// The value this field takes when a record is created.
    pub fn default_value(&self) -> Value {
        self.default.unwrap_or_else(|| self.kind.zero())
    }
}

/// Ordered field list with a fixed packed size.
///
/// Fields are packed in declaration order, big-endian, with no padding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RecordLayoutRepr", into = "RecordLayoutRepr")]
pub struct RecordLayout {
    name: String,
    fields: Vec<FieldSpec>,
    packed_size: usize,
}

#[derive(Serialize, Deserialize)]
struct RecordLayoutRepr {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    packed_size: Option<usize>,
    fields: Vec<FieldSpec>,
}

impl TryFrom<RecordLayoutRepr> for RecordLayout {
    type Error = RecordError;

    fn try_from(repr: RecordLayoutRepr) -> Result<Self> {
        let layout = RecordLayout::new(repr.name, repr.fields)?;
        if let Some(declared) = repr.packed_size {
            if declared != layout.packed_size {
                return Err(RecordError::InvalidLayout(format!(
                    "{}: declared packed_size {declared} but fields pack to {}",
                    layout.name, layout.packed_size
                )));
            }
        }
        Ok(layout)
    }
}

impl From<RecordLayout> for RecordLayoutRepr {
    fn from(layout: RecordLayout) -> Self {
        Self {
            name: layout.name,
            packed_size: Some(layout.packed_size),
            fields: layout.fields,
        }
    }
}

impl RecordLayout {
    /// Build a layout, validating names and defaults.
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RecordError::InvalidLayout(
                "layout name must not be empty".to_string(),
            ));
        }
        if fields.is_empty() {
            return Err(RecordError::InvalidLayout(format!("{name}: no fields")));
        }

        let mut seen = HashSet::new();
        let mut checked = Vec::with_capacity(fields.len());
        for mut field in fields {
            if field.name.is_empty() {
                return Err(RecordError::InvalidLayout(format!(
                    "{name}: field name must not be empty"
                )));
            }
            if !seen.insert(field.name.clone()) {
                return Err(RecordError::InvalidLayout(format!(
                    "{name}: duplicate field '{}'",
                    field.name
                )));
            }
            if let Some(default) = field.default {
                field.default = Some(field.kind.coerce(&field.name, default)?);
            }
            checked.push(field);
        }

        Ok(Self::from_checked(name, checked))
    }

    pub(crate) fn from_checked(name: String, fields: Vec<FieldSpec>) -> Self {
        let packed_size = fields.iter().map(|field| field.kind.size()).sum();
        Self {
            name,
            fields,
            packed_size,
        }
    }

    /// Parse and validate a layout from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the layout as pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Exact number of bytes a record of this layout packs to.
    pub fn packed_size(&self) -> usize {
        self.packed_size
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Position of a field in declaration order.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// Byte offset of a field within the packed record.
    pub fn offset_of(&self, name: &str) -> Option<usize> {
        let index = self.index_of(name)?;
        Some(self.fields[..index].iter().map(|f| f.kind.size()).sum())
    }
}
