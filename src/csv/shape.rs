// src/csv/shape.rs

use std::{fmt, sync::Arc};

use crate::error::{CsvError, CsvResult};

/// Element type of a field: everything a single cell can hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarType {
    Str,
    I16,
    I32,
    I64,
    F32,
    F64,
    Bool,
    /// Closed set of symbolic names; the first one is the zero value.
    Enum(Arc<[String]>),
}

impl ScalarType {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::Str => "string",
            ScalarType::I16 => "i16",
            ScalarType::I32 => "i32",
            ScalarType::I64 => "i64",
            ScalarType::F32 => "f32",
            ScalarType::F64 => "f64",
            ScalarType::Bool => "bool",
            ScalarType::Enum(_) => "enum",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, ScalarType::I16 | ScalarType::I32 | ScalarType::I64)
    }

    pub fn zero(&self) -> Value {
        match self {
            ScalarType::Str => Value::Str(String::new()),
            ScalarType::I16 => Value::I16(0),
            ScalarType::I32 => Value::I32(0),
            ScalarType::I64 => Value::I64(0),
            ScalarType::F32 => Value::F32(0.0),
            ScalarType::F64 => Value::F64(0.0),
            ScalarType::Bool => Value::Bool(false),
            ScalarType::Enum(symbols) => {
                Value::Enum(symbols.first().cloned().unwrap_or_default())
            }
        }
    }
}

/// Declared type of a record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Scalar(ScalarType),
    /// Comma-separated list of scalars inside one cell.
    Array(ScalarType),
}

impl FieldType {
    pub fn enumeration<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let symbols: Vec<String> = symbols.into_iter().map(Into::into).collect();
        FieldType::Scalar(ScalarType::Enum(symbols.into()))
    }

    pub fn array(element: ScalarType) -> Self {
        FieldType::Array(element)
    }

    pub fn zero(&self) -> Value {
        match self {
            FieldType::Scalar(s) => s.zero(),
            FieldType::Array(_) => Value::Array(Vec::new()),
        }
    }
}

impl From<ScalarType> for FieldType {
    fn from(s: ScalarType) -> Self {
        FieldType::Scalar(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
}

/// Ordered list of the fields a CSV row is bound onto.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordShape {
    fields: Vec<Field>,
}

impl RecordShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, ty: impl Into<FieldType>) -> Self {
        self.fields.push(Field {
            name: name.into(),
            ty: ty.into(),
        });
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// A record of this shape with every field at its zero value.
    pub fn zeroed(self: &Arc<Self>) -> Record {
        Record {
            values: self.fields.iter().map(|f| f.ty.zero()).collect(),
            shape: Arc::clone(self),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
    Enum(String),
    Array(Vec<Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Any integer variant widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I16(v) => Some(v.into()),
            Value::I32(v) => Some(v.into()),
            Value::I64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v.into()),
            Value::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) | Value::Enum(s) => f.write_str(s),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

/// One bound row; values are aligned with the shape's fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    shape: Arc<RecordShape>,
    values: Vec<Value>,
}

impl Record {
    pub fn shape(&self) -> &RecordShape {
        &self.shape
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.shape.position(name).map(|i| &self.values[i])
    }

    pub fn set(&mut self, name: &str, value: Value) -> bool {
        match self.shape.position(name) {
            Some(i) => {
                self.values[i] = value;
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_at(&mut self, position: usize, value: Value) {
        self.values[position] = value;
    }

    /// Move a string (or enum symbol) field out of the record.
    pub fn take_string(&mut self, name: &str) -> CsvResult<String> {
        let i = self
            .shape
            .position(name)
            .ok_or_else(|| CsvError::FieldType(name.to_string()))?;
        match std::mem::replace(&mut self.values[i], Value::Str(String::new())) {
            Value::Str(s) | Value::Enum(s) => Ok(s),
            other => {
                self.values[i] = other;
                Err(CsvError::FieldType(name.to_string()))
            }
        }
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
