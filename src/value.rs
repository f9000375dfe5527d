//! Dynamic field values and the binding between Rust field types and them.
//!
//! Converters work on [`Value`], a small closed set of the types that appear
//! in fixed-width interchange files. Record fields are plain Rust types; the
//! [`FieldValue`] trait moves them in and out of a `Value` and names the
//! [`ValueKind`] a converter should produce when decoding.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

/// The target type requested from a converter when decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Text,
    Int,
    Float,
    Bool,
    Date,
    Time,
    DateTime,
}

impl ValueKind {
    /// The zero value of this kind: empty text, 0, 0.0, false, or the epoch.
    pub fn zero(self) -> Value {
        match self {
            ValueKind::Text => Value::Text(String::new()),
            ValueKind::Int => Value::Int(0),
            ValueKind::Float => Value::Float(0.0),
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Date => Value::Date(NaiveDate::default()),
            ValueKind::Time => Value::Time(NaiveTime::default()),
            ValueKind::DateTime => Value::DateTime(NaiveDateTime::default()),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Text => "text",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Bool => "bool",
            ValueKind::Date => "date",
            ValueKind::Time => "time",
            ValueKind::DateTime => "datetime",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value (an `Option` field holding `None`).
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The kind of this value, or `None` for `Null`.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => None,
            Value::Text(_) => Some(ValueKind::Text),
            Value::Int(_) => Some(ValueKind::Int),
            Value::Float(_) => Some(ValueKind::Float),
            Value::Bool(_) => Some(ValueKind::Bool),
            Value::Date(_) => Some(ValueKind::Date),
            Value::Time(_) => Some(ValueKind::Time),
            Value::DateTime(_) => Some(ValueKind::DateTime),
        }
    }

    /// Numeric view used by currency-style converters.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

value_from!(
    String => Text,
    i64 => Int,
    i32 => Int,
    f64 => Float,
    bool => Bool,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => DateTime,
);

/// A Rust type that can be stored in a fixed-width column.
pub trait FieldValue: Sized {
    /// The kind requested from converters when decoding into this type.
    const KIND: ValueKind;

    /// Whether the type has an absent state (`Option<T>`).
    const NULLABLE: bool = false;

    fn to_value(&self) -> Value;

    /// Build the field from a converted value.
    ///
    /// `Null` maps to the type's zero value. Returns `None` when the value
    /// cannot be represented (wrong kind, out of range).
    fn from_value(value: Value) -> Option<Self>;
}

impl FieldValue for String {
    const KIND: ValueKind = ValueKind::Text;

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(String::new()),
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

fn int_of(value: Value) -> Option<i64> {
    match value {
        Value::Null => Some(0),
        Value::Int(i) => Some(i),
        // Truncates toward zero, the way a cast from a decimal amount does.
        Value::Float(f) if f.is_finite() && f.abs() < i64::MAX as f64 => Some(f.trunc() as i64),
        _ => None,
    }
}

macro_rules! int_field {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                const KIND: ValueKind = ValueKind::Int;

                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }

                fn from_value(value: Value) -> Option<Self> {
                    int_of(value).and_then(|i| <$ty>::try_from(i).ok())
                }
            }
        )*
    };
}

int_field!(i32, i64, u32);

impl FieldValue for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(0.0),
            other => other.as_f64(),
        }
    }
}

impl FieldValue for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }

    fn from_value(value: Value) -> Option<Self> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl FieldValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(false),
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl FieldValue for NaiveDate {
    const KIND: ValueKind = ValueKind::Date;

    fn to_value(&self) -> Value {
        Value::Date(*self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(NaiveDate::default()),
            Value::Date(d) => Some(d),
            Value::DateTime(dt) => Some(dt.date()),
            _ => None,
        }
    }
}

impl FieldValue for NaiveTime {
    const KIND: ValueKind = ValueKind::Time;

    fn to_value(&self) -> Value {
        Value::Time(*self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(NaiveTime::default()),
            Value::Time(t) => Some(t),
            Value::DateTime(dt) => Some(dt.time()),
            _ => None,
        }
    }
}

impl FieldValue for NaiveDateTime {
    const KIND: ValueKind = ValueKind::DateTime;

    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(NaiveDateTime::default()),
            Value::DateTime(dt) => Some(dt),
            Value::Date(d) => Some(d.and_time(NaiveTime::default())),
            _ => None,
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    const KIND: ValueKind = T::KIND;
    const NULLABLE: bool = true;

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}
