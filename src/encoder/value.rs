//! The value model handed to [`CustomEncoder`](super::CustomEncoder).
//!
//! JSON-native shapes map one to one onto JSON. Extended shapes (dates, decimals,
//! bytes and [`Encodable`] objects) are only accepted through the encoder's rule table.

use crate::error::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;

/// Capabilities a user-defined type may expose to the encoder.
///
/// Every capability defaults to `None`. The encoder asks them in a fixed order, so a type
/// answering both [`as_mapping`](Encodable::as_mapping) and
/// [`as_datetime`](Encodable::as_datetime) is encoded as a mapping.
///
/// # Example
/// ```
/// use xyapi::encoder::{CustomEncoder, Encodable, Value};
///
/// #[derive(Debug)]
/// struct Point {
///     x: i64,
///     y: i64,
/// }
///
/// impl Encodable for Point {
///     fn attributes(&self) -> Option<Vec<(String, Value)>> {
///         Some(vec![("x".into(), self.x.into()), ("y".into(), self.y.into())])
///     }
/// }
///
/// let bytes = CustomEncoder::new().encode(&Value::custom(Point { x: 1, y: 2 })).unwrap();
/// assert_eq!(bytes, br#"{"x":1,"y":2}"#);
/// ```
pub trait Encodable: Debug + Send + Sync + 'static {
    /// Name used in "not JSON serializable" errors
    fn type_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Key lookup plus key iteration
    fn as_mapping(&self) -> Option<Vec<(String, Value)>> {
        None
    }

    fn as_datetime(&self) -> Option<NaiveDateTime> {
        None
    }

    fn as_date(&self) -> Option<NaiveDate> {
        None
    }

    fn as_decimal(&self) -> Option<Decimal> {
        None
    }

    fn as_bytes(&self) -> Option<Vec<u8>> {
        None
    }

    /// The object's attribute mapping
    fn attributes(&self) -> Option<Vec<(String, Value)>> {
        None
    }
}

/// Value accepted by the encoder
///
/// `Vec<T>` converts to [`Value::Array`] for every `T`, so a `Vec<u8>` becomes a list of
/// integers, as does a `Vec<u8>` field captured with [`Value::from_serialize`]. Use
/// [`Value::bytes`] for byte sequences that should encode as UTF-8 text.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    /// Insertion ordered; a repeated key overwrites the earlier value in place
    Map(Vec<(String, Value)>),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Decimal(Decimal),
    Bytes(Vec<u8>),
    Custom(Arc<dyn Encodable>),
}

impl Value {
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(bytes.into())
    }

    pub fn custom<T: Encodable>(value: T) -> Self {
        Value::Custom(Arc::new(value))
    }

    /// Capture any `Serialize` type through its serde representation
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(serde_json::to_value(value)?.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) | Value::UInt(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::DateTime(_) => "datetime",
            Value::Date(_) => "date",
            Value::Decimal(_) => "decimal",
            Value::Bytes(_) => "bytes",
            Value::Custom(custom) => custom.type_name(),
        }
    }
}

macro_rules! impl_from_signed {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::Int(value as i64)
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::UInt(value as u64)
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64, isize);
impl_from_unsigned!(u8, u16, u32, u64, usize);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::Array(values.into_iter().map(Into::into).collect())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

/// Timezone-aware values keep their local wall time; the offset is dropped.
impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(value: DateTime<Tz>) -> Self {
        Value::DateTime(value.naive_local())
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<Arc<dyn Encodable>> for Value {
    fn from(value: Arc<dyn Encodable>) -> Self {
        Value::Custom(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}
