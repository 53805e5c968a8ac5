//! JSON encoding with support for values plain JSON cannot express.

use crate::error::{Result, XyapiError};
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Number};

mod value;

pub use value::{Encodable, Value};

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One entry of the encoder's rule table
///
/// `matches` selects the values the rule handles, `convert` turns a matched value into
/// something closer to JSON. The converted value is encoded again, so a converter may
/// return extended values of its own.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&Value) -> bool,
    pub convert: fn(&Value) -> Result<Value>,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// Extended shapes, first match wins.
const RULES: [Rule; 6] = [
    Rule {
        name: "mapping",
        matches: is_mapping,
        convert: convert_mapping,
    },
    Rule {
        name: "datetime",
        matches: is_datetime,
        convert: convert_datetime,
    },
    Rule {
        name: "date",
        matches: is_date,
        convert: convert_date,
    },
    Rule {
        name: "decimal",
        matches: is_decimal,
        convert: convert_decimal,
    },
    Rule {
        name: "bytes",
        matches: is_bytes,
        convert: convert_bytes,
    },
    Rule {
        name: "attributes",
        matches: has_attributes,
        convert: convert_attributes,
    },
];

fn is_mapping(value: &Value) -> bool {
    matches!(value, Value::Custom(c) if c.as_mapping().is_some())
}

fn convert_mapping(value: &Value) -> Result<Value> {
    match value {
        Value::Custom(c) => c.as_mapping().map(Value::Map).ok_or_else(|| unsupported(value)),
        _ => Err(unsupported(value)),
    }
}

fn is_datetime(value: &Value) -> bool {
    match value {
        Value::DateTime(_) => true,
        Value::Custom(c) => c.as_datetime().is_some(),
        _ => false,
    }
}

fn convert_datetime(value: &Value) -> Result<Value> {
    let datetime = match value {
        Value::DateTime(datetime) => Some(*datetime),
        Value::Custom(c) => c.as_datetime(),
        _ => None,
    };
    datetime
        .map(|dt| Value::String(dt.format(DATETIME_FORMAT).to_string()))
        .ok_or_else(|| unsupported(value))
}

fn is_date(value: &Value) -> bool {
    match value {
        Value::Date(_) => true,
        Value::Custom(c) => c.as_date().is_some(),
        _ => false,
    }
}

fn convert_date(value: &Value) -> Result<Value> {
    let date = match value {
        Value::Date(date) => Some(*date),
        Value::Custom(c) => c.as_date(),
        _ => None,
    };
    date.map(|d| Value::String(d.format(DATE_FORMAT).to_string()))
        .ok_or_else(|| unsupported(value))
}

fn is_decimal(value: &Value) -> bool {
    match value {
        Value::Decimal(_) => true,
        Value::Custom(c) => c.as_decimal().is_some(),
        _ => false,
    }
}

fn convert_decimal(value: &Value) -> Result<Value> {
    let decimal = match value {
        Value::Decimal(decimal) => Some(*decimal),
        Value::Custom(c) => c.as_decimal(),
        _ => None,
    };
    let decimal = decimal.ok_or_else(|| unsupported(value))?;
    // Precision loss is accepted.
    decimal
        .to_f64()
        .map(Value::Float)
        .ok_or_else(|| XyapiError::DecimalOutOfRange(decimal.to_string()))
}

fn is_bytes(value: &Value) -> bool {
    match value {
        Value::Bytes(_) => true,
        Value::Custom(c) => c.as_bytes().is_some(),
        _ => false,
    }
}

fn convert_bytes(value: &Value) -> Result<Value> {
    let bytes = match value {
        Value::Bytes(bytes) => Some(bytes.clone()),
        Value::Custom(c) => c.as_bytes(),
        _ => None,
    };
    let bytes = bytes.ok_or_else(|| unsupported(value))?;
    Ok(Value::String(String::from_utf8(bytes)?))
}

fn has_attributes(value: &Value) -> bool {
    matches!(value, Value::Custom(c) if c.attributes().is_some())
}

fn convert_attributes(value: &Value) -> Result<Value> {
    match value {
        Value::Custom(c) => c.attributes().map(Value::Map).ok_or_else(|| unsupported(value)),
        _ => Err(unsupported(value)),
    }
}

fn unsupported(value: &Value) -> XyapiError {
    XyapiError::Unsupported {
        type_name: value.type_name().to_string(),
    }
}

/// Stateless JSON encoder
///
/// Output is compact (no whitespace between separators), non-ASCII text is written
/// literally and non-finite floats are rejected.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use xyapi::encoder::{CustomEncoder, Value};
///
/// let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
/// let value = Value::map([("day", Value::from(date)), ("name", Value::from("한글"))]);
///
/// let bytes = CustomEncoder::new().encode(&value).unwrap();
/// assert_eq!(String::from_utf8(bytes).unwrap(), r#"{"day":"2024-01-31","name":"한글"}"#);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomEncoder;

impl CustomEncoder {
    pub fn new() -> Self {
        Self
    }

    /// The extended-shape rules in precedence order
    pub fn rules(&self) -> &'static [Rule] {
        &RULES
    }

    /// Name of the rule that would handle `value`, if any
    pub fn rule_for(&self, value: &Value) -> Option<&'static str> {
        self.rules()
            .iter()
            .find(|rule| (rule.matches)(value))
            .map(|rule| rule.name)
    }

    /// Encode `value` as UTF-8 JSON bytes
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        let json = self.to_json(value)?;
        Ok(serde_json::to_vec(&json)?)
    }

    /// Convert `value` into plain JSON, applying the rule table to extended shapes
    pub fn to_json(&self, value: &Value) -> Result<serde_json::Value> {
        match value {
            Value::Null => Ok(serde_json::Value::Null),
            Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
            Value::Int(i) => Ok(serde_json::Value::Number((*i).into())),
            Value::UInt(u) => Ok(serde_json::Value::Number((*u).into())),
            Value::Float(f) => Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .ok_or(XyapiError::NonFiniteFloat(*f)),
            Value::String(s) => Ok(serde_json::Value::String(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| self.to_json(item))
                .collect::<Result<Vec<_>>>()
                .map(serde_json::Value::Array),
            Value::Map(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (key, value) in entries {
                    map.insert(key.clone(), self.to_json(value)?);
                }
                Ok(serde_json::Value::Object(map))
            }
            extended => self.encode_extended(extended),
        }
    }

    fn encode_extended(&self, value: &Value) -> Result<serde_json::Value> {
        match self.rules().iter().find(|rule| (rule.matches)(value)) {
            Some(rule) => self.to_json(&(rule.convert)(value)?),
            None => Err(unsupported(value)),
        }
    }
}
