//! Values held by table mirrors and the conversions that produce them.
//!
//! Both directions of a write go through an intermediate JSON value: statement
//! parameters are converted from [`sea_orm::Value`] and rows are decoded cell by
//! cell. The conversion to the mirrored form is then the same regardless of
//! where the value came from.

use sea_orm::{DbErr, QueryResult, Value, prelude::Decimal};
use serde_json::Value as JsonValue;
use std::fmt;

/// Closed set of conversions available to typed cache rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Signed 64-bit integer
    Int,
    /// 64-bit float
    Float,
    /// Boolean
    Bool,
    /// Text
    Text,
}

/// Conversion applied to the mirror's key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Integer keys, e.g. guild IDs
    Int,
    /// Text keys
    Text,
}

/// One mirrored value.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// Text value
    Text(String),
    /// Unconverted value of an opaque column
    Raw(JsonValue),
}

impl CacheValue {
    /// Integer payload, if this is an integer.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Text payload, if this is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl From<i64> for CacheValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for CacheValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for CacheValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for CacheValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for CacheValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CacheValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<JsonValue> for CacheValue {
    fn from(value: JsonValue) -> Self {
        Self::Raw(value)
    }
}

/// Lookup key of a mirror entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MirrorKey {
    /// Integer key
    Int(i64),
    /// Text key
    Text(String),
}

impl fmt::Display for MirrorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "'{value}'"),
        }
    }
}

impl From<i64> for MirrorKey {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for MirrorKey {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for MirrorKey {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MirrorKey {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl ColumnKind {
    /// Converts `raw` to this kind. `Ok(None)` means the value was null.
    pub(crate) fn coerce(self, raw: &JsonValue) -> Result<Option<CacheValue>, String> {
        if raw.is_null() {
            return Ok(None);
        }
        let value = match self {
            Self::Int => CacheValue::Int(coerce_int(raw)?),
            Self::Float => CacheValue::Float(coerce_float(raw)?),
            Self::Bool => CacheValue::Bool(coerce_bool(raw)?),
            Self::Text => CacheValue::Text(match raw {
                JsonValue::String(text) => text.clone(),
                other => other.to_string(),
            }),
        };
        Ok(Some(value))
    }
}

impl KeyKind {
    /// Converts `raw` to a mirror key. `Ok(None)` means the key was null.
    pub(crate) fn coerce(self, raw: &JsonValue) -> Result<Option<MirrorKey>, String> {
        let column_kind = match self {
            Self::Int => ColumnKind::Int,
            Self::Text => ColumnKind::Text,
        };
        Ok(column_kind.coerce(raw)?.and_then(|value| match value {
            CacheValue::Int(value) => Some(MirrorKey::Int(value)),
            CacheValue::Text(value) => Some(MirrorKey::Text(value)),
            _ => None,
        }))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn coerce_int(raw: &JsonValue) -> Result<i64, String> {
    let from_float = |value: f64| {
        if value.is_finite() && value.abs() < 9.2e18 {
            Ok(value.trunc() as i64)
        } else {
            Err(format!("{value} does not fit an integer"))
        }
    };

    match raw {
        JsonValue::Number(number) => {
            if let Some(value) = number.as_i64() {
                Ok(value)
            } else if let Some(value) = number.as_f64() {
                from_float(value)
            } else {
                Err(format!("{number} does not fit an integer"))
            }
        }
        JsonValue::String(text) => {
            let text = text.trim();
            text.parse::<i64>().or_else(|_| {
                text.parse::<f64>()
                    .map_err(|_| format!("'{text}' is not an integer"))
                    .and_then(from_float)
            })
        }
        JsonValue::Bool(flag) => Ok(i64::from(*flag)),
        other => Err(format!("{other} is not an integer")),
    }
}

#[allow(clippy::cast_precision_loss)]
fn coerce_float(raw: &JsonValue) -> Result<f64, String> {
    match raw {
        JsonValue::Number(number) => number
            .as_f64()
            .ok_or_else(|| format!("{number} is not a float")),
        JsonValue::String(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{text}' is not a float")),
        JsonValue::Bool(flag) => Ok(if *flag { 1.0 } else { 0.0 }),
        other => Err(format!("{other} is not a float")),
    }
}

fn coerce_bool(raw: &JsonValue) -> Result<bool, String> {
    match raw {
        JsonValue::Bool(flag) => Ok(*flag),
        JsonValue::Number(number) => Ok(number.as_f64().is_some_and(|value| value != 0.0)),
        JsonValue::String(text) => match text.trim().to_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "y" => Ok(true),
            "false" | "f" | "0" | "no" | "n" => Ok(false),
            _ => Err(format!("'{text}' is not a boolean")),
        },
        other => Err(format!("{other} is not a boolean")),
    }
}

/// Converts a statement parameter into the intermediate JSON form.
pub(crate) fn param_to_json(value: &Value) -> Result<JsonValue, String> {
    let converted = match value {
        Value::Bool(v) => v.map(JsonValue::Bool),
        Value::TinyInt(v) => v.map(JsonValue::from),
        Value::SmallInt(v) => v.map(JsonValue::from),
        Value::Int(v) => v.map(JsonValue::from),
        Value::BigInt(v) => v.map(JsonValue::from),
        Value::TinyUnsigned(v) => v.map(JsonValue::from),
        Value::SmallUnsigned(v) => v.map(JsonValue::from),
        Value::Unsigned(v) => v.map(JsonValue::from),
        Value::BigUnsigned(v) => v.map(JsonValue::from),
        Value::Float(v) => v.map(JsonValue::from),
        Value::Double(v) => v.map(JsonValue::from),
        Value::String(v) => v.as_ref().map(|text| JsonValue::String(String::clone(text))),
        Value::Char(v) => v.map(|c| JsonValue::String(c.to_string())),
        Value::Json(v) => v.as_ref().map(|json| JsonValue::clone(json)),
        other => return Err(format!("unsupported parameter type: {other:?}")),
    };
    Ok(converted.unwrap_or(JsonValue::Null))
}

/// Reads one cell without knowing its SQL type, trying the common decodings in turn.
///
/// PostgreSQL only decodes into the exact Rust type of the column, so every
/// integer and float width is tried before falling back to text.
pub(crate) fn decode_cell(row: &QueryResult, column: &str) -> Result<JsonValue, DbErr> {
    if let Ok(value) = row.try_get::<Option<i64>>("", column) {
        return Ok(value.map_or(JsonValue::Null, JsonValue::from));
    }
    if let Ok(value) = row.try_get::<Option<i32>>("", column) {
        return Ok(value.map_or(JsonValue::Null, JsonValue::from));
    }
    if let Ok(value) = row.try_get::<Option<i16>>("", column) {
        return Ok(value.map_or(JsonValue::Null, JsonValue::from));
    }
    if let Ok(value) = row.try_get::<Option<f64>>("", column) {
        return Ok(value.map_or(JsonValue::Null, JsonValue::from));
    }
    if let Ok(value) = row.try_get::<Option<f32>>("", column) {
        return Ok(value.map_or(JsonValue::Null, JsonValue::from));
    }
    if let Ok(value) = row.try_get::<Option<Decimal>>("", column) {
        return Ok(value.map_or(JsonValue::Null, decimal_to_json));
    }
    if let Ok(value) = row.try_get::<Option<bool>>("", column) {
        return Ok(value.map_or(JsonValue::Null, JsonValue::Bool));
    }
    if let Ok(value) = row.try_get::<Option<String>>("", column) {
        return Ok(value.map_or(JsonValue::Null, JsonValue::String));
    }
    row.try_get::<Option<JsonValue>>("", column)
        .map(|value| value.unwrap_or(JsonValue::Null))
}

/// `NUMERIC` values become JSON numbers, or text when they do not fit one.
fn decimal_to_json(value: Decimal) -> JsonValue {
    let text = value.normalize().to_string();
    text.parse::<serde_json::Number>()
        .map_or(JsonValue::String(text), JsonValue::Number)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use serde_json::json;

    #[test]
    fn test_int_coercion_accepts_numeric_text() {
        assert_eq!(
            ColumnKind::Int.coerce(&json!("456")).unwrap(),
            Some(CacheValue::Int(456))
        );
        assert_eq!(
            ColumnKind::Int.coerce(&json!(" 12.9 ")).unwrap(),
            Some(CacheValue::Int(12))
        );
        assert_eq!(
            ColumnKind::Int.coerce(&json!(true)).unwrap(),
            Some(CacheValue::Int(1))
        );
        assert!(ColumnKind::Int.coerce(&json!("abc")).is_err());
    }

    #[test]
    fn test_null_coerces_to_none() {
        for kind in [
            ColumnKind::Int,
            ColumnKind::Float,
            ColumnKind::Bool,
            ColumnKind::Text,
        ] {
            assert_eq!(kind.coerce(&JsonValue::Null).unwrap(), None);
        }
    }

    #[test]
    fn test_bool_coercion_understands_backend_spellings() {
        assert_eq!(
            ColumnKind::Bool.coerce(&json!("t")).unwrap(),
            Some(CacheValue::Bool(true))
        );
        assert_eq!(
            ColumnKind::Bool.coerce(&json!("FALSE")).unwrap(),
            Some(CacheValue::Bool(false))
        );
        assert_eq!(
            ColumnKind::Bool.coerce(&json!(0)).unwrap(),
            Some(CacheValue::Bool(false))
        );
        assert!(ColumnKind::Bool.coerce(&json!("maybe")).is_err());
    }

    #[test]
    fn test_text_and_float_coercion() {
        assert_eq!(
            ColumnKind::Text.coerce(&json!(42)).unwrap(),
            Some(CacheValue::Text("42".to_string()))
        );
        assert_eq!(
            ColumnKind::Float.coerce(&json!("2.5")).unwrap(),
            Some(CacheValue::Float(2.5))
        );
    }

    #[test]
    fn test_key_coercion() {
        assert_eq!(
            KeyKind::Int.coerce(&json!("123")).unwrap(),
            Some(MirrorKey::Int(123))
        );
        assert_eq!(
            KeyKind::Text.coerce(&json!("abc")).unwrap(),
            Some(MirrorKey::Text("abc".to_string()))
        );
        assert_eq!(KeyKind::Int.coerce(&JsonValue::Null).unwrap(), None);
    }

    #[test]
    fn test_numeric_cells_become_numbers() {
        assert_eq!(decimal_to_json(Decimal::new(12, 0)), json!(12));
        assert_eq!(decimal_to_json(Decimal::new(350, 2)), json!(3.5));
        assert_eq!(decimal_to_json(Decimal::new(-70, 1)), json!(-7));
    }

    #[test]
    fn test_param_to_json() {
        assert_eq!(param_to_json(&Value::from(7_i64)).unwrap(), json!(7));
        assert_eq!(param_to_json(&Value::from("hi")).unwrap(), json!("hi"));
        assert_eq!(param_to_json(&Value::from(true)).unwrap(), json!(true));
        assert_eq!(
            param_to_json(&Value::BigInt(None)).unwrap(),
            JsonValue::Null
        );
    }
}
