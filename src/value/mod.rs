//! Runtime values for the armeval expression evaluator
//!
//! Values flow between template functions and mirror the implicit
//! conversions of the ARM template language: coercion helpers return
//! success/failure and the calling function decides whether a failed
//! coercion is a hard error.

use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use indexmap::IndexMap;

use crate::context::TemplateContext;
use crate::errors::EvalResult;

/// A deferred argument thunk, forced only when the owning branch is taken.
pub type DeferredFn = dyn Fn(&dyn TemplateContext) -> EvalResult<Value>;

/// A runtime value in a template expression
#[derive(Clone)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean
    Bool(bool),
    /// Integer (64-bit signed)
    Int(i64),
    /// Floating point (64-bit)
    Float(f64),
    /// String
    String(String),
    /// Array of values
    Array(Vec<Value>),
    /// Object (ordered map of string keys to values)
    Object(IndexMap<String, Value>),
    /// Unevaluated argument expression, used by delay-binding functions
    Deferred(Rc<DeferredFn>),
}

impl Value {
    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Deferred(_) => "deferred",
        }
    }

    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Force a deferred expression; any other value evaluates to itself.
    pub fn force(&self, context: &dyn TemplateContext) -> EvalResult<Value> {
        match self {
            Value::Deferred(f) => f(context),
            other => Ok(other.clone()),
        }
    }

    /// Native string only; numeric and bool values are not stringy.
    pub fn try_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value as a 64-bit signed integer. Floats qualify only when
    /// they hold an exact integral value.
    pub fn try_long(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Float(n) if n.fract() == 0.0 && n.is_finite() => Some(*n as i64),
            _ => None,
        }
    }

    /// Numeric value within 32-bit signed range.
    pub fn try_int(&self) -> Option<i64> {
        let n = self.try_long()?;
        if n >= i32::MIN as i64 && n <= i32::MAX as i64 {
            Some(n)
        } else {
            None
        }
    }

    /// Native boolean only.
    pub fn try_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Like [`try_long`](Value::try_long), also parsing decimal strings.
    pub fn try_convert_long(&self) -> Option<i64> {
        match self {
            Value::String(s) => s.trim().parse::<i64>().ok(),
            other => other.try_long(),
        }
    }

    /// Like [`try_int`](Value::try_int), also parsing decimal strings.
    pub fn try_convert_int(&self) -> Option<i64> {
        let n = self.try_convert_long()?;
        if n >= i32::MIN as i64 && n <= i32::MAX as i64 {
            Some(n)
        } else {
            None
        }
    }

    /// Boolean, also accepting the literal strings "true"/"false"
    /// (ASCII case-insensitive, matching the template language).
    pub fn try_convert_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::String(s) => {
                if s.eq_ignore_ascii_case("true") {
                    Some(true)
                } else if s.eq_ignore_ascii_case("false") {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Parse a date/time from a string value. Accepts RFC 3339 and a
    /// couple of common invariant patterns, always interpreted as UTC.
    pub fn try_convert_datetime(&self) -> Option<DateTime<Utc>> {
        let s = self.try_string()?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        const PATTERNS: &[&str] = &[
            "%Y%m%dT%H%M%SZ",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d",
        ];
        for pattern in PATTERNS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, pattern) {
                return Some(Utc.from_utc_datetime(&dt));
            }
            if *pattern == "%Y-%m-%d" {
                if let Ok(d) = chrono::NaiveDate::parse_from_str(s, pattern) {
                    return Some(Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0)?));
                }
            }
        }
        None
    }

    /// Literal text for scalar values, used by string() before falling
    /// back to JSON serialization for arrays and objects.
    pub fn try_scalar_string(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(n) => Some(n.to_string()),
            Value::Float(n) => Some(n.to_string()),
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Try to get as array
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Try to get as object
    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Convert to serde_json::Value. Deferred values serialize as null;
    /// they never escape the dispatcher in practice.
    pub fn to_serde_json(&self) -> serde_json::Value {
        match self {
            Value::Null | Value::Deferred(_) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::Number(serde_json::Number::from(*n)),
            Value::Float(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(|v| v.to_serde_json()).collect())
            }
            Value::Object(obj) => {
                let map: serde_json::Map<String, serde_json::Value> = obj
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_serde_json()))
                    .collect();
                serde_json::Value::Object(map)
            }
        }
    }

    /// Convert a serde_json::Value to a template value
    pub fn from_serde_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from_serde_json).collect())
            }
            serde_json::Value::Object(obj) => {
                let mut map = IndexMap::new();
                for (k, v) in obj {
                    map.insert(k, Value::from_serde_json(v));
                }
                Value::Object(map)
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            // A deferred value compares equal to nothing, itself included.
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Value::Float(n) => f.debug_tuple("Float").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Array(a) => f.debug_tuple("Array").field(a).finish(),
            Value::Object(o) => f.debug_tuple("Object").field(o).finish(),
            Value::Deferred(_) => write!(f, "Deferred(..)"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(_) | Value::Object(_) => write!(f, "{}", self.to_serde_json()),
            Value::Deferred(_) => write!(f, "<deferred>"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(m: IndexMap<String, Value>) -> Self {
        Value::Object(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::Bool(true).type_name(), "bool");
        assert_eq!(Value::Int(42).type_name(), "int");
        assert_eq!(Value::Float(3.14).type_name(), "float");
        assert_eq!(Value::String("hello".into()).type_name(), "string");
        assert_eq!(Value::Array(vec![]).type_name(), "array");
        assert_eq!(Value::Object(IndexMap::new()).type_name(), "object");
    }

    #[test]
    fn test_try_string_is_strict() {
        assert_eq!(Value::String("a".into()).try_string(), Some("a"));
        assert_eq!(Value::Int(1).try_string(), None);
        assert_eq!(Value::Bool(true).try_string(), None);
    }

    #[test]
    fn test_try_long() {
        assert_eq!(Value::Int(42).try_long(), Some(42));
        assert_eq!(Value::Float(42.0).try_long(), Some(42));
        assert_eq!(Value::Float(42.5).try_long(), None);
        assert_eq!(Value::String("42".into()).try_long(), None);
    }

    #[test]
    fn test_try_convert_long_parses_strings() {
        assert_eq!(Value::String("42".into()).try_convert_long(), Some(42));
        assert_eq!(Value::String("-7".into()).try_convert_long(), Some(-7));
        assert_eq!(Value::String("4.2".into()).try_convert_long(), None);
        assert_eq!(Value::String("nope".into()).try_convert_long(), None);
    }

    #[test]
    fn test_try_int_range_check() {
        assert_eq!(Value::Int(i64::from(i32::MAX)).try_int(), Some(2147483647));
        assert_eq!(Value::Int(i64::from(i32::MAX) + 1).try_int(), None);
        assert_eq!(Value::Int(i64::from(i32::MIN) - 1).try_int(), None);
    }

    #[test]
    fn test_try_convert_bool() {
        assert_eq!(Value::Bool(true).try_convert_bool(), Some(true));
        assert_eq!(Value::String("true".into()).try_convert_bool(), Some(true));
        assert_eq!(Value::String("TRUE".into()).try_convert_bool(), Some(true));
        assert_eq!(Value::String("False".into()).try_convert_bool(), Some(false));
        assert_eq!(Value::String("yes".into()).try_convert_bool(), None);
        assert_eq!(Value::Int(1).try_convert_bool(), None);
    }

    #[test]
    fn test_try_convert_datetime() {
        let v = Value::String("2024-03-01T10:00:00Z".into());
        let dt = v.try_convert_datetime().unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-01T10:00:00+00:00");

        let v = Value::String("20240301T100000Z".into());
        assert!(v.try_convert_datetime().is_some());

        let v = Value::String("not a date".into());
        assert!(v.try_convert_datetime().is_none());
    }

    #[test]
    fn test_int_float_equality() {
        assert_eq!(Value::Int(42), Value::Float(42.0));
        assert_ne!(Value::Int(42), Value::Float(42.1));
        assert_ne!(Value::String("1".into()), Value::Int(1));
    }

    #[test]
    fn test_serde_json_round_trip() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"a":[1,2.5,"x",null,true]}"#).unwrap();
        let value = Value::from_serde_json(json.clone());
        assert_eq!(value.to_serde_json(), json);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Value::Null), "null");
        assert_eq!(format!("{}", Value::Bool(true)), "true");
        assert_eq!(format!("{}", Value::Int(42)), "42");
        assert_eq!(
            format!("{}", Value::Array(vec![Value::Int(1), Value::Int(2)])),
            "[1,2]"
        );
    }
}
