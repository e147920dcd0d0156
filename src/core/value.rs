//! Field values carried by log records
//!
//! [`Value`] is a closed set of value kinds. Anything outside the set is turned
//! into a string on the way in ([`Value::display`], [`Value::debug`]), so
//! serialization never has to fail.

use super::log_level::LogLevel;
use super::record::Record;
use super::timestamp::TimestampFormat;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Nesting limit for lazy evaluation and serialization
pub(crate) const MAX_DEPTH: usize = 64;

/// A value that redacts itself before it is written
///
/// Self-redaction takes precedence over key and pattern redaction: the value
/// returned by [`Redactable::redact`] is written as is.
///
/// # Example
///
/// ```
/// use chainlog::core::{Redactable, Value};
///
/// struct Email(String);
///
/// impl Redactable for Email {
///     fn redact(&self) -> Value {
///         match self.0.split_once('@') {
///             Some((_, domain)) => Value::from(format!("***@{}", domain)),
///             None => Value::from("***"),
///         }
///     }
/// }
/// ```
pub trait Redactable: Send + Sync {
    fn redact(&self) -> Value;
}

/// A deferred value, computed each time a record is written
#[derive(Clone)]
pub struct LazyValue(Arc<dyn Fn() -> Value + Send + Sync>);

impl LazyValue {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn evaluate(&self) -> Value {
        (self.0)()
    }
}

impl fmt::Debug for LazyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LazyValue(..)")
    }
}

/// Value type for structured logging fields
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Time(DateTime<Utc>),
    Level(LogLevel),
    Array(Vec<Value>),
    Record(Record),
    Lazy(LazyValue),
    Redactable(Arc<dyn Redactable>),
}

impl Value {
    /// Wrap a closure evaluated when the record is written
    pub fn lazy<F>(f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Value::Lazy(LazyValue::new(f))
    }

    pub fn redactable<R: Redactable + 'static>(value: R) -> Self {
        Value::Redactable(Arc::new(value))
    }

    /// Fallback for types without a native representation
    pub fn display(value: impl fmt::Display) -> Self {
        Value::String(value.to_string())
    }

    pub fn debug(value: impl fmt::Debug) -> Self {
        Value::String(format!("{:?}", value))
    }

    /// Describe an error and its `source()` chain
    pub fn from_error(error: &dyn std::error::Error) -> Self {
        let mut record = Record::new().with_field("message", error.to_string());

        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(Value::String(cause.to_string()));
            source = cause.source();
        }
        if !causes.is_empty() {
            record.set("causes", Value::Array(causes));
        }
        Value::Record(record)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Level carried by this value, accepting names and bunyan numbers
    pub fn as_level(&self) -> Option<LogLevel> {
        match self {
            Value::Level(level) => Some(*level),
            Value::Int(n) => Some(LogLevel::from_i64(*n)),
            Value::UInt(n) => Some(LogLevel::from_i64(i64::try_from(*n).unwrap_or(i64::MAX))),
            Value::String(name) => Some(LogLevel::from_name(name)),
            _ => None,
        }
    }

    /// Evaluate lazy values until a concrete value is reached
    pub fn resolve(&self) -> Value {
        let mut value = self.clone();
        for _ in 0..MAX_DEPTH {
            match value {
                Value::Lazy(lazy) => value = lazy.evaluate(),
                other => return other,
            }
        }
        Value::String("<lazy value nested too deeply>".to_string())
    }

    /// Convert to a JSON value, never fails
    pub fn to_json(&self) -> serde_json::Value {
        self.to_json_at(0)
    }

    pub(crate) fn to_json_at(&self, depth: usize) -> serde_json::Value {
        use serde_json::Value as Json;

        if depth > MAX_DEPTH {
            return Json::String("<value nested too deeply>".to_string());
        }
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::Number((*i).into()),
            Value::UInt(u) => Json::Number((*u).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or_else(|| Json::String(f.to_string())),
            Value::String(s) => Json::String(s.clone()),
            Value::Time(t) => Json::String(TimestampFormat::default().format(t)),
            Value::Level(level) => Json::Number(level.as_i64().into()),
            Value::Array(items) => {
                Json::Array(items.iter().map(|v| v.to_json_at(depth + 1)).collect())
            }
            Value::Record(record) => record.to_json_at(depth + 1),
            Value::Lazy(lazy) => lazy.evaluate().to_json_at(depth + 1),
            Value::Redactable(value) => value.redact().to_json_at(depth + 1),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Value::UInt(u) => f.debug_tuple("UInt").field(u).finish(),
            Value::Float(fl) => f.debug_tuple("Float").field(fl).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Time(t) => f.debug_tuple("Time").field(t).finish(),
            Value::Level(l) => f.debug_tuple("Level").field(l).finish(),
            Value::Array(a) => f.debug_tuple("Array").field(a).finish(),
            Value::Record(r) => f.debug_tuple("Record").field(r).finish(),
            Value::Lazy(lazy) => lazy.fmt(f),
            Value::Redactable(_) => f.write_str("Redactable(..)"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Level(level) => write!(f, "{}", level),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Level(a), Value::Level(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Lazy(a), Value::Lazy(b)) => Arc::ptr_eq(&a.0, &b.0),
            (Value::Redactable(a), Value::Redactable(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
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

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(i: $t) -> Self {
                Value::Int(i as i64)
            }
        })*
    };
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(u: $t) -> Self {
                Value::UInt(u as u64)
            }
        })*
    };
}

from_signed!(i8, i16, i32, i64, isize);
from_unsigned!(u8, u16, u32, u64, usize);

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f as f64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Time(t)
    }
}

impl From<LogLevel> for Value {
    fn from(level: LogLevel) -> Self {
        Value::Level(level)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl From<LazyValue> for Value {
    fn from(lazy: LazyValue) -> Self {
        Value::Lazy(lazy)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    n.as_f64().map(Value::Float).unwrap_or(Value::Null)
                }
            }
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::Record(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}
