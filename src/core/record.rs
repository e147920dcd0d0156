//! Records: the key/value fields of one log entry
//!
//! Keys are unique and the first writer wins: [`Record::set`] never replaces an
//! existing key and [`Record::merge`] only adds keys the receiver lacks. This is
//! what lets fields set close to the log call take priority over fields
//! inherited from parent loggers.

use super::error::{LoggerError, Result};
use super::value::{Value, MAX_DEPTH};
use serde::{Serialize, Serializer};
use std::collections::hash_map::{self, HashMap};
use std::fmt;

/// Emission time
pub const TIME_FIELD: &str = "time";
/// Level of the entry
pub const LEVEL_FIELD: &str = "level";
/// Formatted message
pub const MESSAGE_FIELD: &str = "msg";
/// Logger name, set once at the root
pub const NAME_FIELD: &str = "name";
pub const HOSTNAME_FIELD: &str = "hostname";
pub const PID_FIELD: &str = "pid";
/// Emitting thread, evaluated when the record is written
pub const TID_FIELD: &str = "tid";
pub const TOPIC_FIELD: &str = "topic";
pub const SCOPE_FIELD: &str = "scope";
/// Error attached by `error`/`fatal` emit calls
pub const ERROR_FIELD: &str = "err";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: HashMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self {
            fields: HashMap::new(),
        }
    }

    /// Set a field unless the value is null or the key is already present
    pub fn set<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let value = value.into();
        if value.is_null() {
            return self;
        }
        if let hash_map::Entry::Vacant(entry) = self.fields.entry(key.into()) {
            entry.insert(value);
        }
        self
    }

    /// Builder form of [`Record::set`]
    #[must_use]
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.set(key, value);
        self
    }

    /// Add every field of `source` missing from this record
    pub fn merge(&mut self, source: &Record) -> &mut Self {
        for (key, value) in &source.fields {
            if !self.fields.contains_key(key) {
                self.fields.insert(key.clone(), value.clone());
            }
        }
        self
    }

    /// Overwrite a field, used by converters that reshape a record
    pub fn replace<K, V>(&mut self, key: K, value: V) -> Option<Value>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.fields.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Move a field to a new key, keeping whatever the new key already held
    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(value) = self.fields.remove(from) {
            self.fields.entry(to.to_string()).or_insert(value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// String value of a field, evaluating it when lazy
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.fields.get(key)?.resolve() {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, Value> {
        self.fields.iter()
    }

    /// Convert to JSON, an empty record becomes `null`
    pub fn to_json(&self) -> serde_json::Value {
        self.to_json_at(0)
    }

    pub(crate) fn to_json_at(&self, depth: usize) -> serde_json::Value {
        if self.fields.is_empty() {
            return serde_json::Value::Null;
        }
        if depth > MAX_DEPTH {
            return serde_json::Value::String("<record nested too deeply>".to_string());
        }
        let map = self
            .fields
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json_at(depth + 1)))
            .collect();
        serde_json::Value::Object(map)
    }

    /// Serialize to one line of JSON
    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }

    /// Parse a record from JSON text, `null` yields an empty record
    pub fn from_json(text: &str) -> Result<Self> {
        match serde_json::from_str::<serde_json::Value>(text)? {
            serde_json::Value::Null => Ok(Record::new()),
            serde_json::Value::Object(map) => {
                Ok(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
            other => Err(LoggerError::other(format!(
                "expected a JSON object or null, found {}",
                other
            ))),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (key, value) in iter {
            record.set(key, value);
        }
        record
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = hash_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
