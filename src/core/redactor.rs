//! Sensitive data redaction
//!
//! Two kinds of rules exist:
//! - [`Redactor`]: a regular expression applied to every string value
//! - [`KeyRedactor`]: field names whose whole value is masked
//!
//! Values implementing [`Redactable`](super::value::Redactable) redact
//! themselves and are left alone by both rule kinds.
//!
//! [`redact_record`] applies a rule list in this order: self-redaction, key
//! redaction, then every pattern in the order the rules were given. The
//! top-level `level`, `topic` and `scope` fields are never redacted, sinks
//! route records by them.

use super::error::{LoggerError, Result};
use super::record::{Record, LEVEL_FIELD, SCOPE_FIELD, TOPIC_FIELD};
use super::value::{Value, MAX_DEPTH};
use regex::{NoExpand, Regex};
use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Marker written in place of redacted content
pub const REDACTED: &str = "REDACTED";

/// Passes run by [`Redactor::redact`] before giving up on reaching a fixed point
const MAX_PASSES: usize = 8;

const ROUTING_FIELDS: [&str; 3] = [LEVEL_FIELD, TOPIC_FIELD, SCOPE_FIELD];

static CREDIT_CARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\d[ -]?){12,18}\d\b").expect("credit card pattern is valid")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email pattern is valid")
});

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+1[-. ]?)?\(?\b\d{3}\)?[-. ]\d{3}[-. ]\d{4}\b").expect("phone pattern is valid")
});

/// Pattern based redaction rule
#[derive(Debug, Clone)]
pub struct Redactor {
    pattern: Regex,
    marker: String,
}

impl Redactor {
    /// Compile a redaction pattern using the [`REDACTED`] marker
    ///
    /// # Errors
    ///
    /// [`LoggerError::InvalidPattern`] when the pattern does not compile or
    /// matches the marker itself.
    pub fn new(pattern: &str) -> Result<Self> {
        Self::with_marker(pattern, REDACTED)
    }

    /// Compile a redaction pattern with a custom marker
    ///
    /// A pattern can still match text formed by the marker and its
    /// neighbours, e.g. `D1` over `D11` with the default marker. Redaction
    /// repeats until the text settles but stops after a fixed number of
    /// passes, so such a pattern may leave text that redacts further.
    pub fn with_marker(pattern: &str, marker: impl Into<String>) -> Result<Self> {
        let regex =
            Regex::new(pattern).map_err(|e| LoggerError::invalid_pattern(pattern, e.to_string()))?;
        Self::from_regex(regex, marker)
    }

    pub fn from_regex(pattern: Regex, marker: impl Into<String>) -> Result<Self> {
        let marker = marker.into();
        if pattern.is_match(&marker) {
            return Err(LoggerError::invalid_pattern(
                pattern.as_str(),
                format!("replacement marker '{}' matches the pattern", marker),
            ));
        }
        Ok(Self { pattern, marker })
    }

    /// Credit card numbers, 13 to 19 digits optionally grouped by spaces or dashes
    pub fn credit_card() -> Self {
        Self::shipped(&CREDIT_CARD)
    }

    pub fn email() -> Self {
        Self::shipped(&EMAIL)
    }

    /// North American phone numbers written with separators
    pub fn phone() -> Self {
        Self::shipped(&PHONE)
    }

    fn shipped(pattern: &Regex) -> Self {
        Self {
            pattern: pattern.clone(),
            marker: REDACTED.to_string(),
        }
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Replace every match with the marker
    ///
    /// Returns the input untouched and `false` when nothing matched. The
    /// replacement is repeated until the text is stable, so redacting the
    /// result again changes nothing.
    pub fn redact<'a>(&self, text: &'a str) -> (Cow<'a, str>, bool) {
        let mut current = match self.pattern.replace_all(text, NoExpand(&self.marker)) {
            Cow::Borrowed(_) => return (Cow::Borrowed(text), false),
            Cow::Owned(redacted) => redacted,
        };

        for _ in 1..MAX_PASSES {
            match self.pattern.replace_all(&current, NoExpand(&self.marker)) {
                Cow::Borrowed(_) => break,
                Cow::Owned(redacted) => current = redacted,
            }
        }
        (Cow::Owned(current), true)
    }
}

/// Key based redaction rule, field names compare case-insensitively
#[derive(Debug, Clone, Default)]
pub struct KeyRedactor {
    keys: HashSet<String>,
}

impl KeyRedactor {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keys: keys
                .into_iter()
                .map(|key| key.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        self.keys.contains(&key.to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// One redaction rule attached to a logger
#[derive(Debug, Clone)]
pub enum Redaction {
    Pattern(Redactor),
    Keys(KeyRedactor),
}

impl From<Redactor> for Redaction {
    fn from(redactor: Redactor) -> Self {
        Redaction::Pattern(redactor)
    }
}

impl From<KeyRedactor> for Redaction {
    fn from(redactor: KeyRedactor) -> Self {
        Redaction::Keys(redactor)
    }
}

/// Mask the values of the named keys at any depth
///
/// Unknown keys are ignored.
pub fn redact_keys(record: &Record, keys: &[&str]) -> Record {
    redact_record(record, &[Redaction::Keys(KeyRedactor::new(keys))])
}

/// Apply a list of redaction rules to a record
///
/// Lazy values are evaluated first so that what they produce is redacted too.
pub fn redact_record<'a, I>(record: &Record, rules: I) -> Record
where
    I: IntoIterator<Item = &'a Redaction>,
{
    let mut patterns = Vec::new();
    let mut keys = Vec::new();
    for rule in rules {
        match rule {
            Redaction::Pattern(redactor) => patterns.push(redactor),
            Redaction::Keys(redactor) => keys.push(redactor),
        }
    }

    let pipeline = Pipeline { patterns, keys };
    pipeline.record(record, 0)
}

struct Pipeline<'a> {
    patterns: Vec<&'a Redactor>,
    keys: Vec<&'a KeyRedactor>,
}

impl Pipeline<'_> {
    fn record(&self, record: &Record, depth: usize) -> Record {
        let mut redacted = Record::new();
        for (key, value) in record {
            let value = match value.resolve() {
                value if depth == 0 && ROUTING_FIELDS.contains(&key.as_str()) => value,
                Value::Redactable(value) => value.redact(),
                _ if self.keys.iter().any(|k| k.matches(key)) => Value::from(REDACTED),
                value => self.value(value, depth),
            };
            redacted.replace(key.clone(), value);
        }
        redacted
    }

    fn value(&self, value: Value, depth: usize) -> Value {
        if depth > MAX_DEPTH {
            return Value::from(REDACTED);
        }
        match value {
            Value::String(text) => Value::String(self.text(text)),
            Value::Record(record) => Value::Record(self.record(&record, depth + 1)),
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| match item.resolve() {
                        Value::Redactable(value) => value.redact(),
                        item => self.value(item, depth + 1),
                    })
                    .collect(),
            ),
            other => other,
        }
    }

    fn text(&self, mut text: String) -> String {
        for redactor in &self.patterns {
            let redacted = match redactor.redact(&text) {
                (Cow::Owned(redacted), true) => redacted,
                _ => continue,
            };
            text = redacted;
        }
        text
    }
}
