//! Topic/scope level filtering rules
//!
//! A [`LevelSet`] maps `(topic, scope)` keys to the minimum level written for
//! them. Lookups fall back from the most specific rule to the least:
//! `(topic, scope)`, `(topic, any)`, `(any, scope)`, `(any, any)`.
//!
//! # Pattern language
//!
//! A level set can be configured from one string made of `;`-separated clauses:
//!
//! ```text
//! INFO                       default rule
//! DEBUG:{auth}               every scope of topic "auth"
//! TRACE:{auth:login,logout}  scopes "login" and "logout" of topic "auth"
//! WARN:{:cache}              scope "cache" of every topic
//! ```
//!
//! ```
//! use chainlog::core::{LevelSet, LogLevel};
//!
//! let levels = LevelSet::parse("INFO;DEBUG:{auth:login}");
//! assert!(levels.should_write(LogLevel::Debug, "auth", "login"));
//! assert!(!levels.should_write(LogLevel::Debug, "auth", "logout"));
//! ```

use super::log_level::LogLevel;
use super::topic_scope::{TopicScope, ANY};
use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

type Rules = HashMap<String, HashMap<String, LogLevel>>;

/// Thread-safe table of level filtering rules
///
/// Reads never block each other; `set` takes an exclusive lock.
#[derive(Debug, Default)]
pub struct LevelSet {
    rules: RwLock<Rules>,
}

impl LevelSet {
    /// Create an empty level set, every lookup yields [`LogLevel::Unset`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a level set holding only a default rule
    pub fn with_default(level: LogLevel) -> Self {
        let levels = Self::new();
        levels.set_default(level);
        levels
    }

    /// Parse a level set from the pattern language
    ///
    /// An empty pattern yields a single `INFO` default rule. Unknown level
    /// names yield `NEVER` rules.
    pub fn parse(text: &str) -> Self {
        let levels = Self::new();
        if text.trim().is_empty() {
            levels.set_default(LogLevel::Info);
            return levels;
        }

        for clause in text.split(';').map(str::trim).filter(|c| !c.is_empty()) {
            let Some((name, target)) = clause.split_once(':') else {
                levels.set_default(LogLevel::from_name(clause));
                continue;
            };

            let level = LogLevel::from_name(name);
            let target = target.trim();
            let target = target.strip_prefix('{').unwrap_or(target);
            let target = target.strip_suffix('}').unwrap_or(target);

            match target.split_once(':') {
                Some((topic, scopes)) if !scopes.trim().is_empty() => {
                    for scope in scopes.split(',') {
                        levels.set(level, topic, scope);
                    }
                }
                Some((topic, _)) => levels.set(level, topic, ANY),
                None => levels.set(level, target, ANY),
            }
        }
        levels
    }

    /// Add or replace the rule for one topic/scope pair
    pub fn set(&self, level: LogLevel, topic: &str, scope: &str) {
        let key = TopicScope::new(topic, scope);
        self.rules
            .write()
            .entry(key.topic().to_string())
            .or_default()
            .insert(key.scope().to_string(), level);
    }

    pub fn set_default(&self, level: LogLevel) {
        self.set(level, ANY, ANY);
    }

    /// Resolve the filter level for a topic/scope pair
    pub fn get(&self, topic: &str, scope: &str) -> LogLevel {
        let topic = normalized(topic);
        let scope = normalized(scope);
        let rules = self.rules.read();

        [(topic, scope), (topic, ANY), (ANY, scope), (ANY, ANY)]
            .iter()
            .find_map(|(t, s)| rules.get(*t).and_then(|scopes| scopes.get(*s)).copied())
            .unwrap_or(LogLevel::Unset)
    }

    pub fn get_default(&self) -> LogLevel {
        self.get(ANY, ANY)
    }

    pub fn should_write(&self, level: LogLevel, topic: &str, scope: &str) -> bool {
        level.should_write(self.get(topic, scope))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.read().values().all(HashMap::is_empty)
    }

    /// Snapshot of every rule, sorted by key
    pub fn rules(&self) -> Vec<(TopicScope, LogLevel)> {
        let mut rules: Vec<_> = self
            .rules
            .read()
            .iter()
            .flat_map(|(topic, scopes)| {
                scopes
                    .iter()
                    .map(move |(scope, level)| (TopicScope::new(topic, scope), *level))
            })
            .collect();
        rules.sort();
        rules
    }
}

fn normalized(value: &str) -> &str {
    let value = value.trim();
    if value.is_empty() || value == "*" {
        ANY
    } else {
        value
    }
}

impl Clone for LevelSet {
    fn clone(&self) -> Self {
        Self {
            rules: RwLock::new(self.rules.read().clone()),
        }
    }
}

impl PartialEq for LevelSet {
    fn eq(&self, other: &Self) -> bool {
        self.rules() == other.rules()
    }
}

impl fmt::Display for LevelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clauses: Vec<String> = self
            .rules()
            .into_iter()
            .map(|(key, level)| match (key.topic() == ANY, key.scope() == ANY) {
                (true, true) => level.to_string(),
                (false, true) => format!("{}:{{{}}}", level, key.topic()),
                (true, false) => format!("{}:{{:{}}}", level, key.scope()),
                (false, false) => format!("{}:{{{}:{}}}", level, key.topic(), key.scope()),
            })
            .collect();
        write!(f, "{}", clauses.join(";"))
    }
}

impl From<&str> for LevelSet {
    fn from(text: &str) -> Self {
        LevelSet::parse(text)
    }
}

impl Serialize for LevelSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for LevelSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(LevelSet::parse(&text))
    }
}
