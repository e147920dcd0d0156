//! Topic/scope keys used to address level filtering rules

use std::fmt;

/// Wildcard that matches every topic or scope
pub const ANY: &str = "any";

/// Topic used when no logger in a chain sets one
pub const DEFAULT_TOPIC: &str = "main";

/// Scope used when no logger in a chain sets one
pub const DEFAULT_SCOPE: &str = "main";

/// A (topic, scope) pair, each either a concrete name or [`ANY`]
///
/// Empty strings and `"*"` normalize to [`ANY`], so `TopicScope::new("", "*")`
/// equals `TopicScope::new("any", "any")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicScope {
    topic: String,
    scope: String,
}

impl TopicScope {
    pub fn new(topic: impl AsRef<str>, scope: impl AsRef<str>) -> Self {
        Self {
            topic: normalize(topic.as_ref()),
            scope: normalize(scope.as_ref()),
        }
    }

    /// The catch-all `(any, any)` key
    pub fn any() -> Self {
        Self::new(ANY, ANY)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn is_default(&self) -> bool {
        self.topic == ANY && self.scope == ANY
    }

    /// True when this key covers the given topic and scope
    pub fn matches(&self, topic: &str, scope: &str) -> bool {
        (self.topic == ANY || self.topic == topic) && (self.scope == ANY || self.scope == scope)
    }

    /// Rank used to order matching keys, lower is more specific
    pub fn specificity(&self) -> u8 {
        match (self.topic == ANY, self.scope == ANY) {
            (false, false) => 0,
            (false, true) => 1,
            (true, false) => 2,
            (true, true) => 3,
        }
    }
}

impl Default for TopicScope {
    fn default() -> Self {
        Self::any()
    }
}

impl fmt::Display for TopicScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.topic, self.scope)
    }
}

fn normalize(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() || value == "*" {
        ANY.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcards_normalize_to_any() {
        assert_eq!(TopicScope::new("", "*"), TopicScope::any());
        assert_eq!(TopicScope::new("*", " ").topic(), ANY);
    }

    #[test]
    fn test_matches() {
        assert!(TopicScope::any().matches("auth", "login"));
        assert!(TopicScope::new("auth", ANY).matches("auth", "login"));
        assert!(!TopicScope::new("auth", ANY).matches("db", "login"));
        assert!(TopicScope::new(ANY, "login").matches("db", "login"));
        assert!(TopicScope::new("auth", "login").matches("auth", "login"));
        assert!(!TopicScope::new("auth", "login").matches("auth", "logout"));
    }

    #[test]
    fn test_specificity_order() {
        let exact = TopicScope::new("a", "b");
        let topic = TopicScope::new("a", ANY);
        let scope = TopicScope::new(ANY, "b");
        assert!(exact.specificity() < topic.specificity());
        assert!(topic.specificity() < scope.specificity());
        assert!(scope.specificity() < TopicScope::any().specificity());
    }
}
