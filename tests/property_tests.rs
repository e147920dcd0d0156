//! Property-based tests for chainlog using proptest

use chainlog::core::REDACTED;
use chainlog::prelude::*;
use proptest::prelude::*;

const NAMES: &[&str] = &["any", "auth", "db", "login", "pool"];

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Never),
        Just(LogLevel::Unset),
        Just(LogLevel::Trace),
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
        Just(LogLevel::Fatal),
        Just(LogLevel::Always),
    ]
}

fn name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(NAMES)
}

fn rules() -> impl Strategy<Value = Vec<(LogLevel, &'static str, &'static str)>> {
    prop::collection::vec((any_level(), name(), name()), 1..8)
}

fn build(rules: &[(LogLevel, &str, &str)]) -> LevelSet {
    let levels = LevelSet::new();
    for (level, topic, scope) in rules {
        levels.set(*level, topic, scope);
    }
    levels
}

/// Exhaustive search over every stored rule, most specific match first
fn exhaustive_get(levels: &LevelSet, topic: &str, scope: &str) -> LogLevel {
    levels
        .rules()
        .into_iter()
        .filter(|(key, _)| key.matches(topic, scope))
        .min_by_key(|(key, _)| key.specificity())
        .map_or(LogLevel::Unset, |(_, level)| level)
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Test the writability formula for every level/filter pair
    #[test]
    fn test_should_write_formula(level in any_level(), filter in any_level()) {
        let expected = !matches!(level, LogLevel::Never | LogLevel::Unset)
            && (filter == LogLevel::Always
                || filter == LogLevel::Unset
                || (filter != LogLevel::Never && level >= filter));
        prop_assert_eq!(level.should_write(filter), expected);
        prop_assert!(!LogLevel::Never.should_write(filter));
    }

    /// Test that level names round-trip case-insensitively
    #[test]
    fn test_level_name_roundtrip(level in any_level(), lower in any::<bool>()) {
        let name = if lower { level.to_str().to_lowercase() } else { level.to_string() };
        prop_assert_eq!(LogLevel::from_name(&name), level);
    }

    /// Test that next/previous stay within the domain and are monotonic
    #[test]
    fn test_next_previous_monotonic(level in any_level()) {
        prop_assert!(level.next() >= level);
        prop_assert!(level.previous() <= level);
        prop_assert_eq!(LogLevel::Always.next(), LogLevel::Always);
        prop_assert_eq!(LogLevel::Never.previous(), LogLevel::Never);
    }
}

// ============================================================================
// LevelSet Tests
// ============================================================================

proptest! {
    /// Test the four step lookup against exhaustive matching
    #[test]
    fn test_get_matches_exhaustive_search(
        rules in rules(),
        topic in name(),
        scope in name(),
    ) {
        let levels = build(&rules);
        prop_assert_eq!(levels.get(topic, scope), exhaustive_get(&levels, topic, scope));
    }

    /// Test that printing and parsing again keeps every lookup
    #[test]
    fn test_parse_display_roundtrip(
        rules in rules(),
        topic in name(),
        scope in name(),
    ) {
        let levels = build(&rules);
        let reparsed = LevelSet::parse(&levels.to_string());
        prop_assert_eq!(reparsed.get(topic, scope), levels.get(topic, scope));
        prop_assert_eq!(&reparsed, &levels);
    }

    /// Test that should_write is consistent with get
    #[test]
    fn test_level_set_should_write(
        rules in rules(),
        level in any_level(),
        topic in name(),
        scope in name(),
    ) {
        let levels = build(&rules);
        prop_assert_eq!(
            levels.should_write(level, topic, scope),
            level.should_write(levels.get(topic, scope))
        );
    }
}

// ============================================================================
// Record Tests
// ============================================================================

fn fields() -> impl Strategy<Value = Vec<(String, i64)>> {
    prop::collection::vec(("[a-e]", any::<i64>()), 0..6)
}

proptest! {
    /// Test that a second set of the same key is a no-op
    #[test]
    fn test_set_first_writer_wins(key in "[a-z]{1,8}", v1 in any::<i64>(), v2 in ".*") {
        let once = Record::new().with_field(key.as_str(), v1);
        let twice = once.clone().with_field(key.as_str(), v2);
        prop_assert_eq!(once, twice);
    }

    /// Test that merge keeps receiver values and adds missing keys
    #[test]
    fn test_merge_precedence(a in fields(), b in fields()) {
        let receiver: Record = a.into_iter().collect();
        let source: Record = b.into_iter().collect();

        let mut merged = receiver.clone();
        merged.merge(&source);

        for (key, value) in &receiver {
            prop_assert_eq!(merged.get(key), Some(value));
        }
        for (key, value) in &source {
            if !receiver.contains_key(key) {
                prop_assert_eq!(merged.get(key), Some(value));
            }
        }
        prop_assert!(merged.len() <= receiver.len() + source.len());
    }

    /// Test that serialization never fails, whatever the float
    #[test]
    fn test_serialization_is_total(f in any::<f64>(), s in ".*") {
        let record = Record::new()
            .with_field("f", f)
            .with_field("s", s)
            .with_field("nested", Record::new().with_field("g", f));
        let line = record.to_json_string();
        prop_assert!(serde_json::from_str::<serde_json::Value>(&line).is_ok());
    }
}

// ============================================================================
// Redaction Tests
// ============================================================================

proptest! {
    /// Test that every shipped redactor is idempotent
    #[test]
    fn test_redaction_idempotent(text in "[0-9a-zA-Z @.+()-]{0,60}") {
        for redactor in [Redactor::credit_card(), Redactor::email(), Redactor::phone()] {
            let once = redactor.redact(&text).0.into_owned();
            let twice = redactor.redact(&once).0.into_owned();
            prop_assert_eq!(&once, &twice);
            prop_assert!(!redactor.redact(REDACTED).1);
        }
    }

    /// Test that key redaction leaves other keys untouched
    #[test]
    fn test_redact_keys_only_touches_named_keys(a in fields()) {
        let record: Record = a.into_iter().collect();
        let redacted = chainlog::core::redact_keys(&record, &["a"]);

        for (key, value) in &record {
            if key == "a" {
                let redacted_value = redacted.get_str(key);
                prop_assert_eq!(redacted_value.as_deref(), Some(REDACTED));
            } else {
                prop_assert_eq!(redacted.get(key), Some(value));
            }
        }
        prop_assert_eq!(redacted.len(), record.len());
    }
}
