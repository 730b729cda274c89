//! Join-event classification and display name extraction.
//!
//! Classification and extraction are two separate passes over a line:
//!
//! 1. A line is a join event if *any* join pattern matches. Order is
//!    irrelevant here.
//! 2. Only for join events, extraction rules are tried in declared order and
//!    the first rule that matches supplies the display name.
//!
//! Coarse markers such as `OnPlayerJoined` identify a join in every VRChat
//! log format, but only some formats carry a name the rules can pull out. A
//! join without a recoverable name is still reported, as a nameless event.
//!
//! # Example
//!
//! ```
//! use joinwatch_monitor::classifier::Classifier;
//!
//! let classifier = Classifier::builtin().unwrap();
//! let event = classifier
//!     .classify(r#"[Behaviour] OnPlayerJoined displayName":"Bob""#)
//!     .unwrap();
//! assert_eq!(event.name.as_deref(), Some("Bob"));
//! ```

use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Markers that identify a player join line.
pub const JOIN_PATTERNS: &[&str] = &[r"OnPlayerJoined", r"\bplayer\s+joined\b"];

/// Display name extraction rules, highest priority first.
pub const EXTRACTION_RULES: &[&str] = &[
    r#"displayName"\s*:\s*"([^"]+)""#,
    r"OnPlayerJoined\s+(.+?)\s*\(usr_[0-9a-f-]+\)",
    r"OnPlayerJoined.*?\s([^\])}]+)$",
];

/// Characters stripped from both ends of a captured name.
const NAME_TRIM_CHARS: &[char] = &['[', ']', '{', '}', '(', ')', '<', '>', '"', '\'', ' '];

/// Errors raised while compiling patterns.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A line recognised as a player join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinEvent {
    /// Display name, if any extraction rule matched.
    pub name: Option<String>,
}

/// Compiled join patterns and extraction rules.
#[derive(Debug, Clone)]
pub struct Classifier {
    join_patterns: Vec<Regex>,
    extraction_rules: Vec<Regex>,
}

impl Classifier {
    /// Builds a classifier from the built-in VRChat patterns.
    pub fn builtin() -> Result<Self, ClassifierError> {
        Self::new(JOIN_PATTERNS, EXTRACTION_RULES)
    }

    /// Builds a classifier from explicit pattern lists.
    ///
    /// All patterns are compiled case-insensitively. Each extraction rule
    /// must have one capture group holding the name.
    pub fn new(join_patterns: &[&str], extraction_rules: &[&str]) -> Result<Self, ClassifierError> {
        Ok(Self {
            join_patterns: compile_patterns(join_patterns)?,
            extraction_rules: compile_patterns(extraction_rules)?,
        })
    }

    /// Returns `true` if the line matches any join pattern.
    pub fn is_join(&self, line: &str) -> bool {
        self.join_patterns.iter().any(|rx| rx.is_match(line))
    }

    /// Returns the name captured by the first matching extraction rule.
    pub fn extract_name(&self, line: &str) -> Option<String> {
        first_capture(&self.extraction_rules, line)
    }

    /// Classifies a line, returning `None` if it is not a join event.
    pub fn classify(&self, line: &str) -> Option<JoinEvent> {
        if !self.is_join(line) {
            return None;
        }
        Some(JoinEvent {
            name: self.extract_name(line),
        })
    }
}

/// Compiles patterns with the case-insensitive flag.
pub(crate) fn compile_patterns(patterns: &[&str]) -> Result<Vec<Regex>, ClassifierError> {
    patterns
        .iter()
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| ClassifierError::InvalidPattern {
                    pattern: (*pattern).to_string(),
                    source,
                })
        })
        .collect()
}

/// Tries `rules` in order against `haystack` and returns the first non-empty
/// trimmed capture.
pub(crate) fn first_capture(rules: &[Regex], haystack: &str) -> Option<String> {
    rules
        .iter()
        .find_map(|rx| {
            rx.captures(haystack)
                .and_then(|caps| caps.get(1))
                .map(|m| trim_name(m.as_str()))
        })
        .filter(|name| !name.is_empty())
}

/// Strips whitespace, brackets and quotes from both ends of a captured name.
pub fn trim_name(raw: &str) -> String {
    raw.trim().trim_matches(NAME_TRIM_CHARS).to_string()
}
