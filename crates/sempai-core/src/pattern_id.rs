//! Identifiers joining dispatched patterns to backend results.
//!
//! A [`PatternId`] names one leaf pattern inside one rule.  Leaves nested
//! in `patterns` / `pattern-either` lists get a dot-separated path of
//! list positions (`"2.0"` is the first entry of the list at position 2).
//! A rule written as one bare `pattern` uses the rule id itself.
//!
//! The backend sees a [`CheckId`]: `"<rule_index>.<pattern_id>"`.  Rule
//! ids may themselves contain dots, so decoding splits on the first dot
//! only.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hierarchical identifier of one leaf pattern within a rule.
///
/// # Example
///
/// ```
/// use sempai_core::PatternId;
///
/// let group = PatternId::nested(None, 2);
/// let leaf = PatternId::nested(Some(&group), 0);
/// assert_eq!(leaf.as_str(), "2.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternId(String);

impl PatternId {
    /// Wraps an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Builds the identifier for list position `index` under `parent`.
    #[must_use]
    pub fn nested(parent: Option<&Self>, index: usize) -> Self {
        match parent {
            Some(parent) => Self(format!("{}.{index}", parent.0)),
            None => Self(index.to_string()),
        }
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PatternId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Errors raised when a backend `check_id` cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckIdError {
    /// The id has no `.` separating the rule index from the pattern id.
    #[error("check id '{0}' has no rule index separator")]
    MissingSeparator(String),
    /// The rule index prefix is not an unsigned integer.
    #[error("check id '{0}' does not start with a rule index")]
    InvalidRuleIndex(String),
    /// Nothing follows the rule index.
    #[error("check id '{0}' has an empty pattern id")]
    EmptyPatternId(String),
}

/// The id a dispatched pattern carries through the backend.
///
/// # Example
///
/// ```
/// use sempai_core::CheckId;
///
/// let id: CheckId = "3.rules.no-eval".parse().expect("valid check id");
/// assert_eq!(id.rule_index(), 3);
/// assert_eq!(id.pattern_id().as_str(), "rules.no-eval");
/// assert_eq!(id.to_string(), "3.rules.no-eval");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CheckId {
    rule_index: usize,
    pattern_id: PatternId,
}

impl CheckId {
    /// Creates a check id.
    #[must_use]
    pub const fn new(rule_index: usize, pattern_id: PatternId) -> Self {
        Self {
            rule_index,
            pattern_id,
        }
    }

    /// Returns the index of the rule in the dispatched rule list.
    #[must_use]
    pub const fn rule_index(&self) -> usize {
        self.rule_index
    }

    /// Returns the pattern id within that rule.
    #[must_use]
    pub const fn pattern_id(&self) -> &PatternId {
        &self.pattern_id
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.rule_index, self.pattern_id)
    }
}

impl FromStr for CheckId {
    type Err = CheckIdError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (index, pattern) = input
            .split_once('.')
            .ok_or_else(|| CheckIdError::MissingSeparator(input.to_owned()))?;
        let rule_index = index
            .parse::<usize>()
            .map_err(|_| CheckIdError::InvalidRuleIndex(input.to_owned()))?;
        if pattern.is_empty() {
            return Err(CheckIdError::EmptyPatternId(input.to_owned()));
        }
        Ok(Self::new(rule_index, PatternId::new(pattern)))
    }
}

impl Serialize for CheckId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CheckId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
