//! Per-file, per-rule index of backend matches keyed by pattern id.

use std::collections::BTreeMap;

use crate::match_result::PatternMatch;
use crate::pattern_id::PatternId;
use crate::range::{Range, RangeSet};

/// Backend matches for one rule in one file, grouped by leaf pattern.
///
/// Matches keep the order the backend reported them in.  The index is
/// built once and is read-only while an expression is evaluated.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use sempai_core::{CheckId, MatchIndex, PatternId, PatternMatch, Position, Span};
///
/// let span = Span::new(Position::new(1, 1, 0), Position::new(1, 5, 4));
/// let m = PatternMatch::new(
///     CheckId::new(0, PatternId::new("0")),
///     String::from("a.py"),
///     span,
///     BTreeMap::new(),
/// );
/// let index = MatchIndex::from_matches([m]);
/// assert_eq!(index.ranges_for(&PatternId::new("0")).count(), 1);
/// assert_eq!(index.ranges_for(&PatternId::new("1")).count(), 0);
/// assert_eq!(index.universe().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchIndex {
    by_pattern: BTreeMap<PatternId, Vec<PatternMatch>>,
}

impl MatchIndex {
    /// Creates an empty index.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            by_pattern: BTreeMap::new(),
        }
    }

    /// Builds an index from matches in backend order.
    #[must_use]
    pub fn from_matches(matches: impl IntoIterator<Item = PatternMatch>) -> Self {
        let mut index = Self::new();
        for pattern_match in matches {
            index.insert(pattern_match);
        }
        index
    }

    /// Appends a match under its pattern id.
    pub fn insert(&mut self, pattern_match: PatternMatch) {
        self.by_pattern
            .entry(pattern_match.pattern_id().clone())
            .or_default()
            .push(pattern_match);
    }

    /// Returns the matches recorded for `pattern_id`.
    #[must_use]
    pub fn matches_for(&self, pattern_id: &PatternId) -> &[PatternMatch] {
        self.by_pattern
            .get(pattern_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterates over the ranges recorded for `pattern_id`.
    pub fn ranges_for(&self, pattern_id: &PatternId) -> impl Iterator<Item = &Range> {
        self.matches_for(pattern_id).iter().map(PatternMatch::range)
    }

    /// Iterates over every match under every pattern id.
    pub fn iter(&self) -> impl Iterator<Item = &PatternMatch> {
        self.by_pattern.values().flatten()
    }

    /// Returns every range this file produced for this rule.
    #[must_use]
    pub fn universe(&self) -> RangeSet {
        self.iter().map(|m| m.range().clone()).collect()
    }

    /// Returns the number of matches in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_pattern.values().map(Vec::len).sum()
    }

    /// Returns `true` when the index holds no matches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_pattern.is_empty()
    }
}
