//! Builders for backend matches used by tests across the workspace.
//!
//! Enabled for this crate's own tests and, through the `test-support`
//! feature, for dependants' dev-builds.

use std::collections::BTreeMap;

use crate::metavar::MetavarValue;
use crate::pattern_id::{CheckId, PatternId};
use crate::match_result::PatternMatch;
use crate::span::{Position, Span};

/// Fluent builder for a [`PatternMatch`].
///
/// Defaults to rule index 0, path `target.py`, and a single-line span
/// whose columns mirror the offsets.
#[derive(Debug, Clone)]
pub struct MatchBuilder {
    rule_index: usize,
    pattern_id: PatternId,
    path: String,
    start: u32,
    end: u32,
    lines: (u32, u32),
    metavars: BTreeMap<String, MetavarValue>,
}

impl MatchBuilder {
    /// Starts a match for `pattern_id` covering `start..end`.
    #[must_use]
    pub fn new(pattern_id: &str, start: u32, end: u32) -> Self {
        Self {
            rule_index: 0,
            pattern_id: PatternId::new(pattern_id),
            path: String::from("target.py"),
            start,
            end,
            lines: (1, 1),
            metavars: BTreeMap::new(),
        }
    }

    /// Sets the rule index.
    #[must_use]
    pub const fn rule_index(mut self, rule_index: usize) -> Self {
        self.rule_index = rule_index;
        self
    }

    /// Sets the file path.
    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        path.clone_into(&mut self.path);
        self
    }

    /// Sets the start and end lines.
    #[must_use]
    pub const fn lines(mut self, start_line: u32, end_line: u32) -> Self {
        self.lines = (start_line, end_line);
        self
    }

    /// Binds `name` to `text` with no backend identity.
    #[must_use]
    pub fn metavar(mut self, name: &str, text: &str) -> Self {
        self.metavars
            .insert(name.to_owned(), MetavarValue::from_text(text));
        self
    }

    /// Binds `name` to `text` resolved to symbol `sid`.
    #[must_use]
    pub fn symbol(mut self, name: &str, text: &str, sid: i64) -> Self {
        self.metavars
            .insert(name.to_owned(), MetavarValue::with_symbol(text, sid));
        self
    }

    /// Builds the match.
    #[must_use]
    pub fn build(self) -> PatternMatch {
        let (start_line, end_line) = self.lines;
        let span = Span::new(
            Position::new(start_line, self.start.saturating_add(1), self.start),
            Position::new(end_line, self.end.saturating_add(1), self.end),
        );
        PatternMatch::new(
            CheckId::new(self.rule_index, self.pattern_id),
            self.path,
            span,
            self.metavars,
        )
    }
}
