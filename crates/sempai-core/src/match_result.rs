//! A single backend match, decoded and attributed to a pattern.
//!
//! A [`PatternMatch`] is what the backend reported for one dispatched
//! pattern at one place in one file: its span, its metavariable bindings,
//! and the [`CheckId`] that ties it back to a rule and leaf.  Its
//! [`Range`] is derived once at construction.

use std::collections::BTreeMap;

use crate::metavar::MetavarValue;
use crate::pattern_id::{CheckId, PatternId};
use crate::range::{Bindings, Range};
use crate::span::Span;

/// A backend match attributed to one leaf pattern.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use sempai_core::{CheckId, PatternId, PatternMatch, Position, Span};
///
/// let m = PatternMatch::new(
///     CheckId::new(0, PatternId::new("0")),
///     String::from("app.py"),
///     Span::new(Position::new(1, 1, 0), Position::new(1, 11, 10)),
///     BTreeMap::new(),
/// );
/// assert_eq!(m.rule_index(), 0);
/// assert_eq!(m.range().start(), 0);
/// assert_eq!(m.range().end(), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    check_id: CheckId,
    path: String,
    span: Span,
    metavars: BTreeMap<String, MetavarValue>,
    range: Range,
}

impl PatternMatch {
    /// Creates a match, deriving its range from the span and bindings.
    #[must_use]
    pub fn new(
        check_id: CheckId,
        path: String,
        span: Span,
        metavars: BTreeMap<String, MetavarValue>,
    ) -> Self {
        let bindings: Bindings = metavars
            .iter()
            .map(|(name, value)| (name.as_str(), value.identity()))
            .collect();
        let range = Range::new(span.start.offset, span.end.offset, bindings);
        Self {
            check_id,
            path,
            span,
            metavars,
            range,
        }
    }

    /// Returns the check id the backend echoed back.
    #[must_use]
    pub const fn check_id(&self) -> &CheckId {
        &self.check_id
    }

    /// Returns the index of the rule this match belongs to.
    #[must_use]
    pub const fn rule_index(&self) -> usize {
        self.check_id.rule_index()
    }

    /// Returns the leaf pattern this match belongs to.
    #[must_use]
    pub const fn pattern_id(&self) -> &PatternId {
        self.check_id.pattern_id()
    }

    /// Returns the path of the matched file.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the matched span.
    #[must_use]
    pub const fn span(&self) -> &Span {
        &self.span
    }

    /// Returns the metavariable bindings.
    #[must_use]
    pub const fn metavars(&self) -> &BTreeMap<String, MetavarValue> {
        &self.metavars
    }

    /// Returns the derived range.
    #[must_use]
    pub const fn range(&self) -> &Range {
        &self.range
    }

    /// Returns each metavariable's matched text, keyed by name.
    #[must_use]
    pub fn metavar_text(&self) -> BTreeMap<String, String> {
        self.metavars
            .iter()
            .map(|(name, value)| (name.clone(), value.text().to_owned()))
            .collect()
    }
}
