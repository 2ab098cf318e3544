//! Matched intervals with metavariable bindings.
//!
//! [`Range`] is the value the evaluator does set algebra over.  Two ranges
//! are equal only when their offsets *and* bindings agree: the same text
//! matched with `$X` bound to two different definitions is two distinct
//! ranges.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// A comparable identity for the entity a metavariable is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BindingIdentity {
    /// A resolved symbol.
    Symbol(i64),
    /// A structural digest of an expression.
    Digest(String),
    /// Raw matched text, used when the backend reports no identity.
    Text(String),
}

/// Metavariable name to identity mapping carried by a [`Range`].
///
/// # Example
///
/// ```
/// use sempai_core::{BindingIdentity, Bindings};
///
/// let bindings = Bindings::from_iter([("$X", BindingIdentity::Symbol(1))]);
/// assert_eq!(bindings.get("$X"), Some(&BindingIdentity::Symbol(1)));
/// assert_eq!(bindings.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bindings(BTreeMap<String, BindingIdentity>);

impl Bindings {
    /// Creates an empty binding map.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Binds `name` to `identity`, replacing any earlier binding.
    pub fn insert(&mut self, name: impl Into<String>, identity: BindingIdentity) {
        self.0.insert(name.into(), identity);
    }

    /// Returns the identity bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BindingIdentity> {
        self.0.get(name)
    }

    /// Returns the number of bound metavariables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BindingIdentity)> {
        self.0.iter().map(|(name, identity)| (name.as_str(), identity))
    }
}

impl<K: Into<String>> FromIterator<(K, BindingIdentity)> for Bindings {
    fn from_iter<T: IntoIterator<Item = (K, BindingIdentity)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, identity)| (name.into(), identity))
                .collect(),
        )
    }
}

/// A matched span of source code plus its metavariable bindings.
///
/// Offsets are byte offsets; `end` is exclusive.  Ranges are immutable
/// values: hashing, ordering, and equality all cover
/// `(start, end, bindings)`.
///
/// # Example
///
/// ```
/// use sempai_core::Range;
///
/// let outer = Range::unbound(0, 20);
/// let inner = Range::unbound(5, 15);
/// assert!(outer.is_enclosing_or_eq(&inner));
/// assert!(inner.is_enclosing_or_eq(&inner));
/// assert!(!inner.is_enclosing_or_eq(&outer));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Range {
    start: u32,
    end: u32,
    bindings: Bindings,
}

impl Range {
    /// Creates a range with bindings.
    #[must_use]
    pub const fn new(start: u32, end: u32, bindings: Bindings) -> Self {
        Self {
            start,
            end,
            bindings,
        }
    }

    /// Creates a range with no bindings.
    #[must_use]
    pub const fn unbound(start: u32, end: u32) -> Self {
        Self::new(start, end, Bindings::new())
    }

    /// Returns the inclusive start offset.
    #[must_use]
    pub const fn start(&self) -> u32 {
        self.start
    }

    /// Returns the exclusive end offset.
    #[must_use]
    pub const fn end(&self) -> u32 {
        self.end
    }

    /// Returns the metavariable bindings.
    #[must_use]
    pub const fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Returns `true` when `self` covers `other`, equality included.
    ///
    /// Only offsets are compared; bindings play no part in containment.
    #[must_use]
    pub const fn is_enclosing_or_eq(&self, other: &Self) -> bool {
        self.start <= other.start && self.end >= other.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)?;
        if !self.bindings.is_empty() {
            let names: Vec<&str> = self.bindings.iter().map(|(name, _)| name).collect();
            write!(f, " [{}]", names.join(", "))?;
        }
        Ok(())
    }
}

/// The order-independent set of ranges produced by evaluation.
pub type RangeSet = BTreeSet<Range>;
