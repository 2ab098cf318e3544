//! The boolean expression tree a rule's pattern clauses describe.
//!
//! A [`BooleanExpression`] is either a leaf carrying one primitive pattern
//! or a group combining child expressions.  The constructors enforce the
//! shape invariant: leaf operators never have children and group
//! operators never carry a pattern.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pattern_id::PatternId;

/// Logical operator of an expression node.
///
/// # Example
///
/// ```
/// use sempai_core::Operator;
///
/// assert_eq!(Operator::from_key("pattern-not-inside"), Some(Operator::AndNotInside));
/// assert!(Operator::AndEither.has_children());
/// assert!(!Operator::Where.is_dispatched());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    /// The range must also match this pattern (`pattern`).
    And,
    /// The range must match a regular expression (`pattern-regex`).
    Regex,
    /// Conjunction of children (`patterns`).
    AndAll,
    /// Disjunction of children (`pattern-either`).
    AndEither,
    /// The range must not match this pattern (`pattern-not`).
    AndNot,
    /// The range must lie inside a match of this pattern (`pattern-inside`).
    AndInside,
    /// The range must not lie inside a match of this pattern
    /// (`pattern-not-inside`).
    AndNotInside,
    /// A side-predicate over the range's bindings (`pattern-where-python`).
    Where,
}

impl Operator {
    /// Every operator, in the order rule keys are documented.
    pub const ALL: [Self; 8] = [
        Self::And,
        Self::Regex,
        Self::AndAll,
        Self::AndEither,
        Self::AndNot,
        Self::AndInside,
        Self::AndNotInside,
        Self::Where,
    ];

    /// Operators allowed as the single pattern key at the top of a rule.
    pub const TOP_LEVEL: [Self; 4] = [Self::And, Self::Regex, Self::AndAll, Self::AndEither];

    /// Returns the rule key spelling this operator.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::And => "pattern",
            Self::Regex => "pattern-regex",
            Self::AndAll => "patterns",
            Self::AndEither => "pattern-either",
            Self::AndNot => "pattern-not",
            Self::AndInside => "pattern-inside",
            Self::AndNotInside => "pattern-not-inside",
            Self::Where => "pattern-where-python",
        }
    }

    /// Looks an operator up by its rule key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|operator| operator.key() == key)
    }

    /// Returns `true` for operators whose operand is a list of children.
    #[must_use]
    pub const fn has_children(self) -> bool {
        matches!(self, Self::AndAll | Self::AndEither)
    }

    /// Returns `true` for leaf operators whose operand goes to the backend.
    #[must_use]
    pub const fn is_dispatched(self) -> bool {
        !self.has_children() && !matches!(self, Self::Where)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::And => "AND",
            Self::Regex => "REGEX",
            Self::AndAll => "AND_ALL",
            Self::AndEither => "AND_EITHER",
            Self::AndNot => "AND_NOT",
            Self::AndInside => "AND_INSIDE",
            Self::AndNotInside => "AND_NOT_INSIDE",
            Self::Where => "WHERE",
        };
        f.write_str(name)
    }
}

/// Errors raised when an expression node is built with the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    /// A group operator was given a pattern operand.
    #[error("operator {0} requires a list of child patterns")]
    OperatorNeedsChildren(Operator),
    /// A leaf operator was given children.
    #[error("operator {0} takes a single pattern, not children")]
    OperatorTakesPattern(Operator),
}

/// A leaf node: one primitive pattern (or side-predicate source).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafExpression {
    operator: Operator,
    pattern_id: PatternId,
    operand: String,
}

impl LeafExpression {
    /// Returns the leaf operator.
    #[must_use]
    pub const fn operator(&self) -> Operator {
        self.operator
    }

    /// Returns the pattern id.
    #[must_use]
    pub const fn pattern_id(&self) -> &PatternId {
        &self.pattern_id
    }

    /// Returns the pattern source text.
    #[must_use]
    pub fn operand(&self) -> &str {
        &self.operand
    }
}

/// An internal node combining child expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupExpression {
    operator: Operator,
    children: Vec<BooleanExpression>,
}

impl GroupExpression {
    /// Returns the group operator.
    #[must_use]
    pub const fn operator(&self) -> Operator {
        self.operator
    }

    /// Returns the children in rule order.
    #[must_use]
    pub fn children(&self) -> &[BooleanExpression] {
        &self.children
    }
}

/// A node of a rule's boolean expression tree.
///
/// # Example
///
/// ```
/// use sempai_core::{BooleanExpression, Operator, PatternId};
///
/// let tree = BooleanExpression::group(
///     Operator::AndAll,
///     vec![
///         BooleanExpression::leaf(Operator::And, PatternId::new("0"), "eval(...)")?,
///         BooleanExpression::leaf(Operator::AndNot, PatternId::new("1"), "eval(\"1\")")?,
///     ],
/// )?;
/// assert_eq!(tree.operator(), Operator::AndAll);
/// assert_eq!(tree.leaves().count(), 2);
/// # Ok::<(), sempai_core::ExpressionError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BooleanExpression {
    /// A primitive pattern clause.
    Leaf(LeafExpression),
    /// A `patterns` or `pattern-either` clause.
    Group(GroupExpression),
}

impl BooleanExpression {
    /// Builds a leaf node.
    ///
    /// # Errors
    ///
    /// Returns [`ExpressionError::OperatorNeedsChildren`] when `operator`
    /// is a group operator.
    pub fn leaf(
        operator: Operator,
        pattern_id: PatternId,
        operand: impl Into<String>,
    ) -> Result<Self, ExpressionError> {
        if operator.has_children() {
            return Err(ExpressionError::OperatorNeedsChildren(operator));
        }
        Ok(Self::Leaf(LeafExpression {
            operator,
            pattern_id,
            operand: operand.into(),
        }))
    }

    /// Builds a group node.
    ///
    /// # Errors
    ///
    /// Returns [`ExpressionError::OperatorTakesPattern`] when `operator` is
    /// a leaf operator.
    pub fn group(
        operator: Operator,
        children: Vec<Self>,
    ) -> Result<Self, ExpressionError> {
        if !operator.has_children() {
            return Err(ExpressionError::OperatorTakesPattern(operator));
        }
        Ok(Self::Group(GroupExpression { operator, children }))
    }

    /// Returns the node's operator.
    #[must_use]
    pub const fn operator(&self) -> Operator {
        match self {
            Self::Leaf(leaf) => leaf.operator,
            Self::Group(group) => group.operator,
        }
    }

    /// Returns the pattern id of a leaf node.
    #[must_use]
    pub const fn pattern_id(&self) -> Option<&PatternId> {
        match self {
            Self::Leaf(leaf) => Some(&leaf.pattern_id),
            Self::Group(_) => None,
        }
    }

    /// Returns the pattern text of a leaf node.
    #[must_use]
    pub fn operand(&self) -> Option<&str> {
        match self {
            Self::Leaf(leaf) => Some(&leaf.operand),
            Self::Group(_) => None,
        }
    }

    /// Returns the children of a group node.
    #[must_use]
    pub fn children(&self) -> Option<&[Self]> {
        match self {
            Self::Leaf(_) => None,
            Self::Group(group) => Some(&group.children),
        }
    }

    /// Iterates over every leaf in depth-first rule order.
    pub fn leaves(&self) -> impl Iterator<Item = &LeafExpression> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            while let Some(node) = stack.pop() {
                match node {
                    Self::Leaf(leaf) => return Some(leaf),
                    Self::Group(group) => stack.extend(group.children.iter().rev()),
                }
            }
            None
        })
    }
}

impl fmt::Display for BooleanExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(leaf) => write!(f, "{}({})", leaf.operator, leaf.pattern_id),
            Self::Group(group) => {
                write!(f, "{}[", group.operator)?;
                for (position, child) in group.children.iter().enumerate() {
                    if position > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str("]")
            }
        }
    }
}
