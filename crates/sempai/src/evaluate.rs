//! Recombines per-pattern matches into the ranges a whole rule matches.
//!
//! Evaluation starts from the universe of every range the file produced
//! for the rule, under any pattern, and narrows it operator by operator:
//!
//! | Operator | Result |
//! |---|---|
//! | `AND`, `REGEX` | candidates also matched by the pattern |
//! | `AND_NOT` | candidates not matched by the pattern |
//! | `AND_INSIDE` | candidates enclosed by some match of the pattern |
//! | `AND_NOT_INSIDE` | candidates enclosed by no match of the pattern |
//! | `WHERE` | candidates whose match satisfies the side-predicate |
//! | `AND_ALL` | intersection of every child's result |
//! | `AND_EITHER` | union of the children's results, within the candidates |
//!
//! Enclosure is inclusive and ignores bindings; every other comparison is
//! on the whole range, bindings included.

use tracing::debug;

use sempai_core::{BooleanExpression, MatchIndex, Operator, RangeSet};

use crate::error::{EngineError, InternalError};
use crate::predicate::SidePredicate;

/// Tracing target for evaluation.
const EVALUATE_TARGET: &str = "sempai::evaluate";

/// Evaluates expression trees against match indexes.
///
/// The evaluator holds no state between calls beyond its side-predicate
/// capability; one evaluator may serve any number of (rule, file) pairs.
///
/// # Example
///
/// ```
/// use sempai::evaluate::Evaluator;
/// use sempai::predicate::DenySidePredicates;
/// use sempai_core::test_support::MatchBuilder;
/// use sempai_core::{BooleanExpression, MatchIndex, Operator, PatternId, Range};
///
/// let index = MatchIndex::from_matches([
///     MatchBuilder::new("0", 0, 10).build(),
///     MatchBuilder::new("1", 20, 30).build(),
/// ]);
/// let expr = BooleanExpression::leaf(Operator::And, PatternId::new("0"), "f()")?;
/// let evaluator = Evaluator::new(&DenySidePredicates);
/// let ranges = evaluator.evaluate(&expr, &index)?;
/// assert_eq!(ranges, [Range::unbound(0, 10)].into());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Evaluator<'p> {
    predicates: &'p dyn SidePredicate,
}

impl<'p> Evaluator<'p> {
    /// Creates an evaluator using `predicates` for `WHERE` clauses.
    #[must_use]
    pub const fn new(predicates: &'p dyn SidePredicate) -> Self {
        Self { predicates }
    }

    /// Returns the ranges that satisfy `expression`, starting from every
    /// range in `index`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Internal`] for a node whose operator does
    /// not fit its shape, and [`EngineError::Predicate`] when a `WHERE`
    /// clause cannot run or misbehaves.
    pub fn evaluate(
        &self,
        expression: &BooleanExpression,
        index: &MatchIndex,
    ) -> Result<RangeSet, EngineError> {
        self.evaluate_within(expression, index, &index.universe())
    }

    /// Returns the subset of `ranges_left` that satisfies `expression`.
    ///
    /// # Errors
    ///
    /// As for [`Evaluator::evaluate`].
    pub fn evaluate_within(
        &self,
        expression: &BooleanExpression,
        index: &MatchIndex,
        ranges_left: &RangeSet,
    ) -> Result<RangeSet, EngineError> {
        let result = match expression {
            BooleanExpression::Leaf(leaf) => {
                let results = || index.ranges_for(leaf.pattern_id());
                match leaf.operator() {
                    Operator::And | Operator::Regex => {
                        let matched: RangeSet = results().cloned().collect();
                        ranges_left.intersection(&matched).cloned().collect()
                    }
                    Operator::AndNot => {
                        let matched: RangeSet = results().cloned().collect();
                        ranges_left.difference(&matched).cloned().collect()
                    }
                    Operator::AndInside => ranges_left
                        .iter()
                        .filter(|candidate| results().any(|outer| outer.is_enclosing_or_eq(candidate)))
                        .cloned()
                        .collect(),
                    Operator::AndNotInside => ranges_left
                        .iter()
                        .filter(|candidate| !results().any(|outer| outer.is_enclosing_or_eq(candidate)))
                        .cloned()
                        .collect(),
                    Operator::Where => self.where_clause(leaf.operand(), index, ranges_left)?,
                    operator @ (Operator::AndAll | Operator::AndEither) => {
                        return Err(InternalError::MalformedTree {
                            shape: "leaf",
                            operator,
                        }
                        .into());
                    }
                }
            }
            BooleanExpression::Group(group) => match group.operator() {
                Operator::AndAll => {
                    let mut narrowed = ranges_left.clone();
                    for child in group.children() {
                        let child_ranges = self.evaluate_within(child, index, &narrowed)?;
                        narrowed.retain(|range| child_ranges.contains(range));
                    }
                    narrowed
                }
                Operator::AndEither => {
                    let mut union = RangeSet::new();
                    for child in group.children() {
                        union.extend(self.evaluate_within(child, index, ranges_left)?);
                    }
                    union.retain(|range| ranges_left.contains(range));
                    union
                }
                operator => {
                    return Err(InternalError::MalformedTree {
                        shape: "group",
                        operator,
                    }
                    .into());
                }
            },
        };
        debug!(
            target: EVALUATE_TARGET,
            operator = %expression.operator(),
            before = ranges_left.len(),
            after = result.len(),
            "evaluated node"
        );
        Ok(result)
    }

    /// Keeps each candidate whose match satisfies the predicate.
    ///
    /// Every match in the index is considered, not only those of one
    /// pattern, since a `WHERE` clause has no pattern of its own.
    fn where_clause(
        &self,
        expression: &str,
        index: &MatchIndex,
        ranges_left: &RangeSet,
    ) -> Result<RangeSet, EngineError> {
        self.predicates.ensure_enabled(expression)?;
        let mut kept = RangeSet::new();
        for candidate in index.iter() {
            if !ranges_left.contains(candidate.range()) || kept.contains(candidate.range()) {
                continue;
            }
            if self.predicates.evaluate(expression, &candidate.metavar_text())? {
                kept.insert(candidate.range().clone());
            }
        }
        Ok(kept)
    }
}
