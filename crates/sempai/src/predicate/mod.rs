//! The side-predicate capability behind `pattern-where-python` clauses.
//!
//! The evaluator never runs a predicate itself; it asks the
//! [`SidePredicate`] it was constructed with.  [`DenySidePredicates`]
//! refuses every predicate, so a rule that uses one fails the run.
//! [`ExpressionPredicates`] runs a small, side-effect-free expression
//! language over the match's bindings:
//!
//! - literals: `'text'`, `"text"`, integers, `True`, `False`, `None`
//! - names: `vars` is the binding map; any other name resolves to the
//!   binding of that name, or of `$name`
//! - `vars['$X']`, `x == 'foo'`, `!=`, `<`, `<=`, `>`, `>=`, `in`, `not in`
//! - `and`, `or`, `not`, parentheses
//! - `len()`, `int()`, `str()`, `bool()`, and the string methods
//!   `startswith`, `endswith`, `lower`, `upper`, `strip`, `isdigit`
//!
//! A predicate must produce a boolean; anything else is an error, as is
//! nesting deeper than 32 levels.

mod interpreter;
mod parser;

use std::collections::BTreeMap;

use crate::error::PredicateError;

use self::interpreter::Value;

/// Decides side-predicates over a match's metavariable bindings.
///
/// `bindings` maps metavariable names (such as `$X`) to the text they
/// matched and is read-only.
pub trait SidePredicate {
    /// Fails unless this capability may run predicates at all.
    ///
    /// Called once per `WHERE` clause before any match is considered, so
    /// a disabled capability fails even when there is nothing to filter.
    ///
    /// # Errors
    ///
    /// Returns [`PredicateError::NotEnabled`] when predicates are refused.
    fn ensure_enabled(&self, expression: &str) -> Result<(), PredicateError>;

    /// Evaluates `expression` against one match's bindings.
    ///
    /// # Errors
    ///
    /// Returns a [`PredicateError`] when predicates are refused, the
    /// expression fails, or it yields a non-boolean.
    fn evaluate(
        &self,
        expression: &str,
        bindings: &BTreeMap<String, String>,
    ) -> Result<bool, PredicateError>;
}

/// Refuses every side-predicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DenySidePredicates;

impl SidePredicate for DenySidePredicates {
    fn ensure_enabled(&self, expression: &str) -> Result<(), PredicateError> {
        Err(PredicateError::NotEnabled {
            expression: expression.to_owned(),
        })
    }

    fn evaluate(
        &self,
        expression: &str,
        _bindings: &BTreeMap<String, String>,
    ) -> Result<bool, PredicateError> {
        self.ensure_enabled(expression).map(|()| false)
    }
}

/// Runs side-predicates written in the restricted expression language.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
///
/// use sempai::predicate::{ExpressionPredicates, SidePredicate};
///
/// let bindings = BTreeMap::from([(String::from("$X"), String::from("foo"))]);
/// let predicates = ExpressionPredicates;
/// assert_eq!(predicates.evaluate("vars['$X'] == 'foo'", &bindings), Ok(true));
/// assert_eq!(predicates.evaluate("X.startswith('b')", &bindings), Ok(false));
/// assert!(predicates.evaluate("vars['$X']", &bindings).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpressionPredicates;

impl SidePredicate for ExpressionPredicates {
    fn ensure_enabled(&self, _expression: &str) -> Result<(), PredicateError> {
        Ok(())
    }

    fn evaluate(
        &self,
        expression: &str,
        bindings: &BTreeMap<String, String>,
    ) -> Result<bool, PredicateError> {
        let raised = |message: String| PredicateError::Raised {
            expression: expression.to_owned(),
            message,
        };
        let parsed = parser::parse(expression).map_err(raised)?;
        match interpreter::evaluate(&parsed, bindings).map_err(raised)? {
            Value::Bool(result) => Ok(result),
            other => Err(PredicateError::NotBoolean {
                expression: expression.to_owned(),
                found: other.type_name().to_owned(),
            }),
        }
    }
}
