//! Builds a rule's [`BooleanExpression`] from its pattern clauses.
//!
//! Leaves nested in `patterns` / `pattern-either` lists are named by their
//! list position under their parent's id, so `"1.0"` is the first clause of
//! the list found at position 1.  A rule written as one bare `pattern` or
//! `pattern-regex` becomes a single leaf named after the rule itself.

use serde_json::{Map, Value};

use sempai_core::{
    BooleanExpression, Diagnostic, DiagnosticCode, ExpressionError, Operator, PatternId,
};

use crate::rule::kind_of;

/// Parses the top-level pattern key of a rule mapping.
///
/// Exactly one of `pattern`, `pattern-regex`, `patterns` and
/// `pattern-either` must be present.
///
/// # Errors
///
/// Returns a diagnostic when no (or more than one) top-level pattern key
/// is present, an operand is not a string, a child list is malformed, or a
/// clause key is not a recognised operator.
///
/// # Example
///
/// ```
/// use sempai_core::Operator;
/// use sempai_yaml::parse_expression;
///
/// let rule = serde_json::json!({
///     "patterns": [{"pattern": "eval(...)"}, {"pattern-not": "eval('safe')"}]
/// });
/// let map = rule.as_object().expect("mapping");
/// let expr = parse_expression(map, "no-eval").expect("valid clauses");
/// assert_eq!(expr.operator(), Operator::AndAll);
/// assert_eq!(expr.to_string(), "AND_ALL[AND(0), AND_NOT(1)]");
/// ```
pub fn parse_expression(
    raw: &Map<String, Value>,
    rule_id: &str,
) -> Result<BooleanExpression, Diagnostic> {
    let present: Vec<Operator> = Operator::TOP_LEVEL
        .into_iter()
        .filter(|operator| raw.contains_key(operator.key()))
        .collect();
    let top_level_keys = || {
        Operator::TOP_LEVEL
            .iter()
            .map(|operator| operator.key())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let operator = match present.as_slice() {
        [operator] => *operator,
        [] => {
            return Err(diagnostic(
                DiagnosticCode::ESempaiMissingPattern,
                format!(
                    "missing a pattern type in rule, expected one of {}",
                    top_level_keys()
                ),
            ));
        }
        several => {
            let keys: Vec<&str> = several.iter().map(|operator| operator.key()).collect();
            return Err(diagnostic(
                DiagnosticCode::ESempaiSchemaInvalid,
                format!("rule has more than one pattern type: {}", keys.join(", ")),
            ));
        }
    };
    let operand = raw.get(operator.key());

    if operator.has_children() {
        let children = parse_children(operand, operator, None)?;
        return BooleanExpression::group(operator, children).map_err(shape_error);
    }
    let text = leaf_operand(operand, operator)?;
    BooleanExpression::leaf(operator, PatternId::new(rule_id), text).map_err(shape_error)
}

fn parse_children(
    operand: Option<&Value>,
    operator: Operator,
    parent: Option<&PatternId>,
) -> Result<Vec<BooleanExpression>, Diagnostic> {
    let Some(Value::Array(items)) = operand else {
        return Err(diagnostic(
            DiagnosticCode::ESempaiInvalidChildren,
            format!(
                "invalid type for '{}': {} is not a list; perhaps your YAML is missing a `-`?",
                operator.key(),
                kind_of(operand)
            ),
        ));
    };
    items
        .iter()
        .enumerate()
        .map(|(position, item)| parse_clause(item, PatternId::nested(parent, position)))
        .collect()
}

fn parse_clause(item: &Value, id: PatternId) -> Result<BooleanExpression, Diagnostic> {
    let clause = item
        .as_object()
        .filter(|clause| clause.len() == 1)
        .and_then(|clause| clause.iter().next())
        .ok_or_else(|| {
            diagnostic(
                DiagnosticCode::ESempaiInvalidChildren,
                format!(
                    "clause {id} must be a mapping with exactly one key, but was {}",
                    kind_of(Some(item))
                ),
            )
        })?;
    let (key, operand) = clause;
    let operator = Operator::from_key(key).ok_or_else(|| {
        diagnostic(
            DiagnosticCode::ESempaiUnknownClause,
            format!("unknown clause '{key}' at {id}"),
        )
    })?;

    if operator.has_children() {
        let children = parse_children(Some(operand), operator, Some(&id))?;
        return BooleanExpression::group(operator, children).map_err(shape_error);
    }
    let text = leaf_operand(Some(operand), operator)?;
    BooleanExpression::leaf(operator, id, text).map_err(shape_error)
}

fn leaf_operand(operand: Option<&Value>, operator: Operator) -> Result<&str, Diagnostic> {
    operand.and_then(Value::as_str).ok_or_else(|| {
        diagnostic(
            DiagnosticCode::ESempaiInvalidOperand,
            format!(
                "operand of '{}' must be a string, but was {}",
                operator.key(),
                kind_of(operand)
            ),
        )
    })
}

fn shape_error(error: ExpressionError) -> Diagnostic {
    diagnostic(DiagnosticCode::ESempaiSchemaInvalid, error.to_string())
}

fn diagnostic(code: DiagnosticCode, message: String) -> Diagnostic {
    Diagnostic::new(code, message, None, vec![])
}
