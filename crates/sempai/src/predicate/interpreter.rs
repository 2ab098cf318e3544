//! Evaluates parsed side-predicates against a match's bindings.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use super::parser::{CompareOp, Expr};

/// A runtime value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Value<'b> {
    Str(String),
    Int(i64),
    Bool(bool),
    None,
    /// The `vars` mapping of metavariable names to matched text.
    Vars(&'b BTreeMap<String, String>),
}

impl Value<'_> {
    pub(crate) const fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "str",
            Self::Int(_) => "int",
            Self::Bool(_) => "bool",
            Self::None => "NoneType",
            Self::Vars(_) => "dict",
        }
    }

    fn truthy(&self) -> bool {
        match self {
            Self::Str(text) => !text.is_empty(),
            Self::Int(value) => *value != 0,
            Self::Bool(value) => *value,
            Self::None => false,
            Self::Vars(vars) => !vars.is_empty(),
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(text) => write!(f, "{text:?}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::None => f.write_str("None"),
            Self::Vars(_) => f.write_str("vars"),
        }
    }
}

/// Evaluates `expr` with `bindings` in scope.
///
/// `vars` names the whole binding map.  A bare name resolves to the
/// binding of that name, or failing that of `$name`.
pub(crate) fn evaluate<'b>(
    expr: &Expr,
    bindings: &'b BTreeMap<String, String>,
) -> Result<Value<'b>, String> {
    Ok(match expr {
        Expr::Str(text) => Value::Str(text.clone()),
        Expr::Int(value) => Value::Int(*value),
        Expr::Bool(value) => Value::Bool(*value),
        Expr::None => Value::None,
        Expr::Name(name) => lookup(name, bindings)?,
        Expr::Not(inner) => Value::Bool(!evaluate(inner, bindings)?.truthy()),
        Expr::And(operands) => short_circuit(operands, bindings, false)?,
        Expr::Or(operands) => short_circuit(operands, bindings, true)?,
        Expr::Compare(left, op, right) => Value::Bool(compare(
            &evaluate(left, bindings)?,
            *op,
            &evaluate(right, bindings)?,
        )?),
        Expr::Subscript(target, index) => {
            subscript(&evaluate(target, bindings)?, &evaluate(index, bindings)?)?
        }
        Expr::Call(function, args) => call(function, &arguments(args, bindings)?)?,
        Expr::Method(target, method, args) => call_method(
            &evaluate(target, bindings)?,
            method,
            &arguments(args, bindings)?,
        )?,
    })
}

/// Returns the first operand whose truthiness is `stop_on`, else the last.
fn short_circuit<'b>(
    operands: &[Expr],
    bindings: &'b BTreeMap<String, String>,
    stop_on: bool,
) -> Result<Value<'b>, String> {
    let mut last = Value::Bool(!stop_on);
    for operand in operands {
        last = evaluate(operand, bindings)?;
        if last.truthy() == stop_on {
            break;
        }
    }
    Ok(last)
}

fn arguments<'b>(
    args: &[Expr],
    bindings: &'b BTreeMap<String, String>,
) -> Result<Vec<Value<'b>>, String> {
    args.iter().map(|arg| evaluate(arg, bindings)).collect()
}

fn lookup<'b>(name: &str, bindings: &'b BTreeMap<String, String>) -> Result<Value<'b>, String> {
    if name == "vars" {
        return Ok(Value::Vars(bindings));
    }
    bindings
        .get(name)
        .or_else(|| bindings.get(&format!("${name}")))
        .map(|text| Value::Str(text.clone()))
        .ok_or_else(|| format!("name '{name}' is not defined"))
}

fn compare(left: &Value<'_>, op: CompareOp, right: &Value<'_>) -> Result<bool, String> {
    let ordering = || match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        _ => Err(format!(
            "'{op:?}' not supported between {} and {}",
            left.type_name(),
            right.type_name()
        )),
    };
    match op {
        CompareOp::Eq => Ok(left == right),
        CompareOp::NotEq => Ok(left != right),
        CompareOp::Lt => Ok(ordering()? == Ordering::Less),
        CompareOp::Le => Ok(ordering()? != Ordering::Greater),
        CompareOp::Gt => Ok(ordering()? == Ordering::Greater),
        CompareOp::Ge => Ok(ordering()? != Ordering::Less),
        CompareOp::In => contains(right, left),
        CompareOp::NotIn => contains(right, left).map(|found| !found),
    }
}

fn contains(haystack: &Value<'_>, needle: &Value<'_>) -> Result<bool, String> {
    match (haystack, needle) {
        (Value::Str(text), Value::Str(part)) => Ok(text.contains(part.as_str())),
        (Value::Vars(vars), Value::Str(name)) => Ok(vars.contains_key(name)),
        _ => Err(format!(
            "'in' not supported between {} and {}",
            needle.type_name(),
            haystack.type_name()
        )),
    }
}

fn subscript<'b>(target: &Value<'b>, index: &Value<'_>) -> Result<Value<'b>, String> {
    match (target, index) {
        (Value::Vars(vars), Value::Str(name)) => vars
            .get(name)
            .map(|text| Value::Str(text.clone()))
            .ok_or_else(|| format!("KeyError: {name:?}")),
        _ => Err(format!(
            "{} is not subscriptable by {}",
            target.type_name(),
            index.type_name()
        )),
    }
}

fn call<'b>(function: &str, args: &[Value<'b>]) -> Result<Value<'b>, String> {
    match (function, args) {
        ("len", [Value::Str(text)]) => i64::try_from(text.chars().count())
            .map(Value::Int)
            .map_err(|err| err.to_string()),
        ("len", [Value::Vars(vars)]) => i64::try_from(vars.len())
            .map(Value::Int)
            .map_err(|err| err.to_string()),
        ("int", [Value::Str(text)]) => text
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|_| format!("invalid literal for int(): {text:?}")),
        ("int", [Value::Int(value)]) => Ok(Value::Int(*value)),
        ("str", [value]) => Ok(Value::Str(match value {
            Value::Str(text) => text.clone(),
            other => other.to_string(),
        })),
        ("bool", [value]) => Ok(Value::Bool(value.truthy())),
        _ => Err(format!(
            "unsupported call {function}() with {} arguments",
            args.len()
        )),
    }
}

fn call_method<'b>(target: &Value<'b>, method: &str, args: &[Value<'b>]) -> Result<Value<'b>, String> {
    let Value::Str(text) = target else {
        return Err(format!(
            "{} has no method '{method}'",
            target.type_name()
        ));
    };
    match (method, args) {
        ("startswith", [Value::Str(prefix)]) => Ok(Value::Bool(text.starts_with(prefix.as_str()))),
        ("endswith", [Value::Str(suffix)]) => Ok(Value::Bool(text.ends_with(suffix.as_str()))),
        ("lower", []) => Ok(Value::Str(text.to_lowercase())),
        ("upper", []) => Ok(Value::Str(text.to_uppercase())),
        ("strip", []) => Ok(Value::Str(text.trim().to_owned())),
        ("isdigit", []) => Ok(Value::Bool(
            !text.is_empty() && text.chars().all(|ch| ch.is_ascii_digit()),
        )),
        _ => Err(format!(
            "unsupported method str.{method}() with {} arguments",
            args.len()
        )),
    }
}
