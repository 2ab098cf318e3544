//! The `paths:` section: per-rule include and exclude globs.

use serde_json::Value;

use sempai_core::{Diagnostic, DiagnosticCode, RuleGlobs};

use crate::rule::kind_of;

const INCLUDE_KEY: &str = "include";
const EXCLUDE_KEY: &str = "exclude";

/// Compiles a rule's `paths:` value.
///
/// An absent section places no restriction on paths.
///
/// # Errors
///
/// Returns an `E_SEMPAI_INVALID_PATHS` diagnostic when the section is not
/// a mapping of `include` / `exclude` string lists, or a glob is invalid.
///
/// # Example
///
/// ```
/// use sempai_yaml::parse_paths;
///
/// let paths = serde_json::json!({"exclude": ["tests"]});
/// let globs = parse_paths(Some(&paths)).expect("valid paths");
/// assert!(!globs.matches("tests/test_app.py"));
/// assert!(globs.matches("app.py"));
/// ```
pub fn parse_paths(value: Option<&Value>) -> Result<RuleGlobs, Diagnostic> {
    let section = match value {
        None | Some(Value::Null) => return Ok(RuleGlobs::unrestricted()),
        Some(Value::Object(section)) => section,
        Some(other) => {
            return Err(invalid(format!(
                "'paths' must be a mapping, but was {}",
                kind_of(Some(other))
            )));
        }
    };
    if let Some(key) = section
        .keys()
        .find(|key| key.as_str() != INCLUDE_KEY && key.as_str() != EXCLUDE_KEY)
    {
        return Err(invalid(format!(
            "unknown key '{key}' in 'paths'; expected '{INCLUDE_KEY}' or '{EXCLUDE_KEY}'"
        )));
    }
    let included = glob_list(section.get(INCLUDE_KEY), INCLUDE_KEY)?;
    let excluded = glob_list(section.get(EXCLUDE_KEY), EXCLUDE_KEY)?;
    RuleGlobs::new(included, excluded).map_err(|err| invalid(err.to_string()))
}

fn glob_list<'a>(value: Option<&'a Value>, key: &str) -> Result<Vec<&'a str>, Diagnostic> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(entries)) => entries
            .iter()
            .map(|entry| {
                entry.as_str().ok_or_else(|| {
                    invalid(format!(
                        "'paths.{key}' entries must be strings, but one was {}",
                        kind_of(Some(entry))
                    ))
                })
            })
            .collect(),
        Some(other) => Err(invalid(format!(
            "'paths.{key}' must be a list, but was {}",
            kind_of(Some(other))
        ))),
    }
}

fn invalid(message: String) -> Diagnostic {
    Diagnostic::new(DiagnosticCode::ESempaiInvalidPaths, message, None, vec![])
}
