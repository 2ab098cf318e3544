//! Rule documents: parsing and per-rule validation.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use sempai_core::{Diagnostic, DiagnosticCode, DiagnosticReport};

use crate::rule::{Rule, RuleSet};

/// Tracing target for rule loading.
pub const LOAD_TARGET: &str = "sempai_yaml::load";

/// Key holding the rule list.
const RULES_KEY: &str = "rules";

/// Parses a rule document into a generic value tree.
///
/// Sources starting with `{` are read as JSON; everything else as YAML.
///
/// # Errors
///
/// Returns an `E_SEMPAI_YAML_PARSE` report when the text is not
/// well-formed.
pub fn parse_document(source: &str) -> Result<Value, DiagnosticReport> {
    let parsed = if source.trim_start().starts_with('{') {
        serde_json::from_str::<Value>(source).map_err(|err| err.to_string())
    } else {
        serde_saphyr::from_str::<Value>(source).map_err(|err| err.to_string())
    };
    parsed.map_err(|message| DiagnosticReport::single(DiagnosticCode::ESempaiYamlParse, message))
}

/// Loads every rule in a document.
///
/// Document-level problems (unparsable text, no `rules` list) fail the
/// whole load.  Problems inside one rule are collected into
/// [`RuleSet::invalid`] and the remaining rules still load.
///
/// # Errors
///
/// Returns a report when the document cannot be parsed or has no `rules`
/// list.
pub fn load_rules(source: &str) -> Result<RuleSet, DiagnosticReport> {
    let document = parse_document(source)?;
    let entries = rule_entries(&document)?;

    let mut valid = Vec::new();
    let mut invalid = DiagnosticReport::default();
    for (position, entry) in entries.iter().enumerate() {
        match entry.as_object() {
            Some(raw) => match Rule::from_mapping(raw) {
                Ok(rule) => valid.push(rule),
                Err(report) => {
                    warn!(target: LOAD_TARGET, position, %report, "skipping invalid rule");
                    invalid.extend(report);
                }
            },
            None => invalid.push(Diagnostic::new(
                DiagnosticCode::ESempaiSchemaInvalid,
                format!("rule at position {position} is not a mapping"),
                None,
                vec![],
            )),
        }
    }
    debug!(
        target: LOAD_TARGET,
        valid = valid.len(),
        invalid = invalid.len(),
        "loaded rule document"
    );
    Ok(RuleSet::new(valid, invalid))
}

fn rule_entries(document: &Value) -> Result<&Vec<Value>, DiagnosticReport> {
    let missing = || {
        DiagnosticReport::single(
            DiagnosticCode::ESempaiMissingRules,
            format!("rule document has no top-level '{RULES_KEY}' list"),
        )
    };
    document
        .as_object()
        .and_then(|root: &Map<String, Value>| root.get(RULES_KEY))
        .and_then(Value::as_array)
        .ok_or_else(missing)
}
