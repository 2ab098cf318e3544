//! Tests for document parsing and rule loading.

use insta::assert_snapshot;
use rstest::rstest;

use sempai_core::DiagnosticCode;

use crate::{load_rules, parse_document};

const TWO_RULES: &str = r"
rules:
  - id: first
    message: first rule
    severity: ERROR
    languages: [python]
    pattern: eval(...)
  - id: second
    message: second rule
    severity: INFO
    languages: [python]
    pattern-regex: TODO
";

#[test]
fn loads_rules_in_document_order() {
    let rules = load_rules(TWO_RULES).expect("document loads");
    let ids: Vec<&str> = rules.valid().iter().map(|rule| rule.id()).collect();
    assert_eq!(ids, vec!["first", "second"]);
}

#[test]
fn json_documents_are_accepted() {
    let source = r#"{"rules": [{"id": "j", "message": "m", "severity": "WARNING",
        "languages": ["go"], "pattern": "fmt.Println(...)"}]}"#;
    let rules = load_rules(source).expect("json loads");
    assert_eq!(rules.valid().len(), 1);
}

#[rstest]
#[case::not_yaml("rules: [unclosed", DiagnosticCode::ESempaiYamlParse)]
#[case::no_rules_key("checks: []", DiagnosticCode::ESempaiMissingRules)]
#[case::rules_not_list("rules: {id: x}", DiagnosticCode::ESempaiMissingRules)]
fn document_level_errors_fail_the_load(#[case] source: &str, #[case] code: DiagnosticCode) {
    let report = load_rules(source).expect_err("document should be rejected");
    let first = report.diagnostics().first().expect("one diagnostic");
    assert_eq!(first.code(), code);
}

#[test]
fn one_bad_rule_does_not_hide_the_others() {
    let source = r"
rules:
  - id: good
    message: ok
    severity: ERROR
    languages: [python]
    pattern: a
  - id: bad
    message: missing severity
    languages: [python]
    pattern: b
  - just-a-string
";
    let rules = load_rules(source).expect("document loads");
    assert_eq!(rules.valid().len(), 1);
    let rendered: Vec<String> = rules
        .invalid()
        .diagnostics()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_snapshot!(rendered.join("\n"), @r"
    E_SEMPAI_MISSING_RULE_KEY (rule bad): rule is missing required keys: severity
    E_SEMPAI_SCHEMA_INVALID: rule at position 2 is not a mapping
    ");
}

#[test]
fn parse_document_reads_nested_structures() {
    let value = parse_document("a:\n  - b: 1\n").expect("parses");
    assert_eq!(value["a"][0]["b"], serde_json::json!(1));
}
