//! Tests for flattening and dispatch planning.

use rstest::{fixture, rstest};

use sempai_core::{CheckId, Language, Operator, PatternId, Position};
use sempai_yaml::Rule;

use super::rules;
use crate::backend::{INTERNAL_MESSAGE, MatchExtra, RawMatch};
use crate::dispatch::{flatten, plan};
use crate::error::InternalError;

const TWO_RULES: &str = r"
rules:
  - id: nested
    message: m
    severity: WARNING
    languages: [python]
    patterns:
      - pattern: $F($X)
      - pattern-either:
          - pattern-inside: 'def a(): ...'
          - pattern-regex: ^import
      - pattern-where-python: vars['$X'] == 'y'
  - id: shared
    message: m
    severity: ERROR
    languages: [javascript, python]
    pattern: eval(...)
";

#[fixture]
fn two_rules() -> Vec<Rule> {
    rules(TWO_RULES)
}

fn python() -> Language {
    Language::new("python")
}

fn raw(check_id: &str) -> RawMatch {
    RawMatch {
        check_id: check_id.to_owned(),
        path: String::from("a.py"),
        start: Position::new(1, 1, 0),
        end: Position::new(1, 5, 4),
        extra: MatchExtra::default(),
    }
}

#[rstest]
fn flatten_walks_pre_order(two_rules: Vec<Rule>) {
    let nested = two_rules.first().expect("first rule");
    let operators: Vec<Operator> = flatten(nested.expression())
        .iter()
        .map(|node| node.operator())
        .collect();
    assert_eq!(
        operators,
        [
            Operator::AndAll,
            Operator::And,
            Operator::AndEither,
            Operator::AndInside,
            Operator::Regex,
            Operator::Where,
        ]
    );
}

#[rstest]
fn group_nodes_and_where_clauses_are_not_sent(two_rules: Vec<Rule>) {
    let nested = two_rules.first().expect("first rule");
    let sent: Vec<&str> = flatten(nested.expression())
        .iter()
        .filter(|node| node.should_send())
        .filter_map(|node| node.pattern_id().map(PatternId::as_str))
        .collect();
    assert_eq!(sent, ["0", "1.0", "1.1"]);
}

#[rstest]
fn plan_batches_by_language_in_first_seen_order(two_rules: Vec<Rule>) {
    let dispatch = plan(&two_rules);

    let languages: Vec<&str> = dispatch
        .batches()
        .iter()
        .map(|batch| batch.language().as_str())
        .collect();
    assert_eq!(languages, ["python", "javascript"]);

    let python: Vec<String> = dispatch
        .batches()
        .first()
        .expect("python batch")
        .patterns()
        .iter()
        .map(|request| request.check_id().to_string())
        .collect();
    assert_eq!(python, ["0.0", "0.1.0", "0.1.1", "1.shared"]);

    let javascript = dispatch.batches().get(1).expect("javascript batch");
    assert_eq!(javascript.patterns().len(), 1);
    assert_eq!(dispatch.ledger().len(), 4);
}

#[rstest]
fn records_carry_pattern_kind_and_rule_context(two_rules: Vec<Rule>) {
    let dispatch = plan(&two_rules);
    let records = dispatch.batches().first().expect("python batch").records();

    let regex = records.get(2).expect("regex record");
    assert_eq!(regex.id, "0.1.1");
    assert_eq!(regex.pattern, None);
    assert_eq!(regex.pattern_regex.as_deref(), Some("^import"));
    assert_eq!(regex.severity, "WARNING");

    let shared = records.get(3).expect("shared record");
    assert_eq!(shared.pattern.as_deref(), Some("eval(...)"));
    assert_eq!(shared.languages, ["javascript", "python"]);
    assert_eq!(shared.message, INTERNAL_MESSAGE);
    assert_eq!(shared.message, "<internalonly>");
}

#[rstest]
fn ledger_decodes_dispatched_matches(two_rules: Vec<Rule>) {
    let dispatch = plan(&two_rules);
    let found = dispatch.ledger().decode(&python(), raw("0.1.0")).expect("dispatched id");
    assert_eq!(
        found.check_id(),
        &CheckId::new(0, PatternId::new("1.0"))
    );
    assert_eq!(found.path(), "a.py");
    assert_eq!(found.range().end(), 4);
}

#[rstest]
fn ledger_rejects_matches_it_never_sent(two_rules: Vec<Rule>) {
    let dispatch = plan(&two_rules);
    assert_eq!(
        dispatch.ledger().decode(&python(), raw("3.1.0")),
        Err(InternalError::UndispatchedPattern {
            check_id: String::from("3.1.0"),
        })
    );
}

#[rstest]
#[case::where_clause_id("0.2")]
#[case::group_id("0.1")]
fn ledger_rejects_ids_of_unsent_nodes(two_rules: Vec<Rule>, #[case] check_id: &str) {
    let dispatch = plan(&two_rules);
    assert!(matches!(
        dispatch.ledger().decode(&python(), raw(check_id)),
        Err(InternalError::UndispatchedPattern { .. })
    ));
}

#[rstest]
fn ledger_checks_the_language_a_pattern_was_sent_for(two_rules: Vec<Rule>) {
    let dispatch = plan(&two_rules);
    let javascript = Language::new("javascript");
    assert!(matches!(
        dispatch.ledger().decode(&javascript, raw("0.0")),
        Err(InternalError::UndispatchedPattern { .. })
    ));
    assert!(dispatch.ledger().decode(&javascript, raw("1.shared")).is_ok());
    assert!(dispatch.ledger().decode(&python(), raw("1.shared")).is_ok());
}

#[rstest]
fn ledger_rejects_malformed_ids(two_rules: Vec<Rule>) {
    let dispatch = plan(&two_rules);
    assert!(matches!(
        dispatch.ledger().decode(&python(), raw("no-separator")),
        Err(InternalError::MalformedCheckId(_))
    ));
}

#[rstest]
fn empty_rule_list_plans_nothing() {
    let dispatch = plan(&[]);
    assert!(dispatch.batches().is_empty());
    assert!(dispatch.ledger().is_empty());
}
