//! Tests for the engine's orchestration of dispatch, evaluation and
//! resolution.

use camino::Utf8PathBuf;
use insta::assert_snapshot;
use mockall::mock;
use rstest::rstest;
use serde_json::json;

use sempai_core::{DiagnosticCode, EngineConfig, MetavarValue, Position};

use super::rules;
use crate::backend::{
    Backend, BackendRequest, BackendResponse, MatchExtra, RawMatch, ReportedError, TargetFilters,
};
use crate::error::{BackendError, EngineError, InternalError, PredicateError};
use crate::{Engine, RunOutput};

mock! {
    Matcher {}
    impl Backend for Matcher {
        fn run(&self, request: &BackendRequest) -> Result<BackendResponse, BackendError>;
    }
}

const NOT_SAFE: &str = r"
rules:
  - id: unsafe-call
    message: call to $F
    severity: WARNING
    languages: [python]
    patterns:
      - pattern: $F(...)
      - pattern-not: safe(...)
";

const WITH_PREDICATE: &str = r"
rules:
  - id: foo-only
    message: foo call
    severity: INFO
    languages: [python]
    patterns:
      - pattern: f($X)
      - pattern-where-python: X == 'foo'
";

fn raw(check_id: &str, path: &str, start: u32, end: u32) -> RawMatch {
    RawMatch {
        check_id: check_id.to_owned(),
        path: path.to_owned(),
        start: Position::new(1, start.saturating_add(1), start),
        end: Position::new(1, end.saturating_add(1), end),
        extra: MatchExtra::default(),
    }
}

fn bound(mut found: RawMatch, name: &str, text: &str) -> RawMatch {
    found
        .extra
        .metavars
        .insert(name.to_owned(), MetavarValue::from_text(text));
    found
}

fn responding(matches: Vec<RawMatch>, errors: Vec<ReportedError>) -> MockMatcher {
    let mut backend = MockMatcher::new();
    backend
        .expect_run()
        .once()
        .return_once(move |_| Ok(BackendResponse { matches, errors }));
    backend
}

fn targets() -> Vec<Utf8PathBuf> {
    vec![Utf8PathBuf::from("src")]
}

fn run_with(
    config: EngineConfig,
    backend: MockMatcher,
    yaml: &str,
) -> Result<RunOutput, EngineError> {
    Engine::new(config, backend).run(&rules(yaml), &targets(), &TargetFilters::default())
}

#[rstest]
fn requests_carry_every_leaf_targets_and_filters() {
    let filters = TargetFilters {
        include: vec![String::from("*.py")],
        ..TargetFilters::default()
    };
    let expected_filters = filters.clone();
    let mut backend = MockMatcher::new();
    backend
        .expect_run()
        .withf(move |request| {
            let ids: Vec<&str> = request.patterns.iter().map(|record| record.id.as_str()).collect();
            request.language.as_str() == "python"
                && ids == ["0.0", "0.1"]
                && request.targets == [Utf8PathBuf::from("src")]
                && request.filters == expected_filters
        })
        .once()
        .return_once(|_| Ok(BackendResponse::default()));

    let output = Engine::new(EngineConfig::default(), backend)
        .run(&rules(NOT_SAFE), &targets(), &filters)
        .expect("run succeeds");
    assert!(output.findings().is_empty());
}

#[rstest]
fn pattern_not_removes_matches_end_to_end() {
    let backend = responding(
        vec![
            bound(raw("0.0", "src/a.py", 0, 10), "$F", "danger"),
            bound(raw("0.0", "src/a.py", 20, 28), "$F", "safe"),
            bound(raw("0.1", "src/a.py", 20, 28), "$F", "safe"),
        ],
        vec![],
    );
    let output = run_with(EngineConfig::default(), backend, NOT_SAFE).expect("run succeeds");

    let messages: Vec<&str> = output.findings().iter().map(|finding| finding.message()).collect();
    assert_eq!(messages, ["call to danger"]);
}

#[rstest]
fn bindings_keep_pattern_not_from_removing_distinct_entities() {
    // `safe(...)` has no bindings, so the bound `$F(...)` range is distinct.
    let backend = responding(
        vec![
            bound(raw("0.0", "src/a.py", 20, 28), "$F", "safe"),
            raw("0.1", "src/a.py", 20, 28),
        ],
        vec![],
    );
    let output = run_with(EngineConfig::default(), backend, NOT_SAFE).expect("run succeeds");
    assert_eq!(output.findings().len(), 1);
}

#[rstest]
fn findings_are_evaluated_per_file() {
    let backend = responding(
        vec![
            raw("0.0", "src/a.py", 0, 10),
            raw("0.0", "src/b.py", 0, 10),
            raw("0.1", "src/b.py", 0, 10),
        ],
        vec![],
    );
    let output = run_with(EngineConfig::default(), backend, NOT_SAFE).expect("run succeeds");
    let paths: Vec<&str> = output.findings().iter().map(|finding| finding.path()).collect();
    assert_eq!(paths, ["src/a.py"]);
}

#[rstest]
fn undispatched_check_id_is_an_internal_error() {
    let backend = responding(vec![raw("3.1.0", "src/a.py", 0, 10)], vec![]);
    let err = run_with(EngineConfig::default(), backend, NOT_SAFE).expect_err("must fail");

    assert!(err.is_internal());
    assert!(matches!(
        err,
        EngineError::Internal(InternalError::UndispatchedPattern { ref check_id }) if check_id == "3.1.0"
    ));
    assert_snapshot!(
        err.to_string(),
        @"an internal error occurred; please file a bug: matcher returned check id '3.1.0' that was never dispatched"
    );
}

#[rstest]
fn invalid_patterns_name_their_rule() {
    let mut backend = MockMatcher::new();
    backend.expect_run().once().return_once(|_| {
        Err(BackendError::InvalidPattern {
            rule_id: None,
            check_id: None,
            language: String::from("python"),
            pattern: String::from("safe(...)"),
            message: String::from("unexpected token"),
        })
    });
    let err = run_with(EngineConfig::default(), backend, NOT_SAFE).expect_err("must fail");

    assert!(!err.is_internal());
    assert_snapshot!(
        err.to_string(),
        @r#"invalid pattern "safe(...)" for python in rule unsafe-call: unexpected token"#
    );
}

const SHARED_PATTERN: &str = r"
rules:
  - id: first
    message: m
    severity: INFO
    languages: [python]
    pattern: eval(...)
  - id: second
    message: m
    severity: INFO
    languages: [python]
    pattern: eval(...)
";

fn rejecting(check_id: Option<&str>) -> MockMatcher {
    let reported = check_id.map(str::to_owned);
    let mut backend = MockMatcher::new();
    backend.expect_run().once().return_once(move |_| {
        Err(BackendError::InvalidPattern {
            rule_id: None,
            check_id: reported,
            language: String::from("python"),
            pattern: String::from("eval(...)"),
            message: String::from("unexpected token"),
        })
    });
    backend
}

#[rstest]
fn reported_check_id_names_the_rule_behind_a_shared_pattern() {
    let err = run_with(EngineConfig::default(), rejecting(Some("1.second")), SHARED_PATTERN)
        .expect_err("must fail");
    assert_snapshot!(
        err.to_string(),
        @r#"invalid pattern "eval(...)" for python in rule second: unexpected token"#
    );
}

#[rstest]
fn ambiguous_pattern_text_names_no_rule() {
    let err = run_with(EngineConfig::default(), rejecting(None), SHARED_PATTERN)
        .expect_err("must fail");
    assert_snapshot!(
        err.to_string(),
        @r#"invalid pattern "eval(...)" for python: unexpected token"#
    );
}

#[rstest]
fn evaluation_failures_name_the_rule_and_file() {
    let yaml = r"
rules:
  - id: my-rule
    message: m
    severity: INFO
    languages: [python]
    patterns:
      - pattern: f($X)
      - pattern-where-python: vars['$Y'] == 'a'
";
    let backend = responding(
        vec![bound(raw("0.0", "src/deep/app.py", 0, 6), "$X", "a")],
        vec![],
    );
    let config = EngineConfig::default().with_side_predicates(true);
    let err = run_with(config, backend, yaml).expect_err("must fail");

    assert!(!err.is_internal());
    assert!(matches!(
        err,
        EngineError::Evaluation { ref source, .. }
            if matches!(**source, EngineError::Predicate(PredicateError::Raised { .. }))
    ));
    assert_snapshot!(
        err.to_string(),
        @r#"rule my-rule failed on src/deep/app.py: side-predicate `vars['$Y'] == 'a'` failed: KeyError: "$Y""#
    );
}

#[rstest]
fn side_predicates_without_opt_in_fail_before_dispatch() {
    let mut backend = MockMatcher::new();
    backend.expect_run().never();
    let err = run_with(EngineConfig::default(), backend, WITH_PREDICATE).expect_err("must fail");
    assert!(matches!(
        err,
        EngineError::Predicate(PredicateError::NotEnabled { ref expression }) if expression == "X == 'foo'"
    ));
}

#[rstest]
fn side_predicates_with_opt_in_filter_matches() {
    let backend = responding(
        vec![
            bound(raw("0.0", "src/a.py", 0, 6), "$X", "foo"),
            bound(raw("0.0", "src/a.py", 10, 16), "$X", "bar"),
        ],
        vec![],
    );
    let config = EngineConfig::default().with_side_predicates(true);
    let output = run_with(config, backend, WITH_PREDICATE).expect("run succeeds");

    let starts: Vec<u32> = output.findings().iter().map(|finding| finding.start().col).collect();
    assert_eq!(starts, [1]);
}

#[rstest]
fn backend_errors_are_reported_and_kept() {
    let error: ReportedError =
        serde_json::from_value(json!({"path": "src/broken.py", "message": "parse error"}))
            .expect("decode error");
    let backend = responding(vec![raw("0.0", "src/a.py", 0, 10)], vec![error.clone()]);
    let output = run_with(EngineConfig::default(), backend, NOT_SAFE).expect("run succeeds");

    assert_eq!(output.findings().len(), 1);
    assert_eq!(output.errors(), [error]);
}

#[rstest]
fn strict_mode_fails_on_backend_errors() {
    let backend = responding(vec![], vec![ReportedError::default()]);
    let config = EngineConfig::default().with_strict(true);
    let err = run_with(config, backend, NOT_SAFE).expect_err("must fail");
    assert!(matches!(err, EngineError::StrictBackendErrors { count: 1 }));
}

#[rstest]
fn test_paths_are_excluded_and_counted() {
    let backend = responding(
        vec![
            raw("0.0", "src/a.py", 0, 10),
            raw("0.0", "tests/test_a.py", 0, 10),
            raw("0.0", "examples/demo.py", 0, 10),
        ],
        vec![],
    );
    let config = EngineConfig::default().with_exclude_tests(true);
    let output = run_with(config, backend, NOT_SAFE).expect("run succeeds");

    assert_eq!(output.findings().len(), 1);
    assert_eq!(output.excluded_test_findings(), 2);
}

#[rstest]
fn one_request_per_language() {
    let yaml = r"
rules:
  - id: py
    message: m
    severity: INFO
    languages: [python]
    pattern: a
  - id: js
    message: m
    severity: INFO
    languages: [javascript]
    pattern: b
";
    let mut backend = MockMatcher::new();
    backend
        .expect_run()
        .times(2)
        .returning(|request| {
            let matches = request
                .patterns
                .iter()
                .map(|record| raw(&record.id, "src/x", 0, 1))
                .collect();
            Ok(BackendResponse {
                matches,
                errors: vec![],
            })
        });
    let output = run_with(EngineConfig::default(), backend, yaml).expect("run succeeds");
    let ids: Vec<&str> = output.findings().iter().map(|finding| finding.check_id()).collect();
    assert_eq!(ids, ["py", "js"]);
}

#[rstest]
fn output_serialises_results_and_errors() {
    let backend = responding(vec![raw("0.0", "src/a.py", 0, 10)], vec![]);
    let output = run_with(EngineConfig::default(), backend, NOT_SAFE).expect("run succeeds");
    let rendered = serde_json::to_value(&output).expect("serialise output");
    assert_eq!(rendered["errors"], json!([]));
    assert_eq!(rendered["results"][0]["check_id"], "unsafe-call");
    assert_eq!(rendered["results"][0]["extra"]["message"], "call to $F");
}

#[rstest]
fn lenient_compile_keeps_invalid_rules_aside() {
    let engine = Engine::new(EngineConfig::default(), MockMatcher::new());
    let yaml = format!("{NOT_SAFE}  - id: broken\n    message: m\n");
    let compiled = engine.compile_yaml(&yaml).expect("document loads");
    assert_eq!(compiled.valid().len(), 1);
    assert_eq!(
        compiled
            .invalid()
            .diagnostics()
            .first()
            .map(sempai_core::Diagnostic::code),
        Some(DiagnosticCode::ESempaiMissingRuleKey)
    );
}

#[rstest]
fn strict_compile_rejects_invalid_rules() {
    let engine = Engine::new(EngineConfig::default().with_strict(true), MockMatcher::new());
    let yaml = format!("{NOT_SAFE}  - id: broken\n    message: m\n");
    let err = engine.compile_yaml(&yaml).expect_err("must fail");
    assert!(matches!(err, EngineError::Schema(ref report) if report.len() == 1));
}
