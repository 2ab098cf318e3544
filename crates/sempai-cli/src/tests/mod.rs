//! Unit tests for the CLI runtime.


use std::ffi::OsString;
use std::fs;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use sempai::backend::{Backend, BackendRequest, BackendResponse, RawMatch, ReportedError};
use sempai::{BackendError, Position};
use sempai_config::Config;

use crate::config::ConfigLoader;
use crate::errors::AppError;
use crate::{
    FATAL_EXIT_CODE, FINDINGS_EXIT_CODE, INVALID_CODE_EXIT_CODE, INVALID_PATTERN_EXIT_CODE,
    run_with,
};

pub(super) const NO_EVAL: &str = r#"
rules:
  - id: no-eval
    message: avoid eval
    severity: ERROR
    languages: [python]
    pattern: eval(...)
"#;

/// Hands back a fixed configuration.
pub(super) struct StubLoader(pub(super) Config);

impl ConfigLoader for StubLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.0.clone())
    }
}

/// Reports one match per pattern at `path`, plus any canned errors.
#[derive(Clone)]
pub(super) struct EchoMatcher {
    pub(super) path: String,
    pub(super) errors: Vec<ReportedError>,
    pub(super) invalid_pattern: bool,
}

impl EchoMatcher {
    pub(super) fn at(path: &str) -> Self {
        Self {
            path: path.to_owned(),
            errors: Vec::new(),
            invalid_pattern: false,
        }
    }
}

impl Backend for EchoMatcher {
    fn run(&self, request: &BackendRequest) -> Result<BackendResponse, BackendError> {
        if self.invalid_pattern {
            return Err(BackendError::InvalidPattern {
                rule_id: None,
                check_id: None,
                language: request.language.to_string(),
                pattern: request
                    .patterns
                    .first()
                    .and_then(|record| record.pattern.clone())
                    .unwrap_or_default(),
                message: String::from("unexpected token"),
            });
        }
        let matches = request
            .patterns
            .iter()
            .map(|record| RawMatch {
                check_id: record.id.clone(),
                path: self.path.clone(),
                start: Position::new(3, 5, 40),
                end: Position::new(3, 15, 50),
                extra: Default::default(),
            })
            .collect();
        Ok(BackendResponse {
            matches,
            errors: self.errors.clone(),
        })
    }
}

pub(super) struct RuleDir {
    _dir: TempDir,
    pub(super) rules: Utf8PathBuf,
}

#[fixture]
fn rule_dir() -> RuleDir {
    new_rule_dir()
}

pub(super) fn new_rule_dir() -> RuleDir {
    let dir = TempDir::new().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
    let rules = root.join("rules.yml");
    fs::write(&rules, NO_EVAL).expect("write rules");
    RuleDir { _dir: dir, rules }
}

pub(super) fn quiet_config() -> Config {
    Config {
        log_filter: String::from("off"),
        no_rewrite_rule_ids: true,
        ..Config::default()
    }
}

pub(super) struct Outcome {
    pub(super) exit: ExitCode,
    pub(super) stdout: String,
    pub(super) stderr: String,
}

pub(super) fn invoke(args: &[&str], config: Config, matcher: EchoMatcher) -> Outcome {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let arguments = std::iter::once("sempai")
        .chain(args.iter().copied())
        .map(OsString::from);
    let exit = run_with(
        arguments,
        &mut stdout,
        &mut stderr,
        &StubLoader(config),
        move |_: &Config| matcher,
    );
    Outcome {
        exit,
        stdout: String::from_utf8(stdout).expect("utf-8 stdout"),
        stderr: String::from_utf8(stderr).expect("utf-8 stderr"),
    }
}

#[rstest]
fn prints_one_line_per_finding(rule_dir: RuleDir) {
    let outcome = invoke(
        &["-f", rule_dir.rules.as_str(), "app.py"],
        quiet_config(),
        EchoMatcher::at("app.py"),
    );
    assert_eq!(outcome.exit, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    insta::assert_snapshot!(outcome.stdout, @"app.py:3: no-eval: avoid eval");
}

#[rstest]
fn error_flag_turns_findings_into_failure(rule_dir: RuleDir) {
    let outcome = invoke(
        &["--error", "-f", rule_dir.rules.as_str()],
        quiet_config(),
        EchoMatcher::at("app.py"),
    );
    assert_eq!(outcome.exit, ExitCode::from(FINDINGS_EXIT_CODE));
}

#[rstest]
fn json_output_lists_results_and_errors(rule_dir: RuleDir) {
    let mut matcher = EchoMatcher::at("app.py");
    matcher.errors.push(ReportedError {
        check_id: None,
        path: Some(String::from("broken.py")),
        rest: serde_json::Map::from_iter([(
            String::from("message"),
            serde_json::Value::from("parse error"),
        )]),
    });
    let outcome = invoke(
        &["--json", "-f", rule_dir.rules.as_str()],
        quiet_config(),
        matcher,
    );
    let document: serde_json::Value =
        serde_json::from_str(&outcome.stdout).expect("stdout is JSON");
    assert_eq!(document["results"][0]["check_id"], "no-eval");
    assert_eq!(document["results"][0]["start"]["col"], 5);
    assert_eq!(document["errors"][0]["path"], "broken.py");
    assert!(outcome.stderr.is_empty(), "stderr: {}", outcome.stderr);
}

#[rstest]
fn text_mode_reports_matcher_errors_on_stderr(rule_dir: RuleDir) {
    let mut matcher = EchoMatcher::at("app.py");
    matcher.errors.push(ReportedError {
        check_id: None,
        path: Some(String::from("broken.py")),
        rest: serde_json::Map::from_iter([(
            String::from("message"),
            serde_json::Value::from("parse error"),
        )]),
    });
    let outcome = invoke(&["-f", rule_dir.rules.as_str()], quiet_config(), matcher);
    assert_eq!(outcome.exit, ExitCode::SUCCESS);
    insta::assert_snapshot!(outcome.stderr, @"warning: broken.py: parse error");
}

#[rstest]
fn strict_mode_fails_on_matcher_errors(rule_dir: RuleDir) {
    let mut matcher = EchoMatcher::at("app.py");
    matcher.errors.push(ReportedError::default());
    let config = Config {
        strict: true,
        ..quiet_config()
    };
    let outcome = invoke(&["-f", rule_dir.rules.as_str()], config, matcher);
    assert_eq!(outcome.exit, ExitCode::from(INVALID_CODE_EXIT_CODE));
    assert!(outcome.stderr.contains("strict mode"), "stderr: {}", outcome.stderr);
}

#[rstest]
fn rejected_pattern_names_the_rule(rule_dir: RuleDir) {
    let matcher = EchoMatcher {
        invalid_pattern: true,
        ..EchoMatcher::at("app.py")
    };
    let outcome = invoke(&["-f", rule_dir.rules.as_str()], quiet_config(), matcher);
    assert_eq!(outcome.exit, ExitCode::from(INVALID_PATTERN_EXIT_CODE));
    insta::assert_snapshot!(
        outcome.stderr,
        @r#"invalid pattern "eval(...)" for python in rule no-eval: unexpected token"#
    );
}

#[rstest]
fn excluded_test_findings_are_counted(rule_dir: RuleDir) {
    let config = Config {
        exclude_tests: true,
        ..quiet_config()
    };
    let outcome = invoke(
        &["-f", rule_dir.rules.as_str()],
        config,
        EchoMatcher::at("tests/test_app.py"),
    );
    assert!(outcome.stdout.is_empty(), "stdout: {}", outcome.stdout);
    assert!(
        outcome
            .stderr
            .contains("ignored 1 results in tests due to --exclude-tests option"),
        "stderr: {}",
        outcome.stderr
    );
}

#[test]
fn missing_rules_is_a_usage_error() {
    let outcome = invoke(&["src"], quiet_config(), EchoMatcher::at("app.py"));
    assert_eq!(outcome.exit, ExitCode::from(FATAL_EXIT_CODE));
    assert!(outcome.stderr.contains("--rules"), "stderr: {}", outcome.stderr);
}

#[test]
fn help_goes_to_stdout_and_succeeds() {
    let outcome = invoke(&["--help"], quiet_config(), EchoMatcher::at("app.py"));
    assert_eq!(outcome.exit, ExitCode::SUCCESS);
    assert!(outcome.stdout.contains("Usage"), "stdout: {}", outcome.stdout);
}
