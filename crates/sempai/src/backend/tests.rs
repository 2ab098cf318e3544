//! Tests for the matcher protocol and the process backend.

use rstest::rstest;
use serde_json::json;

use super::process::{parse_response, targeting_options};
use super::{PatternRecord, ReportedError, TargetFilters};
use crate::error::BackendError;

#[rstest]
fn targeting_options_keep_flag_order() {
    let filters = TargetFilters {
        include: vec![String::from("*.py")],
        exclude: vec![String::from("*_gen.py"), String::from("setup.py")],
        exclude_dirs: vec![String::from("vendor")],
    };
    assert_eq!(
        targeting_options(&filters),
        [
            "-include",
            "*.py",
            "-exclude",
            "*_gen.py",
            "-exclude",
            "setup.py",
            "-exclude-dir",
            "vendor",
        ]
    );
}

#[rstest]
fn empty_filters_add_no_options() {
    assert!(targeting_options(&TargetFilters::default()).is_empty());
}

#[rstest]
fn pattern_records_serialise_only_their_pattern_kind() {
    let record = PatternRecord {
        id: String::from("0.1"),
        pattern: None,
        pattern_regex: Some(String::from("^import os$")),
        severity: String::from("WARNING"),
        languages: vec![String::from("python")],
        message: String::from("<internalonly>"),
    };
    assert_eq!(
        serde_json::to_value(&record).expect("serialise record"),
        json!({
            "id": "0.1",
            "pattern-regex": "^import os$",
            "severity": "WARNING",
            "languages": ["python"],
            "message": "<internalonly>",
        })
    );
}

#[rstest]
fn responses_decode_matches_and_errors() {
    let stdout = json!({
        "matches": [{
            "check_id": "2.0.1",
            "path": "app.py",
            "start": {"line": 3, "col": 5, "offset": 40},
            "end": {"line": 3, "col": 12, "offset": 47},
            "extra": {"metavars": {"$X": {"abstract_content": "user"}}},
        }],
        "errors": [{"path": "broken.py", "extra": {"message": "parse error"}}],
    })
    .to_string();

    let response = parse_response("python", stdout.as_bytes()).expect("valid response");

    let [found] = response.matches.as_slice() else {
        panic!("expected one match, got {:?}", response.matches);
    };
    assert_eq!(found.check_id, "2.0.1");
    assert_eq!(found.start.offset(), 40);
    assert!(found.extra.metavars.contains_key("$X"));
    let [error] = response.errors.as_slice() else {
        panic!("expected one error, got {:?}", response.errors);
    };
    assert_eq!(error.path.as_deref(), Some("broken.py"));
    assert_eq!(error.message(), Some("parse error"));
}

#[rstest]
fn missing_sections_default_to_empty() {
    let response = parse_response("python", b"{}").expect("valid response");
    assert!(response.matches.is_empty());
    assert!(response.errors.is_empty());
}

#[rstest]
fn garbage_output_is_a_protocol_violation() {
    let err = parse_response("python", b"Segmentation fault").expect_err("must fail");
    assert!(matches!(err, BackendError::InvalidOutput { ref language, .. } if language == "python"));
}

#[rstest]
#[case::top_level(json!({"message": "boom"}), Some("boom"))]
#[case::extra_wins(json!({"message": "outer", "extra": {"message": "inner"}}), Some("inner"))]
#[case::absent(json!({"path": "a.py"}), None)]
fn reported_error_messages(#[case] raw: serde_json::Value, #[case] expected: Option<&str>) {
    let error: ReportedError = serde_json::from_value(raw).expect("decode error");
    assert_eq!(error.message(), expected);
}

#[rstest]
fn reported_errors_pass_unknown_fields_through() {
    let raw = json!({"check_id": "0.0", "level": "warn", "spans": [1, 2]});
    let error: ReportedError = serde_json::from_value(raw.clone()).expect("decode error");
    assert_eq!(error.check_id.as_deref(), Some("0.0"));
    assert_eq!(serde_json::to_value(&error).expect("encode error"), raw);
}

#[cfg(unix)]
mod child_process {
    //! Tests that need a real exit status or a real child process.

    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::os::unix::process::ExitStatusExt;
    use std::process::{ExitStatus, Output};

    use camino::{Utf8Path, Utf8PathBuf};
    use rstest::rstest;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    use crate::backend::process::classify_failure;
    use crate::backend::{Backend, BackendRequest, PatternRecord, ProcessBackend, TargetFilters};
    use crate::error::BackendError;
    use sempai_core::Language;

    fn failed(stdout: &str, stderr: &str) -> Output {
        Output {
            status: ExitStatus::from_raw(2 << 8),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[rstest]
    fn invalid_pattern_is_classified() {
        let stdout = json!({
            "error": "invalid pattern",
            "pattern": "foo(",
            "pattern_id": "0.1.0",
            "language": "python",
            "message": "unexpected end of input",
        })
        .to_string();
        let err = classify_failure("python", &failed(&stdout, ""));
        assert!(err.is_user_facing());
        assert!(matches!(
            err,
            BackendError::InvalidPattern { rule_id: None, ref check_id, ref pattern, ref message, .. }
                if check_id.as_deref() == Some("0.1.0")
                    && pattern == "foo("
                    && message == "unexpected end of input"
        ));
    }

    #[rstest]
    fn invalid_language_is_classified() {
        let stdout = json!({"error": "invalid language", "language": "cobol"}).to_string();
        let err = classify_failure("cobol", &failed(&stdout, ""));
        assert!(err.is_user_facing());
        assert_eq!(err.to_string(), "invalid language cobol");
    }

    #[rstest]
    fn other_fatal_errors_are_not_user_facing() {
        let stdout = json!({"error": "timeout", "message": "took too long"}).to_string();
        let err = classify_failure("python", &failed(&stdout, ""));
        assert!(!err.is_user_facing());
        assert!(matches!(err, BackendError::Failed { ref kind, .. } if kind == "timeout"));
    }

    #[rstest]
    fn unstructured_failures_keep_status_and_stderr() {
        let err = classify_failure("python", &failed("", "  out of memory\n"));
        assert!(matches!(
            err,
            BackendError::NonZeroExit { status: 2, ref stderr, .. } if stderr == "out of memory"
        ));
    }

    fn fake_matcher(dir: &Utf8Path, body: &str) -> Utf8PathBuf {
        let path = dir.join("fake-matcher");
        let script = format!("#!/bin/sh\necho \"$@\" > '{dir}/args'\ncp \"$4\" '{dir}/rules.json'\n{body}\n");
        fs::write(&path, script).expect("write fake matcher");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("make fake matcher executable");
        path
    }

    fn request() -> BackendRequest {
        BackendRequest {
            language: Language::new("python"),
            patterns: vec![PatternRecord {
                id: String::from("0.0"),
                pattern: Some(String::from("eval(...)")),
                pattern_regex: None,
                severity: String::from("ERROR"),
                languages: vec![String::from("python")],
                message: String::from("<internalonly>"),
            }],
            targets: vec![Utf8PathBuf::from("src")],
            filters: TargetFilters {
                exclude_dirs: vec![String::from("vendor")],
                ..TargetFilters::default()
            },
        }
    }

    fn temp_dir() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("create temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
        (dir, path)
    }

    #[rstest]
    fn process_backend_sends_rules_file_and_parses_stdout() {
        let (_guard, dir) = temp_dir();
        let response = json!({
            "matches": [{
                "check_id": "0.0",
                "path": "src/app.py",
                "start": {"line": 1, "col": 1, "offset": 0},
                "end": {"line": 1, "col": 10, "offset": 9},
            }],
            "errors": [],
        });
        let program = fake_matcher(&dir, &format!("echo '{response}'"));

        let result = ProcessBackend::new(program)
            .run(&request())
            .expect("matcher succeeds");

        assert_eq!(result.matches.len(), 1);
        let args = fs::read_to_string(dir.join("args")).expect("read args");
        assert!(args.starts_with("-lang python -rules_file "));
        assert!(args.trim_end().ends_with("-exclude-dir vendor src"));
        let rules: Value =
            serde_json::from_str(&fs::read_to_string(dir.join("rules.json")).expect("read rules"))
                .expect("rules file is JSON");
        assert_eq!(rules["rules"][0]["id"], "0.0");
        assert_eq!(rules["rules"][0]["pattern"], "eval(...)");
    }

    #[rstest]
    fn process_backend_reports_structured_failures() {
        let (_guard, dir) = temp_dir();
        let fatal = json!({"error": "invalid pattern", "pattern": "eval(", "message": "bad"});
        let program = fake_matcher(&dir, &format!("echo '{fatal}'\nexit 2"));

        let err = ProcessBackend::new(program)
            .run(&request())
            .expect_err("matcher fails");

        assert!(matches!(err, BackendError::InvalidPattern { ref pattern, .. } if pattern == "eval("));
    }

    #[rstest]
    fn missing_program_fails_to_spawn() {
        let err = ProcessBackend::new("/nonexistent/sempai-matcher")
            .run(&request())
            .expect_err("spawn fails");
        assert!(matches!(err, BackendError::Spawn { .. }));
    }
}
