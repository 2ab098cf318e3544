//! Unit tests for `sempai_config`.

use std::str::FromStr;

use rstest::rstest;

use crate::{Config, LogFormat, default_backend, default_log_filter};

#[rstest]
fn defaults_keep_every_switch_off() {
    let config = Config::default();
    assert_eq!(config.log_filter(), default_log_filter());
    assert_eq!(config.log_format(), LogFormat::Compact);
    assert_eq!(config.backend(), default_backend());
    assert!(config.rewrite_rule_ids());
    assert_eq!(config.engine_config(), sempai_core::EngineConfig::default());
}

#[rstest]
fn engine_config_projects_flags() {
    let config = Config {
        dangerously_allow_arbitrary_code_execution_from_rules: true,
        strict: true,
        autofix: true,
        exclude_tests: true,
        ..Config::default()
    };
    let engine = config.engine_config();
    assert!(engine.allow_side_predicates());
    assert!(engine.strict());
    assert!(engine.autofix());
    assert!(engine.exclude_tests());
}

#[rstest]
#[case("json", LogFormat::Json)]
#[case("JSON", LogFormat::Json)]
#[case("compact", LogFormat::Compact)]
fn log_formats_parse_case_insensitively(#[case] input: &str, #[case] expected: LogFormat) {
    assert_eq!(LogFormat::from_str(input), Ok(expected));
}

#[rstest]
fn unknown_log_format_is_rejected() {
    assert!(LogFormat::from_str("pretty").is_err());
}

#[rstest]
fn log_format_displays_in_snake_case() {
    assert_eq!(LogFormat::Json.to_string(), "json");
}
