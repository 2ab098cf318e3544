//! Unit tests for `sempai`.

use sempai_yaml::{Rule, load_rules};

mod dispatch_tests;
mod engine_tests;


/// Loads `yaml` and returns its valid rules, failing on any invalid one.
fn rules(yaml: &str) -> Vec<Rule> {
    let (valid, invalid) = load_rules(yaml).expect("document loads").into_parts();
    assert!(invalid.is_empty(), "unexpected invalid rules: {invalid:?}");
    valid
}
