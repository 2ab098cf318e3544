//! Rule-file loading for the Sempai rule evaluator.
//!
//! A rule file is a YAML (or JSON) mapping with a top-level `rules` list.
//! This crate validates each rule's keys, builds its
//! [`BooleanExpression`](sempai_core::BooleanExpression) from the pattern
//! clauses, compiles its `paths:` globs, and reports schema problems per
//! rule so one malformed rule does not hide the others.
//!
//! # Example
//!
//! ```
//! use sempai_yaml::load_rules;
//!
//! let source = r#"
//! rules:
//!   - id: no-eval
//!     message: avoid eval
//!     severity: ERROR
//!     languages: [python]
//!     pattern: eval(...)
//! "#;
//! let rules = load_rules(source).expect("document parses");
//! assert_eq!(rules.valid().len(), 1);
//! assert!(rules.invalid().is_empty());
//! ```

mod document;
mod expression;
mod paths;
mod prefix;
mod rule;

pub use document::{LOAD_TARGET, load_rules, parse_document};
pub use expression::parse_expression;
pub use paths::parse_paths;
pub use prefix::rule_id_prefix;
pub use rule::{Rule, RuleSet, Severity};

#[cfg(test)]
mod tests;
