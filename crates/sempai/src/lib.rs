//! Sempai: boolean rule evaluation over an external structural matcher.
//!
//! A Sempai rule combines structural patterns with `patterns`,
//! `pattern-either`, `pattern-not`, `pattern-inside`, and friends.  The
//! matcher only understands single patterns, so this crate:
//!
//! 1. flattens every rule into its leaf patterns and sends each one, once,
//!    to the [`backend::Backend`] for its language ([`dispatch`]);
//! 2. evaluates each rule's expression over the ranges its leaves matched,
//!    per file ([`evaluate`], [`predicate`]);
//! 3. turns surviving ranges into findings with substituted messages
//!    ([`resolve`]).
//!
//! # Core types
//!
//! - [`Engine`]: the entrypoint tying the stages together
//! - [`Rule`] and [`RuleSet`]: validated rules
//! - [`Finding`]: one reported result
//! - [`EngineError`]: every way a run can fail
//!
//! # Example
//!
//! ```
//! use camino::Utf8PathBuf;
//! use sempai::backend::{Backend, BackendRequest, BackendResponse, RawMatch, TargetFilters};
//! use sempai::{BackendError, Engine, EngineConfig, Position};
//!
//! /// Reports one match for every pattern it is sent.
//! struct EveryPattern;
//!
//! impl Backend for EveryPattern {
//!     fn run(&self, request: &BackendRequest) -> Result<BackendResponse, BackendError> {
//!         let matches = request
//!             .patterns
//!             .iter()
//!             .map(|record| RawMatch {
//!                 check_id: record.id.clone(),
//!                 path: String::from("app.py"),
//!                 start: Position::new(3, 1, 40),
//!                 end: Position::new(3, 10, 49),
//!                 extra: Default::default(),
//!             })
//!             .collect();
//!         Ok(BackendResponse { matches, errors: vec![] })
//!     }
//! }
//!
//! let yaml = r#"
//! rules:
//!   - id: no-eval
//!     message: avoid eval
//!     severity: ERROR
//!     languages: [python]
//!     pattern: eval(...)
//! "#;
//! let engine = Engine::new(EngineConfig::default(), EveryPattern);
//! let rules = engine.compile_yaml(yaml)?;
//! let output = engine.run(rules.valid(), &[Utf8PathBuf::from("app.py")], &TargetFilters::default())?;
//! assert_eq!(output.findings().len(), 1);
//! assert_eq!(output.findings()[0].check_id(), "no-eval");
//! # Ok::<(), sempai::EngineError>(())
//! ```

pub mod backend;
pub mod dispatch;
mod engine;
mod error;
pub mod evaluate;
pub mod predicate;
pub mod resolve;

pub use sempai_core::{
    BooleanExpression, CheckId, Diagnostic, DiagnosticCode, DiagnosticReport, EngineConfig,
    Language, LineCol, MatchIndex, Operator, PatternId, PatternMatch, Position, Range, RangeSet,
    RuleGlobs, Span,
};
pub use sempai_yaml::{Rule, RuleSet, Severity, load_rules, rule_id_prefix};

pub use engine::{Engine, RunOutput};
pub use error::{BackendError, EngineError, InternalError, PredicateError};
pub use resolve::Finding;

#[cfg(test)]
mod tests;
