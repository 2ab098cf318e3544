//! Core data model and diagnostics for the Sempai rule evaluator.
//!
//! This crate provides the value types the evaluation pipeline is built
//! from: matched ranges with binding-aware equality, pattern identifiers,
//! the boolean expression tree, per-file match indexes, path globs,
//! diagnostic reports, and engine configuration.  It is re-exported by the
//! `sempai` facade crate for stable public consumption.
//!
//! # Core types
//!
//! - [`Range`] and [`Bindings`]: matched intervals with binding identities
//! - [`PatternId`] and [`CheckId`]: leaf identifiers and their wire form
//! - [`Operator`] and [`BooleanExpression`]: the rule's expression tree
//! - [`PatternMatch`] and [`MatchIndex`]: decoded backend matches
//! - [`RuleGlobs`]: per-rule path filters
//! - [`DiagnosticReport`] and [`Diagnostic`]: structured error reporting
//! - [`EngineConfig`]: feature gates and run policy
//!
//! # Example
//!
//! ```
//! use sempai_core::{Range, RangeSet};
//!
//! let universe: RangeSet = [Range::unbound(0, 10), Range::unbound(20, 30)].into();
//! assert!(universe.contains(&Range::unbound(0, 10)));
//! ```

mod config;
mod diagnostic;
mod expression;
mod globs;
mod language;
mod match_index;
mod match_result;
mod metavar;
mod pattern_id;
mod range;
mod span;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::EngineConfig;
pub use diagnostic::{Diagnostic, DiagnosticCode, DiagnosticReport};
pub use expression::{BooleanExpression, ExpressionError, GroupExpression, LeafExpression, Operator};
pub use globs::{GlobError, RuleGlobs};
pub use language::Language;
pub use match_index::MatchIndex;
pub use match_result::PatternMatch;
pub use metavar::{MetavarValue, UniqueId};
pub use pattern_id::{CheckId, CheckIdError, PatternId};
pub use range::{BindingIdentity, Bindings, Range, RangeSet};
pub use span::{LineCol, Position, Span};

#[cfg(test)]
mod tests;
