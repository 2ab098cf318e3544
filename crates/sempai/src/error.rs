//! Errors raised while dispatching, evaluating, and resolving rules.
//!
//! Errors use `thiserror`-derived enums with structured context so callers
//! can tell which class a failure belongs to.  I/O errors are wrapped in
//! `Arc` to satisfy the `result_large_err` Clippy lint.

use std::sync::Arc;

use thiserror::Error;

use sempai_core::{CheckIdError, DiagnosticReport, Operator};

/// Failures reported by, or while talking to, the structural matcher.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The matcher rejected a pattern.
    #[error("invalid pattern \"{pattern}\" for {language}{}: {message}", rule_suffix(.rule_id.as_deref()))]
    InvalidPattern {
        /// Rule the pattern came from, once attributed.
        rule_id: Option<String>,
        /// Check id the matcher reported for the pattern, if any.
        check_id: Option<String>,
        /// Language the pattern was parsed as.
        language: String,
        /// Pattern text.
        pattern: String,
        /// Matcher's explanation.
        message: String,
    },

    /// The matcher does not know a rule's language.
    #[error("invalid language {language}")]
    InvalidLanguage {
        /// Language name as sent.
        language: String,
    },

    /// The matcher reported an error of a type it should never produce
    /// for a validated rule.
    #[error("matcher failed for {language}: {kind}: {message}")]
    Failed {
        /// Language of the failed invocation.
        language: String,
        /// The matcher's error type.
        kind: String,
        /// The matcher's explanation.
        message: String,
    },

    /// The matcher exited unsuccessfully without a structured error.
    #[error("matcher exited with status {status} for {language}: {stderr}")]
    NonZeroExit {
        /// Language of the failed invocation.
        language: String,
        /// Exit status, or -1 when killed by a signal.
        status: i32,
        /// Captured standard error.
        stderr: String,
    },

    /// The matcher executable could not be started.
    #[error("failed to start matcher '{program}': {source}")]
    Spawn {
        /// Executable that was invoked.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The temporary rules file could not be written.
    #[error("failed to write patterns for {language}: {source}")]
    RulesFile {
        /// Language of the batch.
        language: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The matcher's output does not follow the response contract.
    #[error("matcher output for {language} is not valid: {message}")]
    InvalidOutput {
        /// Language of the invocation.
        language: String,
        /// Description of the protocol violation.
        message: String,
    },
}

fn rule_suffix(rule_id: Option<&str>) -> String {
    rule_id.map_or_else(String::new, |id| format!(" in rule {id}"))
}

impl BackendError {
    /// Returns `true` for errors the rule author can fix.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(self, Self::InvalidPattern { .. } | Self::InvalidLanguage { .. })
    }

    /// Attributes an invalid-pattern error to a rule.
    #[must_use]
    pub fn with_rule_id(self, id: &str) -> Self {
        match self {
            Self::InvalidPattern {
                rule_id: None,
                check_id,
                language,
                pattern,
                message,
            } => Self::InvalidPattern {
                rule_id: Some(id.to_owned()),
                check_id,
                language,
                pattern,
                message,
            },
            other => other,
        }
    }
}

/// Violations of the dispatcher's or parser's own invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    /// The matcher returned a pattern this run never sent.
    #[error("matcher returned check id '{check_id}' that was never dispatched")]
    UndispatchedPattern {
        /// The check id as returned.
        check_id: String,
    },

    /// The matcher returned a check id that cannot be decoded.
    #[error("malformed check id from matcher: {0}")]
    MalformedCheckId(#[from] CheckIdError),

    /// An expression node carries an operator of the wrong shape.
    #[error("{shape} node carries operator {operator}")]
    MalformedTree {
        /// `"leaf"` or `"group"`.
        shape: &'static str,
        /// The misplaced operator.
        operator: Operator,
    },
}

/// Failures of the side-predicate capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredicateError {
    /// The rule uses a side-predicate but the capability was not granted.
    #[error(
        "rule uses side-predicate `{expression}` but arbitrary code execution \
         from rules is not enabled"
    )]
    NotEnabled {
        /// The predicate source.
        expression: String,
    },

    /// The predicate failed to parse or raised while running.
    #[error("side-predicate `{expression}` failed: {message}")]
    Raised {
        /// The predicate source.
        expression: String,
        /// What went wrong.
        message: String,
    },

    /// The predicate produced something other than a boolean.
    #[error("side-predicate `{expression}` returned {found}, not a boolean")]
    NotBoolean {
        /// The predicate source.
        expression: String,
        /// Type name of the value produced.
        found: String,
    },
}

/// Any failure of an engine run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Rules failed validation and strict mode is on.
    #[error("invalid rules: {0}")]
    Schema(#[from] DiagnosticReport),

    /// The structural matcher failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// An internal invariant was violated.
    #[error("an internal error occurred; please file a bug: {0}")]
    Internal(#[from] InternalError),

    /// A side-predicate could not run or misbehaved.
    #[error(transparent)]
    Predicate(#[from] PredicateError),

    /// Evaluating a rule over one file failed.
    #[error("rule {rule_id} failed on {path}: {source}")]
    Evaluation {
        /// Id of the rule being evaluated.
        rule_id: String,
        /// File whose matches were being evaluated.
        path: String,
        /// The underlying failure.
        #[source]
        source: Box<EngineError>,
    },

    /// The matcher reported errors and strict mode is on.
    #[error("strict mode: the matcher reported {count} errors")]
    StrictBackendErrors {
        /// Number of errors reported.
        count: usize,
    },
}

impl EngineError {
    /// Returns `true` when the failure is a defect rather than something
    /// the user can fix.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        match self {
            Self::Internal(_) => true,
            Self::Backend(err) => !err.is_user_facing(),
            Self::Evaluation { source, .. } => source.is_internal(),
            Self::Schema(_) | Self::Predicate(_) | Self::StrictBackendErrors { .. } => false,
        }
    }
}
