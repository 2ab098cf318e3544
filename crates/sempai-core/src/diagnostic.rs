//! Diagnostic types for structured rule-schema error reporting.
//!
//! Problems with a rule definition (wrong value types, unknown clause keys,
//! missing required keys) are surfaced through a [`DiagnosticReport`]
//! containing one or more [`Diagnostic`] entries.  Each diagnostic carries a
//! stable [`DiagnosticCode`], a human-readable message, the id of the rule
//! it concerns when known, and supplementary notes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable error codes for Sempai diagnostics.
///
/// # Example
///
/// ```
/// use sempai_core::DiagnosticCode;
///
/// let code = DiagnosticCode::ESempaiYamlParse;
/// assert_eq!(format!("{code}"), "E_SEMPAI_YAML_PARSE");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DiagnosticCode {
    /// Rule document failed to parse as YAML or JSON.
    ESempaiYamlParse,
    /// Rule document has no top-level `rules` list.
    ESempaiMissingRules,
    /// A rule is missing a required key.
    ESempaiMissingRuleKey,
    /// A rule carries a key outside the allowed set.
    ESempaiUnknownRuleKey,
    /// A rule id is not a string.
    ESempaiInvalidRuleId,
    /// A rule has none of the top-level pattern keys.
    ESempaiMissingPattern,
    /// A leaf clause operand is not a string.
    ESempaiInvalidOperand,
    /// A `patterns` / `pattern-either` operand is not a list of single-key
    /// mappings.
    ESempaiInvalidChildren,
    /// A clause key is not a recognised operator.
    ESempaiUnknownClause,
    /// The `paths:` section is malformed or holds an invalid glob.
    ESempaiInvalidPaths,
    /// Any other schema violation (wrong severity, languages, metadata).
    ESempaiSchemaInvalid,
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ESempaiYamlParse => f.write_str("E_SEMPAI_YAML_PARSE"),
            Self::ESempaiMissingRules => f.write_str("E_SEMPAI_MISSING_RULES"),
            Self::ESempaiMissingRuleKey => f.write_str("E_SEMPAI_MISSING_RULE_KEY"),
            Self::ESempaiUnknownRuleKey => f.write_str("E_SEMPAI_UNKNOWN_RULE_KEY"),
            Self::ESempaiInvalidRuleId => f.write_str("E_SEMPAI_INVALID_RULE_ID"),
            Self::ESempaiMissingPattern => f.write_str("E_SEMPAI_MISSING_PATTERN"),
            Self::ESempaiInvalidOperand => f.write_str("E_SEMPAI_INVALID_OPERAND"),
            Self::ESempaiInvalidChildren => f.write_str("E_SEMPAI_INVALID_CHILDREN"),
            Self::ESempaiUnknownClause => f.write_str("E_SEMPAI_UNKNOWN_CLAUSE"),
            Self::ESempaiInvalidPaths => f.write_str("E_SEMPAI_INVALID_PATHS"),
            Self::ESempaiSchemaInvalid => f.write_str("E_SEMPAI_SCHEMA_INVALID"),
        }
    }
}

/// A single diagnostic entry within a report.
///
/// # Example
///
/// ```
/// use sempai_core::{Diagnostic, DiagnosticCode};
///
/// let diag = Diagnostic::new(
///     DiagnosticCode::ESempaiUnknownClause,
///     String::from("unknown clause 'pattern-nto'"),
///     Some(String::from("no-eval")),
///     vec![],
/// );
/// assert_eq!(diag.code(), DiagnosticCode::ESempaiUnknownClause);
/// assert_eq!(diag.rule_id(), Some("no-eval"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The stable error code.
    code: DiagnosticCode,
    /// A human-readable description of the problem.
    message: String,
    /// The id of the rule the problem was found in, if known.
    rule_id: Option<String>,
    /// Additional notes providing context or suggestions.
    notes: Vec<String>,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    #[must_use]
    pub const fn new(
        code: DiagnosticCode,
        message: String,
        rule_id: Option<String>,
        notes: Vec<String>,
    ) -> Self {
        Self {
            code,
            message,
            rule_id,
            notes,
        }
    }

    /// Returns the diagnostic code.
    #[must_use]
    pub const fn code(&self) -> DiagnosticCode {
        self.code
    }

    /// Returns the diagnostic message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending rule's id, if known.
    #[must_use]
    pub fn rule_id(&self) -> Option<&str> {
        self.rule_id.as_deref()
    }

    /// Returns the supplementary notes.
    #[must_use]
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Attaches the rule id when none was recorded yet.
    #[must_use]
    pub fn with_rule_id(mut self, rule_id: Option<&str>) -> Self {
        if self.rule_id.is_none() {
            self.rule_id = rule_id.map(str::to_owned);
        }
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rule_id {
            Some(rule_id) => write!(f, "{} (rule {rule_id}): {}", self.code, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

/// Summarises the first diagnostic in a report for the `Display` impl.
fn diagnostic_summary(diagnostics: &[Diagnostic]) -> String {
    diagnostics.first().map_or_else(
        || String::from("empty diagnostic report"),
        ToString::to_string,
    )
}

/// A collection of diagnostics produced while loading rules.
///
/// # Example
///
/// ```
/// use sempai_core::{DiagnosticCode, DiagnosticReport};
///
/// let report = DiagnosticReport::single(DiagnosticCode::ESempaiMissingRules, "no rules");
/// assert_eq!(report.diagnostics()[0].code(), DiagnosticCode::ESempaiMissingRules);
/// assert_eq!(report.to_string(), "E_SEMPAI_MISSING_RULES: no rules");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{}", diagnostic_summary(&self.diagnostics))]
pub struct DiagnosticReport {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticReport {
    /// Creates a report from a vector of diagnostics.
    #[must_use]
    pub const fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Creates a single-diagnostic report with no rule attribution.
    #[must_use]
    pub fn single(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            diagnostics: vec![Diagnostic::new(code, message.into(), None, vec![])],
        }
    }

    /// Appends a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Appends every diagnostic from another report.
    pub fn extend(&mut self, other: Self) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Returns the diagnostics in this report.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Returns `true` if the report contains no diagnostics.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Returns the number of diagnostics in the report.
    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }
}

impl From<Diagnostic> for DiagnosticReport {
    fn from(diagnostic: Diagnostic) -> Self {
        Self::new(vec![diagnostic])
    }
}

impl IntoIterator for DiagnosticReport {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}
