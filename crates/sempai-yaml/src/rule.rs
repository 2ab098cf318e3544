//! Validated rule records.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use sempai_core::{
    BooleanExpression, Diagnostic, DiagnosticCode, DiagnosticReport, Language, Operator,
    RuleGlobs,
};

use crate::expression::parse_expression;
use crate::paths::parse_paths;

const ID_KEY: &str = "id";
const MESSAGE_KEY: &str = "message";
const SEVERITY_KEY: &str = "severity";
const LANGUAGES_KEY: &str = "languages";
const METADATA_KEY: &str = "metadata";
const PATHS_KEY: &str = "paths";
const FIX_KEY: &str = "fix";

const REQUIRED_KEYS: [&str; 4] = [ID_KEY, MESSAGE_KEY, SEVERITY_KEY, LANGUAGES_KEY];
const OPTIONAL_KEYS: [&str; 3] = [METADATA_KEY, PATHS_KEY, FIX_KEY];

/// How serious a rule's findings are.
///
/// # Example
///
/// ```
/// use sempai_yaml::Severity;
///
/// assert_eq!(Severity::Info.sarif_level(), "note");
/// assert_eq!("WARNING".parse::<Severity>(), Ok(Severity::Warning));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// A definite problem.
    Error,
    /// A likely problem.
    Warning,
    /// Informational.
    Info,
}

impl Severity {
    /// Returns the SARIF 2.1.0 `level` for this severity.
    #[must_use]
    pub const fn sarif_level(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "note",
        }
    }

    /// Returns the upper-case name used in rule files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "ERROR" => Ok(Self::Error),
            "WARNING" => Ok(Self::Warning),
            "INFO" => Ok(Self::Info),
            other => Err(format!(
                "severity must be one of ERROR, WARNING, INFO, not '{other}'"
            )),
        }
    }
}

/// One validated rule.
#[derive(Debug, Clone)]
pub struct Rule {
    id: String,
    message: String,
    severity: Severity,
    languages: Vec<Language>,
    metadata: Map<String, Value>,
    fix: Option<String>,
    globs: RuleGlobs,
    expression: BooleanExpression,
}

impl Rule {
    /// Validates a raw rule mapping.
    ///
    /// Every problem found is reported, each attributed to the rule id when
    /// the id is a string.
    ///
    /// # Errors
    ///
    /// Returns a report when a required key is missing, an unknown key is
    /// present, a value has the wrong shape, or the pattern clauses do not
    /// form a valid expression.
    pub fn from_mapping(raw: &Map<String, Value>) -> Result<Self, DiagnosticReport> {
        let rule_id = raw.get(ID_KEY).and_then(Value::as_str);
        let mut report = DiagnosticReport::default();
        check_keys(raw, &mut report);
        if !report.is_empty() {
            return Err(attribute(report, rule_id));
        }
        let Some(id) = rule_id else {
            return Err(DiagnosticReport::single(
                DiagnosticCode::ESempaiInvalidRuleId,
                format!("rule id must be a string, but was {}", kind_of(raw.get(ID_KEY))),
            ));
        };

        let message = collect(string_field(raw, MESSAGE_KEY), &mut report);
        let severity = collect(severity_field(raw), &mut report);
        let languages = collect(languages_field(raw), &mut report);
        let metadata = collect(metadata_field(raw), &mut report);
        let fix = collect(fix_field(raw), &mut report);
        let globs = collect(parse_paths(raw.get(PATHS_KEY)).map_err(Into::into), &mut report);
        let expression = collect(parse_expression(raw, id).map_err(Into::into), &mut report);

        match (message, severity, languages, metadata, fix, globs, expression) {
            (
                Some(message),
                Some(severity),
                Some(languages),
                Some(metadata),
                Some(fix),
                Some(globs),
                Some(expression),
            ) => Ok(Self {
                id: id.to_owned(),
                message,
                severity,
                languages,
                metadata,
                fix,
                globs,
                expression,
            }),
            _ => Err(attribute(report, Some(id))),
        }
    }

    /// Returns the rule id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the message template.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the target languages.
    #[must_use]
    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    /// Returns the free-form metadata mapping.
    #[must_use]
    pub const fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Returns the fix template, if any.
    #[must_use]
    pub fn fix(&self) -> Option<&str> {
        self.fix.as_deref()
    }

    /// Returns the path filters.
    #[must_use]
    pub const fn globs(&self) -> &RuleGlobs {
        &self.globs
    }

    /// Returns the expression tree.
    #[must_use]
    pub const fn expression(&self) -> &BooleanExpression {
        &self.expression
    }

    /// Returns the rule with `prefix` prepended to its id.
    ///
    /// Pattern ids inside the expression are unaffected; a top-level
    /// single-pattern leaf keeps the id it was parsed with, which is what
    /// the dispatcher sends.
    #[must_use]
    pub fn with_id_prefix(mut self, prefix: &str) -> Self {
        if !prefix.is_empty() {
            self.id = format!("{prefix}{}", self.id);
        }
        self
    }
}

/// The outcome of loading one rule document.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    valid: Vec<Rule>,
    invalid: DiagnosticReport,
}

impl RuleSet {
    /// Creates a rule set.
    #[must_use]
    pub const fn new(valid: Vec<Rule>, invalid: DiagnosticReport) -> Self {
        Self { valid, invalid }
    }

    /// Returns the rules that validated.
    #[must_use]
    pub fn valid(&self) -> &[Rule] {
        &self.valid
    }

    /// Returns diagnostics for rules that were skipped.
    #[must_use]
    pub const fn invalid(&self) -> &DiagnosticReport {
        &self.invalid
    }

    /// Splits the set into its valid rules and the skipped-rule report.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Rule>, DiagnosticReport) {
        (self.valid, self.invalid)
    }

    /// Merges another set into this one, keeping document order.
    pub fn merge(&mut self, other: Self) {
        self.valid.extend(other.valid);
        self.invalid.extend(other.invalid);
    }

    /// Prefixes every valid rule's id.
    #[must_use]
    pub fn with_id_prefix(self, prefix: &str) -> Self {
        Self {
            valid: self
                .valid
                .into_iter()
                .map(|rule| rule.with_id_prefix(prefix))
                .collect(),
            invalid: self.invalid,
        }
    }
}

fn attribute(report: DiagnosticReport, rule_id: Option<&str>) -> DiagnosticReport {
    DiagnosticReport::new(
        report
            .into_iter()
            .map(|diagnostic| diagnostic.with_rule_id(rule_id))
            .collect(),
    )
}

fn collect<T>(result: Result<T, DiagnosticReport>, report: &mut DiagnosticReport) -> Option<T> {
    result.map_err(|errors| report.extend(errors)).ok()
}

fn check_keys(raw: &Map<String, Value>, report: &mut DiagnosticReport) {
    let missing: Vec<&str> = REQUIRED_KEYS
        .into_iter()
        .filter(|key| !raw.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        report.push(Diagnostic::new(
            DiagnosticCode::ESempaiMissingRuleKey,
            format!("rule is missing required keys: {}", missing.join(", ")),
            None,
            vec![],
        ));
    }

    let allowed = |key: &str| {
        REQUIRED_KEYS.contains(&key)
            || OPTIONAL_KEYS.contains(&key)
            || Operator::TOP_LEVEL.iter().any(|operator| operator.key() == key)
    };
    let mut unknown: Vec<&str> = raw
        .keys()
        .map(String::as_str)
        .filter(|key| !allowed(key))
        .collect();
    unknown.sort_unstable();
    if !unknown.is_empty() {
        report.push(Diagnostic::new(
            DiagnosticCode::ESempaiUnknownRuleKey,
            format!("rule has unknown keys: {}", unknown.join(", ")),
            None,
            vec![format!(
                "allowed keys are {}, {}, and the pattern keys",
                REQUIRED_KEYS.join(", "),
                OPTIONAL_KEYS.join(", ")
            )],
        ));
    }
}

fn schema_error(message: String) -> DiagnosticReport {
    DiagnosticReport::single(DiagnosticCode::ESempaiSchemaInvalid, message)
}

fn string_field(raw: &Map<String, Value>, key: &str) -> Result<String, DiagnosticReport> {
    match raw.get(key) {
        Some(Value::String(text)) => Ok(text.clone()),
        other => Err(schema_error(format!(
            "'{key}' must be a string, but was {}",
            kind_of(other)
        ))),
    }
}

fn severity_field(raw: &Map<String, Value>) -> Result<Severity, DiagnosticReport> {
    string_field(raw, SEVERITY_KEY)?
        .parse()
        .map_err(schema_error)
}

fn languages_field(raw: &Map<String, Value>) -> Result<Vec<Language>, DiagnosticReport> {
    let invalid = || {
        schema_error(format!(
            "'{LANGUAGES_KEY}' must be a non-empty list of strings"
        ))
    };
    let entries = raw
        .get(LANGUAGES_KEY)
        .and_then(Value::as_array)
        .filter(|entries| !entries.is_empty())
        .ok_or_else(invalid)?;
    entries
        .iter()
        .map(|entry| entry.as_str().map(Language::new).ok_or_else(invalid))
        .collect()
}

fn metadata_field(raw: &Map<String, Value>) -> Result<Map<String, Value>, DiagnosticReport> {
    match raw.get(METADATA_KEY) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(metadata)) => Ok(metadata.clone()),
        other => Err(schema_error(format!(
            "'{METADATA_KEY}' must be a mapping, but was {}",
            kind_of(other)
        ))),
    }
}

fn fix_field(raw: &Map<String, Value>) -> Result<Option<String>, DiagnosticReport> {
    match raw.get(FIX_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(fix)) => Ok(Some(fix.clone())),
        other => Err(schema_error(format!(
            "'{FIX_KEY}' must be a string, but was {}",
            kind_of(other)
        ))),
    }
}

/// Names a YAML value's type for error messages.
pub(crate) const fn kind_of(value: Option<&Value>) -> &'static str {
    match value {
        None | Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "a boolean",
        Some(Value::Number(_)) => "a number",
        Some(Value::String(_)) => "a string",
        Some(Value::Array(_)) => "a list",
        Some(Value::Object(_)) => "a mapping",
    }
}
