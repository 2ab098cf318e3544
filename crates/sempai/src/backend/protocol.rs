//! Wire types exchanged with the structural matcher.

use std::collections::BTreeMap;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use sempai_core::{Language, MetavarValue, Position};

/// Placeholder message sent with every pattern; findings take their
/// message from the rule.
pub(crate) const INTERNAL_MESSAGE: &str = "<internalonly>";

/// One pattern as written to the matcher's rules file.
///
/// Field order is significant to the matcher and is preserved by
/// serialisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRecord {
    /// The check id, `"<rule_index>.<pattern_id>"`.
    pub id: String,
    /// Structural pattern text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Regular-expression pattern text.
    #[serde(
        rename = "pattern-regex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pattern_regex: Option<String>,
    /// Rule severity.
    pub severity: String,
    /// Languages the pattern applies to.
    pub languages: Vec<String>,
    /// Always [`INTERNAL_MESSAGE`].
    pub message: String,
}

/// Caller-supplied filters forwarded to the matcher's file walker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetFilters {
    /// Only files matching one of these globs are scanned.
    pub include: Vec<String>,
    /// Files matching these globs are skipped.
    pub exclude: Vec<String>,
    /// Directories matching these globs are skipped.
    pub exclude_dirs: Vec<String>,
}

/// One matcher invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendRequest {
    /// Language every pattern is parsed as.
    pub language: Language,
    /// Patterns in dispatch order.
    pub patterns: Vec<PatternRecord>,
    /// Files and directories to scan.
    pub targets: Vec<Utf8PathBuf>,
    /// Target filters.
    pub filters: TargetFilters,
}

/// A successful matcher response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendResponse {
    /// Every match, for every pattern.
    #[serde(default)]
    pub matches: Vec<RawMatch>,
    /// Non-fatal problems, such as files that failed to parse.
    #[serde(default)]
    pub errors: Vec<ReportedError>,
}

/// One match as reported by the matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMatch {
    /// `"<rule_index>.<pattern_id>"`.
    pub check_id: String,
    /// File the match is in.
    pub path: String,
    /// Start of the match.
    pub start: Position,
    /// End of the match.
    pub end: Position,
    /// Metavariable bindings.
    #[serde(default)]
    pub extra: MatchExtra,
}

/// The `extra` section of a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchExtra {
    /// Bindings keyed by metavariable name, such as `$X`.
    #[serde(default)]
    pub metavars: BTreeMap<String, MetavarValue>,
}

/// A non-fatal error inside a successful response.
///
/// Only the fields Sempai reads are typed; the rest is kept so errors can
/// be passed through to output unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedError {
    /// Check id the error concerns, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_id: Option<String>,
    /// File the error concerns, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Every other field.
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl ReportedError {
    /// Returns the matcher's message, from `extra.message` or `message`.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.rest
            .get("extra")
            .and_then(|extra| extra.get("message"))
            .or_else(|| self.rest.get("message"))
            .and_then(Value::as_str)
    }
}

/// The JSON object a matcher prints when it exits unsuccessfully.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FatalError {
    /// Error type, such as `invalid pattern`.
    pub error: String,
    /// Offending pattern, for `invalid pattern`.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Check id of the offending pattern, for `invalid pattern`.
    #[serde(default)]
    pub pattern_id: Option<String>,
    /// Offending language, for `invalid language`.
    #[serde(default)]
    pub language: Option<String>,
    /// Explanation.
    #[serde(default)]
    pub message: Option<String>,
}
