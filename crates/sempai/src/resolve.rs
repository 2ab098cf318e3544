//! Turns surviving ranges back into findings.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use sempai_core::{LineCol, MatchIndex, RangeSet};
use sempai_yaml::{Rule, Severity};

/// A rule match as presented to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    check_id: String,
    path: String,
    start: LineCol,
    end: LineCol,
    extra: FindingExtra,
}

/// The presentational part of a finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingExtra {
    message: String,
    severity: Severity,
    metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fix: Option<String>,
}

/// Identity used to drop duplicate findings.
type FindingKey = (String, String, u32, u32, u32, u32);

impl Finding {
    /// Returns the id of the rule that matched.
    #[must_use]
    pub fn check_id(&self) -> &str {
        &self.check_id
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the start position.
    #[must_use]
    pub const fn start(&self) -> LineCol {
        self.start
    }

    /// Returns the end position.
    #[must_use]
    pub const fn end(&self) -> LineCol {
        self.end
    }

    /// Returns the message with metavariables substituted.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.extra.message
    }

    /// Returns the rule severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.extra.severity
    }

    /// Returns the rule metadata.
    #[must_use]
    pub const fn metadata(&self) -> &Map<String, Value> {
        &self.extra.metadata
    }

    /// Returns the substituted fix, when autofix is on and the rule has one.
    #[must_use]
    pub fn fix(&self) -> Option<&str> {
        self.extra.fix.as_deref()
    }

    fn key(&self) -> FindingKey {
        (
            self.check_id.clone(),
            self.path.clone(),
            self.start.line,
            self.start.col,
            self.end.line,
            self.end.col,
        )
    }
}

/// Maps evaluated ranges to findings for one rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolver {
    autofix: bool,
}

impl Resolver {
    /// Creates a resolver; with `autofix` findings carry fix text.
    #[must_use]
    pub const fn new(autofix: bool) -> Self {
        Self { autofix }
    }

    /// Returns a finding for every match in `index` whose range survived
    /// evaluation and whose path passes the rule's globs.
    ///
    /// Findings are not deduplicated; see [`dedup`].
    #[must_use]
    pub fn resolve(&self, rule: &Rule, index: &MatchIndex, surviving: &RangeSet) -> Vec<Finding> {
        index
            .iter()
            .filter(|found| surviving.contains(found.range()))
            .filter(|found| rule.globs().matches(found.path()))
            .map(|found| {
                let bindings = found.metavar_text();
                Finding {
                    check_id: rule.id().to_owned(),
                    path: found.path().to_owned(),
                    start: found.span().start.line_col(),
                    end: found.span().end.line_col(),
                    extra: FindingExtra {
                        message: substitute(rule.message(), &bindings),
                        severity: rule.severity(),
                        metadata: rule.metadata().clone(),
                        fix: rule
                            .fix()
                            .filter(|_| self.autofix)
                            .map(|fix| substitute(fix, &bindings)),
                    },
                }
            })
            .collect()
    }
}

/// Replaces every bound metavariable name in `template` with its text.
///
/// Longer names are replaced first so `$XY` is not clobbered by `$X`.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
///
/// use sempai::resolve::substitute;
///
/// let bindings = BTreeMap::from([
///     (String::from("$X"), String::from("a")),
///     (String::from("$XY"), String::from("b")),
/// ]);
/// assert_eq!(substitute("$X then $XY", &bindings), "a then b");
/// ```
#[must_use]
pub fn substitute(template: &str, bindings: &BTreeMap<String, String>) -> String {
    let mut names: Vec<(&String, &String)> = bindings.iter().collect();
    names.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    names
        .into_iter()
        .fold(template.to_owned(), |text, (name, value)| text.replace(name.as_str(), value))
}

/// Drops findings that repeat an earlier one's rule id, path, and start
/// and end positions.  The first occurrence wins.
#[must_use]
pub fn dedup(findings: Vec<Finding>) -> Vec<Finding> {
    let mut seen: HashSet<FindingKey> = HashSet::new();
    findings
        .into_iter()
        .filter(|finding| seen.insert(finding.key()))
        .collect()
}

/// Returns `true` when a path component mentions `test` or `example`.
///
/// # Example
///
/// ```
/// use sempai::resolve::is_test_path;
///
/// assert!(is_test_path("src/tests/helpers.py"));
/// assert!(is_test_path("examples/demo.py"));
/// assert!(!is_test_path("src/app.py"));
/// ```
#[must_use]
pub fn is_test_path(path: &str) -> bool {
    camino::Utf8Path::new(path)
        .components()
        .any(|part| part.as_str().contains("test") || part.as_str().contains("example"))
}
