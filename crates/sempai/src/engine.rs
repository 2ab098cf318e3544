//! The engine: load rules, dispatch leaves, evaluate, resolve.
//!
//! [`Engine::compile_yaml`] validates a rule document.  [`Engine::run`]
//! sends every leaf pattern to the [`Backend`] once per language, groups
//! the matches by rule and file, evaluates each rule's expression per file,
//! and resolves the surviving ranges into deduplicated [`Finding`]s.

use std::collections::BTreeMap;
use std::fmt;

use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::{debug, info, warn};

use sempai_core::{EngineConfig, MatchIndex, Operator};
use sempai_yaml::{Rule, RuleSet, load_rules};

use crate::backend::{Backend, BackendRequest, ReportedError, TargetFilters};
use crate::dispatch::{self, LanguageBatch};
use crate::error::{BackendError, EngineError};
use crate::evaluate::Evaluator;
use crate::predicate::{DenySidePredicates, ExpressionPredicates, SidePredicate};
use crate::resolve::{Finding, Resolver, dedup, is_test_path};

/// Tracing target for engine runs.
const ENGINE_TARGET: &str = "sempai::engine";

/// Everything one run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunOutput {
    #[serde(rename = "results")]
    findings: Vec<Finding>,
    errors: Vec<ReportedError>,
    #[serde(skip)]
    excluded_test_findings: usize,
}

impl RunOutput {
    /// Returns the findings, grouped by rule in rule order.
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Returns the non-fatal errors the matcher reported.
    #[must_use]
    pub fn errors(&self) -> &[ReportedError] {
        &self.errors
    }

    /// Returns how many findings were dropped for being in test paths.
    #[must_use]
    pub const fn excluded_test_findings(&self) -> usize {
        self.excluded_test_findings
    }
}

/// Evaluates boolean rules using an external structural matcher.
///
/// The side-predicate capability is fixed at construction: [`Engine::new`]
/// grants it only when the configuration allows side-predicates.
///
/// # Example
///
/// ```
/// use camino::Utf8PathBuf;
/// use sempai::backend::{Backend, BackendRequest, BackendResponse, TargetFilters};
/// use sempai::{BackendError, Engine, EngineConfig};
///
/// struct NoMatches;
///
/// impl Backend for NoMatches {
///     fn run(&self, _request: &BackendRequest) -> Result<BackendResponse, BackendError> {
///         Ok(BackendResponse::default())
///     }
/// }
///
/// let engine = Engine::new(EngineConfig::default(), NoMatches);
/// let rules = engine.compile_yaml("rules: []")?;
/// let targets = [Utf8PathBuf::from("src")];
/// let output = engine.run(rules.valid(), &targets, &TargetFilters::default())?;
/// assert!(output.findings().is_empty());
/// # Ok::<(), sempai::EngineError>(())
/// ```
pub struct Engine<B> {
    config: EngineConfig,
    backend: B,
    predicates: Box<dyn SidePredicate>,
}

impl<B> fmt::Debug for Engine<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<B: Backend> Engine<B> {
    /// Creates an engine, granting side-predicates only if `config`
    /// allows them.
    #[must_use]
    pub fn new(config: EngineConfig, backend: B) -> Self {
        let predicates: Box<dyn SidePredicate> = if config.allow_side_predicates() {
            Box::new(ExpressionPredicates)
        } else {
            Box::new(DenySidePredicates)
        };
        Self::with_predicates(config, backend, predicates)
    }

    /// Creates an engine with an explicit side-predicate capability.
    #[must_use]
    pub fn with_predicates(
        config: EngineConfig,
        backend: B,
        predicates: Box<dyn SidePredicate>,
    ) -> Self {
        Self {
            config,
            backend,
            predicates,
        }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validates a rule document.
    ///
    /// Invalid rules are returned in [`RuleSet::invalid`] unless strict
    /// mode is on.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Schema`] when the document cannot be loaded,
    /// or when any rule is invalid in strict mode.
    pub fn compile_yaml(&self, yaml: &str) -> Result<RuleSet, EngineError> {
        let rules = load_rules(yaml)?;
        if self.config.strict() && !rules.invalid().is_empty() {
            return Err(EngineError::Schema(rules.invalid().clone()));
        }
        Ok(rules)
    }

    /// Runs `rules` over `targets`.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] when a rule needs side-predicates the
    /// engine was not granted, the matcher fails, the matcher's answer
    /// breaks the dispatch contract, a side-predicate misbehaves, or, in
    /// strict mode, the matcher reports any error.
    pub fn run(
        &self,
        rules: &[Rule],
        targets: &[Utf8PathBuf],
        filters: &TargetFilters,
    ) -> Result<RunOutput, EngineError> {
        self.check_side_predicates(rules)?;
        let plan = dispatch::plan(rules);

        let mut by_rule: BTreeMap<usize, BTreeMap<String, MatchIndex>> = BTreeMap::new();
        let mut errors = Vec::new();
        for batch in plan.batches() {
            let request = BackendRequest {
                language: batch.language().clone(),
                patterns: batch.records(),
                targets: targets.to_vec(),
                filters: filters.clone(),
            };
            let response = self
                .backend
                .run(&request)
                .map_err(|err| attribute(err, batch, rules))?;
            debug!(
                target: ENGINE_TARGET,
                language = %batch.language(),
                matches = response.matches.len(),
                errors = response.errors.len(),
                "matcher finished"
            );
            for raw in response.matches {
                let found = plan.ledger().decode(batch.language(), raw)?;
                by_rule
                    .entry(found.rule_index())
                    .or_default()
                    .entry(found.path().to_owned())
                    .or_default()
                    .insert(found);
            }
            for error in &response.errors {
                warn!(
                    target: ENGINE_TARGET,
                    check_id = error.check_id.as_deref().unwrap_or("-"),
                    path = error.path.as_deref().unwrap_or("-"),
                    message = error.message().unwrap_or("-"),
                    "matcher reported an error"
                );
            }
            errors.extend(response.errors);
        }

        let evaluator = Evaluator::new(self.predicates.as_ref());
        let resolver = Resolver::new(self.config.autofix());
        let mut findings = Vec::new();
        for (rule_index, rule) in rules.iter().enumerate() {
            let Some(files) = by_rule.get(&rule_index) else {
                continue;
            };
            let mut rule_findings = Vec::new();
            for (path, index) in files {
                let surviving = evaluator.evaluate(rule.expression(), index).map_err(|source| {
                    EngineError::Evaluation {
                        rule_id: rule.id().to_owned(),
                        path: path.clone(),
                        source: Box::new(source),
                    }
                })?;
                rule_findings.extend(resolver.resolve(rule, index, &surviving));
            }
            findings.extend(dedup(rule_findings));
        }

        let excluded_test_findings = self.exclude_tests(&mut findings);
        if self.config.strict() && !errors.is_empty() {
            return Err(EngineError::StrictBackendErrors {
                count: errors.len(),
            });
        }
        info!(
            target: ENGINE_TARGET,
            rules = rules.len(),
            findings = findings.len(),
            errors = errors.len(),
            "run complete"
        );
        Ok(RunOutput {
            findings,
            errors,
            excluded_test_findings,
        })
    }

    /// Fails before dispatch when a rule needs a capability the engine
    /// lacks.
    fn check_side_predicates(&self, rules: &[Rule]) -> Result<(), EngineError> {
        for rule in rules {
            for leaf in rule.expression().leaves() {
                if leaf.operator() == Operator::Where {
                    self.predicates.ensure_enabled(leaf.operand())?;
                }
            }
        }
        Ok(())
    }

    fn exclude_tests(&self, findings: &mut Vec<Finding>) -> usize {
        if !self.config.exclude_tests() {
            return 0;
        }
        let before = findings.len();
        findings.retain(|finding| !is_test_path(finding.path()));
        let excluded = before.saturating_sub(findings.len());
        if excluded > 0 {
            warn!(
                target: ENGINE_TARGET,
                excluded,
                "ignored results in tests due to exclude-tests"
            );
        }
        excluded
    }
}

/// Names the rule behind an invalid-pattern error.
///
/// The check id the matcher reported wins; otherwise the pattern text is
/// used, but only when a single rule in the batch owns that text.
fn attribute(error: BackendError, batch: &LanguageBatch, rules: &[Rule]) -> BackendError {
    let BackendError::InvalidPattern {
        check_id, pattern, ..
    } = &error
    else {
        return error;
    };
    let owner = check_id
        .as_deref()
        .and_then(|reported| {
            batch
                .patterns()
                .iter()
                .find(|request| request.check_id().to_string() == reported)
        })
        .map(|request| request.check_id().rule_index())
        .or_else(|| sole_owner(batch, pattern))
        .and_then(|rule_index| rules.get(rule_index));
    let Some(rule) = owner else {
        return error;
    };
    error.with_rule_id(rule.id())
}

fn sole_owner(batch: &LanguageBatch, pattern: &str) -> Option<usize> {
    let mut owners = batch
        .patterns()
        .iter()
        .filter(|request| request.pattern() == pattern)
        .map(|request| request.check_id().rule_index());
    let first = owners.next()?;
    owners.all(|other| other == first).then_some(first)
}
