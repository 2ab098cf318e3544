//! Pattern dispatch: which leaves go to the matcher, and how the answers
//! come back.
//!
//! [`flatten`] walks an expression tree in document order, yielding a
//! [`FlatNode`] for every node.  Group nodes appear as placeholders so the
//! shape of the tree can be rebuilt from the flat list; only nodes for
//! which [`FlatNode::should_send`] holds reach the matcher.
//!
//! [`plan`] gathers the sendable leaves of every rule into one
//! [`LanguageBatch`] per language, in first-seen order, and records each
//! dispatched [`CheckId`] in a [`Ledger`].  The ledger later decodes the
//! matcher's answers, rejecting any check id this run never sent.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use sempai_core::{
    BooleanExpression, CheckId, Language, Operator, PatternId, PatternMatch, Span,
};
use sempai_yaml::Rule;

use crate::backend::{INTERNAL_MESSAGE, PatternRecord, RawMatch};
use crate::error::InternalError;

/// Tracing target for dispatch.
const DISPATCH_TARGET: &str = "sempai::dispatch";

/// One node of a flattened expression tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatNode<'e> {
    operator: Operator,
    pattern_id: Option<&'e PatternId>,
    operand: Option<&'e str>,
}

impl<'e> FlatNode<'e> {
    /// Returns the node's operator.
    #[must_use]
    pub const fn operator(&self) -> Operator {
        self.operator
    }

    /// Returns the leaf's pattern id, or `None` for a placeholder.
    #[must_use]
    pub const fn pattern_id(&self) -> Option<&'e PatternId> {
        self.pattern_id
    }

    /// Returns the leaf's pattern text, or `None` for a placeholder.
    #[must_use]
    pub const fn operand(&self) -> Option<&'e str> {
        self.operand
    }

    /// Returns `true` for a leaf the matcher must run: it has a pattern id
    /// and operand and is not a side-predicate.
    #[must_use]
    pub fn should_send(&self) -> bool {
        self.pattern_id.is_some() && self.operand.is_some() && self.operator != Operator::Where
    }
}

/// Flattens `expression` into pre-order nodes.
///
/// # Example
///
/// ```
/// use sempai::dispatch::flatten;
/// use sempai_core::{BooleanExpression, Operator, PatternId};
///
/// let tree = BooleanExpression::group(
///     Operator::AndAll,
///     vec![
///         BooleanExpression::leaf(Operator::And, PatternId::new("0"), "f($X)")?,
///         BooleanExpression::leaf(Operator::Where, PatternId::new("1"), "True")?,
///     ],
/// )?;
/// let nodes = flatten(&tree);
/// assert_eq!(nodes.len(), 3);
/// assert_eq!(nodes.iter().filter(|node| node.should_send()).count(), 1);
/// # Ok::<(), sempai_core::ExpressionError>(())
/// ```
#[must_use]
pub fn flatten(expression: &BooleanExpression) -> Vec<FlatNode<'_>> {
    let mut nodes = Vec::new();
    let mut stack = vec![expression];
    while let Some(node) = stack.pop() {
        nodes.push(FlatNode {
            operator: node.operator(),
            pattern_id: node.pattern_id(),
            operand: node.operand(),
        });
        if let Some(children) = node.children() {
            stack.extend(children.iter().rev());
        }
    }
    nodes
}

/// A leaf pattern bound for the matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRequest {
    check_id: CheckId,
    operator: Operator,
    pattern: String,
    severity: String,
    languages: Vec<Language>,
}

impl PatternRequest {
    /// Returns the check id the matcher will report matches under.
    #[must_use]
    pub const fn check_id(&self) -> &CheckId {
        &self.check_id
    }

    /// Returns the pattern text.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Converts the request to its rules-file record.
    #[must_use]
    pub fn to_record(&self) -> PatternRecord {
        let (pattern, pattern_regex) = if self.operator == Operator::Regex {
            (None, Some(self.pattern.clone()))
        } else {
            (Some(self.pattern.clone()), None)
        };
        PatternRecord {
            id: self.check_id.to_string(),
            pattern,
            pattern_regex,
            severity: self.severity.clone(),
            languages: self.languages.iter().map(ToString::to_string).collect(),
            message: String::from(INTERNAL_MESSAGE),
        }
    }
}

/// Every pattern to run for one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageBatch {
    language: Language,
    patterns: Vec<PatternRequest>,
}

impl LanguageBatch {
    /// Returns the batch language.
    #[must_use]
    pub const fn language(&self) -> &Language {
        &self.language
    }

    /// Returns the patterns in dispatch order.
    #[must_use]
    pub fn patterns(&self) -> &[PatternRequest] {
        &self.patterns
    }

    /// Returns the rules-file records for the batch.
    #[must_use]
    pub fn records(&self) -> Vec<PatternRecord> {
        self.patterns.iter().map(PatternRequest::to_record).collect()
    }
}

/// The check ids dispatched in one run, with the languages each was sent
/// for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    dispatched: BTreeMap<CheckId, BTreeSet<Language>>,
}

impl Ledger {
    /// Records `check_id` as sent in the batch for `language`.
    pub fn record(&mut self, language: Language, check_id: CheckId) {
        self.dispatched.entry(check_id).or_default().insert(language);
    }

    /// Returns `true` when `check_id` was sent in the batch for `language`.
    #[must_use]
    pub fn contains(&self, language: &Language, check_id: &CheckId) -> bool {
        self.dispatched
            .get(check_id)
            .is_some_and(|languages| languages.contains(language))
    }

    /// Returns the number of dispatched check ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dispatched.len()
    }

    /// Returns `true` when nothing was dispatched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dispatched.is_empty()
    }

    /// Decodes one match returned for the `language` batch.
    ///
    /// # Errors
    ///
    /// Returns an [`InternalError`] when the check id is malformed or was
    /// never dispatched for `language`.
    pub fn decode(
        &self,
        language: &Language,
        raw: RawMatch,
    ) -> Result<PatternMatch, InternalError> {
        let check_id: CheckId = raw.check_id.parse()?;
        if !self.contains(language, &check_id) {
            return Err(InternalError::UndispatchedPattern {
                check_id: raw.check_id,
            });
        }
        Ok(PatternMatch::new(
            check_id,
            raw.path,
            Span::new(raw.start, raw.end),
            raw.extra.metavars,
        ))
    }
}

/// Everything the engine sends to the matcher for a set of rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchPlan {
    batches: Vec<LanguageBatch>,
    ledger: Ledger,
}

impl DispatchPlan {
    /// Returns the per-language batches in first-seen language order.
    #[must_use]
    pub fn batches(&self) -> &[LanguageBatch] {
        &self.batches
    }

    /// Returns the dispatched check ids.
    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}

/// Collects the sendable leaves of `rules` into per-language batches.
///
/// A rule's position in `rules` is its rule index.  A leaf of a rule with
/// several languages is sent once per language.  Pattern order within a
/// batch follows rule order, then document order within a rule.
#[must_use]
pub fn plan(rules: &[Rule]) -> DispatchPlan {
    let mut dispatch = DispatchPlan::default();
    for (rule_index, rule) in rules.iter().enumerate() {
        for node in flatten(rule.expression()) {
            if !node.should_send() {
                continue;
            }
            let (Some(pattern_id), Some(operand)) = (node.pattern_id(), node.operand()) else {
                continue;
            };
            let request = PatternRequest {
                check_id: CheckId::new(rule_index, pattern_id.clone()),
                operator: node.operator(),
                pattern: operand.to_owned(),
                severity: rule.severity().to_string(),
                languages: rule.languages().to_vec(),
            };
            for language in rule.languages() {
                dispatch
                    .ledger
                    .record(language.clone(), request.check_id.clone());
                let position = batch_position(&mut dispatch.batches, language);
                if let Some(batch) = dispatch.batches.get_mut(position) {
                    batch.patterns.push(request.clone());
                }
            }
        }
    }
    debug!(
        target: DISPATCH_TARGET,
        rules = rules.len(),
        languages = dispatch.batches.len(),
        patterns = dispatch.ledger.len(),
        "planned dispatch"
    );
    dispatch
}

fn batch_position(batches: &mut Vec<LanguageBatch>, language: &Language) -> usize {
    batches
        .iter()
        .position(|batch| &batch.language == language)
        .unwrap_or_else(|| {
            batches.push(LanguageBatch {
                language: language.clone(),
                patterns: Vec::new(),
            });
            batches.len().saturating_sub(1)
        })
}
