//! The evaluation engine: dispatches rules to evaluators and assembles reports.

use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info};

use super::{
    CustomEvaluator, DependencyEvaluator, EvaluationError, Evaluator, EvaluatorBox,
    LayeringEvaluator, NamingEvaluator,
};
use crate::cancel::CancellationToken;
use crate::fingerprint::fingerprint;
use crate::graph::PropertyGraph;
use crate::report::ComplianceReport;
use crate::rule::{Rule, RuleProvider, RuleSet, RuleType, Whitelist};

/// Lifecycle of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Not started.
    Idle,
    /// Rules are being evaluated.
    Evaluating,
    /// A report was produced.
    Completed,
    /// The evaluation aborted with an error.
    Failed,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Evaluating => write!(f, "evaluating"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Builder for configuring an [`EvaluationEngine`].
#[derive(Default)]
pub struct EvaluationEngineBuilder {
    evaluators: Vec<EvaluatorBox>,
}

impl EvaluationEngineBuilder {
    /// Creates a builder without evaluators.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an evaluator; earlier registrations win on overlap.
    #[must_use]
    pub fn evaluator<E: Evaluator + 'static>(mut self, evaluator: E) -> Self {
        self.evaluators.push(Box::new(evaluator));
        self
    }

    /// Registers a boxed evaluator.
    #[must_use]
    pub fn evaluator_box(mut self, evaluator: EvaluatorBox) -> Self {
        self.evaluators.push(evaluator);
        self
    }

    /// Builds the engine.
    #[must_use]
    pub fn build(self) -> EvaluationEngine {
        EvaluationEngine {
            evaluators: self.evaluators,
        }
    }
}

/// Evaluates rule sets against a property graph.
///
/// Use [`EvaluationEngine::builder()`] or [`EvaluationEngine::with_defaults()`]
/// to construct an instance. The engine holds no per-evaluation state, so
/// independent calls never interfere.
pub struct EvaluationEngine {
    evaluators: Vec<EvaluatorBox>,
}

impl EvaluationEngine {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> EvaluationEngineBuilder {
        EvaluationEngineBuilder::new()
    }

    /// An engine with the dependency, naming, layering and custom evaluators.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::builder()
            .evaluator(DependencyEvaluator::new())
            .evaluator(NamingEvaluator::new())
            .evaluator(LayeringEvaluator::new())
            .evaluator(CustomEvaluator::new())
            .build()
    }

    /// Names of the registered evaluators.
    #[must_use]
    pub fn evaluator_names(&self) -> Vec<&'static str> {
        self.evaluators.iter().map(|e| e.name()).collect()
    }

    /// Rule types no registered evaluator supports.
    #[must_use]
    pub fn check_coverage(&self) -> Vec<RuleType> {
        RuleType::ALL
            .into_iter()
            .filter(|t| self.evaluator_for(*t).is_none())
            .collect()
    }

    fn evaluator_for(&self, rule_type: RuleType) -> Option<&dyn Evaluator> {
        self.evaluators
            .iter()
            .find(|e| e.supports(rule_type))
            .map(Box::as_ref)
    }

    /// Evaluates the provider's rule sets and whitelist.
    ///
    /// # Errors
    ///
    /// See [`evaluate`](Self::evaluate).
    pub fn evaluate_provider(
        &self,
        graph: &PropertyGraph,
        provider: &dyn RuleProvider,
    ) -> Result<ComplianceReport, EvaluationError> {
        self.evaluate(graph, provider.rule_sets(), provider.whitelist())
    }

    /// Evaluates every rule of every set, in order, and returns the report.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError`] if a rule is malformed, has no evaluator,
    /// or uses an unsupported condition. No partial report is produced.
    pub fn evaluate(
        &self,
        graph: &PropertyGraph,
        rule_sets: &[RuleSet],
        whitelist: &Whitelist,
    ) -> Result<ComplianceReport, EvaluationError> {
        self.evaluate_with_cancel(graph, rule_sets, whitelist, &CancellationToken::new())
    }

    /// Like [`evaluate`](Self::evaluate), checking `cancel` before each rule.
    ///
    /// # Errors
    ///
    /// As [`evaluate`](Self::evaluate), plus [`EvaluationError::Cancelled`].
    pub fn evaluate_with_cancel(
        &self,
        graph: &PropertyGraph,
        rule_sets: &[RuleSet],
        whitelist: &Whitelist,
        cancel: &CancellationToken,
    ) -> Result<ComplianceReport, EvaluationError> {
        let mut state = EngineState::Idle;
        transition(&mut state, EngineState::Evaluating);

        match self.run(graph, rule_sets, whitelist, cancel) {
            Ok(report) => {
                transition(&mut state, EngineState::Completed);
                info!(
                    "Evaluation complete: {} violation(s), passed: {}",
                    report.violations().len(),
                    report.passed()
                );
                Ok(report)
            }
            Err(e) => {
                transition(&mut state, EngineState::Failed);
                Err(e)
            }
        }
    }

    fn run(
        &self,
        graph: &PropertyGraph,
        rule_sets: &[RuleSet],
        whitelist: &Whitelist,
        cancel: &CancellationToken,
    ) -> Result<ComplianceReport, EvaluationError> {
        let rules: Vec<&Rule> = rule_sets.iter().flat_map(|s| s.rules.iter()).collect();
        validate(&rules)?;
        info!(
            "Evaluating {} rule(s) from {} set(s) against {}",
            rules.len(),
            rule_sets.len(),
            graph.id()
        );

        let mut violations = Vec::new();
        for rule in &rules {
            if cancel.is_cancelled() {
                return Err(EvaluationError::Cancelled);
            }
            let evaluator = self.evaluator_for(rule.rule_type).ok_or_else(|| {
                EvaluationError::NoEvaluatorForRuleType {
                    rule_id: rule.id.clone(),
                    rule_type: rule.rule_type,
                }
            })?;
            let found = evaluator.evaluate(graph, rule)?;
            debug!(
                "Rule {} ({}): {} violation(s)",
                rule.id,
                evaluator.name(),
                found.len()
            );
            violations.extend(found);
        }

        let before = violations.len();
        violations.retain(|v| match whitelist.matching(v) {
            Some(entry) => {
                debug!("Suppressed {} ({})", v.id, entry.reason);
                false
            }
            None => true,
        });
        if before != violations.len() {
            info!("Whitelist suppressed {} violation(s)", before - violations.len());
        }

        let report_id = format!(
            "report-{}",
            fingerprint(std::iter::once(graph.id()).chain(rules.iter().map(|r| r.id.as_str())))
        );
        Ok(ComplianceReport::new(
            report_id,
            &graph.metadata().codebase_id,
            graph.metadata().parsed_at,
            violations,
        ))
    }
}

fn transition(state: &mut EngineState, next: EngineState) {
    debug!("Engine state: {} -> {}", state, next);
    *state = next;
}

/// Rejects empty and duplicate rule ids.
fn validate(rules: &[&Rule]) -> Result<(), EvaluationError> {
    let mut seen = HashSet::new();
    for rule in rules {
        if rule.id.trim().is_empty() {
            return Err(EvaluationError::MalformedRule {
                rule_id: rule.id.clone(),
                reason: "rule id must not be empty".to_string(),
            });
        }
        if !seen.insert(rule.id.as_str()) {
            return Err(EvaluationError::MalformedRule {
                rule_id: rule.id.clone(),
                reason: "duplicate rule id".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, EdgeType, GraphMetadata, Node, NodeType};
    use crate::rule::{Condition, RuleSource, WhitelistEntry};
    use crate::types::Severity;

    fn graph() -> PropertyGraph {
        let mut g = PropertyGraph::new(GraphMetadata::new("g", "demo"));
        for id in ["a", "b"] {
            g.add_node(Node::new(id, NodeType::File, id)).unwrap();
        }
        g.add_edge(Edge::between(EdgeType::DependsOn, "a", "b")).unwrap();
        g.add_edge(Edge::between(EdgeType::DependsOn, "b", "a")).unwrap();
        g
    }

    fn cycles_rule(id: &str) -> Rule {
        Rule::new(id, RuleType::Dependency, Severity::Error, Condition::new("no-cycles"))
    }

    fn set(rules: Vec<Rule>) -> Vec<RuleSet> {
        vec![RuleSet {
            rules,
            ..RuleSet::new("test", RuleSource::Custom)
        }]
    }

    #[test]
    fn default_engine_covers_every_rule_type() {
        assert!(EvaluationEngine::with_defaults().check_coverage().is_empty());
        let partial = EvaluationEngine::builder()
            .evaluator(NamingEvaluator::new())
            .build();
        assert_eq!(
            partial.check_coverage(),
            vec![RuleType::Dependency, RuleType::Layering, RuleType::Custom]
        );
    }

    #[test]
    fn missing_evaluator_fails_the_whole_evaluation() {
        let engine = EvaluationEngine::builder()
            .evaluator(NamingEvaluator::new())
            .build();
        let err = engine
            .evaluate(&graph(), &set(vec![cycles_rule("cycles")]), &Whitelist::new())
            .unwrap_err();
        assert_eq!(
            err,
            EvaluationError::NoEvaluatorForRuleType {
                rule_id: "cycles".into(),
                rule_type: RuleType::Dependency,
            }
        );
    }

    #[test]
    fn duplicate_rule_ids_are_malformed() {
        let err = EvaluationEngine::with_defaults()
            .evaluate(
                &graph(),
                &set(vec![cycles_rule("x"), cycles_rule("x")]),
                &Whitelist::new(),
            )
            .unwrap_err();
        assert!(matches!(err, EvaluationError::MalformedRule { .. }));
    }

    #[test]
    fn whitelist_suppression_keeps_ids_stable() {
        let engine = EvaluationEngine::with_defaults();
        let rule = Rule::new(
            "deps",
            RuleType::Dependency,
            Severity::Warning,
            Condition::new("dependency"),
        );
        let full = engine
            .evaluate(&graph(), &set(vec![rule.clone()]), &Whitelist::new())
            .unwrap();
        assert_eq!(full.violations().len(), 2);

        let whitelist: Whitelist = [WhitelistEntry::new(
            "deps",
            Some(crate::pattern::GlobPattern::new("a").unwrap()),
            "known",
        )]
        .into_iter()
        .collect();
        let filtered = engine
            .evaluate(&graph(), &set(vec![rule]), &whitelist)
            .unwrap();
        assert_eq!(filtered.violations().len(), 1);
        assert_eq!(filtered.violations()[0].id, "deps#1");
        assert_eq!(filtered.violations()[0], full.violations()[1]);
    }

    #[test]
    fn cancelled_evaluation_returns_no_report() {
        let token = CancellationToken::new();
        token.cancel();
        let err = EvaluationEngine::with_defaults()
            .evaluate_with_cancel(
                &graph(),
                &set(vec![cycles_rule("cycles")]),
                &Whitelist::new(),
                &token,
            )
            .unwrap_err();
        assert_eq!(err, EvaluationError::Cancelled);
    }

    #[test]
    fn report_is_a_pure_function_of_inputs() {
        let engine = EvaluationEngine::with_defaults();
        let g = graph();
        let sets = set(vec![cycles_rule("cycles")]);
        let first = serde_json::to_string(&engine.evaluate(&g, &sets, &Whitelist::new()).unwrap())
            .unwrap();
        let second = serde_json::to_string(&engine.evaluate(&g, &sets, &Whitelist::new()).unwrap())
            .unwrap();
        assert_eq!(first, second);
        assert!(first.contains("\"passed\":false"));
    }
}
