//! Condition evaluators and the evaluation engine.

mod conditions;
mod custom;
mod cycles;
mod dependency;
mod engine;
mod layering;
mod naming;

pub use conditions::{
    CycleCondition, DependencyCondition, FanOutCondition, Flow, LayeringCondition,
    NamingCondition, NamingStyle, SelectCondition,
};
pub use custom::CustomEvaluator;
pub use cycles::find_cycles;
pub use dependency::DependencyEvaluator;
pub use engine::{EngineState, EvaluationEngine, EvaluationEngineBuilder};
pub use layering::LayeringEvaluator;
pub use naming::NamingEvaluator;

use miette::Diagnostic;

use crate::graph::PropertyGraph;
use crate::rule::{Rule, RuleType};
use crate::types::{Location, Violation};

/// Errors that abort an evaluation. No partial report is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Diagnostic)]
pub enum EvaluationError {
    /// No registered evaluator handles the rule's type.
    #[error("no evaluator registered for rule type `{rule_type}` (rule `{rule_id}`)")]
    #[diagnostic(
        code(c3::evaluate::no_evaluator),
        help("register an evaluator for this rule type on the engine builder")
    )]
    NoEvaluatorForRuleType {
        /// The rule that could not be dispatched.
        rule_id: String,
        /// Its type.
        rule_type: RuleType,
    },

    /// The evaluator does not know the condition kind.
    #[error("rule `{rule_id}`: condition `{kind}` is not supported for {rule_type} rules")]
    #[diagnostic(code(c3::evaluate::unsupported_condition))]
    UnsupportedCondition {
        /// The rule.
        rule_id: String,
        /// Its type.
        rule_type: RuleType,
        /// The condition kind.
        kind: String,
    },

    /// The rule is structurally invalid or its parameters do not parse.
    #[error("rule `{rule_id}` is malformed: {reason}")]
    #[diagnostic(
        code(c3::evaluate::malformed_rule),
        help("check the rule's condition parameters against the documented fields")
    )]
    MalformedRule {
        /// The rule.
        rule_id: String,
        /// What is wrong.
        reason: String,
    },

    /// The caller cancelled the evaluation.
    #[error("evaluation cancelled")]
    #[diagnostic(code(c3::evaluate::cancelled))]
    Cancelled,
}

impl EvaluationError {
    pub(crate) fn unsupported(rule: &Rule) -> Self {
        Self::UnsupportedCondition {
            rule_id: rule.id.clone(),
            rule_type: rule.rule_type,
            kind: rule.condition.kind.clone(),
        }
    }

    pub(crate) fn malformed(rule: &Rule, reason: impl ToString) -> Self {
        Self::MalformedRule {
            rule_id: rule.id.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Checks a graph against one rule.
///
/// Evaluators are pure: same graph and rule, same violations in the same
/// order.
pub trait Evaluator: Send + Sync {
    /// Evaluator name, for logs.
    fn name(&self) -> &'static str;

    /// Whether this evaluator handles rules of the given type.
    fn supports(&self, rule_type: RuleType) -> bool;

    /// Returns the rule's violations in discovery order.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::UnsupportedCondition`] for unknown condition
    /// kinds and [`EvaluationError::MalformedRule`] for bad parameters.
    fn evaluate(&self, graph: &PropertyGraph, rule: &Rule)
        -> Result<Vec<Violation>, EvaluationError>;
}

/// Type alias for boxed evaluator trait objects.
pub type EvaluatorBox = Box<dyn Evaluator>;

/// Collects one rule's violations, numbering them in discovery order.
pub(crate) struct Findings<'r> {
    rule: &'r Rule,
    violations: Vec<Violation>,
}

impl<'r> Findings<'r> {
    pub(crate) fn new(rule: &'r Rule) -> Self {
        Self {
            rule,
            violations: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, location: Location, detail: impl Into<String>) {
        let detail = detail.into();
        let message = match &self.rule.message {
            Some(message) => format!("{message} ({detail})"),
            None => detail,
        };
        let id = format!("{}#{}", self.rule.id, self.violations.len());
        let mut violation =
            Violation::new(id, &self.rule.id, self.rule.severity, location, message);
        if let Some(doc_ref) = &self.rule.doc_ref {
            violation = violation.with_doc_ref(doc_ref);
        }
        self.violations.push(violation);
    }

    pub(crate) fn into_violations(self) -> Vec<Violation> {
        self.violations
    }
}

/// Parses a rule's condition into a typed condition.
pub(crate) fn parse_condition<T: serde::de::DeserializeOwned>(
    rule: &Rule,
) -> Result<T, EvaluationError> {
    rule.condition
        .parse()
        .map_err(|e| EvaluationError::malformed(rule, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Condition;
    use crate::types::Severity;

    #[test]
    fn findings_number_and_decorate_violations() {
        let rule = Rule::new(
            "no-db",
            RuleType::Dependency,
            Severity::Warning,
            Condition::new("dependency"),
        )
        .with_message("Domain must stay pure")
        .with_doc_ref("ARCHITECTURE.md#layers");

        let mut findings = Findings::new(&rule);
        let loc = Location::Graph {
            graph_id: "g".into(),
        };
        findings.push(loc.clone(), "first");
        findings.push(loc, "second");
        let violations = findings.into_violations();

        assert_eq!(violations[0].id, "no-db#0");
        assert_eq!(violations[1].id, "no-db#1");
        assert_eq!(violations[1].message, "Domain must stay pure (second)");
        assert_eq!(violations[0].severity, Severity::Warning);
        assert_eq!(violations[0].doc_ref.as_deref(), Some("ARCHITECTURE.md#layers"));
    }
}
