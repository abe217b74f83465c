//! Naming rules.

use super::conditions::NamingCondition;
use super::{parse_condition, EvaluationError, Evaluator, Findings};
use crate::graph::{Node, NodeType, PropertyGraph};
use crate::rule::{Rule, RuleType};
use crate::types::{Location, Violation};

/// Evaluates `naming` conditions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamingEvaluator;

impl NamingEvaluator {
    /// Creates the evaluator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// The part of a node name the style applies to.
///
/// Files are checked on the name before the first `.`; dotfiles are skipped.
fn checked_name(node: &Node) -> Option<&str> {
    if node.node_type != NodeType::File {
        return Some(&node.name);
    }
    if node.name.starts_with('.') {
        return None;
    }
    node.name.split('.').next().filter(|stem| !stem.is_empty())
}

impl Evaluator for NamingEvaluator {
    fn name(&self) -> &'static str {
        "naming"
    }

    fn supports(&self, rule_type: RuleType) -> bool {
        rule_type == RuleType::Naming
    }

    fn evaluate(
        &self,
        graph: &PropertyGraph,
        rule: &Rule,
    ) -> Result<Vec<Violation>, EvaluationError> {
        if rule.condition.kind != "naming" {
            return Err(EvaluationError::unsupported(rule));
        }
        let condition: NamingCondition = parse_condition(rule)?;
        let target = condition.target();
        let mut findings = Findings::new(rule);

        for node in graph.nodes().filter(|n| target.matches(n)) {
            if condition.ignore.iter().any(|p| p.matches(&node.name)) {
                continue;
            }
            let Some(name) = checked_name(node) else {
                continue;
            };
            if !condition.style.matches(name) {
                findings.push(
                    Location::Node {
                        node_id: node.id.clone(),
                        path: node.path().to_string(),
                    },
                    format!(
                        "`{}` does not follow {} naming",
                        node.name,
                        condition.style.as_str()
                    ),
                );
            }
        }
        Ok(findings.into_violations())
    }
}
