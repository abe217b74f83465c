//! User-defined structural rules.

use std::collections::BTreeSet;

use super::conditions::{DependencyCondition, FanOutCondition, SelectCondition};
use super::dependency::check_dependency;
use super::{parse_condition, EvaluationError, Evaluator, Findings};
use crate::graph::PropertyGraph;
use crate::rule::{Rule, RuleType};
use crate::types::{Location, Violation};

/// Evaluates custom rules: `dependency`, `forbid-node`, `require-node` and
/// `max-fan-out`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomEvaluator;

impl CustomEvaluator {
    /// Creates the evaluator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for CustomEvaluator {
    fn name(&self) -> &'static str {
        "custom"
    }

    fn supports(&self, rule_type: RuleType) -> bool {
        rule_type == RuleType::Custom
    }

    fn evaluate(
        &self,
        graph: &PropertyGraph,
        rule: &Rule,
    ) -> Result<Vec<Violation>, EvaluationError> {
        let mut findings = Findings::new(rule);
        match rule.condition.kind.as_str() {
            "dependency" => {
                let condition: DependencyCondition = parse_condition(rule)?;
                check_dependency(graph, &condition, &mut findings);
            }
            "forbid-node" => {
                let condition: SelectCondition = parse_condition(rule)?;
                for node in graph.nodes().filter(|n| condition.select.matches(n)) {
                    findings.push(
                        Location::Node {
                            node_id: node.id.clone(),
                            path: node.path().to_string(),
                        },
                        format!("forbidden {} `{}`", node.node_type, node.name),
                    );
                }
            }
            "require-node" => {
                let condition: SelectCondition = parse_condition(rule)?;
                if !graph.nodes().any(|n| condition.select.matches(n)) {
                    findings.push(
                        Location::Graph {
                            graph_id: graph.id().to_string(),
                        },
                        "required node not found",
                    );
                }
            }
            "max-fan-out" => {
                let condition: FanOutCondition = parse_condition(rule)?;
                for node in graph.nodes().filter(|n| condition.select.matches(n)) {
                    let targets: BTreeSet<&str> = graph
                        .outgoing(&node.id)
                        .filter(|e| condition.edge_types.contains(&e.edge_type))
                        .map(|e| e.to.as_str())
                        .collect();
                    if targets.len() > condition.max {
                        findings.push(
                            Location::Node {
                                node_id: node.id.clone(),
                                path: node.path().to_string(),
                            },
                            format!(
                                "fan-out of {} exceeds the maximum of {}",
                                targets.len(),
                                condition.max
                            ),
                        );
                    }
                }
            }
            _ => return Err(EvaluationError::unsupported(rule)),
        }
        Ok(findings.into_violations())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, EdgeType, GraphMetadata, Node, NodeType};
    use crate::rule::Condition;
    use crate::types::Severity;

    fn graph() -> PropertyGraph {
        let mut g = PropertyGraph::new(GraphMetadata::new("g", "c"));
        for id in ["hub", "a", "b", "c"] {
            g.add_node(Node::new(id, NodeType::File, id)).unwrap();
        }
        g.add_node(Node::new("package:lodash", NodeType::Package, "lodash"))
            .unwrap();
        for to in ["a", "b", "c", "package:lodash"] {
            g.add_edge(Edge::between(EdgeType::DependsOn, "hub", to)).unwrap();
        }
        g.add_edge(Edge::between(EdgeType::Calls, "hub", "a")).unwrap();
        g
    }

    fn rule(condition: Condition) -> Rule {
        Rule::new("custom-rule", RuleType::Custom, Severity::Error, condition)
    }

    #[test]
    fn forbid_node_reports_each_match() {
        let condition = Condition::new("forbid-node")
            .with_param("select", serde_json::json!({ "type": "package", "name": "lodash" }));
        let violations = CustomEvaluator.evaluate(&graph(), &rule(condition)).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, "forbidden package `lodash`");
    }

    #[test]
    fn require_node_reports_once_when_missing() {
        let condition = Condition::new("require-node")
            .with_param("select", serde_json::json!({ "name": "health-check" }));
        let violations = CustomEvaluator.evaluate(&graph(), &rule(condition)).unwrap();
        assert_eq!(violations.len(), 1);
        assert!(matches!(violations[0].location, Location::Graph { .. }));
    }

    #[test]
    fn fan_out_counts_distinct_targets() {
        let condition = Condition::new("max-fan-out").with_param("max", 3);
        let violations = CustomEvaluator.evaluate(&graph(), &rule(condition)).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, "fan-out of 4 exceeds the maximum of 3");

        let condition = Condition::new("max-fan-out")
            .with_param("max", 4)
            .with_param("edge_types", serde_json::json!(["depends-on", "calls"]));
        assert!(CustomEvaluator
            .evaluate(&graph(), &rule(condition))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn custom_dependency_shares_the_matcher() {
        let condition = Condition::new("dependency")
            .with_param("to", serde_json::json!({ "type": "package" }));
        let violations = CustomEvaluator.evaluate(&graph(), &rule(condition)).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].id, "custom-rule#0");
    }

    #[test]
    fn unknown_kind_is_unsupported() {
        let err = CustomEvaluator
            .evaluate(&graph(), &rule(Condition::new("no-cycles")))
            .unwrap_err();
        assert!(matches!(err, EvaluationError::UnsupportedCondition { .. }));
    }
}
