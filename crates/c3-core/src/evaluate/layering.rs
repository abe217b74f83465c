//! Layering rules.

use std::collections::HashMap;

use super::conditions::{Flow, LayeringCondition};
use super::{parse_condition, EvaluationError, Evaluator, Findings};
use crate::graph::{NodeType, PropertyGraph};
use crate::rule::{Rule, RuleType};
use crate::types::{Location, Violation};

/// Evaluates `layering` conditions.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayeringEvaluator;

impl LayeringEvaluator {
    /// Creates the evaluator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for LayeringEvaluator {
    fn name(&self) -> &'static str {
        "layering"
    }

    fn supports(&self, rule_type: RuleType) -> bool {
        rule_type == RuleType::Layering
    }

    fn evaluate(
        &self,
        graph: &PropertyGraph,
        rule: &Rule,
    ) -> Result<Vec<Violation>, EvaluationError> {
        if rule.condition.kind != "layering" {
            return Err(EvaluationError::unsupported(rule));
        }
        let condition: LayeringCondition = parse_condition(rule)?;

        let order: Vec<String> = if condition.layers.is_empty() {
            graph
                .nodes()
                .filter(|n| n.node_type == NodeType::Layer)
                .map(|n| n.name.clone())
                .collect()
        } else {
            condition.layers.clone()
        };
        // 0 is the innermost layer.
        let rank: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        let mut findings = Findings::new(rule);
        for edge in graph
            .edges()
            .filter(|e| condition.edge_types.contains(&e.edge_type))
        {
            let (Some(from), Some(to)) = (graph.node(&edge.from), graph.node(&edge.to)) else {
                continue;
            };
            let (Some(from_layer), Some(to_layer)) = (from.layer(), to.layer()) else {
                continue;
            };
            let (Some(&from_rank), Some(&to_rank)) = (rank.get(from_layer), rank.get(to_layer))
            else {
                continue;
            };
            let breach = match condition.flow {
                Flow::Inward => to_rank > from_rank,
                Flow::Outward => to_rank < from_rank,
            };
            if breach {
                let direction = match condition.flow {
                    Flow::Inward => "outer",
                    Flow::Outward => "inner",
                };
                findings.push(
                    Location::Edge {
                        edge_id: edge.id.clone(),
                        from: edge.from.clone(),
                        to: edge.to.clone(),
                        path: from.path().to_string(),
                    },
                    format!(
                        "layer `{from_layer}` must not depend on {direction} layer `{to_layer}` ({} -> {})",
                        from.path(),
                        to.path()
                    ),
                );
            }
        }
        Ok(findings.into_violations())
    }
}
