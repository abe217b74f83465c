//! Dependency rules: forbidden / required edges and cycles.

use tracing::debug;

use super::conditions::{CycleCondition, DependencyCondition};
use super::cycles::find_cycles;
use super::{parse_condition, EvaluationError, Evaluator, Findings};
use crate::graph::{Node, PropertyGraph};
use crate::rule::{Rule, RuleType};
use crate::types::{Location, Violation};

/// Evaluates `dependency` and `no-cycles` conditions.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyEvaluator;

impl DependencyEvaluator {
    /// Creates the evaluator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for DependencyEvaluator {
    fn name(&self) -> &'static str {
        "dependency"
    }

    fn supports(&self, rule_type: RuleType) -> bool {
        rule_type == RuleType::Dependency
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
            "no-cycles" => {
                let condition: CycleCondition = parse_condition(rule)?;
                check_cycles(graph, &condition, &mut findings);
            }
            _ => return Err(EvaluationError::unsupported(rule)),
        }
        Ok(findings.into_violations())
    }
}

/// Edge-level dependency check, shared with the custom evaluator.
pub(crate) fn check_dependency(
    graph: &PropertyGraph,
    condition: &DependencyCondition,
    findings: &mut Findings<'_>,
) {
    let matching = graph.edges().filter_map(|edge| {
        if !condition.edge_types.contains(&edge.edge_type) {
            return None;
        }
        let from = graph.node(&edge.from)?;
        let to = graph.node(&edge.to)?;
        (condition.from.matches(from) && condition.to.matches(to)).then_some((edge, from, to))
    });

    if condition.forbidden {
        for (edge, from, to) in matching {
            findings.push(
                Location::Edge {
                    edge_id: edge.id.clone(),
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    path: from.path().to_string(),
                },
                format!("forbidden dependency: {} -> {}", from.path(), to.path()),
            );
        }
    } else {
        let found = matching.count();
        debug!("Required dependency matched {} edge(s)", found);
        if found == 0 {
            findings.push(
                Location::Graph {
                    graph_id: graph.id().to_string(),
                },
                "required dependency not found",
            );
        }
    }
}

fn check_cycles(graph: &PropertyGraph, condition: &CycleCondition, findings: &mut Findings<'_>) {
    for cycle in find_cycles(graph, &condition.edge_types, condition.scope.as_ref()) {
        let paths: Vec<&str> = cycle
            .iter()
            .filter_map(|id| graph.node(id))
            .map(Node::path)
            .collect();
        let path = paths.first().map(ToString::to_string).unwrap_or_default();
        let chain = paths
            .iter()
            .chain(paths.first())
            .copied()
            .collect::<Vec<_>>()
            .join(" -> ");
        findings.push(
            Location::Cycle { nodes: cycle, path },
            format!("circular dependency: {chain}"),
        );
    }
}
