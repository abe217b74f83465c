//! Cycle detection over a typed sub-graph.
//!
//! Depth-first search in node insertion order, neighbors in edge insertion
//! order. Every back edge to a node on the current path closes a cycle.
//! Cycles are reported once, rotated to start at their smallest node id.

use std::collections::HashSet;

use crate::graph::{EdgeType, PropertyGraph, Selector};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

struct DfsState {
    marks: Vec<Mark>,
    path_stack: Vec<usize>,
    seen: HashSet<Vec<usize>>,
    cycles: Vec<Vec<usize>>,
}

impl DfsState {
    fn record_cycle(&mut self, target: usize, ids: &[&str]) {
        let Some(pos) = self.path_stack.iter().position(|&n| n == target) else {
            return;
        };
        let mut cycle = self.path_stack[pos..].to_vec();
        let start = (0..cycle.len())
            .min_by(|&a, &b| ids[cycle[a]].cmp(ids[cycle[b]]))
            .unwrap_or(0);
        cycle.rotate_left(start);
        if self.seen.insert(cycle.clone()) {
            self.cycles.push(cycle);
        }
    }
}

/// Returns the distinct cycles of the sub-graph formed by `edge_types`
/// (and, if given, nodes matching `scope`), as node ids in canonical rotation.
#[must_use]
pub fn find_cycles(
    graph: &PropertyGraph,
    edge_types: &[EdgeType],
    scope: Option<&Selector>,
) -> Vec<Vec<String>> {
    let nodes: Vec<_> = graph.nodes().collect();
    let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let in_scope: Vec<bool> = nodes
        .iter()
        .map(|n| scope.map_or(true, |s| s.matches(n)))
        .collect();

    let adjacency: Vec<Vec<usize>> = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            if !in_scope[i] {
                return Vec::new();
            }
            graph
                .outgoing(&node.id)
                .filter(|e| edge_types.contains(&e.edge_type))
                .filter_map(|e| graph.position(&e.to))
                .filter(|&to| in_scope[to])
                .collect()
        })
        .collect();

    let mut state = DfsState {
        marks: vec![Mark::Unvisited; nodes.len()],
        path_stack: Vec::new(),
        seen: HashSet::new(),
        cycles: Vec::new(),
    };

    for start in 0..nodes.len() {
        if !in_scope[start] || state.marks[start] != Mark::Unvisited {
            continue;
        }
        // Explicit stack of (node, next neighbor index) keeps deep graphs off
        // the call stack.
        let mut stack = vec![(start, 0usize)];
        state.marks[start] = Mark::OnPath;
        state.path_stack.push(start);

        while let Some(top) = stack.last_mut() {
            let node = top.0;
            if let Some(&neighbor) = adjacency[node].get(top.1) {
                top.1 += 1;
                match state.marks[neighbor] {
                    Mark::Unvisited => {
                        state.marks[neighbor] = Mark::OnPath;
                        state.path_stack.push(neighbor);
                        stack.push((neighbor, 0));
                    }
                    Mark::OnPath => state.record_cycle(neighbor, &ids),
                    Mark::Done => {}
                }
            } else {
                state.marks[node] = Mark::Done;
                state.path_stack.pop();
                stack.pop();
            }
        }
    }

    state
        .cycles
        .into_iter()
        .map(|cycle| cycle.into_iter().map(|i| ids[i].to_string()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, GraphMetadata, Node, NodeType};

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> PropertyGraph {
        let mut g = PropertyGraph::new(GraphMetadata::new("g", "c"));
        for id in nodes {
            g.add_node(Node::new(*id, NodeType::File, *id)).unwrap();
        }
        for (from, to) in edges {
            g.add_edge(Edge::between(EdgeType::DependsOn, *from, *to)).unwrap();
        }
        g
    }

    fn cycles(g: &PropertyGraph) -> Vec<Vec<String>> {
        find_cycles(g, &[EdgeType::DependsOn], None)
    }

    #[test]
    fn cycle_detection_cases() {
        let cases: Vec<(Vec<&str>, Vec<(&str, &str)>, usize, &str)> = vec![
            (vec!["a", "b", "c"], vec![("a", "b"), ("b", "c")], 0, "chain"),
            (vec!["a", "b"], vec![("a", "b"), ("b", "a")], 1, "two-node cycle"),
            (
                vec!["a", "b", "c", "d"],
                vec![("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
                0,
                "diamond",
            ),
            (vec!["a"], vec![("a", "a")], 1, "self loop"),
            (
                vec!["a", "b", "c"],
                vec![("a", "b"), ("b", "a"), ("b", "c"), ("c", "b")],
                2,
                "two cycles sharing a node",
            ),
        ];

        for (nodes, edges, expected, label) in cases {
            let g = graph(&nodes, &edges);
            assert_eq!(cycles(&g).len(), expected, "{label}");
        }
    }

    #[test]
    fn cycle_is_rotated_to_smallest_id() {
        let g = graph(&["c", "a", "b"], &[("c", "a"), ("a", "b"), ("b", "c")]);
        assert_eq!(cycles(&g), vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn parallel_back_edges_report_one_cycle() {
        let mut g = graph(&["a", "b"], &[("a", "b"), ("b", "a")]);
        g.add_edge(Edge::between(EdgeType::Calls, "b", "a")).unwrap();
        let found = find_cycles(&g, &[EdgeType::DependsOn, EdgeType::Calls], None);
        assert_eq!(found, vec![vec!["a", "b"]]);
    }

    #[test]
    fn other_edge_types_are_ignored() {
        let mut g = graph(&["a", "b"], &[("a", "b")]);
        g.add_edge(Edge::between(EdgeType::Contains, "b", "a")).unwrap();
        assert!(cycles(&g).is_empty());
        assert_eq!(
            find_cycles(&g, &[EdgeType::DependsOn, EdgeType::Contains], None).len(),
            1
        );
    }

    #[test]
    fn scope_limits_the_sub_graph() {
        let g = graph(&["a", "b"], &[("a", "b"), ("b", "a")]);
        let scope: Selector =
            serde_json::from_value(serde_json::json!({ "name": "a" })).unwrap();
        assert!(find_cycles(&g, &[EdgeType::DependsOn], Some(&scope)).is_empty());
    }

    #[test]
    fn long_chain_does_not_overflow() {
        let ids: Vec<String> = (0..50_000).map(|i| format!("n{i}")).collect();
        let mut g = PropertyGraph::new(GraphMetadata::new("g", "c"));
        for id in &ids {
            g.add_node(Node::new(id.as_str(), NodeType::File, id.as_str())).unwrap();
        }
        for pair in ids.windows(2) {
            g.add_edge(Edge::between(EdgeType::DependsOn, pair[0].as_str(), pair[1].as_str()))
                .unwrap();
        }
        assert!(cycles(&g).is_empty());
    }
}
