//! The property graph: an insertion-ordered, directed multigraph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

use super::model::{Edge, Node};

/// Descriptive metadata for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphMetadata {
    /// Graph id.
    pub graph_id: String,
    /// Id of the analyzed codebase.
    pub codebase_id: String,
    /// When the source tree was parsed.
    pub parsed_at: DateTime<Utc>,
    /// Languages parsed, comma separated.
    pub language: String,
    /// Version of the graph schema / producer.
    pub version: String,
}

impl GraphMetadata {
    /// Creates metadata with the current time and the crate version.
    #[must_use]
    pub fn new(graph_id: impl Into<String>, codebase_id: impl Into<String>) -> Self {
        Self {
            graph_id: graph_id.into(),
            codebase_id: codebase_id.into(),
            parsed_at: Utc::now(),
            language: String::new(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Outcome of a successful [`PropertyGraph::add_node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeInsert {
    /// The id was new.
    Inserted,
    /// The id existed with the same type and name; properties were merged.
    Merged,
}

/// Errors from graph mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// An id collision with incompatible content.
    #[error("duplicate id `{id}`: {reason}")]
    DuplicateIdConflict {
        /// The colliding id.
        id: String,
        /// What differs.
        reason: String,
    },

    /// An edge endpoint does not exist.
    #[error("edge `{edge_id}` references missing node `{missing}`")]
    DanglingReference {
        /// The rejected edge.
        edge_id: String,
        /// The absent endpoint.
        missing: String,
    },
}

/// Typed, directed multigraph for one analysis run.
///
/// Every edge's endpoints exist at all times. Iteration yields insertion order.
#[derive(Debug, Clone)]
pub struct PropertyGraph {
    metadata: GraphMetadata,
    nodes: Vec<Node>,
    node_index: HashMap<String, usize>,
    edges: Vec<Edge>,
    edge_index: HashMap<String, usize>,
    /// Outgoing edge positions per node position.
    outgoing: Vec<Vec<usize>>,
}

impl PropertyGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new(metadata: GraphMetadata) -> Self {
        Self {
            metadata,
            nodes: Vec::new(),
            node_index: HashMap::new(),
            edges: Vec::new(),
            edge_index: HashMap::new(),
            outgoing: Vec::new(),
        }
    }

    /// Rebuilds a graph from its parts, validating every insertion.
    ///
    /// # Errors
    ///
    /// Returns the first structural error encountered.
    pub fn from_parts(
        metadata: GraphMetadata,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::new(metadata);
        for node in nodes {
            graph.add_node(node)?;
        }
        for edge in edges {
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }

    /// Returns the graph metadata.
    #[must_use]
    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    /// Returns the metadata for in-place updates during construction.
    pub fn metadata_mut(&mut self) -> &mut GraphMetadata {
        &mut self.metadata
    }

    /// Returns the graph id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.metadata.graph_id
    }

    /// Inserts a node, or merges it into an existing node with the same id.
    ///
    /// Merging requires equal type and name; properties are overwritten
    /// last-write-wins and the node keeps its original position.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateIdConflict`] if the existing node has
    /// a different type or name.
    pub fn add_node(&mut self, node: Node) -> Result<NodeInsert, GraphError> {
        if let Some(&pos) = self.node_index.get(&node.id) {
            let existing = &mut self.nodes[pos];
            if existing.node_type != node.node_type {
                return Err(GraphError::DuplicateIdConflict {
                    id: node.id,
                    reason: format!(
                        "type `{}` conflicts with existing `{}`",
                        node.node_type, existing.node_type
                    ),
                });
            }
            if existing.name != node.name {
                return Err(GraphError::DuplicateIdConflict {
                    id: node.id,
                    reason: format!(
                        "name `{}` conflicts with existing `{}`",
                        node.name, existing.name
                    ),
                });
            }
            existing.properties.extend(node.properties);
            return Ok(NodeInsert::Merged);
        }

        self.node_index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        self.outgoing.push(Vec::new());
        Ok(NodeInsert::Inserted)
    }

    /// Inserts an edge.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateIdConflict`] if the id is taken and
    /// [`GraphError::DanglingReference`] if an endpoint is missing.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        if self.edge_index.contains_key(&edge.id) {
            return Err(GraphError::DuplicateIdConflict {
                id: edge.id,
                reason: "edge id already present".to_string(),
            });
        }
        let Some(&from) = self.node_index.get(&edge.from) else {
            return Err(GraphError::DanglingReference {
                missing: edge.from.clone(),
                edge_id: edge.id,
            });
        };
        if !self.node_index.contains_key(&edge.to) {
            return Err(GraphError::DanglingReference {
                missing: edge.to.clone(),
                edge_id: edge.id,
            });
        }

        let pos = self.edges.len();
        self.edge_index.insert(edge.id.clone(), pos);
        self.outgoing[from].push(pos);
        self.edges.push(edge);
        Ok(())
    }

    /// Looks up a node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&pos| &self.nodes[pos])
    }

    /// Looks up an edge by id.
    #[must_use]
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edge_index.get(id).map(|&pos| &self.edges[pos])
    }

    /// Returns true if a node with this id exists.
    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter()
    }

    /// Outgoing edges of a node, in insertion order.
    ///
    /// Unknown ids yield nothing.
    pub fn outgoing(&self, node_id: &str) -> impl Iterator<Item = &Edge> + '_ {
        self.node_index
            .get(node_id)
            .map(|&pos| self.outgoing[pos].as_slice())
            .unwrap_or_default()
            .iter()
            .map(|&e| &self.edges[e])
    }

    /// Position of a node in insertion order.
    #[must_use]
    pub fn position(&self, node_id: &str) -> Option<usize> {
        self.node_index.get(node_id).copied()
    }
}

#[derive(Serialize)]
struct GraphView<'a> {
    metadata: &'a GraphMetadata,
    nodes: &'a [Node],
    edges: &'a [Edge],
}

#[derive(Deserialize)]
struct GraphData {
    metadata: GraphMetadata,
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    edges: Vec<Edge>,
}

impl Serialize for PropertyGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        GraphView {
            metadata: &self.metadata,
            nodes: &self.nodes,
            edges: &self.edges,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PropertyGraph {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let data = GraphData::deserialize(deserializer)?;
        Self::from_parts(data.metadata, data.nodes, data.edges).map_err(serde::de::Error::custom)
    }
}
