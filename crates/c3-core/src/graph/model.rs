//! Nodes, edges and scalar properties of the property graph.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of structural entity a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
    /// A source file.
    File,
    /// A directory in the analyzed tree.
    Directory,
    /// A language-level module.
    Module,
    /// An external package / crate.
    Package,
    /// A class, struct or enum.
    Class,
    /// An interface or trait.
    Interface,
    /// A free function or method.
    Function,
    /// An architecture layer.
    Layer,
}

impl NodeType {
    /// Returns the kebab-case name used in configuration.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
            Self::Module => "module",
            Self::Package => "package",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Function => "function",
            Self::Layer => "layer",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of relationship an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeType {
    /// `from` imports or otherwise depends on `to`.
    DependsOn,
    /// `from` structurally contains `to`.
    Contains,
    /// `from` implements the interface `to`.
    Implements,
    /// `from` extends `to`.
    Extends,
    /// `from` calls `to`.
    Calls,
}

impl EdgeType {
    /// Returns the kebab-case name used in configuration and edge ids.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DependsOn => "depends-on",
            Self::Contains => "contains",
            Self::Implements => "implements",
            Self::Extends => "extends",
            Self::Calls => "calls",
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 string.
    String(String),
}

impl PropertyValue {
    /// Returns the string value, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Compares against a JSON value from a condition parameter.
    #[must_use]
    pub fn matches_json(&self, value: &serde_json::Value) -> bool {
        match (self, value) {
            (Self::Bool(a), serde_json::Value::Bool(b)) => a == b,
            (Self::Integer(a), serde_json::Value::Number(n)) => n.as_i64() == Some(*a),
            #[allow(clippy::float_cmp)] // Equality predicate on configured literals
            (Self::Float(a), serde_json::Value::Number(n)) => n.as_f64() == Some(*a),
            (Self::String(a), serde_json::Value::String(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<usize> for PropertyValue {
    fn from(value: usize) -> Self {
        Self::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

/// Key-sorted property map.
pub type Properties = BTreeMap<String, PropertyValue>;

/// Property key holding a node's source path.
pub const PATH_PROPERTY: &str = "path";

/// Property key holding a node's architecture layer.
pub const LAYER_PROPERTY: &str = "layer";

/// A node of the property graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique id within the graph.
    pub id: String,
    /// Node kind.
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Display name.
    pub name: String,
    /// Scalar properties.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: Properties,
}

impl Node {
    /// Creates a node without properties.
    #[must_use]
    pub fn new(id: impl Into<String>, node_type: NodeType, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type,
            name: name.into(),
            properties: Properties::new(),
        }
    }

    /// Sets a property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Returns a property value.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Returns the source path: the `path` property, else the id.
    #[must_use]
    pub fn path(&self) -> &str {
        self.property(PATH_PROPERTY)
            .and_then(PropertyValue::as_str)
            .unwrap_or(&self.id)
    }

    /// Returns the architecture layer, if assigned.
    #[must_use]
    pub fn layer(&self) -> Option<&str> {
        self.property(LAYER_PROPERTY).and_then(PropertyValue::as_str)
    }
}

/// A directed, typed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Unique id within the graph.
    pub id: String,
    /// Edge kind.
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    /// Source node id.
    pub from: String,
    /// Target node id.
    pub to: String,
}

impl Edge {
    /// Creates an edge with an explicit id.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        edge_type: EdgeType,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            edge_type,
            from: from.into(),
            to: to.into(),
        }
    }

    /// Creates an edge whose id is derived from its type and endpoints.
    ///
    /// Re-emitting the same relationship yields the same id.
    #[must_use]
    pub fn between(edge_type: EdgeType, from: impl Into<String>, to: impl Into<String>) -> Self {
        let from = from.into();
        let to = to.into();
        let id = format!("{edge_type}:{from}->{to}");
        Self {
            id,
            edge_type,
            from,
            to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_path_falls_back_to_id() {
        let node = Node::new("module:react", NodeType::Package, "react");
        assert_eq!(node.path(), "module:react");

        let node = node.with_property(PATH_PROPERTY, "node_modules/react");
        assert_eq!(node.path(), "node_modules/react");
    }

    #[test]
    fn derived_edge_id_is_stable() {
        let a = Edge::between(EdgeType::DependsOn, "file:a.ts", "file:b.ts");
        let b = Edge::between(EdgeType::DependsOn, "file:a.ts", "file:b.ts");
        assert_eq!(a.id, b.id);
        assert_eq!(a.id, "depends-on:file:a.ts->file:b.ts");
    }

    #[test]
    fn property_value_matches_json_scalars() {
        assert!(PropertyValue::from("domain").matches_json(&serde_json::json!("domain")));
        assert!(PropertyValue::from(3_i64).matches_json(&serde_json::json!(3)));
        assert!(PropertyValue::from(true).matches_json(&serde_json::json!(true)));
        assert!(!PropertyValue::from("3").matches_json(&serde_json::json!(3)));
    }

    #[test]
    fn node_type_serializes_kebab_case() {
        let json = serde_json::to_string(&NodeType::Interface).unwrap();
        assert_eq!(json, "\"interface\"");
        let parsed: EdgeType = serde_json::from_str("\"depends-on\"").unwrap();
        assert_eq!(parsed, EdgeType::DependsOn);
    }
}
