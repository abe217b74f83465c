//! Node selectors used by rule conditions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::model::{Node, NodeType};
use crate::pattern::GlobPattern;

/// Conjunctive predicate over nodes.
///
/// Every populated field must match; an empty selector matches every node.
///
/// ```ignore
/// { type = "file", path = "src/domain/**", layer = "domain" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Selector {
    /// Node type equality.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,
    /// Glob over the node name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<GlobPattern>,
    /// Glob over the node path (`path` property, else id).
    #[serde(default, alias = "matches", skip_serializing_if = "Option::is_none")]
    pub path: Option<GlobPattern>,
    /// Layer property equality.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    /// Property equality, compared against scalar values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl Selector {
    /// A selector matching every node.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Restricts to one node type.
    #[must_use]
    pub fn of_type(mut self, node_type: NodeType) -> Self {
        self.node_type = Some(node_type);
        self
    }

    /// Restricts to paths matching a glob.
    #[must_use]
    pub fn with_path(mut self, pattern: GlobPattern) -> Self {
        self.path = Some(pattern);
        self
    }

    /// Restricts to one layer.
    #[must_use]
    pub fn in_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    /// Tests a node against every populated field.
    #[must_use]
    pub fn matches(&self, node: &Node) -> bool {
        if self.node_type.is_some_and(|t| t != node.node_type) {
            return false;
        }
        if self.name.as_ref().is_some_and(|p| !p.matches(&node.name)) {
            return false;
        }
        if self.path.as_ref().is_some_and(|p| !p.matches(node.path())) {
            return false;
        }
        if let Some(layer) = &self.layer {
            if node.layer() != Some(layer.as_str()) {
                return false;
            }
        }
        self.properties.iter().all(|(key, expected)| {
            node.property(key)
                .is_some_and(|actual| actual.matches_json(expected))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::PATH_PROPERTY;

    fn order_file() -> Node {
        Node::new("file:src/domain/order.ts", NodeType::File, "order.ts")
            .with_property(PATH_PROPERTY, "src/domain/order.ts")
            .with_property("layer", "domain")
            .with_property("lines", 42_i64)
    }

    #[test]
    fn empty_selector_matches_everything() {
        assert!(Selector::any().matches(&order_file()));
    }

    #[test]
    fn fields_are_conjunctive() {
        let node = order_file();
        let sel = Selector::any()
            .of_type(NodeType::File)
            .with_path(GlobPattern::new("src/domain/**").unwrap());
        assert!(sel.matches(&node));

        let sel = sel.in_layer("infrastructure");
        assert!(!sel.matches(&node));
    }

    #[test]
    fn name_glob_and_property_equality() {
        let sel: Selector = serde_json::from_value(serde_json::json!({
            "name": "*.ts",
            "properties": { "lines": 42 }
        }))
        .unwrap();
        assert!(sel.matches(&order_file()));

        let sel: Selector = serde_json::from_value(serde_json::json!({
            "properties": { "lines": 7 }
        }))
        .unwrap();
        assert!(!sel.matches(&order_file()));
    }

    #[test]
    fn path_falls_back_to_id() {
        let pkg = Node::new("package:react", NodeType::Package, "react");
        let sel: Selector =
            serde_json::from_value(serde_json::json!({ "matches": "package:*" })).unwrap();
        assert!(sel.matches(&pkg));
    }

    #[test]
    fn unknown_selector_field_is_rejected() {
        let result =
            serde_json::from_value::<Selector>(serde_json::json!({ "colour": "blue" }));
        assert!(result.is_err());
    }
}
