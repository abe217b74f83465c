//! Typed conditions, parsed from [`Condition`](crate::rule::Condition) parameters.

use serde::{Deserialize, Serialize};

use crate::graph::{EdgeType, NodeType, Selector};
use crate::pattern::GlobPattern;

fn default_dependency_edges() -> Vec<EdgeType> {
    vec![EdgeType::DependsOn]
}

fn default_forbidden() -> bool {
    true
}

/// `dependency`: edges between selected nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyCondition {
    /// Source selector.
    #[serde(default)]
    pub from: Selector,
    /// Target selector.
    #[serde(default)]
    pub to: Selector,
    /// `true`: every matching edge is a violation. `false`: at least one
    /// matching edge is required.
    #[serde(default = "default_forbidden")]
    pub forbidden: bool,
    /// Edge types considered.
    #[serde(default = "default_dependency_edges")]
    pub edge_types: Vec<EdgeType>,
}

/// `no-cycles`: no cycles in the selected sub-graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CycleCondition {
    /// Edge types forming the sub-graph.
    #[serde(default = "default_dependency_edges")]
    pub edge_types: Vec<EdgeType>,
    /// Restricts the sub-graph to matching nodes.
    #[serde(default)]
    pub scope: Option<Selector>,
}

/// Identifier casing conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingStyle {
    /// `order-service`
    KebabCase,
    /// `order_service`
    SnakeCase,
    /// `orderService`
    CamelCase,
    /// `OrderService`
    PascalCase,
    /// `ORDER_SERVICE`
    ScreamingSnakeCase,
}

impl NamingStyle {
    /// Returns the configuration spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KebabCase => "kebab-case",
            Self::SnakeCase => "snake-case",
            Self::CamelCase => "camel-case",
            Self::PascalCase => "pascal-case",
            Self::ScreamingSnakeCase => "screaming-snake-case",
        }
    }

    /// Tests whether a name follows this style.
    #[must_use]
    pub fn matches(self, name: &str) -> bool {
        match self {
            Self::KebabCase => separated(name, '-', |c| c.is_ascii_lowercase() || c.is_ascii_digit()),
            Self::SnakeCase => separated(name, '_', |c| c.is_ascii_lowercase() || c.is_ascii_digit()),
            Self::ScreamingSnakeCase => {
                separated(name, '_', |c| c.is_ascii_uppercase() || c.is_ascii_digit())
            }
            Self::CamelCase => cased(name, |c| c.is_ascii_lowercase()),
            Self::PascalCase => cased(name, |c| c.is_ascii_uppercase()),
        }
    }
}

/// Non-empty words of allowed characters joined by single separators.
fn separated(name: &str, sep: char, allowed: impl Fn(char) -> bool) -> bool {
    !name.is_empty()
        && name
            .split(sep)
            .all(|word| !word.is_empty() && word.chars().all(&allowed))
}

/// Alphanumeric, with a constrained first character.
fn cased(name: &str, first: impl Fn(char) -> bool) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(first) && chars.all(|c| c.is_ascii_alphanumeric())
}

/// `naming`: node names follow a casing style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamingCondition {
    /// Required style.
    pub style: NamingStyle,
    /// Nodes to check (default: files).
    #[serde(default)]
    pub target: Option<Selector>,
    /// Name globs exempt from the check.
    #[serde(default)]
    pub ignore: Vec<GlobPattern>,
}

impl NamingCondition {
    /// The effective target selector.
    #[must_use]
    pub fn target(&self) -> Selector {
        self.target
            .clone()
            .unwrap_or_else(|| Selector::any().of_type(NodeType::File))
    }
}

/// Allowed direction of dependencies between layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    /// Outer layers may depend on inner ones, never the reverse.
    #[default]
    Inward,
    /// Inner layers may depend on outer ones, never the reverse.
    Outward,
}

/// `layering`: dependencies respect layer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayeringCondition {
    /// Layer names, innermost first; empty means the graph's layer nodes.
    #[serde(default)]
    pub layers: Vec<String>,
    /// Allowed direction.
    #[serde(default)]
    pub flow: Flow,
    /// Edge types considered.
    #[serde(default = "default_dependency_edges")]
    pub edge_types: Vec<EdgeType>,
}

/// `forbid-node` / `require-node`: presence of selected nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectCondition {
    /// Nodes in question.
    pub select: Selector,
}

/// `max-fan-out`: bound on distinct outgoing dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FanOutCondition {
    /// Nodes to check (default: every node).
    #[serde(default)]
    pub select: Selector,
    /// Largest allowed number of distinct targets.
    pub max: usize,
    /// Edge types counted.
    #[serde(default = "default_dependency_edges")]
    pub edge_types: Vec<EdgeType>,
}
