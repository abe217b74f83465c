//! Core types for compliance violations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity level for rule violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail the report.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Error returned when a severity string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity `{0}`, expected: error, warning, info")]
pub struct UnknownSeverity(pub String);

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "error" => Ok(Self::Error),
            "warning" | "warn" => Ok(Self::Warning),
            "info" => Ok(Self::Info),
            _ => Err(UnknownSeverity(value.to_string())),
        }
    }
}

/// Where in the graph a violation was found.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Location {
    /// A single node.
    Node {
        /// Id of the node.
        node_id: String,
        /// Source path of the node.
        path: String,
    },
    /// A single edge.
    Edge {
        /// Id of the edge.
        edge_id: String,
        /// Id of the source node.
        from: String,
        /// Id of the target node.
        to: String,
        /// Source path of the edge's `from` node.
        path: String,
    },
    /// A dependency cycle, in canonical rotation (smallest node id first).
    Cycle {
        /// Node ids along the cycle, without repeating the first one.
        nodes: Vec<String>,
        /// Source path of the first node.
        path: String,
    },
    /// The graph as a whole (e.g. a required dependency is absent).
    Graph {
        /// Id of the evaluated graph.
        graph_id: String,
    },
}

impl Location {
    /// Returns the source path used for whitelist matching.
    ///
    /// Graph-level locations have no path.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Node { path, .. } | Self::Edge { path, .. } | Self::Cycle { path, .. } => {
                Some(path)
            }
            Self::Graph { .. } => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node { path, .. } => write!(f, "{path}"),
            Self::Edge { from, to, .. } => write!(f, "{from} -> {to}"),
            Self::Cycle { nodes, .. } => {
                for node in nodes {
                    write!(f, "{node} -> ")?;
                }
                match nodes.first() {
                    Some(first) => write!(f, "{first}"),
                    None => Ok(()),
                }
            }
            Self::Graph { graph_id } => write!(f, "<{graph_id}>"),
        }
    }
}

/// A compliance violation found during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Stable id: `<rule-id>#<discovery index>`.
    pub id: String,
    /// Id of the rule that produced this violation.
    pub rule_id: String,
    /// Severity, taken from the rule.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Primary location of the violation.
    pub location: Location,
    /// Reference to design document (e.g., "ARCHITECTURE.md L85").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_ref: Option<String>,
}

impl Violation {
    /// Creates a new violation.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        rule_id: impl Into<String>,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            rule_id: rule_id.into(),
            severity,
            message: message.into(),
            location,
            doc_ref: None,
        }
    }

    /// Adds a design document reference to this violation.
    #[must_use]
    pub fn with_doc_ref(mut self, doc_ref: impl Into<String>) -> Self {
        self.doc_ref = Some(doc_ref.into());
        self
    }

    /// Formats the violation for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!("{} at {}\n", self.rule_id, self.location);
        let _ = writeln!(output, "  {}: {}", self.severity, self.message);
        if let Some(doc_ref) = &self.doc_ref {
            let _ = writeln!(output, "  = see: {doc_ref}");
        }
        output
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.location, self.severity, self.rule_id, self.message
        )?;
        if let Some(doc_ref) = &self.doc_ref {
            write!(f, " (see: {doc_ref})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_violation(severity: Severity) -> Violation {
        Violation::new(
            "no-db-in-domain#0",
            "no-db-in-domain",
            severity,
            Location::Edge {
                edge_id: "depends-on:file:src/domain/order.ts->file:src/infra/db.ts".into(),
                from: "file:src/domain/order.ts".into(),
                to: "file:src/infra/db.ts".into(),
                path: "src/domain/order.ts".into(),
            },
            "domain must not depend on infrastructure",
        )
    }

    #[test]
    fn severity_orders_info_below_error() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn severity_parses_known_values() {
        assert_eq!("error".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("warning".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!("info".parse::<Severity>(), Ok(Severity::Info));
        assert!("critical".parse::<Severity>().is_err());
    }

    #[test]
    fn location_path_for_edge_is_source_path() {
        let v = make_violation(Severity::Error);
        assert_eq!(v.location.path(), Some("src/domain/order.ts"));
    }

    #[test]
    fn graph_location_has_no_path() {
        let loc = Location::Graph {
            graph_id: "graph-1".into(),
        };
        assert!(loc.path().is_none());
        assert_eq!(loc.to_string(), "<graph-1>");
    }

    #[test]
    fn cycle_location_displays_closed_loop() {
        let loc = Location::Cycle {
            nodes: vec!["a".into(), "b".into(), "c".into()],
            path: "a".into(),
        };
        assert_eq!(loc.to_string(), "a -> b -> c -> a");
    }

    #[test]
    fn violation_format_includes_doc_ref() {
        let v = make_violation(Severity::Error).with_doc_ref("ARCHITECTURE.md L85");
        assert!(v.format().contains("= see: ARCHITECTURE.md L85"));
    }

    #[test]
    fn violation_display_omits_doc_ref_when_none() {
        let v = make_violation(Severity::Warning);
        let display = format!("{v}");
        assert!(display.starts_with("file:src/domain/order.ts -> file:src/infra/db.ts"));
        assert!(!display.contains("see:"));
    }
}
