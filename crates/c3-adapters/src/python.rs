//! Python adapter using Tree-sitter.

use c3_core::construct::{file_node_id, AdapterError, UnresolvedRef};
use c3_core::{Artifact, EdgeType, GraphFragment, NodeType, SourceAdapter};
use tracing::debug;
use tree_sitter::{Language, Node};

use crate::symbols::{dir_of, package_node, symbol_node, under};
use crate::syntax::{descendants, line, parse_tree, text};

/// Extracts imports, classes and functions from Python.
///
/// Imports are collected at any depth, so guarded (`try:`,
/// `if TYPE_CHECKING:`) and function-local imports count. Classes and
/// functions are taken from module level only.
pub struct PythonAdapter {
    language: Language,
}

/// A module an import statement refers to.
#[derive(Debug, PartialEq, Eq)]
struct ImportTarget {
    /// Leading dots of a relative import; 0 for absolute imports.
    level: usize,
    /// Dotted path segments after the dots.
    segments: Vec<String>,
}

impl PythonAdapter {
    /// Creates a new Python adapter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
        }
    }

    fn dotted(node: &Node<'_>, src: &[u8]) -> Vec<String> {
        text(node, src)
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    /// The dotted name of an import item, looking through `as` aliases.
    fn imported_name(node: &Node<'_>, src: &[u8]) -> Option<Vec<String>> {
        match node.kind() {
            "dotted_name" => Some(Self::dotted(node, src)),
            "aliased_import" => node
                .child_by_field_name("name")
                .map(|n| Self::dotted(&n, src)),
            _ => None,
        }
    }

    fn imports(node: &Node<'_>, src: &[u8]) -> Vec<ImportTarget> {
        let mut cursor = node.walk();
        match node.kind() {
            "import_statement" => node
                .children_by_field_name("name", &mut cursor)
                .filter_map(|n| Self::imported_name(&n, src))
                .map(|segments| ImportTarget { level: 0, segments })
                .collect(),
            "import_from_statement" => {
                let Some(module) = node.child_by_field_name("module_name") else {
                    return Vec::new();
                };
                let (level, base) = if module.kind() == "relative_import" {
                    let raw = text(&module, src);
                    let level = raw.chars().take_while(|c| *c == '.').count();
                    (level, Self::dotted(&module, src))
                } else {
                    (0, Self::dotted(&module, src))
                };

                let names: Vec<Vec<String>> = node
                    .children_by_field_name("name", &mut cursor)
                    .filter_map(|n| Self::imported_name(&n, src))
                    .collect();
                if names.is_empty() {
                    return vec![ImportTarget {
                        level,
                        segments: base,
                    }];
                }
                names
                    .into_iter()
                    .map(|name| ImportTarget {
                        level,
                        segments: base.iter().cloned().chain(name).collect(),
                    })
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    fn declaration(node: &Node<'_>, src: &[u8], artifact: &Artifact<'_>, fragment: &mut GraphFragment) {
        let node_type = match node.kind() {
            "class_definition" => NodeType::Class,
            "function_definition" => NodeType::Function,
            "decorated_definition" => {
                if let Some(inner) = node.child_by_field_name("definition") {
                    Self::declaration(&inner, src, artifact, fragment);
                }
                return;
            }
            _ => return,
        };
        if let Some(name) = node.child_by_field_name("name") {
            fragment.child(
                &artifact.file_id(),
                symbol_node(artifact, node_type, text(&name, src), line(node)),
            );
        }
    }
}

impl Default for PythonAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// Directories absolute imports are tried against: the root, then every
/// ancestor of the importing file, shallowest first.
fn search_roots(path: &str) -> Vec<String> {
    let dir = dir_of(path);
    let mut roots = vec![String::new()];
    if !dir.is_empty() {
        let parts: Vec<&str> = dir.split('/').collect();
        for n in 1..=parts.len() {
            roots.push(parts[..n].join("/"));
        }
    }
    roots
}

/// Candidate files for a module path, longest prefix first.
fn module_candidates(roots: &[String], segments: &[String]) -> Vec<String> {
    let mut candidates = Vec::new();
    for n in (1..=segments.len()).rev() {
        let prefix = segments[..n].join("/");
        for root in roots {
            candidates.push(under(root, &format!("{prefix}.py")));
            candidates.push(under(root, &format!("{prefix}/__init__.py")));
            candidates.push(under(root, &format!("{prefix}.pyi")));
        }
    }
    candidates
}

fn reference(artifact: &Artifact<'_>, target: &ImportTarget) -> Option<UnresolvedRef> {
    let from = artifact.file_id();
    if target.level == 0 {
        let first = target.segments.first()?;
        let candidates = module_candidates(&search_roots(artifact.path), &target.segments);
        return Some(UnresolvedRef {
            from,
            candidates: candidates.iter().map(|c| file_node_id(c)).collect(),
            edge_type: EdgeType::DependsOn,
            fallback: Some(package_node(first)),
        });
    }

    let mut base = dir_of(artifact.path).to_string();
    for _ in 1..target.level {
        if base.is_empty() {
            debug!("{}: relative import escapes the root", artifact.path);
            return None;
        }
        base = dir_of(&base).to_string();
    }
    let mut candidates = module_candidates(std::slice::from_ref(&base), &target.segments);
    candidates.push(under(&base, "__init__.py"));
    Some(UnresolvedRef {
        from,
        candidates: candidates.iter().map(|c| file_node_id(c)).collect(),
        edge_type: EdgeType::DependsOn,
        fallback: None,
    })
}

impl SourceAdapter for PythonAdapter {
    fn name(&self) -> &'static str {
        "PythonParser"
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["py", "pyi"]
    }

    fn parse(&self, artifact: &Artifact<'_>) -> Result<GraphFragment, AdapterError> {
        let tree = parse_tree(&self.language, artifact.content)?;
        let src = artifact.content.as_bytes();
        let root = tree.root_node();
        let mut fragment = GraphFragment::new();

        for node in descendants(root) {
            for target in Self::imports(&node, src) {
                if let Some(r) = reference(artifact, &target) {
                    fragment.reference(r);
                }
            }
        }
        let mut cursor = root.walk();
        for node in root.children(&mut cursor) {
            Self::declaration(&node, src, artifact, &mut fragment);
        }

        Ok(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(path: &str, src: &str) -> GraphFragment {
        PythonAdapter::new()
            .parse(&Artifact::new(path, src))
            .unwrap()
    }

    fn targets(src: &str) -> Vec<ImportTarget> {
        let adapter = PythonAdapter::new();
        let tree = parse_tree(&adapter.language, src).unwrap();
        let root = tree.root_node();
        let mut cursor = root.walk();
        let nodes: Vec<Node<'_>> = root.children(&mut cursor).collect();
        nodes
            .iter()
            .flat_map(|n| PythonAdapter::imports(n, src.as_bytes()))
            .collect()
    }

    fn target(level: usize, segments: &[&str]) -> ImportTarget {
        ImportTarget {
            level,
            segments: segments.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn import_forms() {
        assert_eq!(
            targets("import os.path, json as j\nfrom a.b import c, d as e\nfrom .. import x\nfrom .m import *\n"),
            vec![
                target(0, &["os", "path"]),
                target(0, &["json"]),
                target(0, &["a", "b", "c"]),
                target(0, &["a", "b", "d"]),
                target(2, &["x"]),
                target(1, &["m"]),
            ]
        );
    }

    #[test]
    fn extracts_classes_and_functions() {
        let fragment = parse(
            "app/models.py",
            "class Order:\n    pass\n\n@dataclass\nclass Line:\n    pass\n\ndef total():\n    return 0\n",
        );
        let names: Vec<&str> = fragment.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Order", "Line", "total"]);
        assert_eq!(fragment.nodes[1].node_type, NodeType::Class);
    }

    #[test]
    fn absolute_import_candidates_and_package_fallback() {
        let fragment = parse("app/services/orders.py", "from app.models import Order\n");
        let r = &fragment.references[0];
        assert_eq!(r.candidates[0], "file:app/models/Order.py");
        assert!(r.candidates.contains(&"file:app/models.py".to_string()));
        assert!(r.candidates.contains(&"file:app/models/__init__.py".to_string()));
        assert_eq!(r.fallback.as_ref().map(|n| n.id.as_str()), Some("package:app"));
    }

    #[test]
    fn relative_import_is_anchored_at_the_file() {
        let fragment = parse("pkg/sub/mod.py", "from ..util import helper\n");
        let r = &fragment.references[0];
        assert_eq!(r.candidates[0], "file:pkg/util/helper.py");
        assert!(r.candidates.contains(&"file:pkg/util.py".to_string()));
        assert!(r.fallback.is_none());
    }

    #[test]
    fn guarded_and_local_imports_are_found() {
        let fragment = parse(
            "app/service.py",
            r"from typing import TYPE_CHECKING

try:
    import ujson as json
except ImportError:
    import json

if TYPE_CHECKING:
    from app.models import Order

def load():
    from .cache import warm
    return warm()
",
        );

        assert_eq!(fragment.references.len(), 5);
        let packages: Vec<&str> = fragment
            .references
            .iter()
            .filter_map(|r| r.fallback.as_ref())
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(packages, vec!["typing", "ujson", "json", "app"]);
        assert_eq!(fragment.references[4].candidates[0], "file:app/cache/warm.py");

        let names: Vec<&str> = fragment.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["load"]);
    }

    #[test]
    fn relative_import_above_root_is_dropped() {
        let fragment = parse("top.py", "from ... import x\n");
        assert!(fragment.references.is_empty());
    }

    #[test]
    fn syntax_error_is_reported() {
        let err = PythonAdapter::new()
            .parse(&Artifact::new("bad.py", "def broken(:\n"))
            .unwrap_err();
        assert!(matches!(err, AdapterError::Syntax { .. }));
    }
}
