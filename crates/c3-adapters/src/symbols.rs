//! Node and path helpers shared by the adapters.

use c3_core::construct::package_node_id;
use c3_core::graph::PATH_PROPERTY;
use c3_core::{Artifact, Node, NodeType};

/// Id of a symbol declared in `path`.
///
/// The node type is part of the id so that, e.g., a TypeScript class and an
/// interface merged under one name stay distinct.
pub(crate) fn symbol_id(path: &str, node_type: NodeType, name: &str) -> String {
    format!("{path}::{node_type}:{name}")
}

/// A symbol node carrying its file path and 1-based line.
pub(crate) fn symbol_node(artifact: &Artifact<'_>, node_type: NodeType, name: &str, line: usize) -> Node {
    Node::new(symbol_id(artifact.path, node_type, name), node_type, name)
        .with_property(PATH_PROPERTY, artifact.path)
        .with_property("line", line)
}

/// An external package node, used as a reference fallback.
pub(crate) fn package_node(name: &str) -> Node {
    Node::new(package_node_id(name), NodeType::Package, name)
}

/// Directory part of a relative path (`""` for top-level files).
pub(crate) fn dir_of(path: &str) -> &str {
    path.rfind('/').map_or("", |i| &path[..i])
}

/// Joins `rel` onto `dir`, resolving `.` and `..`.
///
/// Returns `None` when the result would leave the analyzed root.
pub(crate) fn join_normalized(dir: &str, rel: &str) -> Option<String> {
    let mut parts: Vec<&str> = dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in rel.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

/// Joins path segments onto a base directory.
pub(crate) fn under(base: &str, rest: &str) -> String {
    if base.is_empty() {
        rest.to_string()
    } else {
        format!("{base}/{rest}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_resolves_dots() {
        assert_eq!(join_normalized("src/app", "../domain/order").as_deref(), Some("src/domain/order"));
        assert_eq!(join_normalized("src", "./a/./b").as_deref(), Some("src/a/b"));
        assert_eq!(join_normalized("", "../outside"), None);
    }

    #[test]
    fn dir_of_top_level_file_is_empty() {
        assert_eq!(dir_of("main.py"), "");
        assert_eq!(dir_of("pkg/mod.py"), "pkg");
        assert_eq!(under("", "a.py"), "a.py");
        assert_eq!(under("pkg", "a.py"), "pkg/a.py");
    }

    #[test]
    fn symbol_ids_include_type() {
        assert_eq!(symbol_id("src/a.ts", NodeType::Class, "A"), "src/a.ts::class:A");
    }
}
