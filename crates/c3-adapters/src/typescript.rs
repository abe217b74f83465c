//! TypeScript adapter using Tree-sitter.

use c3_core::construct::{file_node_id, AdapterError, UnresolvedRef};
use c3_core::{Artifact, EdgeType, GraphFragment, NodeType, SourceAdapter};
use tracing::debug;
use tree_sitter::{Language, Node};

use crate::symbols::{dir_of, join_normalized, package_node, symbol_node};
use crate::syntax::{descendants, line, parse_tree, text, unquote};

/// Extracts imports, classes, interfaces and functions from TypeScript.
///
/// Static imports, re-exports, `import("x")` and `require("x")` with a
/// literal specifier are collected at any depth. Declarations are taken from
/// module level only.
pub struct TypeScriptAdapter {
    typescript: Language,
    tsx: Language,
}

impl TypeScriptAdapter {
    /// Creates a new TypeScript adapter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            typescript: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            tsx: tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }

    fn declaration(node: &Node<'_>, src: &[u8], artifact: &Artifact<'_>, fragment: &mut GraphFragment) {
        let node_type = match node.kind() {
            "class_declaration" | "abstract_class_declaration" | "enum_declaration" => {
                NodeType::Class
            }
            "interface_declaration" => NodeType::Interface,
            "function_declaration" | "generator_function_declaration" => NodeType::Function,
            _ => return,
        };
        if let Some(name) = node.child_by_field_name("name") {
            fragment.child(
                &artifact.file_id(),
                symbol_node(artifact, node_type, text(&name, src), line(node)),
            );
        }
    }

    /// The module specifier of an import or re-export, if any.
    fn specifier<'a>(node: &Node<'_>, src: &'a [u8]) -> Option<&'a str> {
        if let Some(source) = node.child_by_field_name("source") {
            return Some(unquote(&source, src));
        }
        // import x = require("y")
        let mut cursor = node.walk();
        let found = node
            .children(&mut cursor)
            .find(|c| c.kind() == "import_require_clause")
            .and_then(|c| c.child_by_field_name("source"))
            .map(|s| unquote(&s, src));
        found
    }

    /// The literal argument of `import("x")` or `require("x")`.
    fn call_specifier<'a>(node: &Node<'_>, src: &'a [u8]) -> Option<&'a str> {
        let function = node.child_by_field_name("function")?;
        let loads = match function.kind() {
            "import" => true,
            "identifier" => text(&function, src) == "require",
            _ => false,
        };
        if !loads {
            return None;
        }
        let argument = node.child_by_field_name("arguments")?.named_child(0)?;
        (argument.kind() == "string").then(|| unquote(&argument, src))
    }
}

impl Default for TypeScriptAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// Package name of a bare specifier: `@scope/name` or the first segment.
fn package_name(specifier: &str) -> &str {
    let specifier = specifier.strip_prefix("node:").unwrap_or(specifier);
    let mut parts = specifier.splitn(3, '/');
    match (parts.next(), parts.next()) {
        (Some(scope), Some(name)) if scope.starts_with('@') => {
            &specifier[..scope.len() + 1 + name.len()]
        }
        (Some(first), _) => first,
        _ => specifier,
    }
}

/// Files a relative specifier may refer to, most specific first.
fn relative_candidates(base: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    for js in [".js", ".jsx", ".mjs", ".cjs"] {
        if let Some(stem) = base.strip_suffix(js) {
            candidates.push(format!("{stem}.ts"));
            candidates.push(format!("{stem}.tsx"));
        }
    }
    for suffix in [".ts", ".tsx", ".d.ts", "/index.ts", "/index.tsx", ".js", "/index.js"] {
        candidates.push(format!("{base}{suffix}"));
    }
    candidates.push(base.to_string());
    candidates
}

fn reference(artifact: &Artifact<'_>, specifier: &str) -> Option<UnresolvedRef> {
    let from = artifact.file_id();
    if specifier.starts_with('.') {
        let Some(base) = join_normalized(dir_of(artifact.path), specifier) else {
            debug!("{}: `{}` escapes the root", artifact.path, specifier);
            return None;
        };
        return Some(UnresolvedRef {
            from,
            candidates: relative_candidates(&base)
                .iter()
                .map(|c| file_node_id(c))
                .collect(),
            edge_type: EdgeType::DependsOn,
            fallback: None,
        });
    }
    if specifier.is_empty() || specifier.starts_with('/') {
        return None;
    }
    Some(UnresolvedRef {
        from,
        candidates: Vec::new(),
        edge_type: EdgeType::DependsOn,
        fallback: Some(package_node(package_name(specifier))),
    })
}

impl SourceAdapter for TypeScriptAdapter {
    fn name(&self) -> &'static str {
        "TypeScriptParser"
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["ts", "tsx", "mts", "cts"]
    }

    fn parse(&self, artifact: &Artifact<'_>) -> Result<GraphFragment, AdapterError> {
        let language = if artifact.extension() == Some("tsx") {
            &self.tsx
        } else {
            &self.typescript
        };
        let tree = parse_tree(language, artifact.content)?;
        let src = artifact.content.as_bytes();
        let root = tree.root_node();
        let mut fragment = GraphFragment::new();

        for node in descendants(root) {
            let specifier = match node.kind() {
                "import_statement" | "export_statement" => Self::specifier(&node, src),
                "call_expression" => Self::call_specifier(&node, src),
                _ => None,
            };
            if let Some(r) = specifier.and_then(|s| reference(artifact, s)) {
                fragment.reference(r);
            }
        }

        let mut cursor = root.walk();
        for node in root.children(&mut cursor) {
            match node.kind() {
                "export_statement" => {
                    if let Some(declaration) = node.child_by_field_name("declaration") {
                        Self::declaration(&declaration, src, artifact, &mut fragment);
                    }
                }
                _ => Self::declaration(&node, src, artifact, &mut fragment),
            }
        }

        Ok(fragment)
    }
}
