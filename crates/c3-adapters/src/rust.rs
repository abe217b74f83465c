//! Rust adapter built on `syn`.

use std::collections::BTreeSet;

use c3_core::construct::{file_node_id, AdapterError, UnresolvedRef};
use c3_core::{Artifact, Edge, EdgeType, GraphFragment, NodeType, SourceAdapter};
use proc_macro2::Span;
use syn::{Attribute, Item, Type, UseTree};
use tracing::debug;

use crate::symbols::{package_node, symbol_id, symbol_node, under};

/// Parses `.rs` files into type, trait and function nodes plus module
/// dependencies.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustAdapter;

impl RustAdapter {
    /// Creates the adapter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl SourceAdapter for RustAdapter {
    fn name(&self) -> &'static str {
        "RustParser"
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["rs"]
    }

    fn parse(&self, artifact: &Artifact<'_>) -> Result<GraphFragment, AdapterError> {
        let file = syn::parse_file(artifact.content).map_err(|e| {
            let start = e.span().start();
            AdapterError::Syntax {
                message: format!("{}:{}: {e}", start.line, start.column + 1),
            }
        })?;

        let mut collector = Collector::new(artifact);
        collector.items(&file.items);
        Ok(collector.finish())
    }
}

fn line_of(span: Span) -> usize {
    span.start().line
}

fn is_cfg_test(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path().is_ident("cfg") && attr.parse_args::<syn::Ident>().is_ok_and(|i| i == "test")
    })
}

fn last_ident(path: &syn::Path) -> Option<String> {
    path.segments.last().map(|s| s.ident.to_string())
}

/// Flattens a `use` tree into full paths; globs and `self` stop at the
/// module.
fn flatten_use(tree: &UseTree, prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
    match tree {
        UseTree::Path(p) => {
            prefix.push(p.ident.to_string());
            flatten_use(&p.tree, prefix, out);
            prefix.pop();
        }
        UseTree::Name(n) if n.ident == "self" => out.push(prefix.clone()),
        UseTree::Name(n) => out.push(with(prefix, n.ident.to_string())),
        UseTree::Rename(r) if r.ident == "self" => out.push(prefix.clone()),
        UseTree::Rename(r) => out.push(with(prefix, r.ident.to_string())),
        UseTree::Glob(_) => out.push(prefix.clone()),
        UseTree::Group(g) => {
            for item in &g.items {
                flatten_use(item, prefix, out);
            }
        }
    }
}

fn with(prefix: &[String], last: String) -> Vec<String> {
    let mut path = prefix.to_vec();
    path.push(last);
    path
}

/// Where a file sits in its crate.
#[derive(Debug, PartialEq, Eq)]
struct ModuleLocation {
    /// Directory holding `lib.rs` / `main.rs` (the first `src` directory).
    crate_root: String,
    /// Module path of the file below the crate root.
    module: Vec<String>,
}

impl ModuleLocation {
    fn of(path: &str) -> Self {
        let parts: Vec<&str> = path.split('/').collect();
        let (dirs, file) = parts.split_at(parts.len().saturating_sub(1));
        let root_len = dirs
            .iter()
            .position(|p| *p == "src")
            .map_or(dirs.len(), |i| i + 1);

        let mut module: Vec<String> = dirs[root_len..].iter().map(|s| (*s).to_string()).collect();
        let stem = file
            .first()
            .map_or("", |f| f.strip_suffix(".rs").unwrap_or(f));
        let is_root_file = module.is_empty() && matches!(stem, "lib" | "main");
        if stem != "mod" && !is_root_file {
            module.push(stem.to_string());
        }

        Self {
            crate_root: dirs[..root_len].join("/"),
            module,
        }
    }
}

enum Target {
    Local(Vec<String>),
    External(String),
}

struct Collector<'a> {
    artifact: &'a Artifact<'a>,
    fragment: GraphFragment,
    location: ModuleLocation,
    types: BTreeSet<String>,
    traits: BTreeSet<String>,
    impls: Vec<(String, String)>,
    /// Inline module path of the items being visited.
    scope: Vec<String>,
    /// Modules declared in this file, as paths below the file's module.
    local_mods: BTreeSet<Vec<String>>,
    /// The subset of `local_mods` whose body is in this file.
    inline_mods: BTreeSet<Vec<String>>,
    /// `use` paths with the inline scope they appear in.
    uses: Vec<(Vec<String>, Vec<String>)>,
    extern_crates: Vec<String>,
}

impl<'a> Collector<'a> {
    fn new(artifact: &'a Artifact<'a>) -> Self {
        Self {
            artifact,
            fragment: GraphFragment::new(),
            location: ModuleLocation::of(artifact.path),
            types: BTreeSet::new(),
            traits: BTreeSet::new(),
            impls: Vec::new(),
            scope: Vec::new(),
            local_mods: BTreeSet::new(),
            inline_mods: BTreeSet::new(),
            uses: Vec::new(),
            extern_crates: Vec::new(),
        }
    }

    fn symbol(&mut self, node_type: NodeType, ident: &syn::Ident) {
        let name = ident.to_string();
        let node = symbol_node(self.artifact, node_type, &name, line_of(ident.span()));
        self.fragment.child(&self.artifact.file_id(), node);
        match node_type {
            NodeType::Class => {
                self.types.insert(name);
            }
            NodeType::Interface => {
                self.traits.insert(name);
            }
            _ => {}
        }
    }

    fn items(&mut self, items: &[Item]) {
        for item in items {
            match item {
                Item::Struct(s) => self.symbol(NodeType::Class, &s.ident),
                Item::Enum(e) => self.symbol(NodeType::Class, &e.ident),
                Item::Union(u) => self.symbol(NodeType::Class, &u.ident),
                Item::Trait(t) => self.symbol(NodeType::Interface, &t.ident),
                Item::Fn(f) => self.symbol(NodeType::Function, &f.sig.ident),
                Item::Impl(i) => {
                    let trait_name = i.trait_.as_ref().and_then(|(_, path, _)| last_ident(path));
                    let type_name = match &*i.self_ty {
                        Type::Path(p) => last_ident(&p.path),
                        _ => None,
                    };
                    if let (Some(trait_name), Some(type_name)) = (trait_name, type_name) {
                        self.impls.push((type_name, trait_name));
                    }
                }
                Item::Mod(m) => {
                    let path = with(&self.scope, m.ident.to_string());
                    match &m.content {
                        Some(_) if is_cfg_test(&m.attrs) => {}
                        Some((_, inner)) => {
                            self.local_mods.insert(path.clone());
                            self.inline_mods.insert(path);
                            self.scope.push(m.ident.to_string());
                            self.items(inner);
                            self.scope.pop();
                        }
                        None => {
                            self.local_mods.insert(path);
                        }
                    }
                }
                Item::Use(u) => {
                    let mut paths = Vec::new();
                    flatten_use(&u.tree, &mut Vec::new(), &mut paths);
                    let scope = &self.scope;
                    self.uses.extend(paths.into_iter().map(|p| (scope.clone(), p)));
                }
                Item::ExternCrate(c) if c.ident != "self" => {
                    self.extern_crates.push(c.ident.to_string());
                }
                _ => {}
            }
        }
    }

    /// Module path of `scope` inside this file.
    fn module_at(&self, scope: &[String]) -> Vec<String> {
        let mut module = self.location.module.clone();
        module.extend(scope.iter().cloned());
        module
    }

    fn target(&self, scope: &[String], path: &[String]) -> Option<Target> {
        let first = path.first()?;
        let (mut base, rest) = match first.as_str() {
            "crate" => (Vec::new(), &path[1..]),
            "self" => (self.module_at(scope), &path[1..]),
            "super" => {
                let mut base = self.module_at(scope);
                let supers = path.iter().take_while(|s| *s == "super").count();
                for _ in 0..supers {
                    base.pop()?;
                }
                (base, &path[supers..])
            }
            name if self.local_mods.contains(&with(scope, name.to_string())) => {
                (self.module_at(scope), path)
            }
            name => return Some(Target::External(name.to_string())),
        };
        base.extend(rest.iter().cloned());
        Some(Target::Local(base))
    }

    /// Whether `module` is this file's own module or one of its inline ones.
    fn in_this_file(&self, module: &[String]) -> bool {
        let Some(inner) = module.strip_prefix(self.location.module.as_slice()) else {
            return false;
        };
        let encloses = |m: &Vec<String>| inner.starts_with(m);
        inner.is_empty()
            || (self.inline_mods.iter().any(encloses)
                && !self.local_mods.difference(&self.inline_mods).any(encloses))
    }

    /// Candidate files for a module path, longest prefix first.
    fn candidates(&self, module: &[String]) -> Vec<String> {
        let root = &self.location.crate_root;
        let mut candidates = Vec::new();
        for n in (1..=module.len()).rev() {
            let prefix = module[..n].join("/");
            candidates.push(under(root, &format!("{prefix}.rs")));
            candidates.push(under(root, &format!("{prefix}/mod.rs")));
        }
        candidates.push(under(root, "lib.rs"));
        candidates.push(under(root, "main.rs"));
        candidates
    }

    fn finish(mut self) -> GraphFragment {
        let path = self.artifact.path;
        for (type_name, trait_name) in &self.impls {
            if self.types.contains(type_name) && self.traits.contains(trait_name) {
                self.fragment.edge(Edge::between(
                    EdgeType::Implements,
                    symbol_id(path, NodeType::Class, type_name),
                    symbol_id(path, NodeType::Interface, trait_name),
                ));
            }
        }

        let from = self.artifact.file_id();
        let mut references = Vec::new();
        for (scope, use_path) in &self.uses {
            match self.target(scope, use_path) {
                Some(Target::Local(module)) if self.in_this_file(&module) => {}
                Some(Target::Local(module)) => references.push(UnresolvedRef {
                    from: from.clone(),
                    candidates: self
                        .candidates(&module)
                        .iter()
                        .map(|c| file_node_id(c))
                        .collect(),
                    edge_type: EdgeType::DependsOn,
                    fallback: None,
                }),
                Some(Target::External(name)) => references.push(external(&from, &name)),
                None => debug!("{}: `{}` points above the crate root", path, use_path.join("::")),
            }
        }
        for name in &self.extern_crates {
            references.push(external(&from, name));
        }
        for reference in references {
            self.fragment.reference(reference);
        }
        self.fragment
    }
}

fn external(from: &str, name: &str) -> UnresolvedRef {
    UnresolvedRef {
        from: from.to_string(),
        candidates: Vec::new(),
        edge_type: EdgeType::DependsOn,
        fallback: Some(package_node(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(path: &str, src: &str) -> GraphFragment {
        RustAdapter.parse(&Artifact::new(path, src)).unwrap()
    }

    fn node_names(fragment: &GraphFragment, node_type: NodeType) -> Vec<&str> {
        fragment
            .nodes
            .iter()
            .filter(|n| n.node_type == node_type)
            .map(|n| n.name.as_str())
            .collect()
    }

    #[test]
    fn module_location_from_path() {
        let loc = ModuleLocation::of("crates/core/src/graph/model.rs");
        assert_eq!(loc.crate_root, "crates/core/src");
        assert_eq!(loc.module, vec!["graph", "model"]);

        assert!(ModuleLocation::of("src/lib.rs").module.is_empty());
        assert_eq!(ModuleLocation::of("src/graph/mod.rs").module, vec!["graph"]);
        assert_eq!(ModuleLocation::of("build.rs").crate_root, "");
    }

    #[test]
    fn extracts_types_traits_and_functions() {
        let fragment = parse(
            "src/shapes.rs",
            r"
pub struct Circle;
enum Kind { A }
pub trait Area { fn area(&self) -> f64; }
impl Area for Circle { fn area(&self) -> f64 { 0.0 } }
pub fn unit() -> Circle { Circle }

#[cfg(test)]
mod tests {
    fn helper() {}
}
",
        );

        assert_eq!(node_names(&fragment, NodeType::Class), vec!["Circle", "Kind"]);
        assert_eq!(node_names(&fragment, NodeType::Interface), vec!["Area"]);
        assert_eq!(node_names(&fragment, NodeType::Function), vec!["unit"]);

        let implements: Vec<_> = fragment
            .edges
            .iter()
            .filter(|e| e.edge_type == EdgeType::Implements)
            .collect();
        assert_eq!(implements.len(), 1);
        assert_eq!(implements[0].from, "src/shapes.rs::class:Circle");
        assert_eq!(implements[0].to, "src/shapes.rs::interface:Area");
        assert_eq!(fragment.nodes[0].property("line"), Some(&2usize.into()));
    }

    #[test]
    fn crate_paths_become_file_candidates() {
        let fragment = parse("src/app/service.rs", "use crate::domain::order::{Order, OrderId};");
        assert_eq!(fragment.references.len(), 2);
        let candidates = &fragment.references[0].candidates;
        assert_eq!(candidates[0], "file:src/domain/order/Order.rs");
        assert!(candidates.contains(&"file:src/domain/order.rs".to_string()));
        assert!(candidates.contains(&"file:src/domain/mod.rs".to_string()));
        assert_eq!(candidates.last().map(String::as_str), Some("file:src/main.rs"));
    }

    #[test]
    fn super_self_and_local_modules_resolve_relative() {
        let fragment = parse(
            "src/graph/model.rs",
            "mod detail;\nuse super::selector::Selector;\nuse self::inner::X;\nuse detail::Y;",
        );
        let firsts: Vec<&str> = fragment
            .references
            .iter()
            .map(|r| r.candidates[0].as_str())
            .collect();
        assert_eq!(
            firsts,
            vec![
                "file:src/graph/selector/Selector.rs",
                "file:src/graph/model/inner/X.rs",
                "file:src/graph/model/detail/Y.rs",
            ]
        );
    }

    #[test]
    fn external_crates_fall_back_to_packages() {
        let fragment = parse("src/lib.rs", "use serde::Serialize;\nextern crate alloc;");
        let fallbacks: Vec<&str> = fragment
            .references
            .iter()
            .filter_map(|r| r.fallback.as_ref())
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(fallbacks, vec!["package:serde", "package:alloc"]);
    }

    #[test]
    fn inline_modules_resolve_within_the_file() {
        let fragment = parse(
            "src/graph/model.rs",
            r"
use helpers::f;

mod helpers {
    pub fn f() {}
}

mod sealed {
    use super::*;
    use super::helpers::f;
    use super::super::selector::Selector;
}
",
        );

        assert_eq!(fragment.references.len(), 1);
        assert!(fragment.references[0].fallback.is_none());
        assert_eq!(
            fragment.references[0].candidates[0],
            "file:src/graph/selector/Selector.rs"
        );
        assert!(!fragment.references[0]
            .candidates
            .contains(&"file:src/graph/model.rs".to_string()));
    }

    #[test]
    fn out_of_line_module_inside_inline_module_is_local() {
        let fragment = parse("src/lib.rs", "mod outer {
    mod store;
    use store::Db;
}");
        assert_eq!(fragment.references.len(), 1);
        assert!(fragment.references[0].fallback.is_none());
        assert_eq!(fragment.references[0].candidates[0], "file:src/outer/store/Db.rs");
    }

    #[test]
    fn super_above_crate_root_is_dropped() {
        let fragment = parse("src/lib.rs", "use super::Nothing;");
        assert!(fragment.references.is_empty());
    }

    #[test]
    fn syntax_error_is_reported() {
        let err = RustAdapter
            .parse(&Artifact::new("src/broken.rs", "fn broken( {"))
            .unwrap_err();
        assert!(matches!(err, AdapterError::Syntax { .. }));
    }
}
