//! Builds a property graph from a source tree.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

use super::adapter::{dir_node_id, extension_of, AdapterBox, Artifact, GraphFragment};
use super::fs::{FileSystem, FsError, LocalFileSystem};
use super::ConstructionError;
use crate::cancel::CancellationToken;
use crate::fingerprint::fingerprint;
use crate::graph::{
    Edge, EdgeType, GraphMetadata, Node, NodeType, PropertyGraph, LAYER_PROPERTY, PATH_PROPERTY,
};
use crate::pattern::{GlobPattern, PatternError};

/// A named architecture layer rooted at a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerDef {
    name: String,
    path: String,
    pattern: GlobPattern,
}

impl LayerDef {
    /// Creates a layer. A plain path covers itself and everything below it;
    /// a glob is matched as written.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the path is empty or not a valid glob.
    pub fn new(name: impl Into<String>, path: &str) -> Result<Self, PatternError> {
        let trimmed = path.trim_end_matches('/');
        let pattern = if trimmed.contains(['*', '?', '[']) {
            GlobPattern::new(trimmed)?
        } else if trimmed.is_empty() {
            return Err(PatternError::Empty);
        } else {
            GlobPattern::new(&format!("{trimmed}/**"))?
        };
        Ok(Self {
            name: name.into(),
            path: trimmed.to_string(),
            pattern,
        })
    }

    /// Layer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path as configured.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether a relative path belongs to this layer.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.pattern.matches(path)
    }
}

/// Why an artifact did not contribute to the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No adapter supports the file.
    Unsupported,
    /// The file could not be read.
    Unreadable(String),
    /// The adapter rejected the content.
    Unparsable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => f.write_str("no adapter"),
            Self::Unreadable(e) => write!(f, "unreadable: {e}"),
            Self::Unparsable(e) => write!(f, "unparsable: {e}"),
        }
    }
}

/// An artifact left out of the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedArtifact {
    /// Path relative to the root.
    pub path: String,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Result of a successful construction.
#[derive(Debug, Clone)]
pub struct Construction {
    /// The graph.
    pub graph: PropertyGraph,
    /// Number of files parsed by an adapter.
    pub parsed: usize,
    /// Artifacts left out, in path order.
    pub skipped: Vec<SkippedArtifact>,
}

/// Builder for configuring a [`GraphConstructor`].
#[derive(Default)]
pub struct GraphBuilder {
    adapters: Vec<AdapterBox>,
    excludes: Vec<GlobPattern>,
    layers: Vec<LayerDef>,
    codebase_id: Option<String>,
    parallel: Option<bool>,
    fail_on_parse_error: bool,
    filesystem: Option<Box<dyn FileSystem>>,
    parsed_at: Option<DateTime<Utc>>,
}

impl GraphBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter; the first adapter supporting a file parses it.
    #[must_use]
    pub fn adapter_box(mut self, adapter: AdapterBox) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Registers several adapters in order.
    #[must_use]
    pub fn adapters(mut self, adapters: impl IntoIterator<Item = AdapterBox>) -> Self {
        self.adapters.extend(adapters);
        self
    }

    /// Adds an exclude pattern over relative paths.
    #[must_use]
    pub fn exclude(mut self, pattern: GlobPattern) -> Self {
        self.excludes.push(pattern);
        self
    }

    /// Adds a layer definition. A name already defined keeps its first
    /// definition.
    #[must_use]
    pub fn layer(mut self, layer: LayerDef) -> Self {
        if self.layers.iter().any(|l| l.name() == layer.name()) {
            warn!(
                "Layer `{}` is already defined; ignoring pattern {}",
                layer.name(),
                layer.path()
            );
            return self;
        }
        self.layers.push(layer);
        self
    }

    /// Sets the codebase id (default: root directory name).
    #[must_use]
    pub fn codebase_id(mut self, id: impl Into<String>) -> Self {
        self.codebase_id = Some(id.into());
        self
    }

    /// Sets whether artifacts are parsed in parallel (default: true).
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = Some(parallel);
        self
    }

    /// Sets whether unreadable or unparsable artifacts abort construction
    /// (default: false).
    #[must_use]
    pub fn fail_on_parse_error(mut self, fail: bool) -> Self {
        self.fail_on_parse_error = fail;
        self
    }

    /// Replaces the local disk with another filesystem.
    #[must_use]
    pub fn filesystem(mut self, filesystem: Box<dyn FileSystem>) -> Self {
        self.filesystem = Some(filesystem);
        self
    }

    /// Fixes the parse timestamp, making the graph reproducible.
    #[must_use]
    pub fn parsed_at(mut self, at: DateTime<Utc>) -> Self {
        self.parsed_at = Some(at);
        self
    }

    /// Builds the constructor.
    #[must_use]
    pub fn build(self) -> GraphConstructor {
        GraphConstructor {
            adapters: self.adapters,
            excludes: self.excludes,
            layers: self.layers,
            codebase_id: self.codebase_id,
            parallel: self.parallel.unwrap_or(true),
            fail_on_parse_error: self.fail_on_parse_error,
            filesystem: self
                .filesystem
                .unwrap_or_else(|| Box::new(LocalFileSystem::new())),
            parsed_at: self.parsed_at,
        }
    }
}

/// Walks a source tree and turns it into a [`PropertyGraph`].
///
/// Use [`GraphConstructor::builder()`] to construct an instance.
pub struct GraphConstructor {
    adapters: Vec<AdapterBox>,
    excludes: Vec<GlobPattern>,
    layers: Vec<LayerDef>,
    codebase_id: Option<String>,
    parallel: bool,
    fail_on_parse_error: bool,
    filesystem: Box<dyn FileSystem>,
    parsed_at: Option<DateTime<Utc>>,
}

/// A file scheduled for parsing.
struct Task {
    path: String,
    adapter: usize,
}

enum Outcome {
    Parsed(GraphFragment),
    ReadFailed(FsError),
    ParseFailed(String),
    Cancelled,
}

impl GraphConstructor {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    /// Names of the registered adapters, in dispatch order.
    #[must_use]
    pub fn adapter_names(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Layer definitions.
    #[must_use]
    pub fn layers(&self) -> &[LayerDef] {
        &self.layers
    }

    /// Builds the graph for `root`.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError`] if the root cannot be listed, fragments
    /// are inconsistent, or (in strict mode) an artifact fails.
    pub fn construct(&self, root: &Path) -> Result<Construction, ConstructionError> {
        self.construct_with_cancel(root, &CancellationToken::new())
    }

    /// Like [`construct`](Self::construct), checking `cancel` between artifacts.
    ///
    /// # Errors
    ///
    /// As [`construct`](Self::construct), plus [`ConstructionError::Cancelled`].
    pub fn construct_with_cancel(
        &self,
        root: &Path,
        cancel: &CancellationToken,
    ) -> Result<Construction, ConstructionError> {
        info!("Starting graph construction at {}", root.display());

        let entries = self
            .filesystem
            .list_recursive(root)
            .map_err(|source| ConstructionError::Filesystem {
                root: root.to_path_buf(),
                source,
            })?;

        let mut graph = PropertyGraph::new(self.metadata(root));
        let mut skipped = Vec::new();
        let mut tasks = Vec::new();
        let mut excluded_dirs: Vec<String> = Vec::new();

        let root_name = root
            .file_name()
            .map_or_else(|| ".".to_string(), |n| n.to_string_lossy().into_owned());
        graph.add_node(
            Node::new(dir_node_id("."), NodeType::Directory, root_name)
                .with_property(PATH_PROPERTY, "."),
        )?;

        for entry in entries {
            let rel = to_slash(&entry.path);
            if excluded_dirs
                .iter()
                .any(|d| rel.strip_prefix(d.as_str()).is_some_and(|r| r.starts_with('/')))
            {
                continue;
            }
            if self.excludes.iter().any(|p| p.matches(&rel)) {
                debug!("Excluding: {}", rel);
                if entry.is_dir {
                    excluded_dirs.push(rel);
                }
                continue;
            }

            if entry.is_dir {
                let node = self.stamp_layer(
                    Node::new(dir_node_id(&rel), NodeType::Directory, base_name(&rel))
                        .with_property(PATH_PROPERTY, rel.as_str()),
                    &rel,
                );
                graph.add_node(node)?;
                graph.add_edge(Edge::between(
                    EdgeType::Contains,
                    dir_node_id(parent_of(&rel)),
                    dir_node_id(&rel),
                ))?;
                continue;
            }

            match self.adapters.iter().position(|a| a.supports(&rel)) {
                Some(adapter) => tasks.push(Task { path: rel, adapter }),
                None => {
                    debug!("No adapter for {}", rel);
                    skipped.push(SkippedArtifact {
                        path: rel,
                        reason: SkipReason::Unsupported,
                    });
                }
            }
        }

        info!("Found {} files to parse", tasks.len());

        let outcomes: Vec<Outcome> = if self.parallel {
            tasks
                .par_iter()
                .map(|task| self.parse_task(root, task, cancel))
                .collect()
        } else {
            tasks
                .iter()
                .map(|task| self.parse_task(root, task, cancel))
                .collect()
        };
        if cancel.is_cancelled() {
            return Err(ConstructionError::Cancelled);
        }

        let mut fragments = Vec::with_capacity(tasks.len());
        let mut used_adapters = vec![false; self.adapters.len()];
        for (task, outcome) in tasks.iter().zip(outcomes) {
            match outcome {
                Outcome::Parsed(fragment) => {
                    used_adapters[task.adapter] = true;
                    fragments.push((task, fragment));
                }
                Outcome::ReadFailed(source) => {
                    warn!("Failed to read {}: {}", task.path, source);
                    if self.fail_on_parse_error {
                        return Err(ConstructionError::AdapterReadFailure {
                            path: task.path.clone(),
                            source,
                        });
                    }
                    skipped.push(SkippedArtifact {
                        path: task.path.clone(),
                        reason: SkipReason::Unreadable(source.to_string()),
                    });
                }
                Outcome::ParseFailed(message) => {
                    warn!("Failed to parse {}: {}", task.path, message);
                    if self.fail_on_parse_error {
                        return Err(ConstructionError::AdapterParseFailure {
                            path: task.path.clone(),
                            adapter: self.adapters[task.adapter].name().to_string(),
                            message,
                        });
                    }
                    skipped.push(SkippedArtifact {
                        path: task.path.clone(),
                        reason: SkipReason::Unparsable(message),
                    });
                }
                Outcome::Cancelled => return Err(ConstructionError::Cancelled),
            }
        }
        skipped.sort_by(|a, b| a.path.cmp(&b.path));

        self.merge(&mut graph, &fragments)?;
        self.add_layer_nodes(&mut graph)?;

        graph.metadata_mut().language = self
            .adapters
            .iter()
            .zip(&used_adapters)
            .filter(|(_, used)| **used)
            .map(|(a, _)| a.name())
            .collect::<Vec<_>>()
            .join(",");

        info!(
            "Graph construction complete: {} nodes, {} edges from {} files ({} skipped)",
            graph.node_count(),
            graph.edge_count(),
            fragments.len(),
            skipped.len()
        );

        Ok(Construction {
            graph,
            parsed: fragments.len(),
            skipped,
        })
    }

    fn metadata(&self, root: &Path) -> GraphMetadata {
        let codebase_id = self.codebase_id.clone().unwrap_or_else(|| {
            root.file_name()
                .map_or_else(|| "codebase".to_string(), |n| n.to_string_lossy().into_owned())
        });
        let graph_id = format!(
            "graph-{}",
            fingerprint([codebase_id.as_str(), root.to_string_lossy().as_ref()])
        );
        let mut metadata = GraphMetadata::new(graph_id, codebase_id);
        if let Some(at) = self.parsed_at {
            metadata.parsed_at = at;
        }
        metadata
    }

    fn parse_task(&self, root: &Path, task: &Task, cancel: &CancellationToken) -> Outcome {
        if cancel.is_cancelled() {
            return Outcome::Cancelled;
        }
        let adapter = &self.adapters[task.adapter];
        debug!("Parsing {} with {}", task.path, adapter.name());

        let content = match self.filesystem.read_to_string(&root.join(&task.path)) {
            Ok(content) => content,
            Err(e) => return Outcome::ReadFailed(e),
        };
        match adapter.parse(&Artifact::new(&task.path, &content)) {
            Ok(fragment) => Outcome::Parsed(fragment),
            Err(e) => Outcome::ParseFailed(e.to_string()),
        }
    }

    /// Merges fragments in path order: file nodes and fragment nodes, then
    /// edges, then cross-artifact references.
    fn merge(
        &self,
        graph: &mut PropertyGraph,
        fragments: &[(&Task, GraphFragment)],
    ) -> Result<(), ConstructionError> {
        for (task, fragment) in fragments {
            let artifact = Artifact::new(&task.path, "");
            let mut file = self.stamp_layer(artifact.file_node(), &task.path);
            if let Some(ext) = extension_of(&task.path) {
                file = file.with_property("extension", ext);
            }
            file = file.with_property("adapter", self.adapters[task.adapter].name());
            let layer = file.layer().map(str::to_string);
            let file_id = file.id.clone();

            graph.add_node(file)?;
            graph.add_edge(Edge::between(
                EdgeType::Contains,
                dir_node_id(parent_of(&task.path)),
                file_id,
            ))?;

            for node in &fragment.nodes {
                let mut node = node.clone();
                if let Some(layer) = &layer {
                    if is_symbol(node.node_type) && node.layer().is_none() {
                        node = node.with_property(LAYER_PROPERTY, layer.as_str());
                    }
                }
                graph.add_node(node)?;
            }
        }

        for (_, fragment) in fragments {
            for edge in &fragment.edges {
                if graph.edge(&edge.id) == Some(edge) {
                    continue;
                }
                graph.add_edge(edge.clone())?;
            }
        }

        for (_, fragment) in fragments {
            for reference in &fragment.references {
                if !graph.contains_node(&reference.from) {
                    debug!("Dropping reference from unknown node {}", reference.from);
                    continue;
                }
                let target = match reference
                    .candidates
                    .iter()
                    .find(|c| graph.contains_node(c))
                {
                    Some(found) => found.clone(),
                    None => match &reference.fallback {
                        Some(node) => {
                            graph.add_node(node.clone())?;
                            node.id.clone()
                        }
                        None => {
                            debug!(
                                "Unresolved reference from {} to {:?}",
                                reference.from, reference.candidates
                            );
                            continue;
                        }
                    },
                };
                if target == reference.from {
                    continue;
                }
                let edge = Edge::between(reference.edge_type, reference.from.as_str(), target);
                if graph.edge(&edge.id).is_none() {
                    graph.add_edge(edge)?;
                }
            }
        }
        Ok(())
    }

    fn add_layer_nodes(&self, graph: &mut PropertyGraph) -> Result<(), ConstructionError> {
        for layer in &self.layers {
            let id = format!("layer:{}", layer.name());
            graph.add_node(
                Node::new(id.clone(), NodeType::Layer, layer.name())
                    .with_property("pattern", layer.path()),
            )?;
            let members: Vec<String> = graph
                .nodes()
                .filter(|n| n.node_type == NodeType::File && n.layer() == Some(layer.name()))
                .map(|n| n.id.clone())
                .collect();
            for member in members {
                graph.add_edge(Edge::between(EdgeType::Contains, id.as_str(), member))?;
            }
        }
        Ok(())
    }

    fn stamp_layer(&self, node: Node, rel: &str) -> Node {
        match self.layers.iter().find(|l| l.contains(rel)) {
            Some(layer) => node.with_property(LAYER_PROPERTY, layer.name()),
            None => node,
        }
    }
}

/// Builds a graph from `root` with the given adapters and default settings.
///
/// # Errors
///
/// See [`GraphConstructor::construct`].
pub fn construct(root: &Path, adapters: Vec<AdapterBox>) -> Result<PropertyGraph, ConstructionError> {
    GraphConstructor::builder()
        .adapters(adapters)
        .build()
        .construct(root)
        .map(|c| c.graph)
}

fn is_symbol(node_type: NodeType) -> bool {
    matches!(
        node_type,
        NodeType::Module | NodeType::Class | NodeType::Interface | NodeType::Function
    )
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn parent_of(rel: &str) -> &str {
    rel.rfind('/').map_or(".", |i| &rel[..i])
}

fn base_name(rel: &str) -> &str {
    rel.rsplit('/').next().unwrap_or(rel)
}
