//! The source adapter capability and the fragments adapters produce.

use crate::graph::{Edge, EdgeType, Node, NodeType, PATH_PROPERTY};

/// One source artifact handed to an adapter.
#[derive(Debug, Clone, Copy)]
pub struct Artifact<'a> {
    /// Path relative to the analysis root, `/`-separated.
    pub path: &'a str,
    /// Full text content.
    pub content: &'a str,
}

impl<'a> Artifact<'a> {
    /// Creates an artifact.
    #[must_use]
    pub fn new(path: &'a str, content: &'a str) -> Self {
        Self { path, content }
    }

    /// Id of the file node the builder creates for this artifact.
    #[must_use]
    pub fn file_id(&self) -> String {
        file_node_id(self.path)
    }

    /// Final path component.
    #[must_use]
    pub fn file_name(&self) -> &'a str {
        self.path.rsplit('/').next().unwrap_or(self.path)
    }

    /// Extension without the dot, if any.
    #[must_use]
    pub fn extension(&self) -> Option<&'a str> {
        extension_of(self.path)
    }

    /// The file node as the builder creates it; adapters that add properties
    /// start from this so the two merge.
    #[must_use]
    pub fn file_node(&self) -> Node {
        Node::new(self.file_id(), NodeType::File, self.file_name())
            .with_property(PATH_PROPERTY, self.path)
    }
}

/// Node id of a file.
#[must_use]
pub fn file_node_id(path: &str) -> String {
    format!("file:{path}")
}

/// Node id of a directory; the root directory is `.`.
#[must_use]
pub fn dir_node_id(path: &str) -> String {
    format!("dir:{path}")
}

/// Node id of an external package.
#[must_use]
pub fn package_node_id(name: &str) -> String {
    format!("package:{name}")
}

/// Extension of the final path component, without the dot.
///
/// Dotfiles such as `.gitignore` have no extension.
#[must_use]
pub fn extension_of(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(i) => Some(&name[i + 1..]),
    }
}

/// A reference to another artifact that can only be resolved once every
/// artifact has been parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedRef {
    /// Source node id.
    pub from: String,
    /// Target node ids to try, in order.
    pub candidates: Vec<String>,
    /// Type of the edge to create.
    pub edge_type: EdgeType,
    /// Node to add and link when no candidate exists.
    pub fallback: Option<Node>,
}

/// Nodes, edges and references produced from one artifact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphFragment {
    /// Nodes, in discovery order.
    pub nodes: Vec<Node>,
    /// Edges between nodes of this fragment (or the file node).
    pub edges: Vec<Edge>,
    /// Cross-artifact references.
    pub references: Vec<UnresolvedRef>,
}

impl GraphFragment {
    /// Creates an empty fragment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node.
    pub fn node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Adds a node and a `Contains` edge from `parent` to it.
    pub fn child(&mut self, parent: &str, node: Node) {
        self.edges
            .push(Edge::between(EdgeType::Contains, parent, node.id.as_str()));
        self.nodes.push(node);
    }

    /// Adds an edge.
    pub fn edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// Adds a cross-artifact reference.
    pub fn reference(&mut self, reference: UnresolvedRef) {
        self.references.push(reference);
    }

    /// Returns true if the fragment holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.references.is_empty()
    }
}

/// Errors an adapter reports for a single artifact.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// The content is not valid for the adapter's language.
    #[error("syntax error: {message}")]
    Syntax {
        /// Parser message.
        message: String,
    },

    /// The adapter could not initialise its parser.
    #[error("parser setup failed: {0}")]
    Setup(String),
}

/// Turns source artifacts of one language into graph fragments.
///
/// # Example
///
/// ```ignore
/// use c3_core::construct::{Artifact, GraphFragment, SourceAdapter, AdapterError};
///
/// struct MarkdownAdapter;
///
/// impl SourceAdapter for MarkdownAdapter {
///     fn name(&self) -> &'static str { "MarkdownParser" }
///     fn supported_extensions(&self) -> &[&'static str] { &["md"] }
///     fn parse(&self, artifact: &Artifact<'_>) -> Result<GraphFragment, AdapterError> {
///         Ok(GraphFragment::new())
///     }
/// }
/// ```
pub trait SourceAdapter: Send + Sync {
    /// Adapter name, recorded on file nodes and in the graph language.
    fn name(&self) -> &'static str;

    /// File extensions (without dot) this adapter parses.
    fn supported_extensions(&self) -> &[&'static str];

    /// Whether this adapter handles the path.
    ///
    /// Defaults to a case-insensitive extension check.
    fn supports(&self, path: &str) -> bool {
        extension_of(path).is_some_and(|ext| {
            self.supported_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
    }

    /// Parses one artifact.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] if the artifact cannot be parsed.
    fn parse(&self, artifact: &Artifact<'_>) -> Result<GraphFragment, AdapterError>;
}

/// Type alias for boxed adapter trait objects.
pub type AdapterBox = Box<dyn SourceAdapter>;
