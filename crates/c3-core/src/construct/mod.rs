//! Graph construction: walking a source tree through source adapters.

mod adapter;
mod builder;
mod fs;

pub use adapter::{
    dir_node_id, extension_of, file_node_id, package_node_id, AdapterBox, AdapterError, Artifact,
    GraphFragment, SourceAdapter, UnresolvedRef,
};
pub use builder::{
    construct, Construction, GraphBuilder, GraphConstructor, LayerDef, SkipReason,
    SkippedArtifact,
};
pub use fs::{FileSystem, FsEntry, FsError, LocalFileSystem, MemoryFileSystem};

use miette::Diagnostic;
use std::path::PathBuf;

use crate::graph::GraphError;

/// Errors that abort graph construction. No partial graph is returned.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum ConstructionError {
    /// An edge pointed at a node that was never produced.
    #[error("edge `{edge_id}` references missing node `{missing}`")]
    #[diagnostic(
        code(c3::construct::dangling_reference),
        help("an adapter emitted an edge to a node it did not create")
    )]
    DanglingReference {
        /// The rejected edge.
        edge_id: String,
        /// The absent endpoint.
        missing: String,
    },

    /// Two artifacts produced incompatible nodes or edges under one id.
    #[error("duplicate id `{id}`: {reason}")]
    #[diagnostic(code(c3::construct::duplicate_id))]
    DuplicateIdConflict {
        /// The colliding id.
        id: String,
        /// What differs.
        reason: String,
    },

    /// A file could not be read (strict mode only).
    #[error("failed to read {path}: {source}")]
    #[diagnostic(
        code(c3::construct::read_failure),
        help("disable `fail_on_parse_error` to skip unreadable files")
    )]
    AdapterReadFailure {
        /// Relative path.
        path: String,
        /// Filesystem error.
        source: FsError,
    },

    /// An adapter rejected a file (strict mode only).
    #[error("{adapter} failed to parse {path}: {message}")]
    #[diagnostic(
        code(c3::construct::parse_failure),
        help("disable `fail_on_parse_error` to skip unparsable files")
    )]
    AdapterParseFailure {
        /// Relative path.
        path: String,
        /// Adapter name.
        adapter: String,
        /// Adapter message.
        message: String,
    },

    /// The root could not be listed.
    #[error("cannot list {}: {source}", root.display())]
    #[diagnostic(code(c3::construct::filesystem))]
    Filesystem {
        /// Analysis root.
        root: PathBuf,
        /// Filesystem error.
        source: FsError,
    },

    /// The caller cancelled construction.
    #[error("graph construction cancelled")]
    #[diagnostic(code(c3::construct::cancelled))]
    Cancelled,
}

impl From<GraphError> for ConstructionError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::DanglingReference { edge_id, missing } => {
                Self::DanglingReference { edge_id, missing }
            }
            GraphError::DuplicateIdConflict { id, reason } => {
                Self::DuplicateIdConflict { id, reason }
            }
        }
    }
}
