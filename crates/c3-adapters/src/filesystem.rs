//! Fallback adapter for files no language adapter claims.

use c3_core::construct::AdapterError;
use c3_core::{Artifact, GraphFragment, SourceAdapter};

/// Records every file with its size, without looking at its structure.
///
/// Register it last: it supports every path.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilesystemAdapter;

impl FilesystemAdapter {
    /// Creates the adapter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl SourceAdapter for FilesystemAdapter {
    fn name(&self) -> &'static str {
        "FilesystemParser"
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &[]
    }

    fn supports(&self, _path: &str) -> bool {
        true
    }

    fn parse(&self, artifact: &Artifact<'_>) -> Result<GraphFragment, AdapterError> {
        let mut fragment = GraphFragment::new();
        fragment.node(
            artifact
                .file_node()
                .with_property("lines", artifact.content.lines().count())
                .with_property("bytes", artifact.content.len()),
        );
        Ok(fragment)
    }
}
