//! Parse command implementation.

use anyhow::Result;
use std::path::Path;

use crate::config_resolver::ConfigSource;
use crate::GraphFormat;

/// Runs the parse command: builds the graph and prints it.
pub fn run(
    path: &Path,
    format: GraphFormat,
    exclude: Vec<String>,
    source: &ConfigSource,
) -> Result<()> {
    let pipeline = super::load_pipeline(source, exclude)?;
    let construction = pipeline.construct(path).map_err(super::diagnose)?;

    tracing::info!(
        "Parsed {} file(s), skipped {}",
        construction.parsed,
        construction.skipped.len()
    );

    super::output::print_graph(&construction.graph, format)
}
