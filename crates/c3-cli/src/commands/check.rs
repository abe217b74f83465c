//! Check command implementation.

use anyhow::Result;
use std::path::Path;

use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Runs the check command. Returns whether the report passed.
pub fn run(
    path: &Path,
    format: OutputFormat,
    exclude: Vec<String>,
    source: &ConfigSource,
) -> Result<bool> {
    let pipeline = super::load_pipeline(source, exclude)?;

    tracing::info!(
        "Analyzing {} with {} rules",
        path.display(),
        pipeline.rules().rule_count()
    );

    let analysis = pipeline.run(path).map_err(super::diagnose)?;
    for skipped in &analysis.skipped {
        tracing::debug!("Skipped {}: {}", skipped.path, skipped.reason);
    }

    super::output::print_report(&analysis.report, analysis.parsed, format)?;

    Ok(analysis.report.passed())
}
