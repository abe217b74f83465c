//! Subcommand implementations.

pub mod check;
pub mod init;
pub mod list_rules;
pub mod output;
pub mod parse;

use anyhow::{Context, Result};
use c3::rules::Config;
use c3::{default_config, Pipeline, PipelineError};
use std::path::Path;

use crate::config_resolver::ConfigSource;

/// Loads the resolved config, adds `--exclude` patterns and assembles the
/// pipeline.
pub fn load_pipeline(source: &ConfigSource, exclude: Vec<String>) -> Result<Pipeline> {
    let (mut config, base_dir) = match source {
        ConfigSource::Builtin => {
            tracing::info!("No config found, using c3/recommended");
            (default_config(), Path::new(".").to_path_buf())
        }
        other => {
            let p = other.path().context("resolved config has no path")?;
            if source.is_user_wide() {
                tracing::info!("Using user config: {}", p.display());
            }
            let config = Config::from_file(p)
                .with_context(|| format!("Failed to load config: {}", p.display()))?;
            let base_dir = p.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
            (config, base_dir)
        }
    };
    config.analyzer.exclude.extend(exclude);

    Pipeline::assemble(&config, &base_dir).map_err(diagnose)
}

/// Renders a pipeline error with its miette diagnostic (code, help).
pub fn diagnose(err: PipelineError) -> anyhow::Error {
    anyhow::anyhow!("{:?}", miette::Report::new(err))
}
