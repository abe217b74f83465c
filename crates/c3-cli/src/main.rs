//! c3 CLI tool.
//!
//! Usage:
//! ```bash
//! c3 check [OPTIONS] [PATH]
//! c3 parse [OPTIONS] [PATH]
//! c3 list-rules
//! c3 init
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Architecture compliance checks over a property graph of your code
#[derive(Parser)]
#[command(name = "c3")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "C3_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the graph and evaluate every configured rule
    Check {
        /// Path to analyze (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Exclude patterns (can be specified multiple times)
        #[arg(short, long)]
        exclude: Vec<String>,
    },

    /// Build the graph only and print it
    Parse {
        /// Path to analyze (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: GraphFormat,

        /// Exclude patterns (can be specified multiple times)
        #[arg(short, long)]
        exclude: Vec<String>,
    },

    /// List built-in presets and their rules
    ListRules,

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for compliance reports.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-violation compact format.
    Compact,
}

/// Output format for the `parse` command.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum GraphFormat {
    /// Node and edge counts by type.
    #[default]
    Text,
    /// The serialized graph.
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            path,
            format,
            exclude,
        } => {
            let source = config_resolver::resolve(&path, cli.config.as_deref());
            let passed = commands::check::run(&path, format, exclude, &source)?;
            if !passed {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Parse {
            path,
            format,
            exclude,
        } => {
            let source = config_resolver::resolve(&path, cli.config.as_deref());
            commands::parse::run(&path, format, exclude, &source)
        }
        Commands::ListRules => {
            commands::list_rules::run();
            Ok(())
        }
        Commands::Init { force } => commands::init::run(std::path::Path::new("."), force),
    }
}
