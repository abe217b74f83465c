//! TOML configuration types (DTO layer).
//!
//! These types mirror `c3.toml` one-to-one and carry no validation; the
//! [`loader`](crate::loader) turns them into rules, layers and whitelist
//! entries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "c3.toml";

/// Starter configuration written by `c3 init`.
pub const STARTER_CONFIG: &str = r#"# c3 architecture configuration
version = "1"
extends = ["c3/recommended"]

[architecture]
style = "layered"

# Listed from the innermost layer outwards.
[[architecture.layers]]
name = "domain"
path = "src/domain"

[[architecture.layers]]
name = "application"
path = "src/application"

[[architecture.layers]]
name = "infrastructure"
path = "src/infrastructure"

[[architecture.layers]]
name = "presentation"
path = "src/presentation"

[analyzer]
exclude = ["**/node_modules/**", "**/dist/**", "**/coverage/**", "**/target/**"]

[rules]
consistent-naming = { style = "kebab-case" }
layer-dependencies = { flow = "inward" }

[[custom]]
id = "no-direct-db-access-from-domain"
name = "No direct database access from domain"
type = "dependency"
severity = "error"
description = "Domain code must go through repository interfaces"

[custom.condition]
type = "dependency"
from = { layer = "domain" }
to = { matches = "**/database/**" }
forbidden = true

[[whitelist]]
rule = "consistent-naming"
path = "legacy/**"
reason = "Legacy code, will refactor later"
"#;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Config format version.
    #[serde(default)]
    pub version: Option<String>,

    /// Presets (`c3/recommended`) or relative paths of other config files.
    #[serde(default)]
    pub extends: Vec<String>,

    /// Architecture description.
    #[serde(default)]
    pub architecture: ArchitectureConfig,

    /// Analyzer configuration.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Per-rule overrides of inherited rules.
    #[serde(default)]
    pub rules: BTreeMap<String, RuleOverride>,

    /// Project-specific rules.
    #[serde(default)]
    pub custom: Vec<CustomRuleConfig>,

    /// Suppressed violations.
    #[serde(default)]
    pub whitelist: Vec<WhitelistConfig>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }
}

/// `[architecture]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchitectureConfig {
    /// Free-form style label, e.g. `layered` or `hexagonal`.
    #[serde(default)]
    pub style: Option<String>,

    /// Layers, innermost first.
    #[serde(default)]
    pub layers: Vec<LayerConfig>,
}

/// One `[[architecture.layers]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerConfig {
    /// Layer name.
    pub name: String,
    /// Directory or glob, relative to the analyzed root.
    pub path: String,
}

/// `[analyzer]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Glob patterns to exclude from analysis.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Whether to respect .gitignore files.
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    /// Whether artifacts are parsed in parallel.
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Whether an unreadable or unparsable artifact aborts the run.
    #[serde(default)]
    pub fail_on_parse_error: bool,

    /// Codebase id used in reports (default: root directory name).
    #[serde(default)]
    pub codebase_id: Option<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            exclude: default_exclude(),
            respect_gitignore: true,
            parallel: true,
            fail_on_parse_error: false,
            codebase_id: None,
        }
    }
}

fn default_exclude() -> Vec<String> {
    ["**/node_modules/**", "**/dist/**", "**/coverage/**", "**/target/**"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_true() -> bool {
    true
}

/// A `[rules]` entry: `"off"`, a severity, or an options table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleOverride {
    /// `"off"` or a severity name.
    Level(String),
    /// Severity, `enabled` flag and condition parameters.
    Options(RuleOptions),
}

/// Table form of a `[rules]` entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleOptions {
    /// `false` removes the rule.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override.
    #[serde(default)]
    pub severity: Option<String>,

    /// Parameters merged into the rule's condition.
    #[serde(flatten)]
    pub options: toml::Table,
}

/// One `[[custom]]` rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomRuleConfig {
    /// Rule id (e.g., "no-direct-db-access-from-domain").
    pub id: String,
    /// Display name (default: the id).
    #[serde(default)]
    pub name: Option<String>,
    /// Rule type: dependency, naming, layering or custom.
    #[serde(rename = "type")]
    pub rule_type: String,
    /// Severity (default: "error").
    #[serde(default = "default_severity_str")]
    pub severity: String,
    /// What the rule enforces.
    #[serde(default)]
    pub description: Option<String>,
    /// Document reference.
    #[serde(default)]
    pub doc: Option<String>,
    /// Violation message.
    #[serde(default)]
    pub message: Option<String>,
    /// Condition table; `type` defaults to the rule type for
    /// dependency, naming and layering rules.
    #[serde(default)]
    pub condition: toml::Table,
}

fn default_severity_str() -> String {
    "error".to_string()
}

/// One `[[whitelist]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WhitelistConfig {
    /// Rule id.
    pub rule: String,
    /// Location glob; omitted means every violation of the rule.
    #[serde(default)]
    pub path: Option<String>,
    /// Why the exception exists.
    pub reason: String,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },
}
