//! # c3-rules
//!
//! Rule management for c3: presets, `c3.toml` loading and rule-set
//! resolution.
//!
//! ## Presets
//!
//! | Name | Rules |
//! |------|-------|
//! | `c3/recommended` | `no-circular-dependencies`, `consistent-naming`, `layer-dependencies` |
//! | `c3/strict` | recommended rules at error severity, `max-fan-out` |
//! | `c3/minimal` | `no-circular-dependencies` |
//!
//! ## Usage
//!
//! ```ignore
//! use c3_core::{EvaluationEngine, RuleProvider};
//! use c3_rules::RuleManager;
//!
//! let rules = RuleManager::from_file("c3.toml".as_ref())?;
//! let report = EvaluationEngine::with_defaults().evaluate_provider(&graph, &rules)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// TOML configuration types.
pub mod config;
/// Configuration validation and conversion.
pub mod loader;
mod manager;
mod presets;

pub use config::{
    AnalyzerConfig, Config, ConfigError, CustomRuleConfig, RuleOverride, CONFIG_FILE_NAME,
    STARTER_CONFIG,
};
pub use loader::{LoadError, ModelError};
pub use manager::RuleManager;
pub use presets::{minimal_rules, recommended_rules, strict_rules, Preset};
