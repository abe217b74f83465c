//! # c3
//!
//! Architecture compliance checks over a property graph of your code.
//!
//! This is the facade crate: it re-exports the core engine, the rule
//! configuration layer and the language adapters, and wires them into a
//! [`Pipeline`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use c3::{Pipeline, rules::Config};
//!
//! let config = Config::from_file("c3.toml".as_ref())?;
//! let pipeline = Pipeline::assemble(&config, ".".as_ref())?;
//! let analysis = pipeline.run(".".as_ref())?;
//!
//! for v in analysis.report.violations() {
//!     println!("{}", v.format());
//! }
//! ```
//!
//! ## `cargo test` Integration
//!
//! ```rust,ignore
//! // tests/architecture.rs
//! #[test]
//! fn architecture() {
//!     c3::run_check(None, c3::Severity::Error);
//! }
//! ```

#![forbid(unsafe_code)]

pub use c3_core::*;

/// Configuration, presets and rule loading.
pub mod rules {
    pub use c3_rules::*;
}

/// Built-in source adapters.
pub mod adapters {
    pub use c3_adapters::*;
}

mod pipeline;
mod runner;

pub use pipeline::{
    default_config, find_config, Analysis, Pipeline, PipelineError, CONFIG_CANDIDATES,
};
pub use runner::run_check;
