//! # c3-core
//!
//! Deterministic core of the c3 architecture compliance engine.
//!
//! A source tree is turned into a typed [`PropertyGraph`] by
//! [`GraphConstructor`] and a set of [`SourceAdapter`]s; an
//! [`EvaluationEngine`] then checks [`RuleSet`]s against that graph and
//! produces a [`ComplianceReport`]. The two halves only share the graph
//! value, so either can be used on its own.
//!
//! ## Example
//!
//! ```ignore
//! use c3_core::{EvaluationEngine, GraphConstructor, Whitelist};
//!
//! let construction = GraphConstructor::builder()
//!     .adapter_box(Box::new(MyAdapter))
//!     .build()
//!     .construct("./src".as_ref())?;
//!
//! let engine = EvaluationEngine::with_defaults();
//! let report = engine.evaluate(&construction.graph, &rule_sets, &Whitelist::new())?;
//! println!("passed: {}", report.passed());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cancel;
mod fingerprint;
mod pattern;
mod report;
mod types;

/// Graph construction from source trees.
pub mod construct;
/// Condition evaluators and the evaluation engine.
pub mod evaluate;
/// The property graph model.
pub mod graph;
/// Rules, rule sets and whitelists.
pub mod rule;

pub use cancel::CancellationToken;
pub use construct::{
    construct, Artifact, Construction, ConstructionError, GraphConstructor, GraphFragment,
    LayerDef, SourceAdapter,
};
pub use evaluate::{EvaluationEngine, EvaluationError, Evaluator};
pub use fingerprint::fingerprint;
pub use graph::{Edge, EdgeType, Node, NodeType, PropertyGraph, Selector};
pub use pattern::{GlobPattern, PatternError};
pub use report::{ComplianceReport, Summary};
pub use rule::{
    Condition, Rule, RuleProvider, RuleSet, RuleSource, RuleType, Whitelist, WhitelistEntry,
};
pub use types::{Location, Severity, UnknownSeverity, Violation};
