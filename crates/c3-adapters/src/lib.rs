//! # c3-adapters
//!
//! Source adapters that turn files into graph fragments for
//! [`c3_core::GraphConstructor`].
//!
//! - [`RustAdapter`] parses `.rs` files with `syn`
//! - [`TypeScriptAdapter`] and [`PythonAdapter`] use Tree-sitter grammars
//! - [`FilesystemAdapter`] records any other file with its size
//!
//! Dependencies are emitted as unresolved references to candidate files;
//! the constructor links them once every file node exists, and falls back
//! to `Package` nodes for third-party imports.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod filesystem;
mod python;
mod rust;
mod symbols;
mod syntax;
mod typescript;

pub use filesystem::FilesystemAdapter;
pub use python::PythonAdapter;
pub use rust::RustAdapter;
pub use typescript::TypeScriptAdapter;

use c3_core::construct::AdapterBox;

/// All adapters in dispatch order: Rust, TypeScript, Python, then the
/// filesystem fallback.
#[must_use]
pub fn default_adapters() -> Vec<AdapterBox> {
    vec![
        Box::new(RustAdapter::new()),
        Box::new(TypeScriptAdapter::new()),
        Box::new(PythonAdapter::new()),
        Box::new(FilesystemAdapter::new()),
    ]
}
