//! `cargo test` integration.

use std::path::{Path, PathBuf};

use c3_core::Severity;

use crate::pipeline::{default_config, find_config, Pipeline};

/// Runs c3 over the project being tested and panics with a report if any
/// violation at or above `fail_on` is found.
///
/// The project root is the enclosing Cargo workspace of the crate under
/// test. `config_path`, when given, is taken relative to that root;
/// otherwise `c3.toml` or `.c3.toml` is used if present, falling back to
/// the recommended preset.
///
/// ```rust,ignore
/// // tests/architecture.rs
/// #[test]
/// fn architecture() {
///     c3::run_check(None, c3::Severity::Error);
/// }
/// ```
///
/// # Panics
///
/// Panics if the configuration is invalid, the run fails, or violations at
/// or above `fail_on` are found.
pub fn run_check(config_path: Option<&str>, fail_on: Severity) {
    let root = find_project_root();
    let config_file = match config_path {
        Some(path) if Path::new(path).is_absolute() => Some(PathBuf::from(path)),
        Some(path) => Some(root.join(path)),
        None => find_config(&root),
    };

    let pipeline = match &config_file {
        Some(path) => Pipeline::from_config_file(Some(path.as_path())),
        None => Pipeline::assemble(&default_config(), &root),
    }
    .unwrap_or_else(|e| panic!("c3: failed to assemble pipeline: {e}"));

    let analysis = pipeline
        .run(&root)
        .unwrap_or_else(|e| panic!("c3: analysis failed: {e}"));

    if analysis.report.has_violations_at(fail_on) {
        panic!("{}", analysis.report.format_test_report(fail_on));
    }
}

/// Whether a `Cargo.toml` declares a `[workspace]` table.
fn has_workspace_section(cargo_toml: &Path) -> bool {
    let Ok(content) = std::fs::read_to_string(cargo_toml) else {
        return false;
    };
    content
        .parse::<toml::Table>()
        .is_ok_and(|table| table.contains_key("workspace"))
}

/// Walks up from `CARGO_MANIFEST_DIR` to the workspace root.
fn find_project_root() -> PathBuf {
    let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") else {
        return std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    };
    let manifest_dir = PathBuf::from(manifest_dir);
    manifest_dir
        .ancestors()
        .find(|dir| has_workspace_section(&dir.join("Cargo.toml")))
        .map_or_else(|| manifest_dir.clone(), Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn workspace_section_is_detected_by_parsing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Cargo.toml");

        fs::write(&path, "[workspace]\nmembers = []\n").unwrap();
        assert!(has_workspace_section(&path));

        fs::write(&path, "# [workspace]\n[package]\nname = \"x\"\n").unwrap();
        assert!(!has_workspace_section(&path));

        assert!(!has_workspace_section(&dir.path().join("missing.toml")));
    }
}
