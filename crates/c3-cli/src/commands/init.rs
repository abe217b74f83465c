//! Init command implementation.

use anyhow::{bail, Context, Result};
use c3::rules::{CONFIG_FILE_NAME, STARTER_CONFIG};
use std::path::Path;

/// Writes the starter config into `dir`.
pub fn run(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, STARTER_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Created {CONFIG_FILE_NAME}");
    println!("\nNext steps:");
    println!("  1. Edit the layers in {CONFIG_FILE_NAME} to match your source tree");
    println!("  2. Run: c3 check");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use c3::rules::Config;
    use tempfile::TempDir;

    #[test]
    fn writes_a_parsable_starter_config() {
        let dir = TempDir::new().unwrap();
        run(dir.path(), false).unwrap();

        let config = Config::from_file(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config.architecture.layers.len(), 4);
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "# mine\n").unwrap();

        let err = run(dir.path(), false).unwrap_err();
        assert!(err.to_string().contains("--force"));

        run(dir.path(), true).unwrap();
        let content = std::fs::read_to_string(dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(content, STARTER_CONFIG);
    }
}
