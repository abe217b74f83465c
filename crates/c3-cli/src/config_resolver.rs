//! Finding the `c3.toml` a command runs with.
//!
//! `--config` (or `C3_CONFIG`) is taken as given. Otherwise the project
//! directory is searched for [`CONFIG_CANDIDATES`], then the per-user
//! directory for `config.toml`. With neither, commands run `c3/recommended`.

use std::path::{Path, PathBuf};

use c3::CONFIG_CANDIDATES;
use tracing::debug;

/// File name looked up in the per-user directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// The configuration a command settled on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Named on the command line; not checked for existence here.
    Flag(PathBuf),
    /// A candidate file in the analyzed project.
    Project(PathBuf),
    /// `config.toml` in the per-user directory.
    User(PathBuf),
    /// Nothing on disk; the built-in default applies.
    Builtin,
}

impl ConfigSource {
    /// File to load, or `None` for [`ConfigSource::Builtin`].
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Flag(p) | Self::Project(p) | Self::User(p) => Some(p),
            Self::Builtin => None,
        }
    }

    /// Whether the file lives outside the project.
    #[must_use]
    pub fn is_user_wide(&self) -> bool {
        matches!(self, Self::User(_))
    }
}

/// Picks the configuration for `project_dir`.
#[must_use]
pub fn resolve(project_dir: &Path, flag: Option<&Path>) -> ConfigSource {
    locate(project_dir, flag, user_config_dir().as_deref())
}

fn locate(project_dir: &Path, flag: Option<&Path>, user_dir: Option<&Path>) -> ConfigSource {
    if let Some(path) = flag {
        return ConfigSource::Flag(path.to_path_buf());
    }

    if let Some(path) = CONFIG_CANDIDATES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|p| p.is_file())
    {
        debug!("Using project config {}", path.display());
        return ConfigSource::Project(path);
    }

    match user_dir.map(|dir| dir.join(USER_CONFIG_FILE)) {
        Some(path) if path.is_file() => {
            debug!("Using user config {}", path.display());
            ConfigSource::User(path)
        }
        _ => ConfigSource::Builtin,
    }
}

/// `C3_CONFIG_DIR` when set, else `.c3` in the home directory.
#[must_use]
pub fn user_config_dir() -> Option<PathBuf> {
    match std::env::var_os("C3_CONFIG_DIR") {
        Some(dir) => Some(PathBuf::from(dir)),
        None => home::home_dir().map(|home| home.join(".c3")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn flag_is_returned_without_touching_disk() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("c3.toml"), "").unwrap();

        let source = locate(project.path(), Some(Path::new("/missing/c3.toml")), None);
        assert_eq!(source, ConfigSource::Flag(PathBuf::from("/missing/c3.toml")));
    }

    #[test]
    fn plain_name_beats_dotfile() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join(".c3.toml"), "").unwrap();
        assert_eq!(
            locate(project.path(), None, None),
            ConfigSource::Project(project.path().join(".c3.toml"))
        );

        fs::write(project.path().join("c3.toml"), "").unwrap();
        assert_eq!(
            locate(project.path(), None, None),
            ConfigSource::Project(project.path().join("c3.toml"))
        );
    }

    #[test]
    fn user_config_only_when_project_has_none() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        fs::write(user.path().join("config.toml"), "").unwrap();

        let source = locate(project.path(), None, Some(user.path()));
        assert!(source.is_user_wide());
        assert_eq!(source.path(), Some(user.path().join("config.toml").as_path()));

        fs::write(project.path().join(".c3.toml"), "").unwrap();
        let source = locate(project.path(), None, Some(user.path()));
        assert!(matches!(source, ConfigSource::Project(_)));
    }

    #[test]
    fn empty_dirs_fall_back_to_builtin() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();

        let source = locate(project.path(), None, Some(user.path()));
        assert_eq!(source, ConfigSource::Builtin);
        assert!(source.path().is_none());
    }

    #[test]
    fn directories_are_not_config_files() {
        let project = TempDir::new().unwrap();
        fs::create_dir(project.path().join("c3.toml")).unwrap();
        assert_eq!(locate(project.path(), None, None), ConfigSource::Builtin);
    }
}
