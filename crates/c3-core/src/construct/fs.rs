//! Filesystem capability used by graph construction.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One listed entry, relative to the listing root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FsEntry {
    /// Path relative to the root.
    pub path: PathBuf,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

/// Filesystem errors, keeping "missing" and "not allowed" apart from
/// empty content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FsError {
    /// Path does not exist.
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Path exists but may not be read.
    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    /// Any other I/O failure, including invalid UTF-8.
    #[error("{}: {message}", path.display())]
    Other {
        /// Affected path.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
}

impl FsError {
    /// Classifies an I/O error for a path.
    #[must_use]
    pub fn from_io(path: &Path, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Other {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
        }
    }
}

/// Read-only access to a source tree.
pub trait FileSystem: Send + Sync {
    /// Lists every file and directory below `root` (excluding `root`),
    /// sorted by path.
    ///
    /// # Errors
    ///
    /// Returns [`FsError`] if the root itself cannot be listed.
    fn list_recursive(&self, root: &Path) -> Result<Vec<FsEntry>, FsError>;

    /// Reads a file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`FsError`] if the file is missing, unreadable or not UTF-8.
    fn read_to_string(&self, path: &Path) -> Result<String, FsError>;
}

// ────────────────────────────────────────────
// Local disk
// ────────────────────────────────────────────

/// The local disk.
#[derive(Debug, Clone, Copy)]
pub struct LocalFileSystem {
    respect_gitignore: bool,
}

impl LocalFileSystem {
    /// Creates a local filesystem honouring `.gitignore` files.
    #[must_use]
    pub fn new() -> Self {
        Self {
            respect_gitignore: true,
        }
    }

    /// Sets whether `.gitignore` and hidden-file rules apply (default: true).
    #[must_use]
    pub fn respect_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    fn list_with_ignore(root: &Path) -> Vec<FsEntry> {
        let mut entries = Vec::new();
        let walker = ignore::WalkBuilder::new(root).require_git(false).build();
        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(root) {
                entries.push(FsEntry {
                    path: rel.to_path_buf(),
                    is_dir: entry.file_type().is_some_and(|t| t.is_dir()),
                });
            }
        }
        entries
    }

    fn list_with_walkdir(root: &Path) -> Vec<FsEntry> {
        let mut entries = Vec::new();
        let walker = walkdir::WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git");
        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if let Ok(rel) = entry.path().strip_prefix(root) {
                entries.push(FsEntry {
                    path: rel.to_path_buf(),
                    is_dir: entry.file_type().is_dir(),
                });
            }
        }
        entries
    }
}

impl Default for LocalFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for LocalFileSystem {
    fn list_recursive(&self, root: &Path) -> Result<Vec<FsEntry>, FsError> {
        let meta = std::fs::metadata(root).map_err(|e| FsError::from_io(root, &e))?;
        if !meta.is_dir() {
            return Err(FsError::Other {
                path: root.to_path_buf(),
                message: "not a directory".to_string(),
            });
        }

        let mut entries = if self.respect_gitignore {
            Self::list_with_ignore(root)
        } else {
            Self::list_with_walkdir(root)
        };
        entries.sort();
        Ok(entries)
    }

    fn read_to_string(&self, path: &Path) -> Result<String, FsError> {
        std::fs::read_to_string(path).map_err(|e| FsError::from_io(path, &e))
    }
}

// ────────────────────────────────────────────
// In memory
// ────────────────────────────────────────────

/// An in-memory tree of files, for tests and embedding.
///
/// Directories are implied by file paths. Paths are relative; `.` or an
/// empty root lists everything.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: BTreeMap<PathBuf, String>,
    denied: BTreeSet<PathBuf>,
}

impl MemoryFileSystem {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// Adds a file that is listed but cannot be read.
    #[must_use]
    pub fn with_unreadable_file(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.files.insert(path.clone(), String::new());
        self.denied.insert(path);
        self
    }

    fn relative<'a>(root: &Path, path: &'a Path) -> Option<&'a Path> {
        if root.as_os_str().is_empty() || root == Path::new(".") {
            Some(path)
        } else {
            path.strip_prefix(root).ok()
        }
    }

    fn key<'a>(path: &'a Path) -> &'a Path {
        path.strip_prefix(".").unwrap_or(path)
    }
}

impl FileSystem for MemoryFileSystem {
    fn list_recursive(&self, root: &Path) -> Result<Vec<FsEntry>, FsError> {
        let root = Self::key(root);
        let mut dirs = BTreeSet::new();
        let mut entries = Vec::new();
        for file in self.files.keys() {
            let Some(rel) = Self::relative(root, file) else {
                continue;
            };
            for ancestor in rel.ancestors().skip(1) {
                if !ancestor.as_os_str().is_empty() {
                    dirs.insert(ancestor.to_path_buf());
                }
            }
            entries.push(FsEntry {
                path: rel.to_path_buf(),
                is_dir: false,
            });
        }
        if entries.is_empty() && !root.as_os_str().is_empty() && root != Path::new(".") {
            return Err(FsError::NotFound(root.to_path_buf()));
        }
        entries.extend(dirs.into_iter().map(|path| FsEntry { path, is_dir: true }));
        entries.sort();
        Ok(entries)
    }

    fn read_to_string(&self, path: &Path) -> Result<String, FsError> {
        let key = Self::key(path);
        if self.denied.contains(key) {
            return Err(FsError::PermissionDenied(path.to_path_buf()));
        }
        self.files
            .get(key)
            .cloned()
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_listing_is_sorted_and_includes_directories() {
        let fs = MemoryFileSystem::new()
            .with_file("src/b.ts", "")
            .with_file("src/a.ts", "")
            .with_file("README.md", "");
        let listed: Vec<(String, bool)> = fs
            .list_recursive(Path::new("."))
            .unwrap()
            .into_iter()
            .map(|e| (e.path.to_string_lossy().into_owned(), e.is_dir))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("README.md".to_string(), false),
                ("src".to_string(), true),
                ("src/a.ts".to_string(), false),
                ("src/b.ts".to_string(), false),
            ]
        );
    }

    #[test]
    fn memory_read_distinguishes_missing_denied_and_empty() {
        let fs = MemoryFileSystem::new()
            .with_file("empty.ts", "")
            .with_unreadable_file("secret.ts");
        assert_eq!(fs.read_to_string(Path::new("./empty.ts")), Ok(String::new()));
        assert!(matches!(
            fs.read_to_string(Path::new("secret.ts")),
            Err(FsError::PermissionDenied(_))
        ));
        assert!(matches!(
            fs.read_to_string(Path::new("missing.ts")),
            Err(FsError::NotFound(_))
        ));
    }

    #[test]
    fn local_listing_is_relative_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src/domain")).unwrap();
        std::fs::write(dir.path().join("src/domain/order.ts"), "export {}").unwrap();
        std::fs::write(dir.path().join("src/app.ts"), "").unwrap();

        let entries = LocalFileSystem::new()
            .respect_gitignore(false)
            .list_recursive(dir.path())
            .unwrap();
        let paths: Vec<PathBuf> = entries.into_iter().map(|e| e.path).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("src"),
                PathBuf::from("src/app.ts"),
                PathBuf::from("src/domain"),
                PathBuf::from("src/domain/order.ts"),
            ]
        );
    }

    #[test]
    fn local_listing_honours_gitignore() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "generated/\n").unwrap();
        std::fs::create_dir_all(dir.path().join("generated")).unwrap();
        std::fs::write(dir.path().join("generated/out.ts"), "").unwrap();
        std::fs::write(dir.path().join("main.ts"), "").unwrap();

        let entries = LocalFileSystem::new().list_recursive(dir.path()).unwrap();
        let paths: Vec<PathBuf> = entries.into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec![PathBuf::from("main.ts")]);
    }

    #[test]
    fn local_missing_root_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = LocalFileSystem::new().list_recursive(&dir.path().join("nope"));
        assert!(matches!(result, Err(FsError::NotFound(_))));
    }
}
