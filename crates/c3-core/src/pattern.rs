//! Validated glob patterns for path and name matching.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated glob pattern.
///
/// The glob is compiled once at construction and reused for all match calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GlobPattern {
    raw: String,
    compiled: glob::Pattern,
}

impl GlobPattern {
    /// Creates a new glob pattern.
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is empty or has invalid glob syntax.
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }
        let compiled = glob::Pattern::new(pattern).map_err(|e| PatternError::Invalid {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            raw: pattern.to_string(),
            compiled,
        })
    }

    /// Tests whether a `/`-separated relative path matches this pattern.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        if self.compiled.matches(path) {
            return true;
        }
        // `dir/**` also covers `dir` itself and anything below it.
        if let Some(prefix) = self.raw.strip_suffix("/**") {
            let prefix = prefix.trim_end_matches('/');
            if path == prefix
                || (path.starts_with(prefix)
                    && path.as_bytes().get(prefix.len()).is_some_and(|&b| b == b'/'))
            {
                return true;
            }
        }
        // `**/dir/**` patterns match relative paths that start at `dir`.
        if let Some(rest) = self.raw.strip_prefix("**/") {
            if let Ok(inner) = Self::new(rest) {
                return inner.matches(path);
            }
        }
        false
    }

    /// Returns the pattern as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for GlobPattern {
    type Error = PatternError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<GlobPattern> for String {
    fn from(pattern: GlobPattern) -> Self {
        pattern.raw
    }
}

/// Errors in pattern construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    /// Glob pattern is empty.
    #[error("glob pattern must not be empty")]
    Empty,

    /// Glob pattern has invalid syntax.
    #[error("invalid glob pattern `{pattern}`: {reason}")]
    Invalid {
        /// The invalid pattern.
        pattern: String,
        /// Why it's invalid.
        reason: String,
    },
}
