//! Whitelist entries that suppress individual violations.

use serde::{Deserialize, Serialize};

use crate::pattern::GlobPattern;
use crate::types::Violation;

/// Suppresses violations of one rule, optionally only under a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    /// Rule id the entry applies to.
    pub rule: String,
    /// Location path glob; `None` covers every violation of the rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<GlobPattern>,
    /// Why the exception is acceptable.
    #[serde(default)]
    pub reason: String,
}

impl WhitelistEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(rule: impl Into<String>, path: Option<GlobPattern>, reason: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            path,
            reason: reason.into(),
        }
    }

    /// Tests whether this entry suppresses the violation.
    ///
    /// Graph-level violations carry no path and are only covered by entries
    /// without a path.
    #[must_use]
    pub fn suppresses(&self, violation: &Violation) -> bool {
        if self.rule != violation.rule_id {
            return false;
        }
        match (&self.path, violation.location.path()) {
            (None, _) => true,
            (Some(pattern), Some(path)) => pattern.matches(path),
            (Some(_), None) => false,
        }
    }
}

/// An ordered collection of whitelist entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Whitelist {
    entries: Vec<WhitelistEntry>,
}

impl Whitelist {
    /// Creates an empty whitelist.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry.
    pub fn push(&mut self, entry: WhitelistEntry) {
        self.entries.push(entry);
    }

    /// Returns the entries.
    #[must_use]
    pub fn entries(&self) -> &[WhitelistEntry] {
        &self.entries
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the first entry suppressing the violation.
    #[must_use]
    pub fn matching(&self, violation: &Violation) -> Option<&WhitelistEntry> {
        self.entries.iter().find(|e| e.suppresses(violation))
    }
}

impl FromIterator<WhitelistEntry> for Whitelist {
    fn from_iter<I: IntoIterator<Item = WhitelistEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Location, Severity};

    fn node_violation(rule: &str, path: &str) -> Violation {
        Violation::new(
            format!("{rule}#0"),
            rule,
            Severity::Error,
            Location::Node {
                node_id: format!("file:{path}"),
                path: path.into(),
            },
            "bad",
        )
    }

    #[test]
    fn entry_requires_rule_and_path_match() {
        let entry = WhitelistEntry::new(
            "naming",
            Some(GlobPattern::new("legacy/**").unwrap()),
            "pre-dates the convention",
        );
        assert!(entry.suppresses(&node_violation("naming", "legacy/OldThing.ts")));
        assert!(!entry.suppresses(&node_violation("naming", "src/OldThing.ts")));
        assert!(!entry.suppresses(&node_violation("other", "legacy/OldThing.ts")));
    }

    #[test]
    fn pathless_entry_covers_graph_level_violations() {
        let v = Violation::new(
            "require-auth#0",
            "require-auth",
            Severity::Error,
            Location::Graph {
                graph_id: "g".into(),
            },
            "missing",
        );
        let scoped = WhitelistEntry::new("require-auth", Some(GlobPattern::new("**").unwrap()), "");
        let global = WhitelistEntry::new("require-auth", None, "");
        assert!(!scoped.suppresses(&v));
        assert!(global.suppresses(&v));
    }

    #[test]
    fn deserializes_from_toml_like_json() {
        let list: Whitelist = serde_json::from_value(serde_json::json!([
            { "rule": "naming", "path": "legacy/**", "reason": "old" },
            { "rule": "no-cycles" }
        ]))
        .unwrap();
        assert_eq!(list.entries().len(), 2);
        assert!(list.entries()[1].path.is_none());
        assert!(list.matching(&node_violation("no-cycles", "a.ts")).is_some());
    }
}
