//! Rule model: rules, rule sets, conditions and the rule-management boundary.

mod whitelist;

pub use whitelist::{Whitelist, WhitelistEntry};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Severity;

// ────────────────────────────────────────────
// Rule type and source
// ────────────────────────────────────────────

/// Category of a rule; selects the evaluator that handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    /// Dependency and cycle constraints.
    Dependency,
    /// Naming conventions.
    Naming,
    /// Layered architecture constraints.
    Layering,
    /// User-defined structural checks.
    Custom,
}

impl RuleType {
    /// Every rule type, in declaration order.
    pub const ALL: [Self; 4] = [Self::Dependency, Self::Naming, Self::Layering, Self::Custom];

    /// Returns the lowercase name used in configuration.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dependency => "dependency",
            Self::Naming => "naming",
            Self::Layering => "layering",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a rule set came from.
///
/// Ordered by precedence: a custom rule outranks an extended file's, which
/// outranks a built-in preset's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleSource {
    /// A preset shipped with the tool.
    BuiltIn,
    /// A configuration file pulled in through `extends`.
    Extended,
    /// Rules declared in the project's own configuration.
    Custom,
}

// ────────────────────────────────────────────
// Condition
// ────────────────────────────────────────────

/// Loosely typed condition: a discriminating `type` plus parameters.
///
/// Evaluators turn it into a typed condition with [`Condition::parse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Condition kind, e.g. `dependency` or `no-cycles`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Remaining parameters.
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl Condition {
    /// Creates a condition without parameters.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: serde_json::Map::new(),
        }
    }

    /// Sets one parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Deserializes the parameters into a typed condition.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error for missing, mistyped or unknown
    /// parameters.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(self.params.clone()))
    }
}

// ────────────────────────────────────────────
// Rule and RuleSet
// ────────────────────────────────────────────

/// One architectural constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique id across all rule sets of one evaluation.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// What the rule enforces.
    #[serde(default)]
    pub description: String,
    /// Category; selects the evaluator.
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    /// Severity of every violation this rule produces.
    pub severity: Severity,
    /// What to check.
    pub condition: Condition,
    /// Replaces the evaluator's generic message prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Design document reference copied to violations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_ref: Option<String>,
}

impl Rule {
    /// Creates a rule; the name defaults to the id.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        rule_type: RuleType,
        severity: Severity,
        condition: Condition,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: String::new(),
            rule_type,
            severity,
            condition,
            message: None,
            doc_ref: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the message override.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the design document reference.
    #[must_use]
    pub fn with_doc_ref(mut self, doc_ref: impl Into<String>) -> Self {
        self.doc_ref = Some(doc_ref.into());
        self
    }
}

/// An ordered, named group of rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Set id.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// What the set is for.
    #[serde(default)]
    pub description: String,
    /// Origin of the set.
    pub source: RuleSource,
    /// Rules, in evaluation order.
    pub rules: Vec<Rule>,
}

impl RuleSet {
    /// Creates an empty set; the name defaults to the id.
    #[must_use]
    pub fn new(id: impl Into<String>, source: RuleSource) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: String::new(),
            source,
            rules: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Appends a rule.
    #[must_use]
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Looks up a rule by id.
    #[must_use]
    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }
}

// ────────────────────────────────────────────
// Rule management boundary
// ────────────────────────────────────────────

/// Supplies the merged rule sets and whitelist for one evaluation.
///
/// Implementations resolve presets, extended files and custom rules; the
/// engine only consumes the result.
pub trait RuleProvider {
    /// All rule sets, already merged and in evaluation order.
    fn rule_sets(&self) -> &[RuleSet];

    /// Suppression entries.
    fn whitelist(&self) -> &Whitelist;
}
