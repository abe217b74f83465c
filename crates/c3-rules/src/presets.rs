//! Rule presets for common configurations.

use c3_core::{Condition, Rule, RuleSet, RuleSource, RuleType, Severity};
use std::fmt;

/// File names exempt from the preset naming rule.
const NAMING_EXEMPT: &[&str] = &[
    "README*",
    "LICENSE*",
    "CHANGELOG*",
    "CONTRIBUTING*",
    "Cargo.*",
    "Dockerfile",
    "Makefile",
    "__init__.py",
    "__main__.py",
];

/// Preset configurations for c3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Recommended rules with sensible defaults.
    Recommended,
    /// Strict rules: everything at error severity plus fan-out limits.
    Strict,
    /// Minimal rules for gradual adoption.
    Minimal,
}

impl Preset {
    /// Every preset.
    pub const ALL: [Self; 3] = [Self::Recommended, Self::Strict, Self::Minimal];

    /// Looks up a preset by its `extends` name; `@c3/…` is accepted as an
    /// alias of `c3/…`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.strip_prefix('@').unwrap_or(name);
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Returns true if `name` uses the preset namespace, known or not.
    #[must_use]
    pub fn is_preset_name(name: &str) -> bool {
        name.starts_with("c3/") || name.starts_with("@c3/")
    }

    /// The `extends` name of this preset.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Recommended => "c3/recommended",
            Self::Strict => "c3/strict",
            Self::Minimal => "c3/minimal",
        }
    }

    /// One-line description.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Recommended => "Cycle, naming and layering checks with sensible severities",
            Self::Strict => "Recommended rules at error severity plus fan-out limits",
            Self::Minimal => "Circular dependency detection only",
        }
    }

    /// Returns the rules for this preset.
    #[must_use]
    pub fn rules(self) -> Vec<Rule> {
        match self {
            Self::Recommended => recommended_rules(),
            Self::Strict => strict_rules(),
            Self::Minimal => minimal_rules(),
        }
    }

    /// Returns the preset as a built-in rule set.
    #[must_use]
    pub fn rule_set(self) -> RuleSet {
        RuleSet {
            rules: self.rules(),
            ..RuleSet::new(self.name(), RuleSource::BuiltIn).with_description(self.description())
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn no_circular_dependencies(severity: Severity) -> Rule {
    Rule::new(
        "no-circular-dependencies",
        RuleType::Dependency,
        severity,
        Condition::new("no-cycles"),
    )
    .with_name("No circular dependencies")
    .with_description("Modules must not depend on each other in a cycle")
}

fn consistent_naming(severity: Severity) -> Rule {
    Rule::new(
        "consistent-naming",
        RuleType::Naming,
        severity,
        Condition::new("naming")
            .with_param("style", "kebab-case")
            .with_param("ignore", NAMING_EXEMPT.to_vec()),
    )
    .with_name("Consistent naming")
    .with_description("File names follow one naming style")
}

fn layer_dependencies(severity: Severity) -> Rule {
    Rule::new(
        "layer-dependencies",
        RuleType::Layering,
        severity,
        Condition::new("layering").with_param("flow", "inward"),
    )
    .with_name("Layer dependencies")
    .with_description("Dependencies point from outer layers to inner layers only")
}

/// Returns the recommended set of rules.
///
/// Includes:
/// - `no-circular-dependencies` (error)
/// - `consistent-naming` (kebab-case files, warning)
/// - `layer-dependencies` (inward flow, error)
#[must_use]
pub fn recommended_rules() -> Vec<Rule> {
    vec![
        no_circular_dependencies(Severity::Error),
        consistent_naming(Severity::Warning),
        layer_dependencies(Severity::Error),
    ]
}

/// Returns the strict set of rules.
///
/// Includes all recommended rules at error severity plus:
/// - `max-fan-out` (at most 20 distinct dependencies per file, warning)
#[must_use]
pub fn strict_rules() -> Vec<Rule> {
    vec![
        no_circular_dependencies(Severity::Error),
        consistent_naming(Severity::Error),
        layer_dependencies(Severity::Error),
        Rule::new(
            "max-fan-out",
            RuleType::Custom,
            Severity::Warning,
            Condition::new("max-fan-out")
                .with_param("select", serde_json::json!({ "type": "file" }))
                .with_param("max", 20),
        )
        .with_name("Maximum fan-out")
        .with_description("A file depends on at most 20 other nodes"),
    ]
}

/// Returns the minimal set of rules.
///
/// For gradual adoption, only includes `no-circular-dependencies`.
#[must_use]
pub fn minimal_rules() -> Vec<Rule> {
    vec![no_circular_dependencies(Severity::Error)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_rules() {
        assert_eq!(Preset::Recommended.rules().len(), 3);
        assert_eq!(Preset::Strict.rules().len(), 4);
        assert_eq!(Preset::Minimal.rules().len(), 1);
    }

    #[test]
    fn test_recommended_rule_table() {
        let table: Vec<String> = recommended_rules()
            .iter()
            .map(|r| format!("{} {} {}", r.id, r.rule_type.as_str(), r.severity))
            .collect();
        insta::assert_yaml_snapshot!(table, @r"
        - no-circular-dependencies dependency error
        - consistent-naming naming warning
        - layer-dependencies layering error
        ");
    }

    #[test]
    fn test_preset_names_and_alias() {
        assert_eq!(Preset::from_name("c3/strict"), Some(Preset::Strict));
        assert_eq!(Preset::from_name("@c3/recommended"), Some(Preset::Recommended));
        assert_eq!(Preset::from_name("c3/unknown"), None);
        assert!(Preset::is_preset_name("@c3/unknown"));
        assert!(!Preset::is_preset_name("../shared/c3.toml"));
    }

    #[test]
    fn test_strict_raises_severity() {
        let strict = Preset::Strict.rule_set();
        assert_eq!(strict.source, RuleSource::BuiltIn);
        let naming = strict.rule("consistent-naming").unwrap();
        assert_eq!(naming.severity, Severity::Error);
        assert_eq!(strict.rule("max-fan-out").unwrap().severity, Severity::Warning);
    }

    #[test]
    fn test_preset_conditions_parse() {
        use c3_core::evaluate::{FanOutCondition, LayeringCondition, NamingCondition};

        let rules = Preset::Strict.rules();
        let naming: NamingCondition = rules[1].condition.parse().unwrap();
        assert!(naming.ignore.iter().any(|p| p.matches("README.md")));
        let _: LayeringCondition = rules[2].condition.parse().unwrap();
        let fan_out: FanOutCondition = rules[3].condition.parse().unwrap();
        assert_eq!(fan_out.max, 20);
    }
}
