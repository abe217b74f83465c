//! DTO → domain conversion with validation.

use std::collections::BTreeSet;
use std::path::PathBuf;

use c3_core::{
    Condition, GlobPattern, LayerDef, PatternError, Rule, RuleType, Severity, Whitelist,
    WhitelistEntry,
};

use crate::config::{ConfigError, CustomRuleConfig, LayerConfig, RuleOverride, WhitelistConfig};

/// Field-level validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// An id or name is empty.
    #[error("must not be empty")]
    Empty,

    /// A glob failed to compile.
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// Rule type string is not recognized.
    #[error("unknown rule type `{0}`, expected: dependency, naming, layering, custom")]
    UnknownRuleType(String),

    /// A custom-type rule has no condition `type`.
    #[error("condition `type` is required for {0} rules")]
    MissingConditionType(RuleType),

    /// Condition table cannot be represented.
    #[error("invalid condition: {0}")]
    InvalidCondition(String),

    /// Two rules in one file share an id.
    #[error("duplicate rule id `{0}`")]
    DuplicateRuleId(String),

    /// Two layers share a name.
    #[error("duplicate layer `{0}`")]
    DuplicateLayer(String),
}

/// Errors while turning configuration into rule sets.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A field-level validation error.
    #[error("{context}: {source}")]
    Validation {
        /// Where the error occurred (e.g., "custom[0].condition").
        context: String,
        /// The underlying model error.
        source: ModelError,
    },

    /// Unknown severity string.
    #[error("{context}: unknown severity `{value}`, expected: error, warning, info, off")]
    UnknownSeverity {
        /// Where the error occurred.
        context: String,
        /// The invalid value.
        value: String,
    },

    /// An `extends` entry names a preset that does not exist.
    #[error("unknown preset `{name}`, expected one of: c3/recommended, c3/strict, c3/minimal")]
    UnknownPreset {
        /// The requested name.
        name: String,
    },

    /// A `[rules]` entry refers to a rule no extended set defines.
    #[error("rules.{id}: no inherited rule `{id}` to override")]
    UnknownRule {
        /// The rule id.
        id: String,
    },

    /// An extended config file could not be loaded.
    #[error("failed to load extended config {path}: {source}")]
    Extends {
        /// The file.
        path: PathBuf,
        /// Why loading failed.
        source: ConfigError,
    },

    /// Config files extend each other in a loop.
    #[error("extends cycle: {chain}")]
    ExtendsCycle {
        /// The files involved, joined with ` -> `.
        chain: String,
    },

    /// Cross-reference errors across one configuration file.
    #[error("configuration validation errors:\n{}", format_errors(.0))]
    CrossRef(Vec<ModelError>),
}

fn format_errors(errors: &[ModelError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_rule_type(value: &str) -> Result<RuleType, ModelError> {
    RuleType::ALL
        .into_iter()
        .find(|t| t.as_str() == value)
        .ok_or_else(|| ModelError::UnknownRuleType(value.to_string()))
}

fn parse_severity(value: &str, context: &str) -> Result<Severity, LoadError> {
    value.parse().map_err(|_| LoadError::UnknownSeverity {
        context: context.to_string(),
        value: value.to_string(),
    })
}

fn to_json(value: &toml::Value) -> Result<serde_json::Value, ModelError> {
    serde_json::to_value(value).map_err(|e| ModelError::InvalidCondition(e.to_string()))
}

fn default_condition_kind(rule_type: RuleType) -> Option<&'static str> {
    match rule_type {
        RuleType::Dependency => Some("dependency"),
        RuleType::Naming => Some("naming"),
        RuleType::Layering => Some("layering"),
        RuleType::Custom => None,
    }
}

fn convert_condition(table: &toml::Table, rule_type: RuleType) -> Result<Condition, ModelError> {
    let mut params = serde_json::Map::new();
    for (key, value) in table {
        params.insert(key.clone(), to_json(value)?);
    }
    if !params.contains_key("type") {
        let kind =
            default_condition_kind(rule_type).ok_or(ModelError::MissingConditionType(rule_type))?;
        params.insert("type".into(), kind.into());
    }
    serde_json::from_value(serde_json::Value::Object(params))
        .map_err(|e| ModelError::InvalidCondition(e.to_string()))
}

/// Converts one `[[custom]]` entry.
///
/// # Errors
///
/// Returns [`LoadError`] for an empty id, unknown type or severity, or a
/// condition that is not a table with a string `type`.
pub fn convert_custom_rule(dto: &CustomRuleConfig, index: usize) -> Result<Rule, LoadError> {
    let ctx = format!("custom[{index}]");
    let validation = |field: &str, source: ModelError| LoadError::Validation {
        context: format!("{ctx}.{field}"),
        source,
    };

    if dto.id.trim().is_empty() {
        return Err(validation("id", ModelError::Empty));
    }
    let rule_type = parse_rule_type(&dto.rule_type).map_err(|e| validation("type", e))?;
    let severity = parse_severity(&dto.severity, &format!("{ctx}.severity"))?;
    let condition =
        convert_condition(&dto.condition, rule_type).map_err(|e| validation("condition", e))?;

    let mut rule = Rule::new(&dto.id, rule_type, severity, condition);
    if let Some(name) = &dto.name {
        rule = rule.with_name(name);
    }
    if let Some(description) = &dto.description {
        rule = rule.with_description(description);
    }
    if let Some(message) = &dto.message {
        rule = rule.with_message(message);
    }
    if let Some(doc) = &dto.doc {
        rule = rule.with_doc_ref(doc);
    }
    Ok(rule)
}

/// Converts all `[[custom]]` entries, rejecting duplicate ids.
///
/// # Errors
///
/// Returns the first per-rule error, or [`LoadError::CrossRef`] listing
/// every duplicated id.
pub fn convert_custom_rules(dtos: &[CustomRuleConfig]) -> Result<Vec<Rule>, LoadError> {
    let rules = dtos
        .iter()
        .enumerate()
        .map(|(i, dto)| convert_custom_rule(dto, i))
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen = BTreeSet::new();
    let duplicates: Vec<ModelError> = rules
        .iter()
        .filter(|r| !seen.insert(r.id.as_str()))
        .map(|r| ModelError::DuplicateRuleId(r.id.clone()))
        .collect();
    if duplicates.is_empty() {
        Ok(rules)
    } else {
        Err(LoadError::CrossRef(duplicates))
    }
}

/// Converts `[[architecture.layers]]`, innermost first.
///
/// # Errors
///
/// Returns [`LoadError`] for empty names, bad globs or duplicate names.
pub fn convert_layers(dtos: &[LayerConfig]) -> Result<Vec<LayerDef>, LoadError> {
    let mut seen = BTreeSet::new();
    let mut duplicates = Vec::new();
    let mut layers = Vec::with_capacity(dtos.len());
    for (i, dto) in dtos.iter().enumerate() {
        let ctx = format!("architecture.layers[{i}]");
        if dto.name.trim().is_empty() {
            return Err(LoadError::Validation {
                context: format!("{ctx}.name"),
                source: ModelError::Empty,
            });
        }
        if !seen.insert(dto.name.as_str()) {
            duplicates.push(ModelError::DuplicateLayer(dto.name.clone()));
        }
        let layer = LayerDef::new(&dto.name, &dto.path).map_err(|e| LoadError::Validation {
            context: format!("{ctx}.path"),
            source: e.into(),
        })?;
        layers.push(layer);
    }
    if duplicates.is_empty() {
        Ok(layers)
    } else {
        Err(LoadError::CrossRef(duplicates))
    }
}

/// Converts `[analyzer].exclude`.
///
/// # Errors
///
/// Returns [`LoadError::Validation`] for the first invalid glob.
pub fn convert_excludes(patterns: &[String]) -> Result<Vec<GlobPattern>, LoadError> {
    patterns
        .iter()
        .enumerate()
        .map(|(i, p)| {
            GlobPattern::new(p).map_err(|e| LoadError::Validation {
                context: format!("analyzer.exclude[{i}]"),
                source: e.into(),
            })
        })
        .collect()
}

/// Converts `[[whitelist]]` entries.
///
/// # Errors
///
/// Returns [`LoadError::Validation`] for an empty rule id or bad glob.
pub fn convert_whitelist(dtos: &[WhitelistConfig]) -> Result<Whitelist, LoadError> {
    dtos.iter()
        .enumerate()
        .map(|(i, dto)| {
            let ctx = format!("whitelist[{i}]");
            if dto.rule.trim().is_empty() {
                return Err(LoadError::Validation {
                    context: format!("{ctx}.rule"),
                    source: ModelError::Empty,
                });
            }
            let path = dto
                .path
                .as_deref()
                .map(GlobPattern::new)
                .transpose()
                .map_err(|e| LoadError::Validation {
                    context: format!("{ctx}.path"),
                    source: e.into(),
                })?;
            Ok(WhitelistEntry::new(&dto.rule, path, &dto.reason))
        })
        .collect()
}

/// Applies a `[rules]` entry to an inherited rule.
///
/// Returns `None` when the entry switches the rule off.
///
/// # Errors
///
/// Returns [`LoadError`] for an unknown severity or an option value that
/// cannot be merged into the condition.
pub fn apply_override(mut rule: Rule, entry: &RuleOverride) -> Result<Option<Rule>, LoadError> {
    let ctx = format!("rules.{}", rule.id);
    match entry {
        RuleOverride::Level(level) if level == "off" => Ok(None),
        RuleOverride::Level(level) => {
            rule.severity = parse_severity(level, &ctx)?;
            Ok(Some(rule))
        }
        RuleOverride::Options(options) => {
            if options.enabled == Some(false) {
                return Ok(None);
            }
            if let Some(level) = &options.severity {
                if level == "off" {
                    return Ok(None);
                }
                rule.severity = parse_severity(level, &format!("{ctx}.severity"))?;
            }
            for (key, value) in &options.options {
                let value = to_json(value).map_err(|e| LoadError::Validation {
                    context: format!("{ctx}.{key}"),
                    source: e,
                })?;
                rule.condition.params.insert(key.clone(), value);
            }
            Ok(Some(rule))
        }
    }
}
