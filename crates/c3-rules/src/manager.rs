//! Rule-set resolution: presets, `extends` chains, overrides and custom rules.

use std::path::{Path, PathBuf};

use c3_core::{GlobPattern, LayerDef, Rule, RuleProvider, RuleSet, RuleSource, Whitelist};
use tracing::{debug, info};

use crate::config::{AnalyzerConfig, Config};
use crate::loader::{
    apply_override, convert_custom_rules, convert_excludes, convert_layers, convert_whitelist,
    LoadError,
};
use crate::presets::Preset;

/// Merged rules, whitelist and architecture settings for one project.
///
/// Rule sets are kept in resolution order: `extends` entries first, in the
/// order listed, then the project's own `[[custom]]` rules. When a later set
/// defines a rule id that an earlier set already has, the earlier copy is
/// removed, so the most local definition wins and every id is unique.
#[derive(Debug, Clone)]
pub struct RuleManager {
    rule_sets: Vec<RuleSet>,
    whitelist: Whitelist,
    layers: Vec<LayerDef>,
    excludes: Vec<GlobPattern>,
    analyzer: AnalyzerConfig,
    style: Option<String>,
}

/// What one config file contributes, before it is merged into its parent.
struct Resolved {
    sets: Vec<RuleSet>,
    whitelist: Whitelist,
    layers: Vec<LayerDef>,
}

impl RuleManager {
    /// Resolves a config file; relative `extends` paths are taken from the
    /// file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the file or anything it extends is invalid.
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let config = Config::from_file(path).map_err(|source| LoadError::Extends {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut stack = vec![normalize(path)];
        Self::assemble(&config, base_dir, &mut stack)
    }

    /// Resolves an in-memory config; relative `extends` paths are taken from
    /// `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the config or anything it extends is invalid.
    pub fn from_config(config: &Config, base_dir: &Path) -> Result<Self, LoadError> {
        Self::assemble(config, base_dir, &mut Vec::new())
    }

    /// A manager holding one preset and default analyzer settings.
    #[must_use]
    pub fn with_preset(preset: Preset) -> Self {
        Self {
            rule_sets: vec![preset.rule_set()],
            whitelist: Whitelist::new(),
            layers: Vec::new(),
            excludes: Vec::new(),
            analyzer: AnalyzerConfig::default(),
            style: None,
        }
    }

    fn assemble(
        config: &Config,
        base_dir: &Path,
        stack: &mut Vec<PathBuf>,
    ) -> Result<Self, LoadError> {
        let resolved = resolve(config, base_dir, RuleSource::Custom, "project", stack)?;
        let excludes = convert_excludes(&config.analyzer.exclude)?;
        let manager = Self {
            rule_sets: resolved.sets,
            whitelist: resolved.whitelist,
            layers: resolved.layers,
            excludes,
            analyzer: config.analyzer.clone(),
            style: config.architecture.style.clone(),
        };
        info!(
            "Resolved {} rule(s) in {} set(s), {} layer(s), {} whitelist entries",
            manager.rule_count(),
            manager.rule_sets.len(),
            manager.layers.len(),
            manager.whitelist.entries().len()
        );
        Ok(manager)
    }

    /// Looks up a rule across all sets.
    #[must_use]
    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rule_sets.iter().find_map(|s| s.rule(id))
    }

    /// Total number of rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rule_sets.iter().map(|s| s.rules.len()).sum()
    }

    /// Layer definitions, innermost first.
    #[must_use]
    pub fn layers(&self) -> &[LayerDef] {
        &self.layers
    }

    /// Compiled `[analyzer].exclude` patterns.
    #[must_use]
    pub fn excludes(&self) -> &[GlobPattern] {
        &self.excludes
    }

    /// Analyzer settings of the root config.
    #[must_use]
    pub fn analyzer(&self) -> &AnalyzerConfig {
        &self.analyzer
    }

    /// Architecture style label, if declared.
    #[must_use]
    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }
}

impl RuleProvider for RuleManager {
    fn rule_sets(&self) -> &[RuleSet] {
        &self.rule_sets
    }

    fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Appends `set` at `rank`, settling shared rule ids against every earlier
/// set.
///
/// The higher rank keeps the rule; on a tie the later set does.
fn push_winning(sets: &mut Vec<(RuleSource, RuleSet)>, rank: RuleSource, mut set: RuleSet) {
    for (earlier_rank, earlier) in sets.iter_mut() {
        if *earlier_rank > rank {
            let before = set.rules.len();
            set.rules.retain(|r| earlier.rule(&r.id).is_none());
            if set.rules.len() != before {
                debug!(
                    "Rule set `{}` keeps {} rule(s) over `{}`",
                    earlier.id,
                    before - set.rules.len(),
                    set.id
                );
            }
            continue;
        }
        let before = earlier.rules.len();
        earlier.rules.retain(|r| set.rule(&r.id).is_none());
        if earlier.rules.len() != before {
            debug!(
                "Rule set `{}` overrides {} rule(s) of `{}`",
                set.id,
                before - earlier.rules.len(),
                earlier.id
            );
        }
    }
    sets.push((rank, set));
}

fn resolve(
    config: &Config,
    base_dir: &Path,
    source: RuleSource,
    set_id: &str,
    stack: &mut Vec<PathBuf>,
) -> Result<Resolved, LoadError> {
    let mut sets = Vec::new();
    let mut whitelist = Whitelist::new();
    let mut inherited_layers = Vec::new();

    for entry in &config.extends {
        if Preset::is_preset_name(entry) {
            let preset = Preset::from_name(entry).ok_or_else(|| LoadError::UnknownPreset {
                name: entry.clone(),
            })?;
            debug!("Extending preset {}", preset);
            push_winning(&mut sets, RuleSource::BuiltIn, preset.rule_set());
            continue;
        }

        let path = base_dir.join(entry);
        let key = normalize(&path);
        if stack.contains(&key) {
            let mut chain: Vec<String> = stack.iter().map(|p| p.display().to_string()).collect();
            chain.push(key.display().to_string());
            return Err(LoadError::ExtendsCycle {
                chain: chain.join(" -> "),
            });
        }
        debug!("Extending config file {:?}", path);
        let extended = Config::from_file(&path).map_err(|source| LoadError::Extends {
            path: path.clone(),
            source,
        })?;
        let dir = path.parent().unwrap_or(base_dir).to_path_buf();

        stack.push(key);
        let nested = resolve(&extended, &dir, RuleSource::Extended, entry, stack)?;
        stack.pop();

        // Presets pulled in by an extended file rank as that file.
        for set in nested.sets {
            push_winning(&mut sets, RuleSource::Extended, set);
        }
        for item in nested.whitelist.entries() {
            whitelist.push(item.clone());
        }
        if !nested.layers.is_empty() {
            inherited_layers = nested.layers;
        }
    }

    for (id, entry) in &config.rules {
        let mut found = false;
        for (_, set) in &mut sets {
            let Some(pos) = set.rules.iter().position(|r| &r.id == id) else {
                continue;
            };
            found = true;
            let rule = set.rules.remove(pos);
            if let Some(rule) = apply_override(rule, entry)? {
                set.rules.insert(pos, rule);
            } else {
                debug!("Rule `{}` switched off", id);
            }
        }
        if !found {
            return Err(LoadError::UnknownRule { id: id.clone() });
        }
    }

    let own = RuleSet {
        rules: convert_custom_rules(&config.custom)?,
        ..RuleSet::new(set_id, source)
    };
    push_winning(&mut sets, source, own);

    for item in convert_whitelist(&config.whitelist)?.entries() {
        whitelist.push(item.clone());
    }

    let layers = convert_layers(&config.architecture.layers)?;
    Ok(Resolved {
        sets: sets.into_iter().map(|(_, set)| set).collect(),
        whitelist,
        layers: if layers.is_empty() {
            inherited_layers
        } else {
            layers
        },
    })
}
