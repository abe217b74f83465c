//! `extends` resolution across config files on disk.

use c3_core::{RuleProvider, RuleSource, Severity};
use c3_rules::{LoadError, RuleManager};
use std::fs;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn extended_file_sits_between_preset_and_project() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "shared/base.toml",
        r#"
extends = ["c3/recommended"]

[[architecture.layers]]
name = "domain"
path = "src/domain"

[[custom]]
id = "no-lodash"
type = "custom"
severity = "warning"
condition = { type = "forbid-node", select = { type = "package", name = "lodash" } }

[[whitelist]]
rule = "no-lodash"
path = "scripts/**"
reason = "Build scripts only"
"#,
    );
    write(
        &dir,
        "c3.toml",
        r#"
extends = ["shared/base.toml"]

[rules]
no-lodash = "error"

[[custom]]
id = "layer-dependencies"
type = "layering"
severity = "warning"
"#,
    );

    let manager = RuleManager::from_file(&dir.path().join("c3.toml")).unwrap();
    let sets = manager.rule_sets();

    let sources: Vec<RuleSource> = sets.iter().map(|s| s.source).collect();
    assert_eq!(
        sources,
        vec![RuleSource::BuiltIn, RuleSource::Extended, RuleSource::Custom]
    );
    assert_eq!(sets[1].id, "shared/base.toml");

    assert_eq!(manager.rule("no-lodash").unwrap().severity, Severity::Error);
    assert!(sets[0].rule("layer-dependencies").is_none());
    assert_eq!(
        sets[2].rule("layer-dependencies").unwrap().severity,
        Severity::Warning
    );

    assert_eq!(manager.layers().len(), 1);
    assert_eq!(manager.whitelist().entries()[0].rule, "no-lodash");
}

#[test]
fn extends_cycle_is_rejected() {
    let dir = TempDir::new().unwrap();
    write(&dir, "a.toml", r#"extends = ["b.toml"]"#);
    write(&dir, "b.toml", r#"extends = ["a.toml"]"#);

    let err = RuleManager::from_file(&dir.path().join("a.toml")).unwrap_err();
    assert!(matches!(err, LoadError::ExtendsCycle { .. }), "{err}");
}

#[test]
fn missing_extended_file_names_the_path() {
    let dir = TempDir::new().unwrap();
    write(&dir, "c3.toml", r#"extends = ["nowhere.toml"]"#);

    let err = RuleManager::from_file(&dir.path().join("c3.toml")).unwrap_err();
    assert!(matches!(err, LoadError::Extends { .. }));
    assert!(err.to_string().contains("nowhere.toml"));
}

#[test]
fn extended_file_listed_before_preset_still_wins() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "shared/team.toml",
        r#"
extends = ["c3/recommended"]

[rules]
no-circular-dependencies = "info"
"#,
    );
    write(
        &dir,
        "c3.toml",
        r#"extends = ["shared/team.toml", "c3/recommended"]"#,
    );

    let manager = RuleManager::from_file(&dir.path().join("c3.toml")).unwrap();

    assert_eq!(
        manager.rule("no-circular-dependencies").unwrap().severity,
        Severity::Info
    );
    let holders: Vec<&str> = manager
        .rule_sets()
        .iter()
        .filter(|s| s.rule("no-circular-dependencies").is_some())
        .map(|s| s.id.as_str())
        .collect();
    assert_eq!(holders, vec!["c3/recommended"]);
    let sets = manager.rule_sets();
    let ids: Vec<&str> = sets.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["c3/recommended", "shared/team.toml", "c3/recommended", "project"]
    );
    assert_eq!(sets[0].source, RuleSource::BuiltIn);
    assert!(sets[2].rules.is_empty());
}

#[test]
fn later_extended_file_beats_earlier_one() {
    let dir = TempDir::new().unwrap();
    let rule = |severity: &str| {
        format!(
            "[[custom]]\nid = \"no-lodash\"\ntype = \"custom\"\nseverity = \"{severity}\"\ncondition = {{ type = \"forbid-node\", select = {{ type = \"package\", name = \"lodash\" }} }}\n"
        )
    };
    write(&dir, "a.toml", &rule("warning"));
    write(&dir, "b.toml", &rule("error"));
    write(&dir, "c3.toml", r#"extends = ["a.toml", "b.toml"]"#);

    let manager = RuleManager::from_file(&dir.path().join("c3.toml")).unwrap();

    assert_eq!(manager.rule("no-lodash").unwrap().severity, Severity::Error);
}
