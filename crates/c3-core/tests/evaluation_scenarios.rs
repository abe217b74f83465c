//! End-to-end behaviour of construction and evaluation through the public API.

use c3_core::construct::{file_node_id, AdapterError, MemoryFileSystem, UnresolvedRef};
use c3_core::evaluate::NamingEvaluator;
use c3_core::graph::{GraphMetadata, PATH_PROPERTY};
use c3_core::{
    Artifact, Condition, Edge, EdgeType, EvaluationEngine, EvaluationError, GlobPattern,
    GraphConstructor, GraphFragment, LayerDef, Node, NodeType, PropertyGraph, Rule, RuleSet,
    RuleSource, RuleType, Severity, SourceAdapter, Whitelist, WhitelistEntry,
};
use chrono::{DateTime, Utc};
use std::path::Path;

/// `use <path>` lines become dependencies on other files.
struct UseLines;

impl SourceAdapter for UseLines {
    fn name(&self) -> &'static str {
        "UseLines"
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["mod"]
    }

    fn parse(&self, artifact: &Artifact<'_>) -> Result<GraphFragment, AdapterError> {
        let mut fragment = GraphFragment::new();
        for target in artifact.content.lines().filter_map(|l| l.strip_prefix("use ")) {
            fragment.reference(UnresolvedRef {
                from: artifact.file_id(),
                candidates: vec![file_node_id(target)],
                edge_type: EdgeType::DependsOn,
                fallback: None,
            });
        }
        Ok(fragment)
    }
}

fn at() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn order_graph() -> PropertyGraph {
    let fs = MemoryFileSystem::new()
        .with_file("domain/Order.mod", "use infra/OrderRepo.mod")
        .with_file("infra/OrderRepo.mod", "")
        .with_file("app/PlaceOrder.mod", "use domain/Order.mod");
    GraphConstructor::builder()
        .adapter_box(Box::new(UseLines))
        .filesystem(Box::new(fs))
        .layer(LayerDef::new("domain", "domain").unwrap())
        .layer(LayerDef::new("infrastructure", "infra").unwrap())
        .layer(LayerDef::new("application", "app").unwrap())
        .codebase_id("shop")
        .parsed_at(at())
        .build()
        .construct(Path::new("."))
        .unwrap()
        .graph
}

fn forbid_domain_to_infra(severity: Severity) -> Rule {
    let condition: Condition = serde_json::from_value(serde_json::json!({
        "type": "dependency",
        "from": { "layer": "domain" },
        "to": { "layer": "infrastructure" },
        "forbidden": true
    }))
    .unwrap();
    Rule::new("no-infra-in-domain", RuleType::Dependency, severity, condition)
}

fn custom_set(rules: Vec<Rule>) -> RuleSet {
    RuleSet {
        rules,
        ..RuleSet::new("project", RuleSource::Custom)
    }
}

#[test]
fn forbidden_dependency_fails_the_report() {
    let graph = order_graph();
    let report = EvaluationEngine::with_defaults()
        .evaluate(
            &graph,
            &[custom_set(vec![forbid_domain_to_infra(Severity::Error)])],
            &Whitelist::new(),
        )
        .unwrap();

    assert_eq!(report.violations().len(), 1);
    let v = &report.violations()[0];
    assert_eq!(v.rule_id, "no-infra-in-domain");
    assert_eq!(v.severity, Severity::Error);
    assert_eq!(v.location.path(), Some("domain/Order.mod"));
    assert!(!report.passed());
    assert_eq!(report.codebase_id(), "shop");
}

#[test]
fn warning_severity_still_passes() {
    let report = EvaluationEngine::with_defaults()
        .evaluate(
            &order_graph(),
            &[custom_set(vec![forbid_domain_to_infra(Severity::Warning)])],
            &Whitelist::new(),
        )
        .unwrap();
    assert_eq!(report.summary().warning_count, 1);
    assert!(report.passed());
}

#[test]
fn compliant_graph_passes() {
    let fs = MemoryFileSystem::new()
        .with_file("domain/Order.mod", "")
        .with_file("infra/OrderRepo.mod", "use domain/Order.mod");
    let graph = GraphConstructor::builder()
        .adapter_box(Box::new(UseLines))
        .filesystem(Box::new(fs))
        .layer(LayerDef::new("domain", "domain").unwrap())
        .layer(LayerDef::new("infrastructure", "infra").unwrap())
        .build()
        .construct(Path::new("."))
        .unwrap()
        .graph;

    let report = EvaluationEngine::with_defaults()
        .evaluate(
            &graph,
            &[custom_set(vec![forbid_domain_to_infra(Severity::Error)])],
            &Whitelist::new(),
        )
        .unwrap();
    assert!(report.violations().is_empty());
    assert!(report.passed());
}

#[test]
fn identical_inputs_give_byte_identical_reports() {
    let rules = vec![
        forbid_domain_to_infra(Severity::Error),
        Rule::new(
            "layers",
            RuleType::Layering,
            Severity::Error,
            Condition::new("layering"),
        ),
    ];
    let engine = EvaluationEngine::with_defaults();
    let first = engine
        .evaluate(&order_graph(), &[custom_set(rules.clone())], &Whitelist::new())
        .unwrap();
    let second = engine
        .evaluate(&order_graph(), &[custom_set(rules)], &Whitelist::new())
        .unwrap();
    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
}

#[test]
fn adding_a_rule_set_never_removes_violations() {
    let engine = EvaluationEngine::with_defaults();
    let graph = order_graph();
    let base = vec![custom_set(vec![forbid_domain_to_infra(Severity::Error)])];
    let mut grown = base.clone();
    grown.push(RuleSet {
        rules: vec![Rule::new(
            "no-cycles",
            RuleType::Dependency,
            Severity::Warning,
            Condition::new("no-cycles"),
        )],
        ..RuleSet::new("extra", RuleSource::BuiltIn)
    });

    let small = engine.evaluate(&graph, &base, &Whitelist::new()).unwrap();
    let large = engine.evaluate(&graph, &grown, &Whitelist::new()).unwrap();
    for v in small.violations() {
        assert!(large.violations().contains(v), "{} disappeared", v.id);
    }
}

#[test]
fn whitelist_removes_exactly_the_matching_violations() {
    let mut graph = PropertyGraph::new(GraphMetadata::new("g", "c"));
    for path in ["legacy/OldThing.ts", "src/NewThing.ts", "src/good-thing.ts"] {
        graph
            .add_node(
                Node::new(format!("file:{path}"), NodeType::File, path.rsplit('/').next().unwrap())
                    .with_property(PATH_PROPERTY, path),
            )
            .unwrap();
    }
    let naming = Rule::new(
        "consistent-naming",
        RuleType::Naming,
        Severity::Error,
        Condition::new("naming").with_param("style", "kebab-case"),
    );
    let sets = [custom_set(vec![naming])];
    let engine = EvaluationEngine::builder()
        .evaluator(NamingEvaluator::new())
        .build();

    let all = engine.evaluate(&graph, &sets, &Whitelist::new()).unwrap();
    let whitelist: Whitelist = [WhitelistEntry::new(
        "consistent-naming",
        Some(GlobPattern::new("legacy/**").unwrap()),
        "Legacy code, will refactor in Q2",
    )]
    .into_iter()
    .collect();
    let filtered = engine.evaluate(&graph, &sets, &whitelist).unwrap();

    let expected: Vec<_> = all
        .violations()
        .iter()
        .filter(|v| v.location.path() != Some("legacy/OldThing.ts"))
        .cloned()
        .collect();
    assert_eq!(all.violations().len(), 2);
    assert_eq!(filtered.violations(), expected.as_slice());
    assert_eq!(filtered.summary().error_count, 1);
}

#[test]
fn unsupported_rule_type_fails_without_report() {
    let engine = EvaluationEngine::builder()
        .evaluator(NamingEvaluator::new())
        .build();
    let result = engine.evaluate(
        &order_graph(),
        &[custom_set(vec![forbid_domain_to_infra(Severity::Error)])],
        &Whitelist::new(),
    );
    assert!(matches!(
        result,
        Err(EvaluationError::NoEvaluatorForRuleType { .. })
    ));
}

#[test]
fn constructed_graph_never_has_dangling_edges() {
    let fs = MemoryFileSystem::new()
        .with_file("a.mod", "use b.mod\nuse missing.mod")
        .with_file("b.mod", "use a.mod\nuse a.mod");
    let graph = GraphConstructor::builder()
        .adapter_box(Box::new(UseLines))
        .filesystem(Box::new(fs))
        .build()
        .construct(Path::new("."))
        .unwrap()
        .graph;

    for edge in graph.edges() {
        assert!(graph.node(&edge.from).is_some());
        assert!(graph.node(&edge.to).is_some());
    }
    let deps: Vec<&Edge> = graph
        .edges()
        .filter(|e| e.edge_type == EdgeType::DependsOn)
        .collect();
    assert_eq!(deps.len(), 2);
}
