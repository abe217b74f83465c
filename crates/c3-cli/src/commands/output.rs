//! Shared output formatting for reports and graphs.

use anyhow::Result;
use c3::{ComplianceReport, PropertyGraph, Severity};
use std::collections::BTreeMap;

use crate::{GraphFormat, OutputFormat};

/// Print a compliance report in the specified format.
pub fn print_report(report: &ComplianceReport, parsed: usize, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(report, parsed),
        OutputFormat::Json => return print_json(report),
        OutputFormat::Compact => print_compact(report),
    }
    Ok(())
}

fn print_text(report: &ComplianceReport, parsed: usize) {
    for violation in report.violations() {
        let severity_indicator = match violation.severity {
            Severity::Error => "\x1b[31merror\x1b[0m",
            Severity::Warning => "\x1b[33mwarning\x1b[0m",
            Severity::Info => "\x1b[34minfo\x1b[0m",
        };

        println!("{} at {}", violation.rule_id, violation.location);
        println!("  {}: {}", severity_indicator, violation.message);
        if let Some(doc_ref) = &violation.doc_ref {
            println!("  = see: {doc_ref}");
        }
        println!();
    }

    let summary = report.summary();
    let summary_color = if summary.error_count > 0 {
        "\x1b[31m"
    } else if summary.warning_count > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    println!(
        "{}Found {} error(s), {} warning(s), {} info(s) in {} file(s)\x1b[0m",
        summary_color, summary.error_count, summary.warning_count, summary.info_count, parsed
    );
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

fn print_compact(report: &ComplianceReport) {
    for violation in report.violations() {
        println!("{violation}");
    }
}

/// Node and edge counts by type, sorted by type name.
pub fn graph_stats(graph: &PropertyGraph) -> (BTreeMap<String, usize>, BTreeMap<String, usize>) {
    let mut nodes = BTreeMap::new();
    for node in graph.nodes() {
        *nodes.entry(node.node_type.to_string()).or_insert(0) += 1;
    }
    let mut edges = BTreeMap::new();
    for edge in graph.edges() {
        *edges.entry(edge.edge_type.to_string()).or_insert(0) += 1;
    }
    (nodes, edges)
}

/// Print a graph as counts or as JSON.
pub fn print_graph(graph: &PropertyGraph, format: GraphFormat) -> Result<()> {
    match format {
        GraphFormat::Json => print_json(graph),
        GraphFormat::Text => {
            let metadata = graph.metadata();
            println!("Graph {} ({})", graph.id(), metadata.codebase_id);
            println!("  adapters: {}", metadata.language);
            let (nodes, edges) = graph_stats(graph);
            println!("  {} node(s)", graph.node_count());
            for (node_type, count) in &nodes {
                println!("    {node_type:<12} {count}");
            }
            println!("  {} edge(s)", graph.edge_count());
            for (edge_type, count) in &edges {
                println!("    {edge_type:<12} {count}");
            }
            Ok(())
        }
    }
}
