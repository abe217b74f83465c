//! Compliance reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Write;

use crate::types::{Severity, Violation};

/// Violation counts by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// All violations.
    pub total_violations: usize,
    /// Error-severity violations.
    pub error_count: usize,
    /// Warning-severity violations.
    pub warning_count: usize,
    /// Info-severity violations.
    pub info_count: usize,
}

/// The outcome of evaluating a rule set against a graph.
///
/// The summary and pass/fail verdict are derived from the violations on
/// demand and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplianceReport {
    id: String,
    codebase_id: String,
    generated_at: DateTime<Utc>,
    violations: Vec<Violation>,
}

impl ComplianceReport {
    /// Creates a report.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        codebase_id: impl Into<String>,
        generated_at: DateTime<Utc>,
        violations: Vec<Violation>,
    ) -> Self {
        Self {
            id: id.into(),
            codebase_id: codebase_id.into(),
            generated_at,
            violations,
        }
    }

    /// Report id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Id of the evaluated codebase.
    #[must_use]
    pub fn codebase_id(&self) -> &str {
        &self.codebase_id
    }

    /// Timestamp of the evaluated graph.
    #[must_use]
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Violations in rule order, then discovery order.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Counts violations by severity.
    #[must_use]
    pub fn summary(&self) -> Summary {
        self.violations
            .iter()
            .fold(Summary::default(), |mut summary, v| {
                summary.total_violations += 1;
                match v.severity {
                    Severity::Error => summary.error_count += 1,
                    Severity::Warning => summary.warning_count += 1,
                    Severity::Info => summary.info_count += 1,
                }
                summary
            })
    }

    /// True iff no error-severity violation remains.
    #[must_use]
    pub fn passed(&self) -> bool {
        !self.violations.iter().any(|v| v.severity == Severity::Error)
    }

    /// Returns violations filtered by severity.
    #[must_use]
    pub fn by_severity(&self, severity: Severity) -> Vec<&Violation> {
        self.violations
            .iter()
            .filter(|v| v.severity == severity)
            .collect()
    }

    /// Returns violations of one rule.
    #[must_use]
    pub fn violations_for_rule(&self, rule_id: &str) -> Vec<&Violation> {
        self.violations
            .iter()
            .filter(|v| v.rule_id == rule_id)
            .collect()
    }

    /// Checks if any violations meet or exceed the given severity threshold.
    #[must_use]
    pub fn has_violations_at(&self, severity: Severity) -> bool {
        self.violations.iter().any(|v| v.severity >= severity)
    }

    /// Formats violations at or above `fail_on` as a multi-line report
    /// suitable for test failure messages.
    #[must_use]
    pub fn format_test_report(&self, fail_on: Severity) -> String {
        let failing: Vec<&Violation> = self
            .violations
            .iter()
            .filter(|v| v.severity >= fail_on)
            .collect();

        let mut report = String::new();
        let _ = writeln!(report, "\n=== c3: {} violation(s) ===\n", failing.len());
        for v in &failing {
            let _ = writeln!(report, "{}", v.format());
        }

        let summary = self.summary();
        let _ = writeln!(
            report,
            "Total: {} error(s), {} warning(s), {} info(s) in {}",
            summary.error_count, summary.warning_count, summary.info_count, self.codebase_id
        );
        report
    }
}

#[derive(Serialize)]
struct ReportView<'a> {
    id: &'a str,
    codebase_id: &'a str,
    generated_at: DateTime<Utc>,
    passed: bool,
    summary: Summary,
    violations: &'a [Violation],
}

#[derive(Deserialize)]
struct ReportData {
    id: String,
    codebase_id: String,
    generated_at: DateTime<Utc>,
    #[serde(default)]
    violations: Vec<Violation>,
}

impl Serialize for ComplianceReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ReportView {
            id: &self.id,
            codebase_id: &self.codebase_id,
            generated_at: self.generated_at,
            passed: self.passed(),
            summary: self.summary(),
            violations: &self.violations,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ComplianceReport {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let data = ReportData::deserialize(deserializer)?;
        Ok(Self::new(
            data.id,
            data.codebase_id,
            data.generated_at,
            data.violations,
        ))
    }
}
