//! Health scoring and the CI quality gate
//!
//! # Scoring formula
//!
//! ```text
//! score = clamp(100 - Σ weight(severity), 0, 100)
//!
//! weight: critical 15, warning 5, info 2
//! ```
//!
//! The score is a pure function of the findings retained in the report
//! (post confidence filter); a role with one informational finding
//! scores 98.

use crate::models::{Finding, Report, Severity};
use serde::Deserialize;

/// Per-severity penalty points subtracted from 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoreWeights {
    pub critical: u32,
    pub warning: u32,
    pub info: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            critical: 15,
            warning: 5,
            info: 2,
        }
    }
}

impl ScoreWeights {
    fn penalty(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Critical => self.critical,
            Severity::Warning => self.warning,
            Severity::Info => self.info,
        }
    }
}

/// Severity-weighted health score, clamped to [0, 100].
pub fn health_score(findings: &[Finding], weights: &ScoreWeights) -> u8 {
    let penalty: i64 = findings
        .iter()
        .map(|f| weights.penalty(f.severity) as i64)
        .sum();
    (100 - penalty).clamp(0, 100) as u8
}

/// Pass/fail thresholds for using a report as a CI quality gate.
///
/// The documented default rejects any critical finding and any health
/// score below 70.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualityGate {
    pub max_critical: usize,
    pub min_score: u8,
}

impl Default for QualityGate {
    fn default() -> Self {
        Self {
            max_critical: 0,
            min_score: 70,
        }
    }
}

/// Outcome of evaluating a report against a gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    pub passed: bool,
    /// Human-readable reasons for a failure; empty on a pass.
    pub reasons: Vec<String>,
}

impl QualityGate {
    pub fn evaluate(&self, report: &Report) -> GateDecision {
        let mut reasons = Vec::new();
        if report.severity_counts.critical > self.max_critical {
            reasons.push(format!(
                "{} critical finding(s), gate allows at most {}",
                report.severity_counts.critical, self.max_critical
            ));
        }
        if report.health_score < self.min_score {
            reasons.push(format!(
                "health score {} is below the gate minimum {}",
                report.health_score, self.min_score
            ));
        }
        GateDecision {
            passed: reasons.is_empty(),
            reasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Finding, SeveritySummary};

    fn finding(severity: Severity) -> Finding {
        Finding::builder("magic_values", Category::Maintainability)
            .description("test finding")
            .severity(severity)
            .confidence(0.6)
            .build()
            .unwrap()
    }

    fn report_of(findings: Vec<Finding>) -> Report {
        let severity_counts = SeveritySummary::from_findings(&findings);
        let category_counts = Report::category_counts_from(&findings);
        let health_score = health_score(&findings, &ScoreWeights::default());
        Report {
            role: "test".to_string(),
            findings,
            severity_counts,
            category_counts,
            health_score,
            degraded: vec![],
        }
    }

    #[test]
    fn single_info_finding_scores_98() {
        assert_eq!(
            health_score(&[finding(Severity::Info)], &ScoreWeights::default()),
            98
        );
    }

    #[test]
    fn no_findings_scores_100() {
        assert_eq!(health_score(&[], &ScoreWeights::default()), 100);
    }

    #[test]
    fn score_clamps_at_zero() {
        let findings: Vec<Finding> = (0..10).map(|_| finding(Severity::Critical)).collect();
        assert_eq!(health_score(&findings, &ScoreWeights::default()), 0);
    }

    #[test]
    fn severity_mix_adds_up() {
        let findings = vec![
            finding(Severity::Critical),
            finding(Severity::Warning),
            finding(Severity::Info),
        ];
        // 100 - 15 - 5 - 2
        assert_eq!(health_score(&findings, &ScoreWeights::default()), 78);
    }

    #[test]
    fn default_gate_rejects_criticals_and_low_scores() {
        let gate = QualityGate::default();

        let clean = report_of(vec![finding(Severity::Info)]);
        assert!(gate.evaluate(&clean).passed);

        let critical = report_of(vec![finding(Severity::Critical)]);
        let decision = gate.evaluate(&critical);
        assert!(!decision.passed);
        assert_eq!(decision.reasons.len(), 1);

        let low: Vec<Finding> = (0..7).map(|_| finding(Severity::Warning)).collect();
        let decision = gate.evaluate(&report_of(low));
        assert!(!decision.passed);
        assert!(decision.reasons[0].contains("health score"));
    }
}
