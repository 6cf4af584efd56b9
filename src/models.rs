//! Core data models for roleaudit
//!
//! These models are used throughout the codebase for representing
//! findings, aggregate counts, and analysis reports.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Severity levels for findings, ordered info < warning < critical.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Categories of issues a detector can report.
///
/// Each detector declares exactly one category and every finding it
/// produces carries that category. The variants without a built-in
/// detector are reserved for detectors registered by id later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Duplication,
    Complexity,
    Security,
    Maintainability,
    Idempotency,
    Organization,
    Performance,
    ErrorHandling,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Duplication => write!(f, "duplication"),
            Category::Complexity => write!(f, "complexity"),
            Category::Security => write!(f, "security"),
            Category::Maintainability => write!(f, "maintainability"),
            Category::Idempotency => write!(f, "idempotency"),
            Category::Organization => write!(f, "organization"),
            Category::Performance => write!(f, "performance"),
            Category::ErrorHandling => write!(f, "error_handling"),
        }
    }
}

/// Error raised when a detector hands the engine a malformed finding.
///
/// These are programming errors in a detector, not user errors, so the
/// engine treats them as that detector's execution failure rather than
/// coercing the value into range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FindingError {
    #[error("confidence {0} is outside [0.0, 1.0]")]
    ConfidenceOutOfRange(f64),
    #[error("finding pattern id is empty")]
    EmptyPattern,
    #[error("finding description is empty")]
    EmptyDescription,
}

/// A single improvement suggestion produced by a detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Stable rule identifier, e.g. `repeated_package_install`.
    pub pattern: String,
    pub category: Category,
    pub severity: Severity,
    pub description: String,
    /// Illustrative snippet, may be empty.
    #[serde(default)]
    pub example: String,
    /// Remediation guidance, may be empty.
    #[serde(default)]
    pub suggestion: String,
    /// Deduplicated, sorted set of originating task-file ids.
    #[serde(default)]
    pub affected_files: Vec<String>,
    /// Expected benefit, may be empty.
    #[serde(default)]
    pub impact: String,
    /// Detector certainty that this is a true positive, in [0.0, 1.0].
    pub confidence: f64,
}

impl Finding {
    /// Start building a finding. `pattern` must be a stable rule id.
    pub fn builder(pattern: impl Into<String>, category: Category) -> FindingBuilder {
        FindingBuilder {
            pattern: pattern.into(),
            category,
            severity: Severity::Info,
            description: String::new(),
            example: String::new(),
            suggestion: String::new(),
            affected_files: Vec::new(),
            impact: String::new(),
            confidence: 1.0,
        }
    }

    /// Re-check the field invariants on an already-built value.
    ///
    /// The engine runs this on every finding a detector returns, so a
    /// detector that bypasses the builder still cannot smuggle an
    /// out-of-range confidence into a report.
    pub fn validate(&self) -> Result<(), FindingError> {
        if self.pattern.trim().is_empty() {
            return Err(FindingError::EmptyPattern);
        }
        if self.description.trim().is_empty() {
            return Err(FindingError::EmptyDescription);
        }
        if !(0.0..=1.0).contains(&self.confidence) || self.confidence.is_nan() {
            return Err(FindingError::ConfidenceOutOfRange(self.confidence));
        }
        Ok(())
    }
}

/// Builder with constructor-time validation.
#[derive(Debug, Clone)]
pub struct FindingBuilder {
    pattern: String,
    category: Category,
    severity: Severity,
    description: String,
    example: String,
    suggestion: String,
    affected_files: Vec<String>,
    impact: String,
    confidence: f64,
}

impl FindingBuilder {
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.example = example.into();
        self
    }

    pub fn suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = suggestion.into();
        self
    }

    pub fn affected_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.affected_files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn affected_file(mut self, file: impl Into<String>) -> Self {
        self.affected_files.push(file.into());
        self
    }

    pub fn impact(mut self, impact: impl Into<String>) -> Self {
        self.impact = impact.into();
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Validate and build. Affected files are deduplicated and sorted
    /// here; membership is the only invariant callers may rely on.
    pub fn build(self) -> Result<Finding, FindingError> {
        let mut affected_files = self.affected_files;
        affected_files.sort();
        affected_files.dedup();

        let finding = Finding {
            pattern: self.pattern,
            category: self.category,
            severity: self.severity,
            description: self.description,
            example: self.example,
            suggestion: self.suggestion,
            affected_files,
            impact: self.impact,
            confidence: self.confidence,
        };
        finding.validate()?;
        Ok(finding)
    }
}

/// Findings counted by severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeveritySummary {
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
    pub total: usize,
}

impl SeveritySummary {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut summary = Self::default();
        for f in findings {
            match f.severity {
                Severity::Critical => summary.critical += 1,
                Severity::Warning => summary.warning += 1,
                Severity::Info => summary.info += 1,
            }
            summary.total += 1;
        }
        summary
    }
}

/// A detector that failed during an analysis run.
///
/// The rest of the report is still valid; the marker records that this
/// detector's findings are missing from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedDetector {
    pub detector: String,
    pub error: String,
}

/// Immutable result of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Role the report describes.
    pub role: String,
    /// Findings in detector order, then each detector's emission order.
    pub findings: Vec<Finding>,
    pub severity_counts: SeveritySummary,
    /// Count of findings per category; only categories with at least
    /// one finding appear.
    pub category_counts: BTreeMap<Category, usize>,
    /// Derived health score in [0, 100].
    pub health_score: u8,
    /// Detectors that failed or were skipped; empty on a full run.
    #[serde(default)]
    pub degraded: Vec<DegradedDetector>,
}

impl Report {
    /// Whether every enabled detector ran to completion.
    pub fn is_complete(&self) -> bool {
        self.degraded.is_empty()
    }

    pub fn category_counts_from(findings: &[Finding]) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for f in findings {
            *counts.entry(f.category).or_insert(0) += 1;
        }
        counts
    }
}
