//! Base detector trait and types
//!
//! This module defines the core abstractions for role analysis:
//! - `Detector` trait that all detector strategies implement
//! - `DetectorResult` for capturing execution results
//! - `RuleThresholds` holding the tunable rule constants

use crate::models::{Category, Finding};
use crate::role::RoleModel;
use anyhow::Result;

/// Tunable constants the detection rules compare against.
///
/// Defaults match the documented rule set; every field can be
/// overridden through `[thresholds]` in roleaudit.toml.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleThresholds {
    /// Minimum group size before repeated same-module tasks are flagged.
    pub repetition: usize,
    /// Token-set similarity above which two task names are "similar".
    pub name_similarity: f64,
    /// Max boolean ANDs tolerated in one conditional expression.
    pub max_and_count: usize,
    /// Max boolean ORs tolerated in one conditional expression.
    pub max_or_count: usize,
    /// Max include/import chain depth.
    pub max_include_depth: usize,
    /// Max ratio of set-fact tasks per file.
    pub max_set_fact_ratio: f64,
    /// Max tasks in a single file.
    pub max_file_tasks: usize,
    /// Minimum recurrences before a literal counts as a magic value.
    pub magic_value_repetition: usize,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            repetition: 3,
            name_similarity: 0.6,
            max_and_count: 3,
            max_or_count: 2,
            max_include_depth: 3,
            max_set_fact_ratio: 0.15,
            max_file_tasks: 30,
            magic_value_repetition: 4,
        }
    }
}

/// Result from running a single detector
#[derive(Debug, Clone)]
pub struct DetectorResult {
    /// Id of the detector that produced these results
    pub detector: String,
    /// Findings produced by the detector
    pub findings: Vec<Finding>,
    /// Whether the detector completed successfully
    pub success: bool,
    /// Error message if the detector failed
    pub error: Option<String>,
}

impl DetectorResult {
    /// Create a successful result
    pub fn success(detector: String, findings: Vec<Finding>) -> Self {
        Self {
            detector,
            findings,
            success: true,
            error: None,
        }
    }

    /// Create a failed result
    pub fn failure(detector: String, error: String) -> Self {
        Self {
            detector,
            findings: Vec::new(),
            success: false,
            error: Some(error),
        }
    }
}

/// Trait for all detector strategies.
///
/// A detector is a stateless rule set: given a read-only role model it
/// returns the findings its rules produce, in a deterministic order.
/// "Nothing found" is an empty vec, never an error; `Err` signals an
/// internal failure the engine isolates from the other detectors.
pub trait Detector: Send + Sync {
    /// Stable identifier used in configuration and degraded markers.
    fn id(&self) -> &'static str;

    /// The single category every finding of this detector carries.
    fn category(&self) -> Category;

    /// Human-readable description of what this detector finds
    fn description(&self) -> &'static str;

    /// Run detection against the role model and return findings.
    fn detect(&self, model: &RoleModel) -> Result<Vec<Finding>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detector_result_success() {
        let result = DetectorResult::success("security".to_string(), vec![]);
        assert!(result.success);
        assert!(result.error.is_none());
    }

    #[test]
    fn detector_result_failure() {
        let result = DetectorResult::failure("security".to_string(), "oops".to_string());
        assert!(!result.success);
        assert_eq!(result.error, Some("oops".to_string()));
        assert!(result.findings.is_empty());
    }

    #[test]
    fn default_thresholds_match_rule_set() {
        let t = RuleThresholds::default();
        assert_eq!(t.repetition, 3);
        assert_eq!(t.max_and_count, 3);
        assert_eq!(t.max_or_count, 2);
        assert_eq!(t.max_include_depth, 3);
        assert_eq!(t.max_file_tasks, 30);
        assert!((t.max_set_fact_ratio - 0.15).abs() < f64::EPSILON);
    }
}
