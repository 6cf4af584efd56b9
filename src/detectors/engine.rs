//! Analysis engine with parallel detector execution
//!
//! The engine orchestrates the enabled detector strategies:
//! - validates configuration before any model is touched
//! - fans detectors out on a rayon pool and joins their results
//! - isolates per-detector failures as degraded markers
//! - filters findings by confidence, aggregates counts, scores health
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   AnalysisEngine                     │
//! ├──────────────────────────────────────────────────────┤
//! │  1. Validate config (ids, confidence threshold)      │
//! │  2. Run enabled detectors in parallel (rayon)        │
//! │  3. Isolate failures as degraded markers             │
//! │  4. Filter by confidence, count, score               │
//! │  5. Assemble immutable Report                        │
//! └──────────────────────────────────────────────────────┘
//! ```

use crate::detectors::base::{Detector, DetectorResult, RuleThresholds};
use crate::detectors::{build_detector, DetectorId, DEFAULT_DETECTORS};
use crate::models::{DegradedDetector, Finding, Report, SeveritySummary};
use crate::role::RoleModel;
use crate::scoring::{health_score, ScoreWeights};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Configuration errors reported before any analysis runs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown detector id `{0}`")]
    UnknownDetector(String),
    #[error("detector `{0}` is enabled twice")]
    DuplicateDetector(String),
    #[error("minimum confidence {0} is outside [0.0, 1.0]")]
    ConfidenceOutOfRange(f64),
}

/// Construction-time options for the engine.
///
/// The "all detectors" default is the explicit `DEFAULT_DETECTORS`
/// constant; an empty detector set is valid and yields an empty report.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub detectors: Vec<DetectorId>,
    /// Findings strictly below this confidence are excluded from the
    /// report, not merely hidden.
    pub min_confidence: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            detectors: DEFAULT_DETECTORS.to_vec(),
            min_confidence: 0.0,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for id in &self.detectors {
            if !seen.insert(*id) {
                return Err(ConfigError::DuplicateDetector(id.to_string()));
            }
        }
        if !(0.0..=1.0).contains(&self.min_confidence) || self.min_confidence.is_nan() {
            return Err(ConfigError::ConfidenceOutOfRange(self.min_confidence));
        }
        Ok(())
    }
}

/// Orchestrates detection across the enabled detector strategies.
pub struct AnalysisEngine {
    detectors: Vec<Arc<dyn Detector>>,
    min_confidence: f64,
    weights: ScoreWeights,
    /// Optional wall-clock budget for one `analyze` call. Detectors not
    /// yet started when it runs out are skipped and marked degraded.
    budget: Option<Duration>,
}

impl AnalysisEngine {
    /// Validate the configuration and instantiate the enabled
    /// detectors. Fails fast, before any role model is touched.
    pub fn new(config: AnalysisConfig, thresholds: RuleThresholds) -> Result<Self, ConfigError> {
        config.validate()?;
        let detectors = config
            .detectors
            .iter()
            .map(|id| build_detector(*id, thresholds.clone()))
            .collect();
        Ok(Self {
            detectors,
            min_confidence: config.min_confidence,
            weights: ScoreWeights::default(),
            budget: None,
        })
    }

    /// Engine with the default configuration: all detectors, no
    /// confidence floor.
    pub fn with_defaults() -> Self {
        Self::new(AnalysisConfig::default(), RuleThresholds::default())
            .expect("default configuration is valid")
    }

    /// Engine over caller-supplied strategies.
    ///
    /// This is the extension point for detectors that are not part of
    /// the built-in registry; they plug in without the engine changing.
    pub fn from_detectors(
        detectors: Vec<Arc<dyn Detector>>,
        min_confidence: f64,
    ) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&min_confidence) || min_confidence.is_nan() {
            return Err(ConfigError::ConfidenceOutOfRange(min_confidence));
        }
        let mut seen = BTreeSet::new();
        for detector in &detectors {
            if !seen.insert(detector.id()) {
                return Err(ConfigError::DuplicateDetector(detector.id().to_string()));
            }
        }
        Ok(Self {
            detectors,
            min_confidence,
            weights: ScoreWeights::default(),
            budget: None,
        })
    }

    /// Override the severity weights used for the health score.
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Impose a wall-clock budget on each `analyze` call.
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn detector_count(&self) -> usize {
        self.detectors.len()
    }

    /// Run every enabled detector against the role model and assemble
    /// the report.
    ///
    /// Detectors run in parallel; the collected results keep the
    /// configured detector order, so reports are byte-identical across
    /// runs of the same model and configuration.
    pub fn analyze(&self, model: &RoleModel) -> Report {
        let start = Instant::now();
        debug!(
            detectors = self.detectors.len(),
            role = %model.name,
            "starting analysis"
        );

        let results: Vec<DetectorResult> = self
            .detectors
            .par_iter()
            .map(|detector| self.run_detector(detector, model, start))
            .collect();

        let mut findings: Vec<Finding> = Vec::new();
        let mut degraded: Vec<DegradedDetector> = Vec::new();
        for result in results {
            if result.success {
                findings.extend(result.findings);
            } else {
                warn!(
                    detector = %result.detector,
                    error = result.error.as_deref().unwrap_or("unknown"),
                    "detector failed; continuing with remaining detectors"
                );
                degraded.push(DegradedDetector {
                    detector: result.detector,
                    error: result.error.unwrap_or_else(|| "unknown error".to_string()),
                });
            }
        }

        let before = findings.len();
        findings.retain(|f| f.confidence >= self.min_confidence);
        if findings.len() < before {
            debug!(
                dropped = before - findings.len(),
                threshold = self.min_confidence,
                "dropped findings below confidence threshold"
            );
        }

        let severity_counts = SeveritySummary::from_findings(&findings);
        let category_counts = Report::category_counts_from(&findings);
        let score = health_score(&findings, &self.weights);

        info!(
            role = %model.name,
            findings = findings.len(),
            degraded = degraded.len(),
            score,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "analysis complete"
        );

        Report {
            role: model.name.clone(),
            findings,
            severity_counts,
            category_counts,
            health_score: score,
            degraded,
        }
    }

    /// Run one detector with failure isolation.
    ///
    /// A panic, an `Err`, or an invalid finding (bad confidence, empty
    /// pattern, or a category that does not match the detector's) all
    /// become a failed result; none of them aborts the overall run.
    fn run_detector(
        &self,
        detector: &Arc<dyn Detector>,
        model: &RoleModel,
        started: Instant,
    ) -> DetectorResult {
        let id = detector.id().to_string();

        if let Some(budget) = self.budget {
            if started.elapsed() >= budget {
                return DetectorResult::failure(
                    id,
                    "skipped: wall-clock budget exhausted before detector started".to_string(),
                );
            }
        }

        debug!(detector = %id, "running detector");
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            detector.detect(model)
        }));

        match outcome {
            Ok(Ok(findings)) => {
                for finding in &findings {
                    if let Err(e) = finding.validate() {
                        return DetectorResult::failure(
                            id,
                            format!("invalid finding `{}`: {}", finding.pattern, e),
                        );
                    }
                    if finding.category != detector.category() {
                        return DetectorResult::failure(
                            id,
                            format!(
                                "finding `{}` carries category {} but the detector declares {}",
                                finding.pattern,
                                finding.category,
                                detector.category()
                            ),
                        );
                    }
                }
                debug!(detector = %id, findings = findings.len(), "detector finished");
                DetectorResult::success(id, findings)
            }
            Ok(Err(e)) => DetectorResult::failure(id, e.to_string()),
            Err(panic) => {
                let message = if let Some(s) = panic.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = panic.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic".to_string()
                };
                DetectorResult::failure(id, format!("panic: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Severity};

    fn empty_model() -> RoleModel {
        RoleModel {
            name: "empty".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn duplicate_detector_rejected() {
        let config = AnalysisConfig {
            detectors: vec![DetectorId::Security, DetectorId::Security],
            min_confidence: 0.0,
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateDetector("security".to_string()))
        );
    }

    #[test]
    fn out_of_range_confidence_rejected() {
        for bad in [-0.1, 1.1, f64::NAN] {
            let config = AnalysisConfig {
                detectors: vec![DetectorId::Security],
                min_confidence: bad,
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::ConfidenceOutOfRange(_))
            ));
        }
    }

    #[test]
    fn empty_detector_set_yields_empty_report() {
        let engine = AnalysisEngine::new(
            AnalysisConfig {
                detectors: vec![],
                min_confidence: 0.0,
            },
            RuleThresholds::default(),
        )
        .unwrap();
        let report = engine.analyze(&empty_model());
        assert!(report.findings.is_empty());
        assert!(report.degraded.is_empty());
        assert_eq!(report.health_score, 100);
        assert_eq!(report.severity_counts.total, 0);
    }

    #[test]
    fn clean_model_scores_perfect() {
        let engine = AnalysisEngine::with_defaults();
        let report = engine.analyze(&empty_model());
        assert_eq!(report.health_score, 100);
        assert!(report.is_complete());
    }

    #[test]
    fn category_mismatch_is_detector_failure() {
        struct Mismatched;
        impl Detector for Mismatched {
            fn id(&self) -> &'static str {
                "mismatched"
            }
            fn category(&self) -> Category {
                Category::Security
            }
            fn description(&self) -> &'static str {
                "claims security, emits complexity"
            }
            fn detect(&self, _model: &RoleModel) -> anyhow::Result<Vec<Finding>> {
                Ok(vec![Finding::builder("oops", Category::Complexity)
                    .description("wrong category")
                    .severity(Severity::Info)
                    .build()
                    .unwrap()])
            }
        }

        let mut engine = AnalysisEngine::with_defaults();
        engine.detectors = vec![Arc::new(Mismatched)];
        let report = engine.analyze(&empty_model());
        assert!(report.findings.is_empty());
        assert_eq!(report.degraded.len(), 1);
        assert_eq!(report.degraded[0].detector, "mismatched");
        assert!(report.degraded[0].error.contains("category"));
    }

    #[test]
    fn zero_budget_skips_all_detectors() {
        let engine = AnalysisEngine::with_defaults().with_budget(Duration::ZERO);
        let report = engine.analyze(&empty_model());
        assert!(report.findings.is_empty());
        assert_eq!(report.degraded.len(), 4);
        assert!(report.degraded[0].error.contains("budget"));
    }
}
