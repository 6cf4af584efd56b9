//! Project-level configuration support
//!
//! Loads per-project configuration from a `roleaudit.toml` file next to
//! the role-model snapshot (or an explicitly given path).
//!
//! # Configuration Format
//!
//! ```toml
//! # roleaudit.toml
//!
//! [analysis]
//! detectors = ["duplication", "complexity", "security", "maintainability"]
//! min_confidence = 0.5
//!
//! [thresholds]
//! repetition = 3
//! max_file_tasks = 30
//!
//! [scoring]
//! critical = 15
//! warning = 5
//! info = 2
//!
//! [gate]
//! max_critical = 0
//! min_score = 70
//!
//! [defaults]
//! format = "text"
//! ```

use crate::detectors::{AnalysisConfig, ConfigError, DetectorId, RuleThresholds, DEFAULT_DETECTORS};
use crate::scoring::{QualityGate, ScoreWeights};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// The config file name probed next to a snapshot.
pub const CONFIG_FILE_NAME: &str = "roleaudit.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub analysis: AnalysisSection,
    pub thresholds: ThresholdOverrides,
    pub scoring: ScoreWeights,
    pub gate: QualityGate,
    pub defaults: CliDefaults,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisSection {
    /// Detector ids to enable. An empty list is honored as "run
    /// nothing"; absence means all detectors.
    pub detectors: Option<Vec<String>>,
    pub min_confidence: f64,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            detectors: None,
            min_confidence: 0.0,
        }
    }
}

/// Partial overrides for [`RuleThresholds`]; unset fields keep their
/// defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdOverrides {
    pub repetition: Option<usize>,
    pub name_similarity: Option<f64>,
    pub max_and_count: Option<usize>,
    pub max_or_count: Option<usize>,
    pub max_include_depth: Option<usize>,
    pub max_set_fact_ratio: Option<f64>,
    pub max_file_tasks: Option<usize>,
    pub magic_value_repetition: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliDefaults {
    pub format: String,
}

impl Default for CliDefaults {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
        }
    }
}

impl ProjectConfig {
    /// Resolve the `[analysis]` section into an engine configuration.
    pub fn analysis_config(&self) -> Result<AnalysisConfig, ConfigError> {
        let detectors = match &self.analysis.detectors {
            None => DEFAULT_DETECTORS.to_vec(),
            Some(names) => names
                .iter()
                .map(|name| name.parse::<DetectorId>())
                .collect::<Result<Vec<_>, ConfigError>>()?,
        };
        Ok(AnalysisConfig {
            detectors,
            min_confidence: self.analysis.min_confidence,
        })
    }

    /// Rule thresholds with the `[thresholds]` overrides applied.
    pub fn rule_thresholds(&self) -> RuleThresholds {
        let mut thresholds = RuleThresholds::default();
        let o = &self.thresholds;
        if let Some(v) = o.repetition {
            thresholds.repetition = v;
        }
        if let Some(v) = o.name_similarity {
            thresholds.name_similarity = v;
        }
        if let Some(v) = o.max_and_count {
            thresholds.max_and_count = v;
        }
        if let Some(v) = o.max_or_count {
            thresholds.max_or_count = v;
        }
        if let Some(v) = o.max_include_depth {
            thresholds.max_include_depth = v;
        }
        if let Some(v) = o.max_set_fact_ratio {
            thresholds.max_set_fact_ratio = v;
        }
        if let Some(v) = o.max_file_tasks {
            thresholds.max_file_tasks = v;
        }
        if let Some(v) = o.magic_value_repetition {
            thresholds.magic_value_repetition = v;
        }
        thresholds
    }
}

/// Load project configuration from a directory or file path.
///
/// A directory is probed for `roleaudit.toml`. A missing file yields
/// the defaults; a malformed file is reported and the defaults are
/// used, so a bad config never blocks analysis.
pub fn load_project_config(path: &Path) -> ProjectConfig {
    let file = if path.is_dir() {
        path.join(CONFIG_FILE_NAME)
    } else {
        path.to_path_buf()
    };

    let raw = match std::fs::read_to_string(&file) {
        Ok(raw) => raw,
        Err(_) => {
            debug!("no config file at {}, using defaults", file.display());
            return ProjectConfig::default();
        }
    };

    match toml::from_str(&raw) {
        Ok(config) => {
            debug!("loaded project config from {}", file.display());
            config
        }
        Err(e) => {
            warn!("ignoring malformed {}: {}", file.display(), e);
            ProjectConfig::default()
        }
    }
}

/// Example config written by `roleaudit init`.
pub fn example_config() -> &'static str {
    r#"# roleaudit configuration

[analysis]
# detectors = ["duplication", "complexity", "security", "maintainability"]
min_confidence = 0.0

[thresholds]
# repetition = 3
# max_and_count = 3
# max_or_count = 2
# max_include_depth = 3
# max_set_fact_ratio = 0.15
# max_file_tasks = 30
# magic_value_repetition = 4
# name_similarity = 0.6

[scoring]
critical = 15
warning = 5
info = 2

[gate]
max_critical = 0
min_score = 70

[defaults]
format = "text"
"#
}
