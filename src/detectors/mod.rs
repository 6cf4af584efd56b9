//! Detector strategies for role analysis
//!
//! This module provides the detector framework and the four built-in
//! rule sets.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   AnalysisEngine                     │
//! │  - validates configuration eagerly                   │
//! │  - runs enabled detectors in parallel (rayon)        │
//! │  - isolates failures, filters, counts, scores        │
//! └──────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌──────────────────────────────────────────────────────┐
//! │                   Detector trait                     │
//! │  - id(): stable identifier                           │
//! │  - category(): the one category it reports           │
//! │  - detect(model): run detection, return findings     │
//! └──────────────────────────────────────────────────────┘
//!          │              │              │
//!          ▼              ▼              ▼
//!   duplication      complexity     security / maintainability
//! ```
//!
//! Detectors are referenced by `DetectorId` in configuration; the
//! registry maps an id to its strategy, so a new detector registers
//! here without the engine changing.
//!
//! # Usage
//!
//! ```ignore
//! use roleaudit::detectors::{AnalysisConfig, AnalysisEngine, DetectorId, RuleThresholds};
//!
//! let engine = AnalysisEngine::new(
//!     AnalysisConfig {
//!         detectors: vec![DetectorId::Security],
//!         min_confidence: 0.5,
//!     },
//!     RuleThresholds::default(),
//! )?;
//! let report = engine.analyze(&model);
//! ```

mod base;
mod complexity;
mod duplication;
mod engine;
mod maintainability;
mod security;

pub use base::{Detector, DetectorResult, RuleThresholds};
pub use complexity::ComplexityDetector;
pub use duplication::DuplicationDetector;
pub use engine::{AnalysisConfig, AnalysisEngine, ConfigError};
pub use maintainability::MaintainabilityDetector;
pub use security::SecurityDetector;

use std::sync::Arc;

/// Identifiers for the built-in detector strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DetectorId {
    Duplication,
    Complexity,
    Security,
    Maintainability,
}

/// The explicit "all detectors" default referenced by configuration.
pub const DEFAULT_DETECTORS: [DetectorId; 4] = [
    DetectorId::Duplication,
    DetectorId::Complexity,
    DetectorId::Security,
    DetectorId::Maintainability,
];

impl DetectorId {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorId::Duplication => "duplication",
            DetectorId::Complexity => "complexity",
            DetectorId::Security => "security",
            DetectorId::Maintainability => "maintainability",
        }
    }
}

impl std::fmt::Display for DetectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DetectorId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "duplication" => Ok(DetectorId::Duplication),
            "complexity" => Ok(DetectorId::Complexity),
            "security" => Ok(DetectorId::Security),
            "maintainability" => Ok(DetectorId::Maintainability),
            other => Err(ConfigError::UnknownDetector(other.to_string())),
        }
    }
}

/// Instantiate the strategy a detector id names.
pub fn build_detector(id: DetectorId, thresholds: RuleThresholds) -> Arc<dyn Detector> {
    match id {
        DetectorId::Duplication => Arc::new(DuplicationDetector::new(thresholds)),
        DetectorId::Complexity => Arc::new(ComplexityDetector::new(thresholds)),
        DetectorId::Security => Arc::new(SecurityDetector::new(thresholds)),
        DetectorId::Maintainability => Arc::new(MaintainabilityDetector::new(thresholds)),
    }
}
