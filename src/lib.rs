//! roleaudit - Rule-based health analysis for automation roles
//!
//! roleaudit inspects the structural model of an automation role — its
//! task files, default variables, and handlers — and emits structured
//! improvement findings aggregated into a report with a 0-100 health
//! score.
//!
//! The library surface is the analysis core; the binary adds snapshot
//! loading, report rendering, and CI gating on top of it.
//!
//! ```ignore
//! use roleaudit::detectors::AnalysisEngine;
//! use roleaudit::role::load_model;
//!
//! let model = load_model("role.json")?;
//! let report = AnalysisEngine::with_defaults().analyze(&model);
//! println!("health: {}", report.health_score);
//! ```

pub mod cli;
pub mod config;
pub mod detectors;
pub mod models;
pub mod reporters;
pub mod role;
pub mod scoring;
