//! `roleaudit analyze` - run the detectors and render the report

use crate::config::{load_project_config, ProjectConfig};
use crate::detectors::{AnalysisEngine, DetectorId};
use crate::reporters;
use crate::role;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use tracing::info;

pub struct AnalyzeArgs {
    pub snapshot: PathBuf,
    pub format: Option<String>,
    pub output: Option<PathBuf>,
    pub detectors: Option<Vec<String>>,
    pub min_confidence: Option<f64>,
    pub config: Option<PathBuf>,
    pub gate: bool,
}

pub fn run(args: AnalyzeArgs) -> Result<ExitCode> {
    let config = resolve_config(&args);

    // CLI flags win over the config file.
    let mut analysis = config.analysis_config()?;
    if let Some(names) = &args.detectors {
        analysis.detectors = names
            .iter()
            .map(|name| DetectorId::from_str(name))
            .collect::<Result<Vec<_>, _>>()?;
    }
    if let Some(min_confidence) = args.min_confidence {
        analysis.min_confidence = min_confidence;
    }

    let engine = AnalysisEngine::new(analysis, config.rule_thresholds())?
        .with_weights(config.scoring);

    let model = role::load_model(&args.snapshot)?;
    info!(
        role = %model.name,
        files = model.task_files.len(),
        "loaded role model snapshot"
    );

    let report = engine.analyze(&model);

    let format = args.format.as_deref().unwrap_or(&config.defaults.format);
    let rendered = reporters::report(&report, format)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            eprintln!("Report written to {}", path.display());
        }
        None => print!("{rendered}"),
    }

    if args.gate {
        let decision = config.gate.evaluate(&report);
        if !decision.passed {
            for reason in &decision.reasons {
                eprintln!("gate: {reason}");
            }
            return Ok(ExitCode::FAILURE);
        }
        eprintln!("gate: passed");
    }

    Ok(ExitCode::SUCCESS)
}

fn resolve_config(args: &AnalyzeArgs) -> ProjectConfig {
    match &args.config {
        Some(path) => load_project_config(path),
        None => {
            let dir = args
                .snapshot
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            load_project_config(dir)
        }
    }
}
