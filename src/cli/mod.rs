//! CLI command definitions and handlers

pub(crate) mod analyze;
mod init;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Parse and validate a confidence threshold (0.0-1.0)
fn parse_confidence(s: &str) -> Result<f64, String> {
    let v: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if !(0.0..=1.0).contains(&v) {
        Err("confidence must be between 0.0 and 1.0".to_string())
    } else {
        Ok(v)
    }
}

/// roleaudit - Rule-based health analysis for automation roles
#[derive(Parser, Debug)]
#[command(name = "roleaudit")]
#[command(
    version,
    about = "Analyze an automation role for duplication, complexity, security, and maintainability issues",
    long_about = "roleaudit inspects a materialized role-model snapshot and runs four \
rule-based detectors over its task files, defaults, and handlers. Each finding carries \
a category, a severity, and a confidence score; the report aggregates counts and a \
0-100 health score suitable for CI gating.",
    after_help = "\
Examples:
  roleaudit analyze role.json                      Analyze a role-model snapshot
  roleaudit analyze role.json --format json        JSON output for scripting
  roleaudit analyze role.json --detectors security Security findings only
  roleaudit analyze role.json --min-confidence 0.8 Drop fuzzy findings
  roleaudit analyze role.json --gate               Exit 1 if the quality gate fails
  roleaudit init                                   Write a roleaudit.toml with defaults"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a role-model snapshot and report findings
    Analyze {
        /// Path to the role-model snapshot (JSON)
        snapshot: PathBuf,

        /// Output format: text, json, markdown (or md)
        #[arg(long, short = 'f', value_parser = ["text", "json", "markdown", "md"])]
        format: Option<String>,

        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Comma-separated detector ids to enable (default: all)
        #[arg(long, value_delimiter = ',')]
        detectors: Option<Vec<String>>,

        /// Exclude findings below this confidence (0.0-1.0)
        #[arg(long, value_parser = parse_confidence)]
        min_confidence: Option<f64>,

        /// Config file path (default: roleaudit.toml next to the snapshot)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Evaluate the quality gate and exit 1 on failure
        #[arg(long)]
        gate: bool,
    },

    /// Write a roleaudit.toml config file with example settings
    Init {
        /// Directory to write the config into
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

pub fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Analyze {
            snapshot,
            format,
            output,
            detectors,
            min_confidence,
            config,
            gate,
        } => analyze::run(analyze::AnalyzeArgs {
            snapshot,
            format,
            output,
            detectors,
            min_confidence,
            config,
            gate,
        }),
        Commands::Init { path } => {
            init::run(&path)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
