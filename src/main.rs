//! roleaudit - Rule-based health analysis for automation roles
//!
//! Analyzes a materialized role-model snapshot with four rule-based
//! detectors and reports findings, counts, and a health score.

use anyhow::Result;
use clap::Parser;
use roleaudit::cli;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<ExitCode> {
    let args = cli::Cli::parse();

    // RUST_LOG takes precedence over the --log-level flag.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.clone()));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    cli::run(args)
}
