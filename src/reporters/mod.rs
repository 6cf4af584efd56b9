//! Output reporters for analysis reports
//!
//! Supports multiple output formats:
//! - `text` - Terminal output with ANSI colors
//! - `json` - Machine-readable JSON
//! - `markdown` - GitHub-flavored Markdown

mod json;
mod markdown;
mod text;

use crate::models::Report;
use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(anyhow!(
                "Unknown format '{}'. Valid formats: text, json, markdown",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// Render a report in the named format
pub fn report(report: &Report, format: &str) -> Result<String> {
    let fmt = OutputFormat::from_str(format)?;
    report_with_format(report, fmt)
}

/// Render a report using an OutputFormat enum
pub fn report_with_format(report: &Report, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(report),
        OutputFormat::Json => json::render(report),
        OutputFormat::Markdown => markdown::render(report),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Category, DegradedDetector, Finding, Report, Severity, SeveritySummary};

    /// Create a small Report for reporter tests
    pub(crate) fn test_report() -> Report {
        let findings = vec![
            Finding::builder("exposed_secrets", Category::Security)
                .severity(Severity::Critical)
                .description("Task `Create db user` passes a literal value for `password`.")
                .suggestion("Move the value into an encrypted variable store.")
                .affected_file("tasks/main")
                .confidence(0.9)
                .build()
                .unwrap(),
            Finding::builder("magic_values", Category::Maintainability)
                .severity(Severity::Info)
                .description("Literal `8080` appears in 4 tasks.")
                .affected_file("tasks/main")
                .confidence(0.6)
                .build()
                .unwrap(),
        ];
        let severity_counts = SeveritySummary::from_findings(&findings);
        let category_counts = Report::category_counts_from(&findings);
        Report {
            role: "webserver".to_string(),
            findings,
            severity_counts,
            category_counts,
            health_score: 83,
            degraded: vec![DegradedDetector {
                detector: "complexity".to_string(),
                error: "boom".to_string(),
            }],
        }
    }

    #[test]
    fn format_round_trips_through_strings() {
        for (name, fmt) in [
            ("text", OutputFormat::Text),
            ("json", OutputFormat::Json),
            ("md", OutputFormat::Markdown),
        ] {
            assert_eq!(OutputFormat::from_str(name).unwrap(), fmt);
        }
        assert!(OutputFormat::from_str("sarif").is_err());
    }

    #[test]
    fn every_format_renders() {
        let r = test_report();
        for fmt in [OutputFormat::Text, OutputFormat::Json, OutputFormat::Markdown] {
            let out = report_with_format(&r, fmt).unwrap();
            assert!(out.contains("webserver") || out.contains("83"), "{fmt}");
        }
    }
}
