//! Text (terminal) reporter with colors and formatting

use crate::models::{Report, Severity};
use anyhow::Result;

/// Severity colors (ANSI escape codes)
fn severity_color(severity: &Severity) -> &'static str {
    match severity {
        Severity::Critical => "\x1b[31m", // Red
        Severity::Warning => "\x1b[33m",  // Yellow
        Severity::Info => "\x1b[90m",     // Gray
    }
}

fn score_color(score: u8) -> &'static str {
    match score {
        90..=100 => "\x1b[32m", // Green
        70..=89 => "\x1b[33m",  // Yellow
        _ => "\x1b[31m",        // Red
    }
}

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Severity tag
fn severity_tag(severity: &Severity) -> &'static str {
    match severity {
        Severity::Critical => "[C]",
        Severity::Warning => "[W]",
        Severity::Info => "[I]",
    }
}

/// Render report as formatted terminal output
pub fn render(report: &Report) -> Result<String> {
    let mut out = String::new();

    let score_c = score_color(report.health_score);
    out.push_str(&format!("\n{BOLD}Role Analysis: {}{RESET}\n", report.role));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    out.push_str(&format!(
        "Health: {score_c}{BOLD}{}/100{RESET}\n\n",
        report.health_score
    ));

    // Findings summary
    let counts = &report.severity_counts;
    out.push_str(&format!("{BOLD}FINDINGS{RESET} ({} total)\n", counts.total));

    let mut summary_parts = Vec::new();
    if counts.critical > 0 {
        summary_parts.push(format!("\x1b[31m{} critical{RESET}", counts.critical));
    }
    if counts.warning > 0 {
        summary_parts.push(format!("\x1b[33m{} warning{RESET}", counts.warning));
    }
    if counts.info > 0 {
        summary_parts.push(format!("\x1b[90m{} info{RESET}", counts.info));
    }
    if !summary_parts.is_empty() {
        out.push_str(&format!("  {}\n", summary_parts.join(" | ")));
    }
    if !report.category_counts.is_empty() {
        let by_category = report
            .category_counts
            .iter()
            .map(|(category, n)| format!("{category}: {n}"))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!("  {DIM}{by_category}{RESET}\n"));
    }
    out.push('\n');

    for finding in &report.findings {
        let sev_c = severity_color(&finding.severity);
        let tag = severity_tag(&finding.severity);
        out.push_str(&format!(
            "{sev_c}{tag}{RESET} {BOLD}{}{RESET} {DIM}({}, confidence {:.2}){RESET}\n",
            finding.pattern, finding.category, finding.confidence
        ));
        out.push_str(&format!("    {}\n", finding.description.replace('\n', "\n    ")));
        if !finding.affected_files.is_empty() {
            out.push_str(&format!(
                "    {DIM}files: {}{RESET}\n",
                finding.affected_files.join(", ")
            ));
        }
        if !finding.suggestion.is_empty() {
            out.push_str(&format!("    {DIM}fix: {}{RESET}\n", finding.suggestion));
        }
        out.push('\n');
    }

    if !report.degraded.is_empty() {
        out.push_str(&format!("{BOLD}\x1b[33mDEGRADED{RESET}\n"));
        for marker in &report.degraded {
            out.push_str(&format!(
                "  detector `{}` did not complete: {}\n",
                marker.detector, marker.error
            ));
        }
        out.push('\n');
    }

    Ok(out)
}
