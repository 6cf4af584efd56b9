//! Markdown reporter for GitHub-flavored Markdown output
//!
//! Generates reports suitable for pull request comments and CI job
//! summaries.

use crate::models::{Report, Severity};
use anyhow::Result;

fn severity_label(severity: &Severity) -> &'static str {
    match severity {
        Severity::Critical => "🔴 critical",
        Severity::Warning => "🟡 warning",
        Severity::Info => "⚪ info",
    }
}

/// Render report as GitHub-flavored Markdown
pub fn render(report: &Report) -> Result<String> {
    let mut md = String::new();

    md.push_str(&format!("# Role Analysis: {}\n\n", report.role));
    md.push_str(&format!(
        "**Health score: {}/100** — {} finding(s)\n\n",
        report.health_score, report.severity_counts.total
    ));

    md.push_str("## Summary\n\n");
    md.push_str("| Severity | Count |\n|---|---|\n");
    md.push_str(&format!("| critical | {} |\n", report.severity_counts.critical));
    md.push_str(&format!("| warning | {} |\n", report.severity_counts.warning));
    md.push_str(&format!("| info | {} |\n\n", report.severity_counts.info));

    if !report.category_counts.is_empty() {
        md.push_str("| Category | Count |\n|---|---|\n");
        for (category, count) in &report.category_counts {
            md.push_str(&format!("| {category} | {count} |\n"));
        }
        md.push('\n');
    }

    if !report.findings.is_empty() {
        md.push_str("## Findings\n\n");
        for finding in &report.findings {
            md.push_str(&format!(
                "### `{}` ({})\n\n",
                finding.pattern,
                severity_label(&finding.severity)
            ));
            md.push_str(&format!("{}\n\n", finding.description));
            if !finding.example.is_empty() {
                md.push_str(&format!("```yaml\n{}\n```\n\n", finding.example));
            }
            if !finding.suggestion.is_empty() {
                md.push_str(&format!("**Suggestion:** {}\n\n", finding.suggestion));
            }
            if !finding.impact.is_empty() {
                md.push_str(&format!("**Impact:** {}\n\n", finding.impact));
            }
            if !finding.affected_files.is_empty() {
                md.push_str(&format!(
                    "**Files:** {}\n\n",
                    finding
                        .affected_files
                        .iter()
                        .map(|f| format!("`{f}`"))
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
            }
            md.push_str(&format!("*Confidence: {:.2}*\n\n", finding.confidence));
        }
    }

    if !report.degraded.is_empty() {
        md.push_str("## Degraded analysis\n\n");
        md.push_str("The following detectors did not complete; their findings are missing:\n\n");
        for marker in &report.degraded {
            md.push_str(&format!("- `{}`: {}\n", marker.detector, marker.error));
        }
        md.push('\n');
    }

    Ok(md)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_report;

    #[test]
    fn markdown_has_summary_tables_and_findings() {
        let md = render(&test_report()).unwrap();
        assert!(md.starts_with("# Role Analysis: webserver"));
        assert!(md.contains("| critical | 1 |"));
        assert!(md.contains("| security | 1 |"));
        assert!(md.contains("### `exposed_secrets`"));
        assert!(md.contains("## Degraded analysis"));
    }

    #[test]
    fn markdown_omits_empty_sections() {
        let mut report = test_report();
        report.findings.clear();
        report.degraded.clear();
        let md = render(&report).unwrap();
        assert!(!md.contains("## Findings"));
        assert!(!md.contains("## Degraded"));
    }
}
