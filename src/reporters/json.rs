//! JSON reporter
//!
//! Outputs the full Report as pretty-printed JSON.
//! Useful for machine consumption, piping to jq, or CI gating.

use crate::models::Report;
use anyhow::Result;

/// Render report as JSON
pub fn render(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Render report as compact JSON (single line)
#[allow(dead_code)] // Public API helper
pub fn render_compact(report: &Report) -> Result<String> {
    Ok(serde_json::to_string(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_report;

    #[test]
    fn json_render_exposes_every_field() {
        let report = test_report();
        let json_str = render(&report).expect("render JSON");
        let parsed: serde_json::Value = serde_json::from_str(&json_str).expect("parse JSON");
        assert_eq!(parsed["role"], "webserver");
        assert_eq!(parsed["health_score"], 83);
        assert_eq!(parsed["severity_counts"]["critical"], 1);
        assert_eq!(parsed["category_counts"]["security"], 1);
        let first = &parsed["findings"][0];
        assert_eq!(first["pattern"], "exposed_secrets");
        assert_eq!(first["severity"], "critical");
        assert_eq!(first["confidence"], 0.9);
        assert_eq!(parsed["degraded"][0]["detector"], "complexity");
    }

    #[test]
    fn json_render_compact_is_single_line() {
        let report = test_report();
        let json_str = render_compact(&report).expect("render compact JSON");
        assert!(!json_str.contains('\n'));
        let _: serde_json::Value = serde_json::from_str(&json_str).expect("parse compact JSON");
    }

    #[test]
    fn json_round_trips_to_identical_report() {
        let report = test_report();
        let json_str = render(&report).unwrap();
        let back: Report = serde_json::from_str(&json_str).unwrap();
        assert_eq!(back, report);
    }
}
