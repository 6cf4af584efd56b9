//! Security Detection
//!
//! Detects hardcoded secrets, missing log suppression, world-writable
//! file modes, and shell commands that interpolate variables next to
//! shell metacharacters.

use crate::detectors::base::{Detector, RuleThresholds};
use crate::models::{Category, Finding, Severity};
use crate::role::toolkit::{
    flatten_tasks, module_family, render_task, FlatTask, FlattenOptions, ModuleFamily,
};
use crate::role::RoleModel;
use anyhow::Result;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

static SECRET_KEY_PATTERN: OnceLock<Regex> = OnceLock::new();

fn secret_key_pattern() -> &'static Regex {
    SECRET_KEY_PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(^|_)(password|passwd|pwd|secret|token|api_?key|key)(_|$)").unwrap()
    })
}

/// Shell metacharacters that turn interpolated input into commands.
const SHELL_METACHARACTERS: [&str; 5] = [";", "|", "&", "`", "$("];

pub struct SecurityDetector {
    #[allow(dead_code)] // No threshold-based rule yet; kept for config symmetry.
    thresholds: RuleThresholds,
}

impl SecurityDetector {
    pub fn new(thresholds: RuleThresholds) -> Self {
        Self { thresholds }
    }

    /// Secret-like argument keys holding a literal value: the key name
    /// matches the secret pattern and the value carries no `{{ }}`
    /// templating, so the secret is sitting in the role source itself.
    fn literal_secret_keys<'a>(task: &FlatTask<'a>) -> Vec<&'a str> {
        task.task
            .args
            .iter()
            .filter(|(key, value)| {
                secret_key_pattern().is_match(key) && is_literal_value(value)
            })
            .map(|(key, _)| key.as_str())
            .collect()
    }

    fn secret_findings(&self, tasks: &[FlatTask<'_>]) -> Vec<Finding> {
        let mut findings = Vec::new();
        for ft in tasks {
            let keys = Self::literal_secret_keys(ft);
            if keys.is_empty() {
                continue;
            }
            let key_list = keys.join("`, `");
            findings.push(
                Finding::builder("exposed_secrets", Category::Security)
                    .severity(Severity::Critical)
                    .description(format!(
                        "Task `{}` passes a literal value for secret-like argument `{}`.",
                        display_name(&ft.task.name),
                        key_list
                    ))
                    .suggestion(
                        "Move the value into an encrypted variable store and reference it \
                         with templating instead of embedding it in the role.",
                    )
                    .affected_file(ft.file)
                    .impact("Secrets in role source end up in version control and backups.")
                    .confidence(0.9)
                    .build()
                    .expect("secret finding is well-formed"),
            );
            if !ft.task.no_log {
                findings.push(
                    Finding::builder("missing_no_log", Category::Security)
                        .severity(Severity::Warning)
                        .description(format!(
                            "Task `{}` handles secret-like argument `{}` without log \
                             suppression.",
                            display_name(&ft.task.name),
                            key_list
                        ))
                        .suggestion("Add `no_log: true` to tasks that handle credentials.")
                        .affected_file(ft.file)
                        .impact("Suppressed logs keep credentials out of run output.")
                        .confidence(0.85)
                        .build()
                        .expect("no-log finding is well-formed"),
                );
            }
        }
        findings
    }

    fn permission_findings(&self, tasks: &[FlatTask<'_>]) -> Vec<Finding> {
        let mut findings = Vec::new();
        for ft in tasks {
            let Some(mode_value) = ft.task.arg("mode") else {
                continue;
            };
            let Some(mode) = decode_mode(mode_value) else {
                continue;
            };
            // World-writable is the dangerous bit; 0666 and 0777 both
            // decode to it, 0755 does not.
            if mode & 0o002 != 0 {
                let also_exec = mode & 0o001 != 0;
                findings.push(
                    Finding::builder("insecure_file_permissions", Category::Security)
                        .severity(Severity::Critical)
                        .description(format!(
                            "Task `{}` sets mode {:o}, which is world-writable{}.",
                            display_name(&ft.task.name),
                            mode,
                            if also_exec { " and world-executable" } else { "" }
                        ))
                        .example(render_task(ft.task))
                        .suggestion("Restrict the mode to the owning user and group, e.g. 0644 or 0750.")
                        .affected_file(ft.file)
                        .impact("Any local user can modify a world-writable file.")
                        .confidence(0.95)
                        .build()
                        .expect("permission finding is well-formed"),
                );
            }
        }
        findings
    }

    fn injection_findings(&self, tasks: &[FlatTask<'_>]) -> Vec<Finding> {
        let mut findings = Vec::new();
        for ft in tasks {
            if module_family(&ft.task.module) != ModuleFamily::Command {
                continue;
            }
            let Some(cmd) = ft.task.command_text() else {
                continue;
            };
            if !cmd.contains("{{") {
                continue;
            }
            let meta: Vec<&str> = SHELL_METACHARACTERS
                .iter()
                .copied()
                .filter(|m| cmd.contains(m))
                .collect();
            if meta.is_empty() {
                continue;
            }
            findings.push(
                Finding::builder("shell_injection_risk", Category::Security)
                    .severity(Severity::Warning)
                    .description(format!(
                        "Task `{}` interpolates variables into a shell command that also \
                         uses `{}`.",
                        display_name(&ft.task.name),
                        meta.join("` `")
                    ))
                    .example(render_task(ft.task))
                    .suggestion(
                        "Quote the interpolated values or switch to the command module \
                         with an argument list.",
                    )
                    .affected_file(ft.file)
                    .impact("Unquoted interpolation lets crafted variable values run extra commands.")
                    .confidence(0.7)
                    .build()
                    .expect("injection finding is well-formed"),
            );
        }
        findings
    }
}

fn display_name(name: &str) -> &str {
    if name.is_empty() {
        "(unnamed)"
    } else {
        name
    }
}

/// A value is literal when it is a non-empty string with no templating.
fn is_literal_value(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.is_empty() && !s.contains("{{") && !s.starts_with("!vault"),
        Value::Number(_) => true,
        _ => false,
    }
}

/// Decode a file-mode argument into permission bits.
///
/// Accepts octal strings ("0644", "0o644", "644") and numbers whose
/// digits read as octal (the snapshot carries `mode: 644` the way the
/// author wrote it). Symbolic modes ("u=rw,o=r") are not decoded.
fn decode_mode(value: &Value) -> Option<u32> {
    let digits = match value {
        Value::String(s) => s.trim().trim_start_matches("0o").to_string(),
        Value::Number(n) => n.as_u64()?.to_string(),
        _ => return None,
    };
    if digits.is_empty() || !digits.chars().all(|c| ('0'..='7').contains(&c)) {
        return None;
    }
    u32::from_str_radix(&digits, 8).ok()
}

impl Detector for SecurityDetector {
    fn id(&self) -> &'static str {
        "security"
    }

    fn category(&self) -> Category {
        Category::Security
    }

    fn description(&self) -> &'static str {
        "Detects hardcoded secrets, unsafe file modes, and shell injection risks"
    }

    fn detect(&self, model: &RoleModel) -> Result<Vec<Finding>> {
        let flat = flatten_tasks(model, FlattenOptions::default());
        let mut findings = self.secret_findings(&flat);
        findings.extend(self.permission_findings(&flat));
        findings.extend(self.injection_findings(&flat));
        Ok(findings)
    }
}
