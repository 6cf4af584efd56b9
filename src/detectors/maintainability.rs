//! Maintainability Detector
//!
//! Flags command tasks with no idempotency guard, oversized task files,
//! recurring unexplained literals, missing check-mode and failure
//! overrides, and defaults shadowed by runtime scopes.

use crate::detectors::base::{Detector, RuleThresholds};
use crate::models::{Category, Finding, Severity};
use crate::role::toolkit::{
    flatten_file, flatten_tasks, module_family, render_task, FlatTask, FlattenOptions,
    ModuleFamily,
};
use crate::role::RoleModel;
use anyhow::Result;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Literal values that recur legitimately and are never "magic".
const ACCEPTABLE_LITERALS: [&str; 16] = [
    "present", "absent", "latest", "installed", "started", "stopped", "restarted", "reloaded",
    "enabled", "directory", "file", "link", "touch", "yes", "no", "root",
];

pub struct MaintainabilityDetector {
    thresholds: RuleThresholds,
}

impl MaintainabilityDetector {
    pub fn new(thresholds: RuleThresholds) -> Self {
        Self { thresholds }
    }

    /// Command-family tasks that change state but carry neither an
    /// idempotency-hint argument nor a guard condition.
    fn idempotency_findings(&self, tasks: &[FlatTask<'_>]) -> Vec<Finding> {
        let mut findings = Vec::new();
        for ft in tasks {
            if module_family(&ft.task.module) != ModuleFamily::Command {
                continue;
            }
            let has_hint = ft.task.arg("creates").is_some() || ft.task.arg("removes").is_some();
            let has_guard = ft.task.when.is_some() || ft.task.changed_when.is_some();
            if has_hint || has_guard {
                continue;
            }
            findings.push(
                Finding::builder("missing_idempotency", Category::Maintainability)
                    .severity(Severity::Warning)
                    .description(format!(
                        "Task `{}` runs `{}` unconditionally on every play.",
                        display_name(&ft.task.name),
                        ft.task.module
                    ))
                    .example(render_task(ft.task))
                    .suggestion(
                        "Add `creates:`/`removes:`, a `when:` guard, or `changed_when:` so \
                         repeated runs converge instead of re-executing.",
                    )
                    .affected_file(ft.file)
                    .impact("Idempotent tasks make reruns safe and change reporting accurate.")
                    .confidence(0.7)
                    .build()
                    .expect("idempotency finding is well-formed"),
            );
        }
        findings
    }

    fn file_size_findings(&self, model: &RoleModel) -> Vec<Finding> {
        let mut findings = Vec::new();
        for file in model.task_files.keys() {
            let count = flatten_file(model, file, FlattenOptions::default()).len();
            if count > self.thresholds.max_file_tasks {
                findings.push(
                    Finding::builder("monolithic_main_file", Category::Maintainability)
                        .severity(Severity::Warning)
                        .description(format!(
                            "`{}` contains {} tasks (limit {}).",
                            file, count, self.thresholds.max_file_tasks
                        ))
                        .suggestion(
                            "Split the file by concern (install, configure, service) and \
                             include the pieces from the entry point.",
                        )
                        .affected_file(file.as_str())
                        .impact("Small per-concern files are easier to review and reuse.")
                        .confidence(0.95)
                        .build()
                        .expect("file-size finding is well-formed"),
                );
            }
        }
        findings
    }

    fn magic_value_findings(&self, tasks: &[FlatTask<'_>]) -> Vec<Finding> {
        let mut occurrences: FxHashMap<String, BTreeSet<&str>> = FxHashMap::default();
        let mut counts: FxHashMap<String, usize> = FxHashMap::default();
        for ft in tasks {
            for value in ft.task.args.values() {
                let Some(literal) = magic_candidate(value) else {
                    continue;
                };
                *counts.entry(literal.clone()).or_insert(0) += 1;
                occurrences.entry(literal).or_default().insert(ft.file);
            }
        }

        let mut recurring: Vec<(String, usize)> = counts
            .into_iter()
            .filter(|(_, n)| *n >= self.thresholds.magic_value_repetition)
            .collect();
        recurring.sort();

        recurring
            .into_iter()
            .map(|(literal, count)| {
                let files = occurrences.remove(&literal).unwrap_or_default();
                Finding::builder("magic_values", Category::Maintainability)
                    .severity(Severity::Info)
                    .description(format!(
                        "Literal `{}` appears in {} tasks; a rename means touching every one.",
                        literal, count
                    ))
                    .suggestion(format!(
                        "Extract `{}` into a default variable and reference it everywhere.",
                        literal
                    ))
                    .affected_files(files)
                    .impact("One named value changes in one place.")
                    .confidence(0.6)
                    .build()
                    .expect("magic-value finding is well-formed")
            })
            .collect()
    }

    fn check_mode_findings(&self, model: &RoleModel) -> Vec<Finding> {
        let mut findings = Vec::new();
        for file in model.task_files.keys() {
            let tasks = flatten_file(model, file, FlattenOptions::default());
            let missing: Vec<&FlatTask<'_>> = tasks
                .iter()
                .filter(|ft| {
                    module_family(&ft.task.module) == ModuleFamily::Command
                        && ft.task.check_mode.is_none()
                })
                .collect();
            if missing.is_empty() {
                continue;
            }
            findings.push(
                Finding::builder("missing_check_mode", Category::Maintainability)
                    .severity(Severity::Info)
                    .description(format!(
                        "{} command task{} in `{}` do not declare check-mode behavior.",
                        missing.len(),
                        if missing.len() == 1 { "" } else { "s" },
                        file
                    ))
                    .suggestion(
                        "Declare `check_mode:` on command tasks so dry runs either skip \
                         them or run them safely.",
                    )
                    .affected_file(file.as_str())
                    .impact("Predictable dry runs let operators preview changes.")
                    .confidence(0.6)
                    .build()
                    .expect("check-mode finding is well-formed"),
            );
        }
        findings
    }

    /// Piped shell commands report the exit status of the last command
    /// only; without an explicit override, failures upstream pass
    /// silently.
    fn failed_when_findings(&self, tasks: &[FlatTask<'_>]) -> Vec<Finding> {
        let mut findings = Vec::new();
        for ft in tasks {
            if module_family(&ft.task.module) != ModuleFamily::Command {
                continue;
            }
            let Some(cmd) = ft.task.command_text() else {
                continue;
            };
            if !cmd.contains('|') || cmd.contains("||") {
                continue;
            }
            if ft.task.failed_when.is_some() || ft.task.register.is_some() {
                continue;
            }
            findings.push(
                Finding::builder("missing_failed_when", Category::Maintainability)
                    .severity(Severity::Warning)
                    .description(format!(
                        "Task `{}` pipes commands without an explicit failure condition.",
                        display_name(&ft.task.name)
                    ))
                    .example(render_task(ft.task))
                    .suggestion(
                        "Register the result and add `failed_when:`, or set `set -o \
                         pipefail` before the pipeline.",
                    )
                    .affected_file(ft.file)
                    .impact("Explicit failure conditions stop plays when upstream commands break.")
                    .confidence(0.75)
                    .build()
                    .expect("failed-when finding is well-formed"),
            );
        }
        findings
    }

    fn shadowing_findings(&self, model: &RoleModel, tasks: &[FlatTask<'_>]) -> Vec<Finding> {
        if model.defaults.is_empty() {
            return Vec::new();
        }
        // Variable name -> files where an override scope redefines it.
        let mut shadowed: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for ft in tasks {
            let override_keys = ft.task.vars.keys().chain(
                if module_family(&ft.task.module) == ModuleFamily::SetFact {
                    Some(ft.task.args.keys())
                } else {
                    None
                }
                .into_iter()
                .flatten(),
            );
            for key in override_keys {
                if model.defaults.contains_key(key) {
                    shadowed.entry(key.as_str()).or_default().insert(ft.file);
                }
            }
        }

        shadowed
            .into_iter()
            .map(|(name, files)| {
                Finding::builder("variable_shadowing", Category::Maintainability)
                    .severity(Severity::Warning)
                    .description(format!(
                        "Variable `{}` is defined in defaults and redefined at task scope.",
                        name
                    ))
                    .suggestion(format!(
                        "Rename the task-scope variable or drop the default for `{}`; one \
                         definition should win.",
                        name
                    ))
                    .affected_files(files)
                    .impact("A single source of truth per variable avoids surprising precedence.")
                    .confidence(0.8)
                    .build()
                    .expect("shadowing finding is well-formed")
            })
            .collect()
    }
}

fn display_name(name: &str) -> &str {
    if name.is_empty() {
        "(unnamed)"
    } else {
        name
    }
}

/// Literal argument values eligible for magic-value counting: plain
/// strings with no templating and integers beyond 0/1.
fn magic_candidate(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.len() < 2
                || trimmed.contains("{{")
                || ACCEPTABLE_LITERALS.contains(&trimmed.to_lowercase().as_str())
            {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => {
            let v = n.as_i64()?;
            if v == 0 || v == 1 {
                None
            } else {
                Some(v.to_string())
            }
        }
        _ => None,
    }
}

impl Detector for MaintainabilityDetector {
    fn id(&self) -> &'static str {
        "maintainability"
    }

    fn category(&self) -> Category {
        Category::Maintainability
    }

    fn description(&self) -> &'static str {
        "Detects non-idempotent commands, monolithic files, magic values, and shadowed variables"
    }

    fn detect(&self, model: &RoleModel) -> Result<Vec<Finding>> {
        let flat = flatten_tasks(model, FlattenOptions::default());
        let mut findings = self.idempotency_findings(&flat);
        findings.extend(self.file_size_findings(model));
        findings.extend(self.magic_value_findings(&flat));
        findings.extend(self.check_mode_findings(model));
        findings.extend(self.failed_when_findings(&flat));
        findings.extend(self.shadowing_findings(model, &flat));
        Ok(findings)
    }
}
