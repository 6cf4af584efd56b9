//! Complexity Detector
//!
//! Flags conditionals with too many boolean operators, include chains
//! that nest too deep, and files drowning in variable-assignment tasks.

use crate::detectors::base::{Detector, RuleThresholds};
use crate::models::{Category, Finding, Severity};
use crate::role::toolkit::{
    flatten_file, flatten_tasks, module_family, render_task, FlattenOptions, ModuleFamily,
};
use crate::role::RoleModel;
use anyhow::Result;
use std::collections::BTreeSet;

pub struct ComplexityDetector {
    thresholds: RuleThresholds,
}

impl ComplexityDetector {
    pub fn new(thresholds: RuleThresholds) -> Self {
        Self { thresholds }
    }

    fn conditional_findings(&self, model: &RoleModel) -> Vec<Finding> {
        let mut findings = Vec::new();
        for ft in flatten_tasks(model, FlattenOptions::default()) {
            let Some(when) = ft.task.when.as_deref() else {
                continue;
            };
            let (ands, ors) = boolean_operator_counts(when);
            if ands > self.thresholds.max_and_count || ors > self.thresholds.max_or_count {
                findings.push(
                    Finding::builder("complex_conditional", Category::Complexity)
                        .severity(Severity::Warning)
                        .description(format!(
                            "Task `{}` combines {} `and` and {} `or` operators in one conditional.",
                            display_name(ft.task.name.as_str()),
                            ands,
                            ors
                        ))
                        .example(render_task(ft.task))
                        .suggestion(
                            "Move the combined condition into a named variable, or split \
                             the task so each branch has a simple guard.",
                        )
                        .affected_file(ft.file)
                        .impact("Simple guards are readable at a glance and testable in isolation.")
                        .confidence(0.9)
                        .build()
                        .expect("conditional finding is well-formed"),
                );
            }
        }
        findings
    }

    fn include_chain_findings(&self, model: &RoleModel) -> Vec<Finding> {
        // Files that are themselves pulled in by another file; chains
        // are only reported from their roots so one deep chain yields
        // one finding, not one per suffix.
        let mut included: BTreeSet<&str> = BTreeSet::new();
        for file in model.task_files.keys() {
            for target in include_targets(model, file) {
                included.insert(target);
            }
        }

        let roots: Vec<&str> = model
            .task_files
            .keys()
            .map(String::as_str)
            .filter(|f| !included.contains(f))
            .collect();
        // A fully cyclic layout has no roots; fall back to every file.
        let starts = if roots.is_empty() {
            model.task_files.keys().map(String::as_str).collect()
        } else {
            roots
        };

        let mut findings = Vec::new();
        for root in starts {
            let mut stack = vec![root];
            let chain = longest_chain(model, root, &mut stack);
            let hops = chain.len().saturating_sub(1);
            if hops > self.thresholds.max_include_depth {
                findings.push(
                    Finding::builder("deep_include_chain", Category::Complexity)
                        .severity(Severity::Warning)
                        .description(format!(
                            "Include chain starting at `{}` is {} hops deep: {}.",
                            root,
                            hops,
                            chain.join(" -> ")
                        ))
                        .suggestion(
                            "Flatten the chain: inline the small files or include the leaf \
                             files directly from the entry point.",
                        )
                        .affected_files(chain)
                        .impact("Shallow include trees make the execution order obvious.")
                        .confidence(0.9)
                        .build()
                        .expect("include-chain finding is well-formed"),
                );
            }
        }
        findings
    }

    fn set_fact_findings(&self, model: &RoleModel) -> Vec<Finding> {
        let mut findings = Vec::new();
        for file in model.task_files.keys() {
            let tasks = flatten_file(model, file, FlattenOptions::default());
            if tasks.is_empty() {
                continue;
            }
            let set_facts = tasks
                .iter()
                .filter(|ft| module_family(&ft.task.module) == ModuleFamily::SetFact)
                .count();
            let ratio = set_facts as f64 / tasks.len() as f64;
            if ratio > self.thresholds.max_set_fact_ratio {
                findings.push(
                    Finding::builder("excessive_set_fact", Category::Complexity)
                        .severity(Severity::Warning)
                        .description(format!(
                            "{} of {} tasks in `{}` only assign variables ({:.0}%).",
                            set_facts,
                            tasks.len(),
                            file,
                            ratio * 100.0
                        ))
                        .suggestion(
                            "Precompute the values as defaults or role vars instead of \
                             building them step by step at run time.",
                        )
                        .affected_file(file.as_str())
                        .impact("Fewer runtime assignments make the data flow traceable.")
                        .confidence(0.85)
                        .build()
                        .expect("set-fact finding is well-formed"),
                );
            }
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

/// Count word-level `and`/`or` operators in a conditional expression.
fn boolean_operator_counts(expr: &str) -> (usize, usize) {
    let mut ands = 0;
    let mut ors = 0;
    for token in expr.split_whitespace() {
        match token.to_lowercase().as_str() {
            "and" | "&&" => ands += 1,
            "or" | "||" => ors += 1,
            _ => {}
        }
    }
    (ands, ors)
}

/// Include targets referenced anywhere in a file, nested tasks included.
fn include_targets<'a>(model: &'a RoleModel, file: &str) -> Vec<&'a str> {
    flatten_file(model, file, FlattenOptions::default())
        .iter()
        .filter_map(|ft| ft.task.include.as_deref())
        .filter(|target| model.task_files.contains_key(*target))
        .collect()
}

/// Longest include chain starting from the last file on `stack`.
fn longest_chain<'a>(
    model: &'a RoleModel,
    file: &'a str,
    stack: &mut Vec<&'a str>,
) -> Vec<&'a str> {
    let mut best = stack.clone();
    for target in include_targets(model, file) {
        if stack.contains(&target) {
            continue; // cycle
        }
        stack.push(target);
        let candidate = longest_chain(model, target, stack);
        if candidate.len() > best.len() {
            best = candidate;
        }
        stack.pop();
    }
    best
}

impl Detector for ComplexityDetector {
    fn id(&self) -> &'static str {
        "complexity"
    }

    fn category(&self) -> Category {
        Category::Complexity
    }

    fn description(&self) -> &'static str {
        "Detects oversized conditionals, deep include chains, and set-fact sprawl"
    }

    fn detect(&self, model: &RoleModel) -> Result<Vec<Finding>> {
        let mut findings = self.conditional_findings(model);
        findings.extend(self.include_chain_findings(model));
        findings.extend(self.set_fact_findings(model));
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Task;

    fn task(name: &str, module: &str) -> Task {
        Task {
            name: name.to_string(),
            module: module.to_string(),
            ..Default::default()
        }
    }

    fn model_with(files: Vec<(&str, Vec<Task>)>) -> RoleModel {
        RoleModel {
            name: "test".to_string(),
            task_files: files
                .into_iter()
                .map(|(f, t)| (f.to_string(), t))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn operator_counting() {
        let (ands, ors) = boolean_operator_counts(
            "a == 1 and b == 2 and c == 3 or d is defined",
        );
        assert_eq!(ands, 2);
        assert_eq!(ors, 1);
    }

    #[test]
    fn four_ands_trigger_complex_conditional() {
        let mut t = task("gate", "debug");
        t.when = Some("a and b and c and d and e".to_string());
        let findings = ComplexityDetector::new(RuleThresholds::default())
            .detect(&model_with(vec![("tasks/main", vec![t])]))
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].pattern, "complex_conditional");
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn three_ands_do_not_trigger() {
        let mut t = task("gate", "debug");
        t.when = Some("a and b and c and d".to_string());
        let findings = ComplexityDetector::new(RuleThresholds::default())
            .detect(&model_with(vec![("tasks/main", vec![t])]))
            .unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn deep_chain_reported_once_from_root() {
        let chain_link = |target: Option<&str>| {
            let mut t = task("link", "include_tasks");
            t.include = target.map(str::to_string);
            t
        };
        let model = model_with(vec![
            ("tasks/a", vec![chain_link(Some("tasks/b"))]),
            ("tasks/b", vec![chain_link(Some("tasks/c"))]),
            ("tasks/c", vec![chain_link(Some("tasks/d"))]),
            ("tasks/d", vec![chain_link(Some("tasks/e"))]),
            ("tasks/e", vec![chain_link(None)]),
        ]);
        let findings = ComplexityDetector::new(RuleThresholds::default())
            .detect(&model)
            .unwrap();
        let chains: Vec<_> = findings
            .iter()
            .filter(|f| f.pattern == "deep_include_chain")
            .collect();
        assert_eq!(chains.len(), 1);
        assert!(chains[0].description.contains("tasks/a"));
        assert_eq!(chains[0].affected_files.len(), 5);
    }

    #[test]
    fn chain_of_three_hops_is_fine() {
        let chain_link = |target: Option<&str>| {
            let mut t = task("link", "include_tasks");
            t.include = target.map(str::to_string);
            t
        };
        let model = model_with(vec![
            ("tasks/a", vec![chain_link(Some("tasks/b"))]),
            ("tasks/b", vec![chain_link(Some("tasks/c"))]),
            ("tasks/c", vec![chain_link(Some("tasks/d"))]),
            ("tasks/d", vec![chain_link(None)]),
        ]);
        let findings = ComplexityDetector::new(RuleThresholds::default())
            .detect(&model)
            .unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn include_cycle_terminates() {
        let link = |target: &str| {
            let mut t = task("link", "include_tasks");
            t.include = Some(target.to_string());
            t
        };
        let model = model_with(vec![
            ("tasks/a", vec![link("tasks/b")]),
            ("tasks/b", vec![link("tasks/a")]),
        ]);
        // Must not hang or overflow; a two-file cycle is only one hop.
        let findings = ComplexityDetector::new(RuleThresholds::default())
            .detect(&model)
            .unwrap();
        assert!(findings
            .iter()
            .all(|f| f.pattern != "deep_include_chain"));
    }

    #[test]
    fn set_fact_heavy_file_is_flagged() {
        let tasks = vec![
            task("compute a", "set_fact"),
            task("compute b", "set_fact"),
            task("install", "apt"),
            task("configure", "template"),
            task("restart", "service"),
        ];
        let findings = ComplexityDetector::new(RuleThresholds::default())
            .detect(&model_with(vec![("tasks/main", tasks)]))
            .unwrap();
        let set_fact: Vec<_> = findings
            .iter()
            .filter(|f| f.pattern == "excessive_set_fact")
            .collect();
        assert_eq!(set_fact.len(), 1);
        assert!(set_fact[0].description.contains("40%"));
    }
}
