//! Duplication Detector
//!
//! Finds groups of near-identical tasks that should be collapsed into a
//! loop, and task names that drifted apart through copy-paste.

use crate::detectors::base::{Detector, RuleThresholds};
use crate::models::{Category, Finding, Severity};
use crate::role::toolkit::{
    flatten_tasks, module_family, render_tasks, unique_files, FlatTask, FlattenOptions,
    ModuleFamily,
};
use crate::role::RoleModel;
use anyhow::Result;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// Upper bound on names considered for pairwise similarity.
const SIMILARITY_NAME_CAP: usize = 500;

/// Tasks rendered into a finding's example snippet.
const EXAMPLE_TASK_CAP: usize = 3;

pub struct DuplicationDetector {
    thresholds: RuleThresholds,
}

impl DuplicationDetector {
    pub fn new(thresholds: RuleThresholds) -> Self {
        Self { thresholds }
    }

    /// Grouping key: module plus the sorted argument-key signature.
    /// Values are deliberately ignored so `apt: name=nginx` and
    /// `apt: name=curl` land in the same group.
    fn signature(task: &FlatTask<'_>) -> (String, String) {
        let keys: BTreeSet<&str> = task.task.args.keys().map(String::as_str).collect();
        (
            task.task.module.clone(),
            keys.into_iter().collect::<Vec<_>>().join(","),
        )
    }

    fn repeated_group_finding(&self, group: &[FlatTask<'_>]) -> Option<Finding> {
        let family = module_family(&group[0].task.module);
        let (pattern, what, suggestion) = match family {
            ModuleFamily::Package => (
                "repeated_package_install",
                "package installation",
                "Collapse the installs into one task looping over a list of package names.",
            ),
            ModuleFamily::Service => (
                "repeated_service_operations",
                "service operation",
                "Collapse the service operations into one task looping over the service names.",
            ),
            ModuleFamily::File => {
                // Only directory creation repeats are worth a loop; file
                // copies with distinct content are legitimately separate.
                let dir_count = group
                    .iter()
                    .filter(|ft| ft.task.arg_str("state") == Some("directory"))
                    .count();
                if dir_count < self.thresholds.repetition {
                    return None;
                }
                (
                    "repeated_directory_creation",
                    "directory creation",
                    "Create the directories with one task looping over the paths.",
                )
            }
            _ => return None,
        };

        let module = &group[0].task.module;
        Some(
            Finding::builder(pattern, Category::Duplication)
                .severity(Severity::Warning)
                .description(format!(
                    "{} {} tasks use `{}` with the same argument shape.",
                    group.len(),
                    what,
                    module
                ))
                .example(render_tasks(group, EXAMPLE_TASK_CAP))
                .suggestion(suggestion)
                .affected_files(unique_files(group))
                .impact("One looping task is shorter, faster to read, and changes in one place.")
                .confidence(0.9)
                .build()
                .expect("repeated-group finding is well-formed"),
        )
    }

    fn similar_names_findings(&self, tasks: &[FlatTask<'_>]) -> Vec<Finding> {
        // Normalized token sets per distinct task name.
        let mut named: Vec<(&str, &str, BTreeSet<String>)> = Vec::new();
        let mut seen = BTreeSet::new();
        for ft in tasks {
            let name = ft.task.name.as_str();
            if name.is_empty() || !seen.insert(name) {
                continue;
            }
            named.push((name, ft.file, normalize_tokens(name)));
            if named.len() >= SIMILARITY_NAME_CAP {
                break;
            }
        }

        // Cluster names by pairwise similarity: a name joins the first
        // cluster it is similar to.
        let mut clusters: Vec<Vec<usize>> = Vec::new();
        for i in 0..named.len() {
            let mut placed = false;
            for cluster in &mut clusters {
                if cluster.iter().any(|&j| {
                    jaccard(&named[i].2, &named[j].2) > self.thresholds.name_similarity
                }) {
                    cluster.push(i);
                    placed = true;
                    break;
                }
            }
            if !placed {
                clusters.push(vec![i]);
            }
        }

        clusters
            .into_iter()
            .filter(|c| c.len() >= 2)
            .map(|cluster| {
                let names: Vec<&str> = cluster.iter().map(|&i| named[i].0).collect();
                let files: Vec<&str> = cluster.iter().map(|&i| named[i].1).collect();
                let shown = names
                    .iter()
                    .take(5)
                    .map(|n| format!("  - {n}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                Finding::builder("similar_task_names", Category::Duplication)
                    .severity(Severity::Info)
                    .description(format!(
                        "{} task names differ only by a few tokens, which usually means \
                         copy-paste drift:\n{}",
                        names.len(),
                        shown
                    ))
                    .suggestion(
                        "If the tasks do the same thing, merge them into a loop; if not, \
                         rename them so the difference is visible.",
                    )
                    .affected_files(files)
                    .impact("Distinct names make run output and failures easier to trace.")
                    .confidence(0.6)
                    .build()
                    .expect("similar-names finding is well-formed")
            })
            .collect()
    }
}

/// Lowercased alphabetic tokens of a task name. Numeric tokens are
/// dropped so "step 1"/"step 2" compare as identical.
fn normalize_tokens(name: &str) -> BTreeSet<String> {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && !t.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .collect()
}

fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

impl Detector for DuplicationDetector {
    fn id(&self) -> &'static str {
        "duplication"
    }

    fn category(&self) -> Category {
        Category::Duplication
    }

    fn description(&self) -> &'static str {
        "Detects repeated same-module tasks and copy-paste task names"
    }

    fn detect(&self, model: &RoleModel) -> Result<Vec<Finding>> {
        let flat = flatten_tasks(model, FlattenOptions::default());

        let mut groups: FxHashMap<(String, String), Vec<FlatTask<'_>>> = FxHashMap::default();
        for ft in &flat {
            groups.entry(Self::signature(ft)).or_default().push(*ft);
        }

        // Sort grouped keys so emission order is stable across runs.
        let mut keyed: Vec<_> = groups.into_iter().collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));

        let mut findings = Vec::new();
        for (_, group) in &keyed {
            if group.len() >= self.thresholds.repetition {
                findings.extend(self.repeated_group_finding(group));
            }
        }
        findings.extend(self.similar_names_findings(&flat));
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Task;
    use serde_json::json;

    fn install_task(name: &str, package: &str) -> Task {
        let mut args = std::collections::BTreeMap::new();
        args.insert("name".to_string(), json!(package));
        args.insert("state".to_string(), json!("present"));
        Task {
            name: name.to_string(),
            module: "apt".to_string(),
            args,
            ..Default::default()
        }
    }

    fn model_of(tasks: Vec<Task>) -> RoleModel {
        RoleModel {
            name: "web".to_string(),
            task_files: [("tasks/main".to_string(), tasks)].into_iter().collect(),
            ..Default::default()
        }
    }

    #[test]
    fn three_package_installs_are_flagged() {
        let model = model_of(vec![
            install_task("Install nginx", "nginx"),
            install_task("Install curl", "curl"),
            install_task("Install git", "git"),
        ]);
        let findings = DuplicationDetector::new(RuleThresholds::default())
            .detect(&model)
            .unwrap();
        let repeated: Vec<_> = findings
            .iter()
            .filter(|f| f.pattern == "repeated_package_install")
            .collect();
        assert_eq!(repeated.len(), 1);
        assert_eq!(repeated[0].severity, Severity::Warning);
        assert!(repeated[0].affected_files.contains(&"tasks/main".to_string()));
        assert!(repeated[0].example.contains("apt"));
    }

    #[test]
    fn two_installs_stay_quiet() {
        let model = model_of(vec![
            install_task("Install nginx", "nginx"),
            install_task("Install curl", "curl"),
        ]);
        let findings = DuplicationDetector::new(RuleThresholds::default())
            .detect(&model)
            .unwrap();
        assert!(findings
            .iter()
            .all(|f| f.pattern != "repeated_package_install"));
    }

    #[test]
    fn repeated_service_operations_are_flagged() {
        let service = |name: &str, svc: &str| {
            let mut t = Task {
                name: name.to_string(),
                module: "systemd".to_string(),
                ..Default::default()
            };
            t.args.insert("name".to_string(), json!(svc));
            t.args.insert("state".to_string(), json!("restarted"));
            t
        };
        let model = model_of(vec![
            service("Restart nginx", "nginx"),
            service("Restart php-fpm", "php-fpm"),
            service("Restart varnish", "varnish"),
        ]);
        let findings = DuplicationDetector::new(RuleThresholds::default())
            .detect(&model)
            .unwrap();
        assert!(findings
            .iter()
            .any(|f| f.pattern == "repeated_service_operations"));
    }

    #[test]
    fn repeated_file_tasks_need_directory_state() {
        let mut copy = Task {
            name: "Copy config".to_string(),
            module: "copy".to_string(),
            ..Default::default()
        };
        copy.args.insert("src".to_string(), json!("a.conf"));
        copy.args.insert("dest".to_string(), json!("/etc/a.conf"));
        let mut b = copy.clone();
        b.args.insert("src".to_string(), json!("b.conf"));
        let mut c = copy.clone();
        c.args.insert("src".to_string(), json!("c.conf"));

        let findings = DuplicationDetector::new(RuleThresholds::default())
            .detect(&model_of(vec![copy, b, c]))
            .unwrap();
        assert!(findings
            .iter()
            .all(|f| f.pattern != "repeated_directory_creation"));
    }

    #[test]
    fn similar_names_cluster() {
        let model = model_of(vec![
            install_task("Install nginx package on server", "nginx"),
            install_task("Install nginx package on servers", "nginx2"),
            install_task("Restart the database", "postgresql"),
        ]);
        let findings = DuplicationDetector::new(RuleThresholds::default())
            .detect(&model)
            .unwrap();
        let similar: Vec<_> = findings
            .iter()
            .filter(|f| f.pattern == "similar_task_names")
            .collect();
        assert_eq!(similar.len(), 1);
        assert!(similar[0].confidence < 0.85);
        assert!(similar[0]
            .description
            .contains("Install nginx package on server"));
    }

    #[test]
    fn jaccard_edges() {
        let a = normalize_tokens("Install nginx step 1");
        let b = normalize_tokens("install NGINX step 2");
        // Numeric tokens dropped, case folded: identical sets.
        assert!((jaccard(&a, &b) - 1.0).abs() < f64::EPSILON);
        assert_eq!(jaccard(&BTreeSet::new(), &BTreeSet::new()), 0.0);
    }
}
