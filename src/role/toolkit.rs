//! Shared traversal and query helpers over a role model
//!
//! Pure functions composed by every detector. Nothing here mutates the
//! model or touches shared state, so detectors can call these helpers
//! concurrently from the rayon pool.

use crate::role::{RoleModel, Task};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Controls cross-file traversal during flattening.
///
/// Detectors that reason per-file leave `follow_includes` off so each
/// file's sequence is enumerated exactly once; detectors that reason
/// about a file's effective task stream turn it on.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlattenOptions {
    pub follow_includes: bool,
}

/// A task paired with the file it effectively belongs to.
#[derive(Debug, Clone, Copy)]
pub struct FlatTask<'a> {
    pub task: &'a Task,
    pub file: &'a str,
}

impl<'a> FlatTask<'a> {
    fn new(task: &'a Task, context_file: &'a str) -> Self {
        // Snapshots may omit per-task file ids; fall back to the file
        // the task was found under.
        let file = if task.file.is_empty() {
            context_file
        } else {
            task.file.as_str()
        };
        Self { task, file }
    }
}

/// Flatten every task file into one ordered sequence, descending into
/// block/rescue/always children.
pub fn flatten_tasks<'a>(model: &'a RoleModel, opts: FlattenOptions) -> Vec<FlatTask<'a>> {
    let mut out = Vec::new();
    for (file, tasks) in &model.task_files {
        let mut seen = BTreeSet::new();
        seen.insert(file.as_str());
        walk(model, file, tasks, opts, &mut seen, &mut out);
    }
    out
}

/// Flatten a single task file. Returns an empty sequence for an unknown
/// file id.
pub fn flatten_file<'a>(
    model: &'a RoleModel,
    file: &str,
    opts: FlattenOptions,
) -> Vec<FlatTask<'a>> {
    let mut out = Vec::new();
    if let Some((key, tasks)) = model.task_files.get_key_value(file) {
        let mut seen = BTreeSet::new();
        seen.insert(key.as_str());
        walk(model, key, tasks, opts, &mut seen, &mut out);
    }
    out
}

fn walk<'a>(
    model: &'a RoleModel,
    file: &'a str,
    tasks: &'a [Task],
    opts: FlattenOptions,
    seen: &mut BTreeSet<&'a str>,
    out: &mut Vec<FlatTask<'a>>,
) {
    for task in tasks {
        out.push(FlatTask::new(task, file));
        for children in [&task.block, &task.rescue, &task.always] {
            if !children.is_empty() {
                walk(model, file, children, opts, seen, out);
            }
        }
        if opts.follow_includes {
            if let Some(target) = task.include.as_deref() {
                // Guard against include cycles.
                if let Some((key, included)) = model.task_files.get_key_value(target) {
                    if seen.insert(key.as_str()) {
                        walk(model, key, included, opts, seen, out);
                    }
                }
            }
        }
    }
}

/// Count of tasks per module id.
pub fn module_counts<'a>(tasks: &[FlatTask<'a>]) -> BTreeMap<&'a str, usize> {
    let mut counts = BTreeMap::new();
    for ft in tasks {
        *counts.entry(ft.task.module.as_str()).or_insert(0) += 1;
    }
    counts
}

/// The tasks using a given module, in sequence order.
pub fn tasks_for_module<'a, 'b>(tasks: &'b [FlatTask<'a>], module: &str) -> Vec<FlatTask<'a>> {
    tasks
        .iter()
        .filter(|ft| ft.task.module == module)
        .copied()
        .collect()
}

/// Distinct originating-file ids, sorted.
pub fn unique_files<'a>(tasks: &[FlatTask<'a>]) -> Vec<&'a str> {
    let set: BTreeSet<&str> = tasks.iter().map(|ft| ft.file).collect();
    set.into_iter().collect()
}

/// Coarse module families the rules key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleFamily {
    Package,
    Service,
    File,
    Command,
    SetFact,
    Other,
}

/// Classify a module id into its family.
pub fn module_family(module: &str) -> ModuleFamily {
    match module {
        "apt" | "yum" | "dnf" | "package" | "pip" | "npm" | "gem" | "zypper" | "pacman"
        | "apk" | "homebrew" => ModuleFamily::Package,
        "service" | "systemd" | "systemd_service" | "sysvinit" | "runit" => ModuleFamily::Service,
        "file" | "copy" | "template" => ModuleFamily::File,
        "command" | "shell" | "raw" | "script" | "win_command" | "win_shell" => {
            ModuleFamily::Command
        }
        "set_fact" => ModuleFamily::SetFact,
        _ => ModuleFamily::Other,
    }
}

/// Max argument lines rendered per task snippet.
const SNIPPET_ARG_CAP: usize = 6;

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render one task as a bounded, YAML-like snippet for Finding examples.
pub fn render_task(task: &Task) -> String {
    let mut lines = Vec::new();
    let name = if task.name.is_empty() {
        "(unnamed)"
    } else {
        task.name.as_str()
    };
    lines.push(format!("- name: {name}"));
    if task.args.is_empty() {
        lines.push(format!("  {}: {{}}", task.module));
    } else {
        lines.push(format!("  {}:", task.module));
        for (key, value) in task.args.iter().take(SNIPPET_ARG_CAP) {
            lines.push(format!("    {}: {}", key, render_value(value)));
        }
        if task.args.len() > SNIPPET_ARG_CAP {
            lines.push(format!(
                "    # ... {} more arguments",
                task.args.len() - SNIPPET_ARG_CAP
            ));
        }
    }
    if let Some(when) = &task.when {
        lines.push(format!("  when: {when}"));
    }
    if let Some(loop_with) = &task.loop_with {
        lines.push(format!("  loop: {loop_with}"));
    }
    lines.join("\n")
}

/// Render a capped list of tasks, noting how many were omitted.
pub fn render_tasks<'a>(tasks: &[FlatTask<'a>], cap: usize) -> String {
    let mut out: Vec<String> = tasks.iter().take(cap).map(|ft| render_task(ft.task)).collect();
    if tasks.len() > cap {
        out.push(format!("# ... and {} more tasks", tasks.len() - cap));
    }
    out.join("\n")
}
