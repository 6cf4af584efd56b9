//! Structural model of an automation role
//!
//! A role is a named bundle of ordered task lists, default variables,
//! and notification handlers. The model arrives fully materialized —
//! deserialized from a JSON snapshot produced by the role-parsing
//! collaborator — and is never mutated by the analysis core.
//!
//! Ordered maps (`BTreeMap`) are used throughout so traversal order,
//! and therefore report order, is deterministic across runs.

pub mod toolkit;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// One step in a task file.
///
/// Every attribute beyond `name` and `module` is optional in the
/// snapshot; a missing attribute deserializes to its empty form and is
/// treated as absent by the detectors, never as an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub module: String,
    /// Module arguments. Free-form command text for shell-style modules
    /// is carried under the `cmd` key.
    #[serde(default)]
    pub args: BTreeMap<String, Value>,
    /// Conditional expression guarding the task.
    #[serde(default)]
    pub when: Option<String>,
    /// Loop construct (`loop`, `with_items`, ...), if any.
    #[serde(default)]
    pub loop_with: Option<String>,
    #[serde(default)]
    pub block: Vec<Task>,
    #[serde(default)]
    pub rescue: Vec<Task>,
    #[serde(default)]
    pub always: Vec<Task>,
    /// Include/import reference to another task-file id.
    #[serde(default)]
    pub include: Option<String>,
    /// Log-suppression directive.
    #[serde(default)]
    pub no_log: bool,
    #[serde(default)]
    pub changed_when: Option<String>,
    #[serde(default)]
    pub failed_when: Option<String>,
    #[serde(default)]
    pub check_mode: Option<bool>,
    #[serde(default)]
    pub register: Option<String>,
    /// Task-level variable overrides.
    #[serde(default)]
    pub vars: BTreeMap<String, Value>,
    /// Originating task-file id. May be empty in snapshots; traversal
    /// falls back to the id of the file the task was found under.
    #[serde(default)]
    pub file: String,
}

impl Task {
    /// Argument value by key.
    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.args.get(key)
    }

    /// Argument value as a string slice, if it is a string.
    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(Value::as_str)
    }

    /// Free-form command text for shell/command-style modules.
    pub fn command_text(&self) -> Option<&str> {
        self.arg_str("cmd").or_else(|| self.arg_str("_raw_params"))
    }
}

/// A notification handler definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Handler {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub module: String,
    /// Topic the handler listens on, if any.
    #[serde(default)]
    pub listen: Option<String>,
    #[serde(default)]
    pub file: String,
}

/// The in-memory structural representation of a role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleModel {
    #[serde(default)]
    pub name: String,
    /// Task-file id to its ordered task sequence.
    #[serde(default)]
    pub task_files: BTreeMap<String, Vec<Task>>,
    /// Default-variable definitions, nested to arbitrary depth.
    #[serde(default)]
    pub defaults: BTreeMap<String, Value>,
    #[serde(default)]
    pub handlers: Vec<Handler>,
}

impl RoleModel {
    /// Total number of top-level tasks across all files.
    pub fn task_count(&self) -> usize {
        self.task_files.values().map(Vec::len).sum()
    }
}

/// Load a role-model snapshot from a JSON file.
pub fn load_model(path: impl AsRef<Path>) -> Result<RoleModel> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read role model snapshot {}", path.display()))?;
    let model: RoleModel = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse role model snapshot {}", path.display()))?;
    Ok(model)
}
