use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One line of the work breakdown structure.
///
/// Generated tasks are always level 1 with `parent_id` pointing at the owning
/// feature. Deeper levels only appear when a user nests tasks by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WbsTask {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub duration_hours: f64,
    /// Ids of tasks that must finish before this one starts.
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub task_type: TaskType,
}

fn default_level() -> u32 {
    1
}

/// Whether a task is implementation work or research.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
pub enum TaskType {
    #[default]
    Dev,
    #[serde(rename = "R&D")]
    Rnd,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "Dev",
            Self::Rnd => "R&D",
        }
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Dev" | "dev" => Ok(Self::Dev),
            "R&D" | "r&d" | "rnd" => Ok(Self::Rnd),
            other => Err(format!("unknown task_type '{}'", other)),
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete generated WBS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WbsResponse {
    pub project_name: String,
    pub tasks: Vec<WbsTask>,
    pub total_tasks: usize,
    pub total_hours: f64,
}

impl WbsResponse {
    /// Build a response whose totals are derived from `tasks`.
    pub fn from_tasks(project_name: impl Into<String>, tasks: Vec<WbsTask>) -> Self {
        let total_hours = crate::engine::round_hours(tasks.iter().map(|t| t.duration_hours).sum());
        Self {
            project_name: project_name.into(),
            total_tasks: tasks.len(),
            total_hours,
            tasks,
        }
    }

    pub fn empty(project_name: impl Into<String>) -> Self {
        Self::from_tasks(project_name, Vec::new())
    }

    /// Hours spent on tasks of the given type.
    pub fn hours_of(&self, task_type: TaskType) -> f64 {
        crate::engine::round_hours(
            self.tasks
                .iter()
                .filter(|t| t.task_type == task_type)
                .map(|t| t.duration_hours)
                .sum(),
        )
    }
}

/// Outcome of checking a (possibly hand-edited) task list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WbsValidation {
    pub valid: bool,
    /// Structural problems. Any entry here makes `valid` false.
    pub issues: Vec<String>,
    /// Policy deviations that do not invalidate the WBS.
    pub warnings: Vec<String>,
    pub total_hours: f64,
    pub dev_hours: f64,
    pub rnd_hours: f64,
    pub total_tasks: usize,
}

/// Input accepted by the export formatters.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExportRequest {
    pub project_name: String,
    pub tasks: Vec<WbsTask>,
}
