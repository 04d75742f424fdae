use std::collections::{HashMap, HashSet};

use crate::models::{TaskType, WbsTask, WbsValidation};

use super::expand::first_cycle;
use super::round_hours;

/// Bounds on the Dev:R&D hour ratio under the 8+2 rule (nominally 4:1).
const MIN_DEV_RND_RATIO: f64 = 3.5;
const MAX_DEV_RND_RATIO: f64 = 4.5;

/// Check a task list, typically after manual edits.
///
/// Structural problems land in `issues` and make the WBS invalid. A Dev:R&D
/// ratio away from 4:1 is only a warning: the allocation policy itself moves
/// the ratio with UI/DB and testing hours.
pub fn validate_wbs(tasks: &[WbsTask]) -> WbsValidation {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    let mut seen = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen.insert(task.id.as_str()) {
            issues.push(format!("Duplicate task id '{}'", task.id));
        }
        if !task.duration_hours.is_finite() || task.duration_hours < 0.0 {
            issues.push(format!(
                "Task '{}' has invalid duration {}",
                task.id, task.duration_hours
            ));
        }
        if task.level == 0 {
            issues.push(format!("Task '{}' has level 0; levels start at 1", task.id));
        }
    }

    // First occurrence wins for duplicated ids.
    let mut position: HashMap<&str, usize> = HashMap::with_capacity(tasks.len());
    for (i, task) in tasks.iter().enumerate() {
        position.entry(task.id.as_str()).or_insert(i);
    }

    let mut deps = vec![Vec::new(); tasks.len()];
    for (i, task) in tasks.iter().enumerate() {
        for dep in &task.dependencies {
            if dep == &task.id {
                issues.push(format!("Task '{}' depends on itself", task.id));
                continue;
            }
            match position.get(dep.as_str()) {
                Some(&j) => deps[i].push(j),
                None => issues.push(format!(
                    "Task '{}' depends on unknown task '{}'",
                    task.id, dep
                )),
            }
        }
    }

    if let Some(i) = first_cycle(&deps) {
        issues.push(format!("Dependency cycle involving task '{}'", tasks[i].id));
    }

    let hours_of = |kind: TaskType| -> f64 {
        tasks
            .iter()
            .filter(|t| t.task_type == kind && t.duration_hours.is_finite())
            .map(|t| t.duration_hours)
            .sum()
    };
    let dev_hours = round_hours(hours_of(TaskType::Dev));
    let rnd_hours = round_hours(hours_of(TaskType::Rnd));

    if dev_hours > 0.0 && rnd_hours > 0.0 {
        let ratio = dev_hours / rnd_hours;
        if !(MIN_DEV_RND_RATIO..=MAX_DEV_RND_RATIO).contains(&ratio) {
            warnings.push(format!(
                "Dev/R&D ratio ({:.1}:1) doesn't match 8+2 rule (4:1)",
                ratio
            ));
        }
    }

    WbsValidation {
        valid: issues.is_empty(),
        issues,
        warnings,
        total_hours: round_hours(dev_hours + rnd_hours),
        dev_hours,
        rnd_hours,
        total_tasks: tasks.len(),
    }
}
