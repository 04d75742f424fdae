//! Plain-text table for terminals.

use crate::models::{ExportRequest, TaskType};

use super::{format_hours, hours_of};

/// Render tasks as an aligned table followed by totals.
///
/// ```text
/// Task Tracker
///
/// ID  Type  Hours  Depends on  Task
/// --  ----  -----  ----------  ----------------------------
/// T1  R&D   4                  Research & Design - Login
/// T2  Dev   11.6               Development - Login
/// T3  Dev   8.8    T2          Development - Search
///
/// 3 tasks, 24.4 hours (Dev 20.4, R&D 4)
/// ```
pub fn to_table(request: &ExportRequest) -> String {
    let headers = ["ID", "Type", "Hours", "Depends on", "Task"];
    let rows: Vec<[String; 5]> = request
        .tasks
        .iter()
        .map(|t| {
            [
                t.id.clone(),
                t.task_type.to_string(),
                format_hours(t.duration_hours),
                t.dependencies.join(","),
                t.name.clone(),
            ]
        })
        .collect();

    let mut widths = headers.map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = format!("{}\n\n", request.project_name);
    push_line(&mut out, &headers.map(String::from), &widths);
    push_line(&mut out, &widths.map(|w| "-".repeat(w)), &widths);
    for row in &rows {
        push_line(&mut out, row, &widths);
    }

    let tasks = &request.tasks;
    out.push_str(&format!(
        "\n{} tasks, {} hours (Dev {}, R&D {})\n",
        tasks.len(),
        format_hours(hours_of(tasks, None)),
        format_hours(hours_of(tasks, Some(TaskType::Dev))),
        format_hours(hours_of(tasks, Some(TaskType::Rnd))),
    ));
    out
}

fn push_line(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    let last = cells.len() - 1;
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, &w))| {
            if i == last {
                cell.clone()
            } else {
                format!("{:<width$}", cell, width = w)
            }
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}
