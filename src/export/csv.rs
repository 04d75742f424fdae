use crate::models::WbsTask;

use super::format_hours;

const HEADER: [&str; 7] = [
    "ID",
    "Task Name",
    "Description",
    "Type",
    "Hours",
    "Level",
    "Dependencies",
];

/// One row per task, CRLF line endings, fields quoted when they need it.
pub fn to_csv(tasks: &[WbsTask]) -> String {
    let mut out = String::new();
    write_row(&mut out, HEADER.iter().map(|h| h.to_string()));

    for task in tasks {
        write_row(
            &mut out,
            [
                task.id.clone(),
                task.name.clone(),
                task.description.clone(),
                task.task_type.to_string(),
                format_hours(task.duration_hours),
                task.level.to_string(),
                task.dependencies.join(", "),
            ],
        );
    }
    out
}

fn write_row(out: &mut String, fields: impl IntoIterator<Item = String>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&quote(&field));
    }
    out.push_str("\r\n");
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
