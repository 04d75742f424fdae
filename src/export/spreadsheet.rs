//! SpreadsheetML 2003 workbook.
//!
//! A single XML document that Excel and LibreOffice open as a workbook, so
//! no zip or xlsx writer is needed. Layout: a styled header row, one row
//! per task with Type and Hours shaded by task type, a blank row, then the
//! summary block.

use crate::models::{ExportRequest, TaskType, WbsTask};

use super::{format_hours, hours_of};

const HEADER: [&str; 7] = [
    "ID",
    "Task Name",
    "Description",
    "Type",
    "Hours",
    "Level",
    "Dependencies",
];

const COLUMN_WIDTHS: [u32; 7] = [60, 240, 300, 60, 60, 48, 120];

const STYLES: &str = r##"<Styles>
<Style ss:ID="Default" ss:Name="Normal"><Alignment ss:Vertical="Center" ss:WrapText="1"/></Style>
<Style ss:ID="header"><Font ss:Bold="1" ss:Color="#FFFFFF" ss:Size="12"/><Interior ss:Color="#4472C4" ss:Pattern="Solid"/><Alignment ss:Horizontal="Center" ss:Vertical="Center"/></Style>
<Style ss:ID="dev"><Interior ss:Color="#E7E6FD" ss:Pattern="Solid"/><Alignment ss:Horizontal="Center" ss:Vertical="Center"/></Style>
<Style ss:ID="rnd"><Interior ss:Color="#FFF2CC" ss:Pattern="Solid"/><Alignment ss:Horizontal="Center" ss:Vertical="Center"/></Style>
<Style ss:ID="title"><Font ss:Bold="1" ss:Size="14"/></Style>
<Style ss:ID="label"><Font ss:Bold="1"/></Style>
</Styles>
"##;

pub fn to_spreadsheet(request: &ExportRequest) -> String {
    let tasks = &request.tasks;
    let mut out = String::new();

    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<?mso-application progid=\"Excel.Sheet\"?>\n");
    out.push_str(
        "<Workbook xmlns=\"urn:schemas-microsoft-com:office:spreadsheet\" \
         xmlns:ss=\"urn:schemas-microsoft-com:office:spreadsheet\">\n",
    );
    out.push_str(&format!(
        "<DocumentProperties xmlns=\"urn:schemas-microsoft-com:office:office\"><Title>{} WBS</Title></DocumentProperties>\n",
        escape(&request.project_name)
    ));
    out.push_str(STYLES);
    out.push_str("<Worksheet ss:Name=\"WBS\">\n<Table>\n");

    for width in COLUMN_WIDTHS {
        out.push_str(&format!("<Column ss:Width=\"{}\"/>\n", width));
    }

    out.push_str("<Row>");
    for title in HEADER {
        out.push_str(&string_cell(title, Some("header")));
    }
    out.push_str("</Row>\n");

    for task in tasks {
        out.push_str(&task_row(task));
    }

    out.push_str("<Row/>\n");
    out.push_str(&format!("<Row>{}</Row>\n", string_cell("Summary", Some("title"))));
    summary_row(&mut out, "Total Tasks:", &tasks.len().to_string());
    summary_row(&mut out, "Total Hours:", &format_hours(hours_of(tasks, None)));
    summary_row(
        &mut out,
        "Dev Hours:",
        &format_hours(hours_of(tasks, Some(TaskType::Dev))),
    );
    summary_row(
        &mut out,
        "R&D Hours:",
        &format_hours(hours_of(tasks, Some(TaskType::Rnd))),
    );

    out.push_str("</Table>\n</Worksheet>\n</Workbook>\n");
    out
}

fn task_row(task: &WbsTask) -> String {
    let shade = match task.task_type {
        TaskType::Dev => "dev",
        TaskType::Rnd => "rnd",
    };

    let mut row = String::from("<Row>");
    row.push_str(&string_cell(&task.id, None));
    row.push_str(&string_cell(&task.name, None));
    row.push_str(&string_cell(&task.description, None));
    row.push_str(&string_cell(task.task_type.as_str(), Some(shade)));
    row.push_str(&number_cell(&format_hours(task.duration_hours), Some(shade)));
    row.push_str(&number_cell(&task.level.to_string(), None));
    row.push_str(&string_cell(&task.dependencies.join(", "), None));
    row.push_str("</Row>\n");
    row
}

fn summary_row(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!(
        "<Row>{}{}</Row>\n",
        string_cell(label, Some("label")),
        number_cell(value, None)
    ));
}

fn string_cell(value: &str, style: Option<&str>) -> String {
    cell("String", &escape(value), style)
}

fn number_cell(value: &str, style: Option<&str>) -> String {
    cell("Number", value, style)
}

fn cell(kind: &str, value: &str, style: Option<&str>) -> String {
    match style {
        Some(style) => format!(
            "<Cell ss:StyleID=\"{}\"><Data ss:Type=\"{}\">{}</Data></Cell>",
            style, kind, value
        ),
        None => format!("<Cell><Data ss:Type=\"{}\">{}</Data></Cell>", kind, value),
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str("&#10;"),
            c => out.push(c),
        }
    }
    out
}
