//! WBS export formatters.
//!
//! All formatters take an [`ExportRequest`] and return the document as a
//! string. None of them reorders or filters tasks.

mod csv;
mod json;
mod spreadsheet;
mod table;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ExportRequest, TaskType, WbsTask};

pub use self::csv::to_csv;
pub use self::json::to_json;
pub use self::spreadsheet::to_spreadsheet;
pub use self::table::to_table;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Csv,
    Json,
    Spreadsheet,
    Text,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Spreadsheet => "spreadsheet",
            Self::Text => "text",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Spreadsheet => "xml",
            Self::Text => "txt",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
            Self::Spreadsheet => "application/vnd.ms-excel",
            Self::Text => "text/plain; charset=utf-8",
        }
    }

    /// Download name, e.g. `Task_Tracker_WBS.csv`.
    pub fn filename(&self, project_name: &str) -> String {
        format!("{}_WBS.{}", safe_name(project_name), self.extension())
    }

    pub fn render(&self, request: &ExportRequest) -> Result<String, ExportError> {
        tracing::debug!(
            format = self.as_str(),
            project = %request.project_name,
            tasks = request.tasks.len(),
            "Rendering export"
        );
        match self {
            Self::Csv => Ok(to_csv(&request.tasks)),
            Self::Json => to_json(request),
            Self::Spreadsheet => Ok(to_spreadsheet(request)),
            Self::Text => Ok(to_table(request)),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "spreadsheet" | "excel" | "xml" => Ok(Self::Spreadsheet),
            "text" | "txt" | "table" => Ok(Self::Text),
            other => Err(format!(
                "unknown export format '{}'. Must be: csv, json, spreadsheet, or text",
                other
            )),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project name reduced to characters safe in a file name.
fn safe_name(project_name: &str) -> String {
    let name: String = project_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() {
        "project".to_string()
    } else {
        name
    }
}

/// Hours as shown in documents: no trailing zeros, at most two decimals.
fn format_hours(hours: f64) -> String {
    let rounded = crate::engine::round_hours(hours);
    if rounded.fract() == 0.0 {
        format!("{:.0}", rounded)
    } else {
        let s = format!("{:.2}", rounded);
        s.trim_end_matches('0').to_string()
    }
}

fn hours_of(tasks: &[WbsTask], task_type: Option<TaskType>) -> f64 {
    crate::engine::round_hours(
        tasks
            .iter()
            .filter(|t| task_type.map_or(true, |kind| t.task_type == kind))
            .map(|t| t.duration_hours)
            .sum(),
    )
}
