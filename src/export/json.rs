use crate::models::{ExportRequest, WbsResponse};

use super::ExportError;

/// Pretty JSON with totals recomputed from the task list.
pub fn to_json(request: &ExportRequest) -> Result<String, ExportError> {
    let response = WbsResponse::from_tasks(request.project_name.clone(), request.tasks.clone());
    Ok(serde_json::to_string_pretty(&response)?)
}
