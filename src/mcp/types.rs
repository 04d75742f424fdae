//! Request types for MCP tools.

use std::collections::BTreeMap;

use rmcp::schemars::JsonSchema;
use serde::Deserialize;

use crate::models::{Feature, WbsTask};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AllocateFeatureRequest {
    #[schemars(
        description = "The feature to allocate hours for. Supply either 'classification' (needs_rnd, needs_ui, needs_db, dev_complexity) or a complete 'analysis' to validate; with neither, keywords in the name and description decide."
    )]
    pub feature: Feature,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateWbsRequest {
    #[schemars(description = "Project name shown on the WBS and in export file names")]
    pub project_name: String,
    #[schemars(
        description = "Features to expand. Tasks follow ascending execution_order; features without one go last."
    )]
    pub features: Vec<Feature>,
    #[schemars(description = "Reject the request unless execution_order is exactly 1..N")]
    #[serde(default)]
    pub strict_ordering: bool,
    #[schemars(
        description = "Feature id -> ids of features whose Dev tasks it must wait for. Replaces the default link to the previous feature."
    )]
    #[serde(default)]
    pub dependency_overrides: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ValidateWbsRequest {
    #[schemars(description = "Tasks to check, typically after manual edits")]
    pub tasks: Vec<WbsTask>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExportWbsRequest {
    #[schemars(description = "Project name for the document title")]
    pub project_name: String,
    #[schemars(description = "Tasks to export, in display order")]
    pub tasks: Vec<WbsTask>,
    #[schemars(description = "Output format: 'csv', 'json', 'spreadsheet', or 'text'. Defaults to 'text'.")]
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "text".to_string()
}
