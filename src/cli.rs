//! `wbsp plan`: expand a feature file into a WBS without any server.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::Deserialize;

use crate::engine::{ExpandOptions, HourAllocationEngine};
use crate::export::ExportFormat;
use crate::models::{ExportRequest, Feature};

const DEFAULT_PROJECT_NAME: &str = "Untitled Project";

#[derive(Debug, Clone, Args)]
pub struct PlanArgs {
    /// JSON file: a feature array, or an object with `features`
    #[arg(short, long)]
    pub input: PathBuf,

    /// Overrides the project name in the input file
    #[arg(long)]
    pub project_name: Option<String>,

    /// csv, json, spreadsheet or text
    #[arg(short, long, default_value = "text")]
    pub format: ExportFormat,

    /// Require execution_order to be exactly 1..N
    #[arg(long)]
    pub strict: bool,
}

/// Contents of a plan input file.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanDocument {
    #[serde(default)]
    pub project_name: Option<String>,
    pub features: Vec<Feature>,
    #[serde(default)]
    pub strict_ordering: bool,
    #[serde(default)]
    pub dependency_overrides: BTreeMap<String, Vec<String>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PlanInput {
    Document(PlanDocument),
    Features(Vec<Feature>),
}

pub fn load_plan(path: &Path) -> anyhow::Result<PlanDocument> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let input: PlanInput = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a feature list", path.display()))?;

    Ok(match input {
        PlanInput::Document(doc) => doc,
        PlanInput::Features(features) => PlanDocument {
            project_name: None,
            features,
            strict_ordering: false,
            dependency_overrides: BTreeMap::new(),
        },
    })
}

/// Load, expand and render. Returns the rendered document.
pub fn run_plan(args: &PlanArgs, engine: &HourAllocationEngine) -> anyhow::Result<String> {
    let doc = load_plan(&args.input)?;

    let project_name = args
        .project_name
        .clone()
        .or(doc.project_name)
        .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string());

    let options = ExpandOptions {
        strict_ordering: args.strict || doc.strict_ordering,
        dependency_overrides: doc.dependency_overrides,
    };

    let wbs = engine.expand(&project_name, &doc.features, &options)?;
    tracing::debug!(tasks = wbs.total_tasks, hours = wbs.total_hours, "Plan expanded");

    let document = args.format.render(&ExportRequest {
        project_name: wbs.project_name,
        tasks: wbs.tasks,
    })?;
    Ok(document)
}
