//! MCP server exposing hour allocation and WBS generation to AI agents.

mod types;

pub use types::*;

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::Serialize;

use crate::engine::{self, EngineError, ExpandOptions, HourAllocationEngine};
use crate::export::ExportFormat;
use crate::models::*;

#[derive(Clone)]
pub struct McpServer {
    engine: HourAllocationEngine,
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    pub fn new(engine: HourAllocationEngine) -> Self {
        Self {
            engine,
            tool_router: Self::tool_router(),
        }
    }

    fn engine_err(e: EngineError) -> McpError {
        McpError::invalid_params(e.to_string(), Some(serde_json::json!({ "code": e.code() })))
    }

    fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // ============================================================
    // Tool logic, callable without the protocol layer
    // ============================================================

    pub fn allocate_feature_analysis(
        &self,
        req: AllocateFeatureRequest,
    ) -> Result<FeatureAnalysis, McpError> {
        self.engine.allocate(&req.feature).map_err(Self::engine_err)
    }

    pub fn generate_wbs_response(&self, req: GenerateWbsRequest) -> Result<WbsResponse, McpError> {
        if req.project_name.trim().is_empty() {
            return Err(McpError::invalid_params("project_name must not be blank", None));
        }
        let options = ExpandOptions {
            strict_ordering: req.strict_ordering,
            dependency_overrides: req.dependency_overrides,
        };
        self.engine
            .expand(&req.project_name, &req.features, &options)
            .map_err(Self::engine_err)
    }

    pub fn validate_wbs_report(&self, req: ValidateWbsRequest) -> WbsValidation {
        engine::validate_wbs(&req.tasks)
    }

    pub fn export_wbs_document(&self, req: ExportWbsRequest) -> Result<String, McpError> {
        let format: ExportFormat = req
            .format
            .parse()
            .map_err(|e: String| McpError::invalid_params(e, None))?;
        format
            .render(&ExportRequest {
                project_name: req.project_name,
                tasks: req.tasks,
            })
            .map_err(|e| McpError::internal_error(e.to_string(), None))
    }
}

#[tool_router]
impl McpServer {
    #[tool(
        description = "Compute the hour breakdown for one feature under the 8+2 rule: development hours by complexity (simple 4, medium 8, complex 16), 4h R&D, 2h UI and 2h database when needed, unit tests at 20% of development, 2h QA. If the feature already carries an analysis it is checked for internal consistency and returned unchanged."
    )]
    async fn allocate_feature(
        &self,
        params: Parameters<AllocateFeatureRequest>,
    ) -> Result<CallToolResult, McpError> {
        let analysis = self.allocate_feature_analysis(params.0)?;
        Self::json_result(&analysis)
    }

    #[tool(
        description = "Expand features into a flat work breakdown structure. Each feature yields an optional 'R&D' task and one 'Dev' task (development, UI, database, unit test and QA hours). Dev tasks are chained in execution order unless dependency_overrides says otherwise. Task ids are T1..Tn. Same input always gives the same output."
    )]
    async fn generate_wbs(
        &self,
        params: Parameters<GenerateWbsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let wbs = self.generate_wbs_response(params.0)?;
        Self::json_result(&wbs)
    }

    #[tool(
        description = "Check a task list for duplicate ids, unknown or circular dependencies, invalid durations and levels. Also warns when the Dev:R&D hour ratio strays from 4:1. Returns valid, issues, warnings and hour totals."
    )]
    async fn validate_wbs(
        &self,
        params: Parameters<ValidateWbsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let report = self.validate_wbs_report(params.0);
        Self::json_result(&report)
    }

    #[tool(
        description = "Render a task list as CSV, JSON, SpreadsheetML (opens in Excel) or an aligned text table. Returns the document text."
    )]
    async fn export_wbs(
        &self,
        params: Parameters<ExportWbsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let document = self.export_wbs_document(params.0)?;
        Ok(CallToolResult::success(vec![Content::text(document)]))
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: rmcp::model::Implementation {
                name: "wbs-planner".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            instructions: Some(
                r#"wbs-planner turns a list of features into a work breakdown structure with hour estimates.

WORKFLOW:
1. Give each feature an id, name and description. Add a classification
   (needs_rnd, needs_ui, needs_db, dev_complexity: simple|medium|complex)
   when you know it; otherwise keywords decide.
2. Optionally call allocate_feature to preview the hours of a single feature.
3. Set execution_order (1..N) on the features and call generate_wbs.
4. After editing tasks by hand, call validate_wbs.
5. Call export_wbs with format csv, json, spreadsheet or text.

HOUR POLICY (8+2 rule):
- Development: simple 4h, medium 8h, complex 16h
- R&D 4h, UI 2h, database 2h, each only when needed
- Unit tests: 20% of development hours
- QA: 2h per feature

Task ids are regenerated on every generate_wbs call. Do not keep them across
calls."#
                    .into(),
            ),
            ..Default::default()
        }
    }
}

pub async fn run_stdio_server(engine: HourAllocationEngine) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!("Starting MCP server via stdio");

    let service = McpServer::new(engine);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}
