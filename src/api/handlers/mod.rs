use std::collections::{HashMap, HashSet};

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::ai::{AiClient, AiError};
use crate::engine::{self, EngineError, ExpandOptions};
use crate::export::{ExportError, ExportFormat};
use crate::models::*;

const MAX_RECOMMENDED_FEATURES: usize = 50;

// ============================================================
// Error Handling
// ============================================================

/// JSON error body for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub message: String,
    pub code: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: code.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
    }

    fn ai_not_configured() -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "ai_not_configured",
            "AI backend is not configured (set WBS_PLANNER_AI_URL)",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, code = %self.code, "{}", self.message);
        } else {
            tracing::warn!(status = %self.status, code = %self.code, "{}", self.message);
        }
        let body = ErrorBody {
            message: self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, e.code(), e.to_string())
    }
}

impl From<AiError> for ApiError {
    fn from(e: AiError) -> Self {
        let code = match &e {
            AiError::Api {
                code: Some(code), ..
            } => code.clone(),
            AiError::Boundary(_) | AiError::InvalidResponse { .. } => {
                "invalid_ai_response".to_string()
            }
            AiError::Timeout { .. } => "ai_timeout".to_string(),
            _ => "ai_backend_error".to_string(),
        };
        Self::new(StatusCode::BAD_GATEWAY, code, e.to_string())
    }
}

impl From<ExportError> for ApiError {
    fn from(e: ExportError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "export_failed", e.to_string())
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn require_ai(state: &AppState) -> Result<&AiClient, ApiError> {
    state.ai.as_ref().ok_or_else(ApiError::ai_not_configured)
}

fn require_text(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        Err(ApiError::bad_request(format!("{} must not be blank", field)))
    } else {
        Ok(())
    }
}

// ============================================================
// Request / Response Types
// ============================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectRequest {
    pub project_name: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractRequest {
    pub project_name: String,
    pub document_text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderRequest {
    pub project_name: String,
    pub features: Vec<Feature>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiscoverResponse {
    pub project_name: String,
    pub features: Vec<Feature>,
    pub total_features: usize,
    pub competitors: CompetitorAnalysis,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub features: Vec<Feature>,
    /// Ask the AI backend about features the keyword classifier is unsure of.
    #[serde(default = "default_true")]
    pub use_ai: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    /// Input features with `analysis` filled in.
    pub features: Vec<Feature>,
    pub summary: AnalysisSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeatureListValidation {
    pub valid: bool,
    pub issues: Vec<String>,
    pub feature_count: usize,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateWbsRequest {
    pub project_name: String,
    pub features: Vec<Feature>,
    #[serde(flatten)]
    pub options: ExpandOptions,
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy", "service": "wbs-planner" }))
}

// ============================================================
// Features (AI-backed)
// ============================================================

pub async fn generate_features(
    State(state): State<AppState>,
    Json(req): Json<ProjectRequest>,
) -> ApiResult<FeatureListResponse> {
    require_text(&req.project_name, "project_name")?;
    let ai = require_ai(&state)?;

    let features = ai
        .generate_features(&req.project_name, &req.description)
        .await?;
    Ok(Json(FeatureListResponse::new(req.project_name, features)))
}

pub async fn extract_features(
    State(state): State<AppState>,
    Json(req): Json<ExtractRequest>,
) -> ApiResult<FeatureListResponse> {
    require_text(&req.project_name, "project_name")?;
    require_text(&req.document_text, "document_text")?;
    let ai = require_ai(&state)?;

    let features = ai
        .extract_features(&req.project_name, &req.document_text)
        .await?;
    Ok(Json(FeatureListResponse::new(req.project_name, features)))
}

pub async fn analyze_competitors(
    State(state): State<AppState>,
    Json(req): Json<ProjectRequest>,
) -> ApiResult<CompetitorAnalysis> {
    require_text(&req.project_name, "project_name")?;
    let ai = require_ai(&state)?;

    let analysis = ai
        .analyze_competitors(&req.project_name, &req.description)
        .await?;
    Ok(Json(analysis))
}

/// Feature generation and competitor research in one round trip.
pub async fn discover(
    State(state): State<AppState>,
    Json(req): Json<ProjectRequest>,
) -> ApiResult<DiscoverResponse> {
    require_text(&req.project_name, "project_name")?;
    let ai = require_ai(&state)?;

    let (features, competitors) = ai.discover(&req.project_name, &req.description).await?;
    Ok(Json(DiscoverResponse {
        total_features: features.len(),
        project_name: req.project_name,
        features,
        competitors,
    }))
}

/// Let the AI sequence the features, then make the order contiguous.
///
/// The response carries the caller's features unchanged apart from
/// `execution_order`.
pub async fn order_features(
    State(state): State<AppState>,
    Json(req): Json<OrderRequest>,
) -> ApiResult<FeatureListResponse> {
    require_text(&req.project_name, "project_name")?;
    let ai = require_ai(&state)?;

    let planned = ai
        .plan_execution_order(&req.project_name, &req.features)
        .await?;
    let mut ordered: Vec<Feature> = engine::sort_by_execution_order(&planned)
        .into_iter()
        .cloned()
        .collect();
    engine::restamp_order(&mut ordered);

    Ok(Json(FeatureListResponse::new(req.project_name, ordered)))
}

// ============================================================
// Features (engine)
// ============================================================

/// Attach an hour analysis to every feature.
///
/// Features with neither an analysis nor a classification are classified by
/// keyword. The ones the keyword classifier is unsure about go to the AI
/// backend first when it is configured; if that call fails the keyword
/// result stands.
pub async fn analyze_features(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> ApiResult<AnalyzeResponse> {
    let mut features = req.features;

    if req.use_ai {
        if let Some(ai) = &state.ai {
            classify_ambiguous(ai, &mut features).await;
        }
    }

    let mut analyses = Vec::with_capacity(features.len());
    for feature in &mut features {
        let analysis = state.engine.allocate(feature)?;
        feature.analysis = Some(analysis.clone());
        analyses.push(analysis);
    }

    Ok(Json(AnalyzeResponse {
        summary: engine::summarize(&analyses),
        features,
    }))
}

async fn classify_ambiguous(ai: &AiClient, features: &mut [Feature]) {
    let pending: Vec<Feature> = features
        .iter()
        .filter(|f| f.analysis.is_none() && f.classification.is_none() && engine::is_ambiguous(f))
        .cloned()
        .collect();
    if pending.is_empty() {
        return;
    }

    match ai.classify_features(&pending).await {
        Ok(classifications) => {
            let pending_ids: HashSet<&str> = pending.iter().map(|f| f.id.as_str()).collect();
            let by_id: HashMap<String, FeatureClassification> = classifications
                .into_iter()
                .filter(|(id, _)| pending_ids.contains(id.as_str()))
                .collect();
            for feature in features.iter_mut() {
                if let Some(c) = by_id.get(&feature.id) {
                    feature.classification = Some(c.clone());
                }
            }
            tracing::debug!(
                requested = pending.len(),
                classified = by_id.len(),
                "AI classification applied"
            );
        }
        Err(e) => {
            tracing::warn!(error = %e, "AI classification failed, using keyword analysis");
        }
    }
}

pub async fn validate_features(
    Json(features): Json<Vec<String>>,
) -> ApiResult<FeatureListValidation> {
    if features.is_empty() {
        return Err(ApiError::bad_request("No features provided"));
    }

    let mut issues = Vec::new();
    if features.len() > MAX_RECOMMENDED_FEATURES {
        issues.push(format!(
            "Too many features (>{}). Consider grouping related features.",
            MAX_RECOMMENDED_FEATURES
        ));
    }
    let blank = features.iter().filter(|f| f.trim().is_empty()).count();
    if blank > 0 {
        issues.push(format!("{} feature name(s) are blank", blank));
    }

    Ok(Json(FeatureListValidation {
        valid: issues.is_empty(),
        issues,
        feature_count: features.len(),
        recommendations: vec!["Ensure features are at least 10 hours of work each".to_string()],
    }))
}

// ============================================================
// WBS
// ============================================================

pub async fn generate_wbs(
    State(state): State<AppState>,
    Json(req): Json<GenerateWbsRequest>,
) -> ApiResult<WbsResponse> {
    require_text(&req.project_name, "project_name")?;
    let wbs = state
        .engine
        .expand(&req.project_name, &req.features, &req.options)?;
    Ok(Json(wbs))
}

pub async fn validate_wbs(Json(tasks): Json<Vec<WbsTask>>) -> ApiResult<WbsValidation> {
    Ok(Json(engine::validate_wbs(&tasks)))
}

// ============================================================
// Export
// ============================================================

fn export(format: ExportFormat, request: ExportRequest) -> Result<Response, ApiError> {
    let body = format.render(&request)?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        format.filename(&request.project_name)
    );
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

pub async fn export_csv(Json(req): Json<ExportRequest>) -> Result<Response, ApiError> {
    export(ExportFormat::Csv, req)
}

pub async fn export_json(Json(req): Json<ExportRequest>) -> Result<Response, ApiError> {
    export(ExportFormat::Json, req)
}

pub async fn export_spreadsheet(Json(req): Json<ExportRequest>) -> Result<Response, ApiError> {
    export(ExportFormat::Spreadsheet, req)
}

pub async fn export_text(Json(req): Json<ExportRequest>) -> Result<Response, ApiError> {
    export(ExportFormat::Text, req)
}
