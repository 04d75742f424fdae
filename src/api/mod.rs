mod handlers;
mod middleware;

pub use handlers::{
    AnalyzeRequest, AnalyzeResponse, ApiError, DiscoverResponse, ErrorBody, ExtractRequest,
    FeatureListValidation, GenerateWbsRequest, OrderRequest, ProjectRequest,
};
pub use middleware::{RateLimiter, SecurityConfig};

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::ai::{AiClient, AiError};
use crate::config::AppConfig;
use crate::engine::HourAllocationEngine;

/// Shared, read-only state handed to every handler.
#[derive(Clone, Default)]
pub struct AppState {
    pub engine: HourAllocationEngine,
    /// `None` makes the AI-backed routes answer 503.
    pub ai: Option<AiClient>,
}

impl AppState {
    pub fn new(engine: HourAllocationEngine, ai: Option<AiClient>) -> Self {
        Self { engine, ai }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AiError> {
        let ai = config.ai.as_ref().map(AiClient::new).transpose()?;
        Ok(Self::new(HourAllocationEngine::default(), ai))
    }
}

pub fn create_router(state: AppState) -> Router {
    create_router_with_config(state, SecurityConfig::disabled())
}

pub fn create_router_with_config(state: AppState, security: SecurityConfig) -> Router {
    let mut api = Router::new()
        // Features
        .route("/features/generate", post(handlers::generate_features))
        .route("/features/extract", post(handlers::extract_features))
        .route("/features/competitors", post(handlers::analyze_competitors))
        .route("/features/discover", post(handlers::discover))
        .route("/features/order", post(handlers::order_features))
        .route("/features/analyze", post(handlers::analyze_features))
        .route("/features/validate", post(handlers::validate_features))
        // WBS
        .route("/wbs/generate", post(handlers::generate_wbs))
        .route("/wbs/validate", post(handlers::validate_wbs))
        // Export
        .route("/export/csv", post(handlers::export_csv))
        .route("/export/json", post(handlers::export_json))
        .route("/export/spreadsheet", post(handlers::export_spreadsheet))
        .route("/export/text", post(handlers::export_text));

    if let Some(limiter) = security.rate_limiter.clone() {
        api = api.layer(from_fn_with_state(limiter, middleware::rate_limit_middleware));
    }
    let api = api.layer(from_fn_with_state(
        security.clone(),
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(security.cors_layer())
        .with_state(state)
}
