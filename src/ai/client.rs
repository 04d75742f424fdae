use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::types::*;
use crate::config::AiConfig;
use crate::models::{CompetitorAnalysis, Feature, FeatureClassification};

/// Failures talking to the AI backend.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI backend error: {status} - {message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
    },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("AI backend unavailable: {message} (retries: {retries})")]
    Unavailable { message: String, retries: u32 },

    #[error("Invalid AI payload: {0}")]
    Boundary(#[from] BoundaryError),
}

impl AiError {
    /// Timeouts, connection failures and 5xx are worth another attempt.
    fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

pub type AiResult<T> = Result<T, AiError>;

/// Client for the feature discovery and classification backend.
#[derive(Debug, Clone)]
pub struct AiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout_ms: u64,
    max_retries: u32,
    retry_delay_ms: u64,
}

impl AiClient {
    pub fn new(config: &AiConfig) -> AiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout_ms: config.timeout_ms,
            max_retries: config.max_retries,
            retry_delay_ms: config.retry_delay_ms,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ============================================================
    // Endpoints
    // ============================================================

    /// Propose features for a project description.
    pub async fn generate_features(
        &self,
        project_name: &str,
        description: &str,
    ) -> AiResult<Vec<Feature>> {
        let raw: RawFeatureList = self
            .post(
                "/features/generate",
                &GenerateRequest {
                    project_name,
                    description,
                },
            )
            .await?;
        Ok(parse_features(raw.features)?)
    }

    /// Pull features out of an already-extracted requirements document.
    pub async fn extract_features(
        &self,
        project_name: &str,
        document_text: &str,
    ) -> AiResult<Vec<Feature>> {
        let raw: RawFeatureList = self
            .post(
                "/features/extract",
                &ExtractRequest {
                    project_name,
                    document_text,
                },
            )
            .await?;
        Ok(parse_features(raw.features)?)
    }

    pub async fn analyze_competitors(
        &self,
        project_name: &str,
        description: &str,
    ) -> AiResult<CompetitorAnalysis> {
        self.post(
            "/competitors/analyze",
            &GenerateRequest {
                project_name,
                description,
            },
        )
        .await
    }

    /// Classify features for hour allocation. Features the backend skips are
    /// simply absent from the result.
    pub async fn classify_features(
        &self,
        features: &[Feature],
    ) -> AiResult<Vec<(String, FeatureClassification)>> {
        let request = ClassifyRequest {
            features: features
                .iter()
                .map(|f| ClassifyItem {
                    id: &f.id,
                    name: &f.name,
                    description: &f.description,
                })
                .collect(),
        };
        let raw: RawClassificationList = self.post("/features/classify", &request).await?;

        raw.classifications
            .into_iter()
            .map(|c| {
                ClassifiedFeature::try_from(c)
                    .map(|classified| (classified.id, classified.classification))
                    .map_err(AiError::from)
            })
            .collect()
    }

    /// Ask the backend for an implementation sequence.
    ///
    /// Only the `execution_order` of each returned feature is used; it is
    /// copied onto the matching input feature by id. The backend must return
    /// every input id exactly once and nothing else.
    pub async fn plan_execution_order(
        &self,
        project_name: &str,
        features: &[Feature],
    ) -> AiResult<Vec<Feature>> {
        let raw: RawFeatureList = self
            .post(
                "/features/order",
                &OrderRequest {
                    project_name,
                    features,
                },
            )
            .await?;
        apply_planned_order(features, parse_features(raw.features)?)
    }

    /// Feature generation and competitor research, concurrently. Either
    /// failure fails the whole call.
    pub async fn discover(
        &self,
        project_name: &str,
        description: &str,
    ) -> AiResult<(Vec<Feature>, CompetitorAnalysis)> {
        tokio::try_join!(
            self.generate_features(project_name, description),
            self.analyze_competitors(project_name, description),
        )
    }

    // ============================================================
    // Transport
    // ============================================================

    /// POST with retry and exponential backoff on transient failures.
    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> AiResult<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut retries = 0;

        loop {
            if retries > 0 {
                let delay = backoff_delay(self.retry_delay_ms, retries);
                warn!(
                    path = %path,
                    retry = retries,
                    delay_ms = delay.as_millis(),
                    "Retrying AI backend request"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();
            match self.execute(&url, body).await {
                Ok(response) => {
                    info!(
                        path = %path,
                        latency_ms = start.elapsed().as_millis(),
                        "AI backend call succeeded"
                    );
                    return Ok(response);
                }
                Err(e) if e.is_transient() && retries < self.max_retries => {
                    error!(
                        path = %path,
                        error = %e,
                        retry = retries,
                        "AI backend call failed"
                    );
                    retries += 1;
                }
                Err(e) if e.is_transient() => {
                    error!(path = %path, error = %e, retries, "AI backend gave up");
                    return Err(AiError::Unavailable {
                        message: e.to_string(),
                        retries,
                    });
                }
                Err(e) => {
                    error!(path = %path, error = %e, "AI backend call failed");
                    return Err(e);
                }
            }
        }
    }

    async fn execute<Req, Resp>(&self, url: &str, body: &Req) -> AiResult<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        debug!(url = %url, "Calling AI backend");

        let mut request = self.client.post(url).json(body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AiError::Timeout {
                    timeout_ms: self.timeout_ms,
                }
            } else {
                AiError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let (message, code) = match serde_json::from_str::<ErrorBody>(&text) {
                Ok(body) => (body.message, body.code),
                Err(_) => (text, None),
            };
            return Err(AiError::Api {
                status: status.as_u16(),
                message,
                code,
            });
        }

        response
            .json()
            .await
            .map_err(|e| AiError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })
    }
}

/// Delay before retry number `retry` (1-based), doubling each time.
fn backoff_delay(retry_delay_ms: u64, retry: u32) -> Duration {
    let factor = 2_u64.saturating_pow(retry.saturating_sub(1));
    Duration::from_millis(retry_delay_ms.saturating_mul(factor))
}

/// Copy the planned `execution_order` values onto the caller's features.
fn apply_planned_order(features: &[Feature], planned: Vec<Feature>) -> AiResult<Vec<Feature>> {
    let mut orders: HashMap<String, Option<u32>> = HashMap::with_capacity(planned.len());
    for feature in planned {
        if !features.iter().any(|f| f.id == feature.id) {
            return Err(AiError::InvalidResponse {
                message: format!("order contains unknown feature '{}'", feature.id),
            });
        }
        if orders.insert(feature.id.clone(), feature.execution_order).is_some() {
            return Err(AiError::InvalidResponse {
                message: format!("order lists feature '{}' twice", feature.id),
            });
        }
    }

    features
        .iter()
        .map(|feature| match orders.get(&feature.id) {
            Some(order) => Ok(Feature {
                execution_order: *order,
                ..feature.clone()
            }),
            None => Err(AiError::InvalidResponse {
                message: format!("order is missing feature '{}'", feature.id),
            }),
        })
        .collect()
}
