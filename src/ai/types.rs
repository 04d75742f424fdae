//! Wire payloads of the AI backend and their conversion into typed records.
//!
//! The backend is a language model behind HTTP, so nothing it returns is
//! trusted: every raw record goes through `TryFrom` before it reaches the
//! engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{DevComplexity, Feature, FeatureClassification, Priority};

/// A payload field the backend got wrong.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundaryError {
    #[error("feature '{id}': {field} is missing or blank")]
    Blank { id: String, field: &'static str },

    #[error("feature '{id}': confidence {value} is outside 0..=1")]
    Confidence { id: String, value: f64 },

    #[error("feature '{id}': execution_order {value} must be a positive integer")]
    ExecutionOrder { id: String, value: i64 },

    #[error("feature '{id}': unknown {field} '{value}'")]
    UnknownValue {
        id: String,
        field: &'static str,
        value: String,
    },
}

// ============================================================
// Requests
// ============================================================

#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub project_name: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ExtractRequest<'a> {
    pub project_name: &'a str,
    pub document_text: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ClassifyRequest<'a> {
    pub features: Vec<ClassifyItem<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ClassifyItem<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Serialize)]
pub struct OrderRequest<'a> {
    pub project_name: &'a str,
    pub features: &'a [Feature],
}

// ============================================================
// Responses
// ============================================================

#[derive(Debug, Deserialize)]
pub struct RawFeatureList {
    #[serde(default)]
    pub features: Vec<RawFeature>,
}

/// A feature as the backend sends it: every field optional, strings for enums.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFeature {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub execution_order: Option<i64>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawClassificationList {
    #[serde(default)]
    pub classifications: Vec<RawClassification>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawClassification {
    #[serde(alias = "feature_id")]
    pub id: String,
    #[serde(default)]
    pub needs_rnd: bool,
    #[serde(default)]
    pub needs_ui: bool,
    #[serde(default)]
    pub needs_db: bool,
    #[serde(default)]
    pub dev_complexity: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(alias = "detail")]
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

// ============================================================
// Conversions
// ============================================================

impl TryFrom<RawFeature> for Feature {
    type Error = BoundaryError;

    fn try_from(raw: RawFeature) -> Result<Self, Self::Error> {
        let id = raw
            .id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| BoundaryError::Blank {
                id: String::new(),
                field: "id",
            })?;

        let name = raw
            .name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| BoundaryError::Blank {
                id: id.clone(),
                field: "name",
            })?;

        let priority = match raw.priority {
            Some(p) if !p.trim().is_empty() => {
                Some(p.parse::<Priority>().map_err(|_| BoundaryError::UnknownValue {
                    id: id.clone(),
                    field: "priority",
                    value: p,
                })?)
            }
            _ => None,
        };

        if let Some(value) = raw.confidence {
            if !(0.0..=1.0).contains(&value) {
                return Err(BoundaryError::Confidence { id, value });
            }
        }

        let execution_order = match raw.execution_order {
            Some(value) if value < 1 || value > u32::MAX as i64 => {
                return Err(BoundaryError::ExecutionOrder { id, value })
            }
            Some(value) => Some(value as u32),
            None => None,
        };

        let mut feature = Feature::new(id, name, raw.description.unwrap_or_default());
        feature.priority = priority;
        feature.confidence = raw.confidence;
        feature.execution_order = execution_order;
        feature.reasoning = raw.reasoning;
        feature.category_name = raw.category_name;
        Ok(feature)
    }
}

/// Convert a raw list, naming id-less features `F1`, `F2`, ... by position.
pub fn parse_features(raw: Vec<RawFeature>) -> Result<Vec<Feature>, BoundaryError> {
    raw.into_iter()
        .enumerate()
        .map(|(i, mut f)| {
            if f.id.as_deref().map_or(true, |id| id.trim().is_empty()) {
                f.id = Some(format!("F{}", i + 1));
            }
            Feature::try_from(f)
        })
        .collect()
}

/// A validated classification keyed by the feature it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedFeature {
    pub id: String,
    pub classification: FeatureClassification,
}

impl TryFrom<RawClassification> for ClassifiedFeature {
    type Error = BoundaryError;

    fn try_from(raw: RawClassification) -> Result<Self, Self::Error> {
        if raw.id.trim().is_empty() {
            return Err(BoundaryError::Blank {
                id: raw.id,
                field: "id",
            });
        }

        let dev_complexity = match raw.dev_complexity {
            Some(c) => c
                .parse::<DevComplexity>()
                .map_err(|_| BoundaryError::UnknownValue {
                    id: raw.id.clone(),
                    field: "dev_complexity",
                    value: c,
                })?,
            None => {
                return Err(BoundaryError::Blank {
                    id: raw.id,
                    field: "dev_complexity",
                })
            }
        };

        Ok(ClassifiedFeature {
            id: raw.id,
            classification: FeatureClassification {
                needs_rnd: raw.needs_rnd,
                needs_ui: raw.needs_ui,
                needs_db: raw.needs_db,
                dev_complexity,
                reasoning: raw.reasoning,
            },
        })
    }
}
