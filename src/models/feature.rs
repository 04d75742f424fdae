use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::analysis::{DevComplexity, FeatureAnalysis};

/// A deliverable capability of the project being planned.
///
/// Features arrive from the AI backend (or are typed in by the user), get an
/// execution order, and are finally expanded into WBS tasks. A feature may
/// carry either a bare [`FeatureClassification`] or a fully computed
/// [`FeatureAnalysis`]; when it carries neither, the keyword classifier fills
/// the gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Feature {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Classifier confidence in `0.0..=1.0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Position in the implementation sequence, starting at 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_order: Option<u32>,
    /// Why the AI placed the feature at this position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<FeatureClassification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<FeatureAnalysis>,
}

impl Feature {
    /// Create a bare feature with only the required fields set.
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            priority: None,
            confidence: None,
            execution_order: None,
            reasoning: None,
            category_name: None,
            classification: None,
            analysis: None,
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.execution_order = Some(order);
        self
    }

    pub fn with_classification(mut self, classification: FeatureClassification) -> Self {
        self.classification = Some(classification);
        self
    }

    pub fn with_analysis(mut self, analysis: FeatureAnalysis) -> Self {
        self.analysis = Some(analysis);
        self
    }
}

/// Relative business priority of a feature.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The upstream classifier's verdict on a feature, before any hours are attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FeatureClassification {
    pub needs_rnd: bool,
    pub needs_ui: bool,
    pub needs_db: bool,
    pub dev_complexity: DevComplexity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl FeatureClassification {
    pub fn new(dev_complexity: DevComplexity) -> Self {
        Self {
            needs_rnd: false,
            needs_ui: false,
            needs_db: false,
            dev_complexity,
            reasoning: None,
        }
    }

    pub fn rnd(mut self) -> Self {
        self.needs_rnd = true;
        self
    }

    pub fn ui(mut self) -> Self {
        self.needs_ui = true;
        self
    }

    pub fn db(mut self) -> Self {
        self.needs_db = true;
        self
    }
}

/// Response shape for feature discovery endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureListResponse {
    pub project_name: String,
    pub features: Vec<Feature>,
    pub total_features: usize,
}

impl FeatureListResponse {
    pub fn new(project_name: impl Into<String>, features: Vec<Feature>) -> Self {
        Self {
            project_name: project_name.into(),
            total_features: features.len(),
            features,
        }
    }
}
