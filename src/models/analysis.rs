use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How much base development work a feature needs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DevComplexity {
    Simple,
    Medium,
    Complex,
}

impl DevComplexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Medium => "medium",
            Self::Complex => "complex",
        }
    }
}

impl FromStr for DevComplexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "medium" => Ok(Self::Medium),
            "complex" => Ok(Self::Complex),
            other => Err(format!("unknown dev_complexity '{}'", other)),
        }
    }
}

impl fmt::Display for DevComplexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hour breakdown attached to a feature.
///
/// `unit_test_hours`, `qa_hours` and `total_hours` are derived values; an
/// analysis whose derived fields disagree with its inputs is rejected by the
/// allocation engine rather than corrected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FeatureAnalysis {
    pub needs_rnd: bool,
    pub needs_ui: bool,
    pub needs_db: bool,
    pub dev_complexity: DevComplexity,
    pub dev_hours: f64,
    pub rnd_hours: f64,
    pub ui_hours: f64,
    pub db_hours: f64,
    pub unit_test_hours: f64,
    pub qa_hours: f64,
    pub total_hours: f64,
    #[serde(default)]
    pub reasoning: String,
}

impl FeatureAnalysis {
    /// Sum of every hour bucket, regardless of what `total_hours` claims.
    pub fn bucket_sum(&self) -> f64 {
        self.dev_hours
            + self.rnd_hours
            + self.ui_hours
            + self.db_hours
            + self.unit_test_hours
            + self.qa_hours
    }

    /// Hours that end up on the feature's Dev task.
    pub fn dev_task_hours(&self) -> f64 {
        self.dev_hours + self.ui_hours + self.db_hours + self.unit_test_hours + self.qa_hours
    }
}

/// Aggregate figures over a set of analysed features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisSummary {
    pub total_features: usize,
    pub features_needing_rnd: usize,
    pub features_needing_ui: usize,
    pub features_needing_db: usize,
    pub total_hours: f64,
    pub total_dev_hours: f64,
    pub total_test_hours: f64,
    pub avg_hours_per_feature: f64,
}
