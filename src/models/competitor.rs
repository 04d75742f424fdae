use serde::{Deserialize, Serialize};

/// A competing product and the features it is known for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,
    #[serde(default)]
    pub features: Vec<String>,
}

/// Result of the competitor research call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompetitorAnalysis {
    #[serde(default)]
    pub competitors: Vec<Competitor>,
    /// Features competitors offer that the project description does not mention.
    #[serde(default)]
    pub missing_features: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}
