use crate::models::{AnalysisSummary, FeatureAnalysis};

use super::round_hours;

/// Aggregate statistics over analysed features.
pub fn summarize(analyses: &[FeatureAnalysis]) -> AnalysisSummary {
    let total_features = analyses.len();
    let total_hours: f64 = analyses.iter().map(|a| a.total_hours).sum();

    AnalysisSummary {
        total_features,
        features_needing_rnd: analyses.iter().filter(|a| a.needs_rnd).count(),
        features_needing_ui: analyses.iter().filter(|a| a.needs_ui).count(),
        features_needing_db: analyses.iter().filter(|a| a.needs_db).count(),
        total_hours: round_hours(total_hours),
        total_dev_hours: round_hours(analyses.iter().map(|a| a.dev_hours).sum()),
        total_test_hours: round_hours(
            analyses
                .iter()
                .map(|a| a.unit_test_hours + a.qa_hours)
                .sum(),
        ),
        avg_hours_per_feature: if total_features > 0 {
            round_hours(total_hours / total_features as f64)
        } else {
            0.0
        },
    }
}
