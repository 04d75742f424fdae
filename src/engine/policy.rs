//! The frozen hour-allocation policy.

use serde::Serialize;

use crate::models::{DevComplexity, FeatureAnalysis, FeatureClassification};

use super::round_hours;

/// Fixed hour constants applied to every feature.
///
/// The table extends the "8+2" rule: a medium feature is 8 hours of
/// development, research adds a fixed block, and UI/DB work, unit tests and QA
/// get their own buckets. Values are per policy, never per feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AllocationPolicy {
    pub simple_dev_hours: f64,
    pub medium_dev_hours: f64,
    pub complex_dev_hours: f64,
    pub rnd_hours: f64,
    pub ui_hours: f64,
    pub db_hours: f64,
    /// Unit-test hours as a fraction of development hours.
    pub unit_test_ratio: f64,
    pub qa_hours: f64,
}

impl AllocationPolicy {
    pub const STANDARD: Self = Self {
        simple_dev_hours: 4.0,
        medium_dev_hours: 8.0,
        complex_dev_hours: 16.0,
        rnd_hours: 4.0,
        ui_hours: 2.0,
        db_hours: 2.0,
        unit_test_ratio: 0.2,
        qa_hours: 2.0,
    };

    pub fn dev_hours(&self, complexity: DevComplexity) -> f64 {
        match complexity {
            DevComplexity::Simple => self.simple_dev_hours,
            DevComplexity::Medium => self.medium_dev_hours,
            DevComplexity::Complex => self.complex_dev_hours,
        }
    }

    /// Unit-test hours for a given amount of development, rounded to 2 decimals.
    pub fn unit_test_hours(&self, dev_hours: f64) -> f64 {
        round_hours(dev_hours * self.unit_test_ratio)
    }

    /// Turn a classification into a full hour breakdown.
    pub fn analyze(&self, classification: &FeatureClassification) -> FeatureAnalysis {
        let dev_hours = self.dev_hours(classification.dev_complexity);
        let rnd_hours = if classification.needs_rnd { self.rnd_hours } else { 0.0 };
        let ui_hours = if classification.needs_ui { self.ui_hours } else { 0.0 };
        let db_hours = if classification.needs_db { self.db_hours } else { 0.0 };
        let unit_test_hours = self.unit_test_hours(dev_hours);
        let qa_hours = self.qa_hours;

        let total_hours =
            round_hours(dev_hours + rnd_hours + ui_hours + db_hours + unit_test_hours + qa_hours);

        FeatureAnalysis {
            needs_rnd: classification.needs_rnd,
            needs_ui: classification.needs_ui,
            needs_db: classification.needs_db,
            dev_complexity: classification.dev_complexity,
            dev_hours,
            rnd_hours,
            ui_hours,
            db_hours,
            unit_test_hours,
            qa_hours,
            total_hours,
            reasoning: classification
                .reasoning
                .clone()
                .unwrap_or_else(|| "Analysis completed".to_string()),
        }
    }
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self::STANDARD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_hours_follow_complexity_table() {
        let policy = AllocationPolicy::STANDARD;
        assert_eq!(policy.dev_hours(DevComplexity::Simple), 4.0);
        assert_eq!(policy.dev_hours(DevComplexity::Medium), 8.0);
        assert_eq!(policy.dev_hours(DevComplexity::Complex), 16.0);
    }

    #[test]
    fn unit_tests_are_a_fifth_of_dev_time() {
        let policy = AllocationPolicy::STANDARD;
        assert_eq!(policy.unit_test_hours(8.0), 1.6);
        assert_eq!(policy.unit_test_hours(16.0), 3.2);
        assert_eq!(policy.unit_test_hours(4.5), 0.9);
    }

    #[test]
    fn analyze_fills_every_bucket() {
        let analysis = AllocationPolicy::STANDARD.analyze(
            &FeatureClassification::new(DevComplexity::Complex).rnd().ui().db(),
        );

        assert_eq!(analysis.dev_hours, 16.0);
        assert_eq!(analysis.rnd_hours, 4.0);
        assert_eq!(analysis.ui_hours, 2.0);
        assert_eq!(analysis.db_hours, 2.0);
        assert_eq!(analysis.unit_test_hours, 3.2);
        assert_eq!(analysis.qa_hours, 2.0);
        assert_eq!(analysis.total_hours, 29.2);
        assert_eq!(analysis.reasoning, "Analysis completed");
    }
}
