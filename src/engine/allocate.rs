use crate::models::{Feature, FeatureAnalysis};

use super::{classify, round_hours, EngineError, HourAllocationEngine};

/// Slack allowed when comparing supplied hour fields with derived ones.
const TOLERANCE: f64 = 1e-6;

impl HourAllocationEngine {
    /// Produce the hour breakdown for one feature.
    ///
    /// A supplied `analysis` is trusted only if it is internally consistent;
    /// otherwise the call fails with [`EngineError::InvalidAnalysis`] so the
    /// caller can re-request or override it. Without an analysis the breakdown
    /// is computed from the feature's classification, falling back to the
    /// keyword classifier.
    pub fn allocate(&self, feature: &Feature) -> Result<FeatureAnalysis, EngineError> {
        if let Some(analysis) = &feature.analysis {
            self.check_analysis(&feature.id, analysis)?;
            tracing::debug!(feature_id = %feature.id, "Using supplied analysis");
            return Ok(analysis.clone());
        }

        let classification = match &feature.classification {
            Some(classification) => classification.clone(),
            None => {
                tracing::debug!(feature_id = %feature.id, "No classification, using keywords");
                classify::keyword_classify(feature)
            }
        };

        Ok(self.policy.analyze(&classification))
    }

    /// Check a supplied analysis against the allocation invariants.
    pub fn check_analysis(
        &self,
        feature_id: &str,
        analysis: &FeatureAnalysis,
    ) -> Result<(), EngineError> {
        let invalid = |reason: String| EngineError::InvalidAnalysis {
            feature_id: feature_id.to_string(),
            reason,
        };

        let fields = [
            ("dev_hours", analysis.dev_hours),
            ("rnd_hours", analysis.rnd_hours),
            ("ui_hours", analysis.ui_hours),
            ("db_hours", analysis.db_hours),
            ("unit_test_hours", analysis.unit_test_hours),
            ("qa_hours", analysis.qa_hours),
            ("total_hours", analysis.total_hours),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
            let cents = value * 100.0;
            if (cents - cents.round()).abs() > TOLERANCE {
                return Err(invalid(format!(
                    "{} must be a multiple of 0.01, got {}",
                    name, value
                )));
            }
        }

        let flagged = [
            ("needs_rnd", analysis.needs_rnd, "rnd_hours", analysis.rnd_hours),
            ("needs_ui", analysis.needs_ui, "ui_hours", analysis.ui_hours),
            ("needs_db", analysis.needs_db, "db_hours", analysis.db_hours),
        ];
        for (flag_name, flag, hours_name, hours) in flagged {
            let has_hours = hours > TOLERANCE;
            if flag && !has_hours {
                return Err(invalid(format!(
                    "{} is true but {} is {}",
                    flag_name, hours_name, hours
                )));
            }
            if !flag && has_hours {
                return Err(invalid(format!(
                    "{} is false but {} is {}",
                    flag_name, hours_name, hours
                )));
            }
        }

        let expected_unit = self.policy.unit_test_hours(analysis.dev_hours);
        if (analysis.unit_test_hours - expected_unit).abs() > TOLERANCE {
            return Err(invalid(format!(
                "unit_test_hours is {} but {} dev hours require {}",
                analysis.unit_test_hours, analysis.dev_hours, expected_unit
            )));
        }

        if (analysis.qa_hours - self.policy.qa_hours).abs() > TOLERANCE {
            return Err(invalid(format!(
                "qa_hours must be {}, got {}",
                self.policy.qa_hours, analysis.qa_hours
            )));
        }

        let sum = analysis.bucket_sum();
        if (analysis.total_hours - sum).abs() > TOLERANCE
            && (analysis.total_hours - round_hours(sum)).abs() > TOLERANCE
        {
            return Err(invalid(format!(
                "total_hours is {} but the buckets sum to {}",
                analysis.total_hours,
                round_hours(sum)
            )));
        }

        Ok(())
    }
}
