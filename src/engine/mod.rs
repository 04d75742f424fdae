//! Hour allocation and WBS expansion.
//!
//! [`HourAllocationEngine`] is pure: it performs no I/O, holds no session
//! state and returns identical output for identical input. Everything it
//! needs is passed in, and every rejection is a typed [`EngineError`].

mod allocate;
mod classify;
mod expand;
mod order;
mod policy;
mod summary;
mod validate;

use thiserror::Error;

pub use classify::{is_ambiguous, keyword_classify};
pub use expand::ExpandOptions;
pub use order::{
    check_execution_order, move_feature, restamp_order, sort_by_execution_order, MoveDirection,
};
pub use policy::AllocationPolicy;
pub use summary::summarize;
pub use validate::validate_wbs;

/// Errors reported by the allocation engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Invalid analysis for feature '{feature_id}': {reason}")]
    InvalidAnalysis { feature_id: String, reason: String },

    #[error("Invalid ordering: {reason}")]
    InvalidOrdering { reason: String },

    #[error("Invalid feature '{feature_id}': {reason}")]
    InvalidFeature { feature_id: String, reason: String },

    #[error("Feature '{feature_id}' depends on unknown feature '{dependency}'")]
    UnknownDependency {
        feature_id: String,
        dependency: String,
    },

    #[error("Dependency cycle involving feature '{feature_id}'")]
    DependencyCycle { feature_id: String },
}

impl EngineError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAnalysis { .. } => "invalid_analysis",
            Self::InvalidOrdering { .. } => "invalid_ordering",
            Self::InvalidFeature { .. } => "invalid_feature",
            Self::UnknownDependency { .. } => "unknown_dependency",
            Self::DependencyCycle { .. } => "dependency_cycle",
        }
    }
}

/// Converts features into hour breakdowns and flat task lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct HourAllocationEngine {
    policy: AllocationPolicy,
}

impl HourAllocationEngine {
    pub fn new(policy: AllocationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AllocationPolicy {
        &self.policy
    }
}

/// Round an hour figure to two decimals.
pub fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}
