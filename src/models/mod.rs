//! Domain models for the WBS planner.
//!
//! # Core Concepts
//!
//! - [`Feature`]: A capability of the planned project. Carries an optional
//!   execution order and either a [`FeatureClassification`] or a full
//!   [`FeatureAnalysis`].
//! - [`FeatureAnalysis`]: The hour breakdown of one feature under the
//!   allocation policy (Dev, R&D, UI, DB, unit tests, QA).
//! - [`WbsTask`]: A line of the generated work breakdown structure.
//! - [`WbsResponse`]: The full ordered task list with totals. It is always
//!   recomputed from the feature set; there is no partial WBS state.
//! - [`CompetitorAnalysis`]: Research output from the AI backend, used only
//!   to help the user choose features.

mod analysis;
mod competitor;
mod feature;
mod wbs;

pub use analysis::*;
pub use competitor::*;
pub use feature::*;
pub use wbs::*;
