//! Client for the external AI backend.
//!
//! Feature generation, document extraction, competitor research,
//! classification and execution ordering all live behind one HTTP service.
//! This module only moves JSON and validates what comes back.

mod client;
mod types;

pub use client::{AiClient, AiError, AiResult};
pub use types::{parse_features, BoundaryError, ClassifiedFeature, RawClassification, RawFeature};
