//! Execution order of features.

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::Feature;

use super::EngineError;

/// Direction of a single-step manual move.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Up,
    Down,
}

/// Features by ascending `execution_order`. Unordered features go last and
/// ties keep their original relative position.
pub fn sort_by_execution_order(features: &[Feature]) -> Vec<&Feature> {
    let mut ordered: Vec<&Feature> = features.iter().collect();
    ordered.sort_by_key(|f| (f.execution_order.is_none(), f.execution_order.unwrap_or(0)));
    ordered
}

/// Reject zero orders always, and anything but an exact 1..N permutation
/// when `strict` is set.
pub fn check_execution_order(features: &[Feature], strict: bool) -> Result<(), EngineError> {
    if let Some(f) = features.iter().find(|f| f.execution_order == Some(0)) {
        return Err(EngineError::InvalidOrdering {
            reason: format!("feature '{}' has execution_order 0; orders start at 1", f.id),
        });
    }

    if !strict {
        return Ok(());
    }

    if let Some(f) = features.iter().find(|f| f.execution_order.is_none()) {
        return Err(EngineError::InvalidOrdering {
            reason: format!("feature '{}' has no execution_order", f.id),
        });
    }

    let n = features.len() as u32;
    let orders: BTreeSet<u32> = features.iter().filter_map(|f| f.execution_order).collect();
    if orders.len() != features.len() || orders.iter().any(|&o| o > n) {
        return Err(EngineError::InvalidOrdering {
            reason: format!(
                "execution_order values {:?} are not a permutation of 1..={}",
                features
                    .iter()
                    .filter_map(|f| f.execution_order)
                    .collect::<Vec<_>>(),
                n
            ),
        });
    }

    Ok(())
}

/// Rewrite `execution_order` to match list position, starting at 1.
pub fn restamp_order(features: &mut [Feature]) {
    for (i, feature) in features.iter_mut().enumerate() {
        feature.execution_order = Some(i as u32 + 1);
    }
}

/// Swap a feature with its neighbour and restamp the whole list.
///
/// Returns the feature's new index, or `None` if no feature has that id.
/// Moving past either end leaves the list in place.
pub fn move_feature(features: &mut [Feature], id: &str, direction: MoveDirection) -> Option<usize> {
    let index = features.iter().position(|f| f.id == id)?;

    let target = match direction {
        MoveDirection::Up if index > 0 => index - 1,
        MoveDirection::Down if index + 1 < features.len() => index + 1,
        _ => index,
    };

    features.swap(index, target);
    restamp_order(features);
    Some(target)
}
