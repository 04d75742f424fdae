use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::{Feature, FeatureAnalysis, TaskType, WbsResponse, WbsTask};

use super::{order, round_hours, EngineError, HourAllocationEngine};

/// Caller-controlled knobs for [`HourAllocationEngine::expand`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExpandOptions {
    /// Require `execution_order` to be exactly 1..N.
    #[serde(default)]
    pub strict_ordering: bool,
    /// Feature id -> ids of the features whose Dev tasks it waits for.
    /// Replaces the default "previous feature" link for that feature.
    #[serde(default)]
    pub dependency_overrides: BTreeMap<String, Vec<String>>,
}

/// Task ids assigned to one feature before any task is built.
struct Slot<'a> {
    feature: &'a Feature,
    analysis: FeatureAnalysis,
    rnd_id: Option<String>,
    dev_id: String,
}

impl HourAllocationEngine {
    /// Expand an ordered feature set into a flat WBS.
    ///
    /// Each feature yields an R&D task (only when it needs research) followed
    /// by one Dev task carrying development, UI, DB, unit-test and QA hours.
    /// Dev tasks are chained in execution order unless overridden; R&D tasks
    /// never wait on anything. Task ids are `T1..Tn` in emission order.
    pub fn expand(
        &self,
        project_name: &str,
        features: &[Feature],
        options: &ExpandOptions,
    ) -> Result<WbsResponse, EngineError> {
        if features.is_empty() {
            tracing::debug!(project = %project_name, "Expanding empty feature set");
            return Ok(WbsResponse::empty(project_name));
        }

        check_feature_ids(features)?;
        order::check_execution_order(features, options.strict_ordering)?;

        let ordered = order::sort_by_execution_order(features);
        let dev_deps = resolve_dependencies(&ordered, &options.dependency_overrides)?;

        let mut next_id = 0usize;
        let mut fresh_id = || {
            next_id += 1;
            format!("T{}", next_id)
        };

        let mut slots = Vec::with_capacity(ordered.len());
        for feature in ordered.iter().copied() {
            let analysis = self.allocate(feature)?;
            let rnd_id = analysis.needs_rnd.then(&mut fresh_id);
            let dev_id = fresh_id();
            slots.push(Slot {
                feature,
                analysis,
                rnd_id,
                dev_id,
            });
        }

        let mut tasks = Vec::with_capacity(task_count(&slots));
        for (i, slot) in slots.iter().enumerate() {
            if let Some(rnd_id) = &slot.rnd_id {
                tasks.push(rnd_task(rnd_id, slot));
            }

            let dependencies = dev_deps[i]
                .iter()
                .map(|&j| slots[j].dev_id.clone())
                .collect();
            tasks.push(dev_task(dependencies, slot));
        }

        let response = WbsResponse::from_tasks(project_name, tasks);
        tracing::info!(
            project = %project_name,
            features = features.len(),
            tasks = response.total_tasks,
            hours = response.total_hours,
            "Expanded features into WBS"
        );
        Ok(response)
    }
}

fn task_count(slots: &[Slot<'_>]) -> usize {
    slots.len() + slots.iter().filter(|s| s.rnd_id.is_some()).count()
}

fn rnd_task(id: &str, slot: &Slot<'_>) -> WbsTask {
    let name = &slot.feature.name;
    WbsTask {
        id: id.to_string(),
        name: format!("Research & Design - {}", name),
        description: format!(
            "Research technical approach and feasibility for {} ({}h)",
            name, slot.analysis.rnd_hours
        ),
        duration_hours: round_hours(slot.analysis.rnd_hours),
        dependencies: Vec::new(),
        level: 1,
        parent_id: Some(slot.feature.id.clone()),
        task_type: TaskType::Rnd,
    }
}

fn dev_task(dependencies: Vec<String>, slot: &Slot<'_>) -> WbsTask {
    let a = &slot.analysis;
    let name = &slot.feature.name;
    WbsTask {
        id: slot.dev_id.clone(),
        name: format!("Development - {}", name),
        description: format!(
            "Implement {} ({} complexity): {}h development, {}h UI, {}h database, {}h unit tests, {}h QA",
            name, a.dev_complexity, a.dev_hours, a.ui_hours, a.db_hours, a.unit_test_hours, a.qa_hours
        ),
        duration_hours: round_hours(a.dev_task_hours()),
        dependencies,
        level: 1,
        parent_id: Some(slot.feature.id.clone()),
        task_type: TaskType::Dev,
    }
}

fn check_feature_ids(features: &[Feature]) -> Result<(), EngineError> {
    let mut seen = HashSet::with_capacity(features.len());
    for feature in features {
        if feature.id.trim().is_empty() {
            return Err(EngineError::InvalidFeature {
                feature_id: feature.id.clone(),
                reason: format!("feature '{}' has a blank id", feature.name),
            });
        }
        if !seen.insert(feature.id.as_str()) {
            return Err(EngineError::InvalidFeature {
                feature_id: feature.id.clone(),
                reason: "duplicate feature id".to_string(),
            });
        }
    }
    Ok(())
}

/// For each position in `ordered`, the positions whose Dev tasks it waits on.
fn resolve_dependencies(
    ordered: &[&Feature],
    overrides: &BTreeMap<String, Vec<String>>,
) -> Result<Vec<Vec<usize>>, EngineError> {
    let position: HashMap<&str, usize> = ordered
        .iter()
        .enumerate()
        .map(|(i, f)| (f.id.as_str(), i))
        .collect();

    for (feature_id, deps) in overrides {
        if !position.contains_key(feature_id.as_str()) {
            return Err(EngineError::InvalidFeature {
                feature_id: feature_id.clone(),
                reason: "dependency override for a feature that is not in the set".to_string(),
            });
        }
        if let Some(missing) = deps.iter().find(|d| !position.contains_key(d.as_str())) {
            return Err(EngineError::UnknownDependency {
                feature_id: feature_id.clone(),
                dependency: missing.clone(),
            });
        }
    }

    let mut deps = Vec::with_capacity(ordered.len());
    for (i, feature) in ordered.iter().enumerate() {
        let resolved = match overrides.get(&feature.id) {
            Some(ids) => {
                let mut positions: Vec<usize> = Vec::with_capacity(ids.len());
                for id in ids {
                    let p = position[id.as_str()];
                    if !positions.contains(&p) {
                        positions.push(p);
                    }
                }
                positions
            }
            None if i > 0 => vec![i - 1],
            None => Vec::new(),
        };
        deps.push(resolved);
    }

    if let Some(i) = first_cycle(&deps) {
        return Err(EngineError::DependencyCycle {
            feature_id: ordered[i].id.clone(),
        });
    }

    Ok(deps)
}

/// Kahn's algorithm over `deps[node] = prerequisites`. Returns a node left
/// unprocessed, which sits on or behind a cycle.
pub(crate) fn first_cycle(deps: &[Vec<usize>]) -> Option<usize> {
    let mut indegree: Vec<usize> = deps.iter().map(Vec::len).collect();
    let mut dependents = vec![Vec::new(); deps.len()];
    for (node, prereqs) in deps.iter().enumerate() {
        for &p in prereqs {
            dependents[p].push(node);
        }
    }

    let mut queue: VecDeque<usize> = (0..deps.len()).filter(|&n| indegree[n] == 0).collect();
    let mut processed = 0;
    while let Some(node) = queue.pop_front() {
        processed += 1;
        for &d in &dependents[node] {
            indegree[d] -= 1;
            if indegree[d] == 0 {
                queue.push_back(d);
            }
        }
    }

    if processed == deps.len() {
        None
    } else {
        (0..deps.len()).find(|&n| indegree[n] > 0)
    }
}
