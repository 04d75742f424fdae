//! Wizard session state.
//!
//! A planning session walks through fixed steps: describe the project, wait
//! for feature discovery, pick and order features, wait for WBS generation,
//! review tasks, export. [`SessionState`] is a plain value and
//! [`SessionState::apply`] is a pure reducer: it never mutates the state it
//! is called on, and a rejected event leaves the caller holding the previous
//! state untouched.
//!
//! Network calls are not made here. The caller fires them when the state
//! enters [`WizardStep::Discovering`] or [`WizardStep::Generating`] and feeds
//! the outcome back as an event, tagged with the [`SessionState::request`]
//! number that was current when the call was fired. A result tagged with an
//! older number is rejected.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::engine::{self, MoveDirection};
use crate::models::{
    CompetitorAnalysis, ExportRequest, Feature, TaskType, WbsResponse, WbsTask,
};

const MAX_PROJECT_NAME: usize = 200;
const MIN_DESCRIPTION: usize = 10;

/// The screen the wizard is on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    ProjectInput,
    /// Feature generation and competitor research are in flight.
    Discovering,
    FeatureSelection,
    /// WBS generation is in flight.
    Generating,
    WbsReview,
    Export,
}

impl WizardStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectInput => "project_input",
            Self::Discovering => "discovering",
            Self::FeatureSelection => "feature_selection",
            Self::Generating => "generating",
            Self::WbsReview => "wbs_review",
            Self::Export => "export",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the user can do, plus the outcomes of the two network phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    SubmitProject {
        project_name: String,
        description: String,
    },
    DiscoveryCompleted {
        request: u64,
        features: Vec<Feature>,
        #[serde(default)]
        competitors: Option<CompetitorAnalysis>,
    },
    DiscoveryFailed {
        request: u64,
        message: String,
    },
    AddFeature {
        name: String,
        description: String,
    },
    EditFeature {
        id: String,
        name: String,
        description: String,
    },
    RemoveFeature {
        id: String,
    },
    ToggleFeature {
        id: String,
    },
    /// Select everything, or clear the selection if everything is selected.
    ToggleAll,
    MoveFeature {
        id: String,
        direction: MoveDirection,
    },
    ConfirmFeatures,
    WbsGenerated {
        request: u64,
        wbs: WbsResponse,
    },
    GenerationFailed {
        request: u64,
        message: String,
    },
    AddTask {
        name: String,
        description: String,
        duration_hours: f64,
    },
    EditTask {
        id: String,
        name: String,
        description: String,
        duration_hours: f64,
    },
    RemoveTask {
        id: String,
    },
    ProceedToExport,
    Back,
    Reset,
}

impl SessionEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::SubmitProject { .. } => "submit_project",
            Self::DiscoveryCompleted { .. } => "discovery_completed",
            Self::DiscoveryFailed { .. } => "discovery_failed",
            Self::AddFeature { .. } => "add_feature",
            Self::EditFeature { .. } => "edit_feature",
            Self::RemoveFeature { .. } => "remove_feature",
            Self::ToggleFeature { .. } => "toggle_feature",
            Self::ToggleAll => "toggle_all",
            Self::MoveFeature { .. } => "move_feature",
            Self::ConfirmFeatures => "confirm_features",
            Self::WbsGenerated { .. } => "wbs_generated",
            Self::GenerationFailed { .. } => "generation_failed",
            Self::AddTask { .. } => "add_task",
            Self::EditTask { .. } => "edit_task",
            Self::RemoveTask { .. } => "remove_task",
            Self::ProceedToExport => "proceed_to_export",
            Self::Back => "back",
            Self::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("'{event}' is not allowed during {step}")]
    InvalidTransition {
        step: WizardStep,
        event: &'static str,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("No features selected")]
    NothingSelected,

    #[error("Result of request {got} arrived after request {expected} was started")]
    StaleResult { expected: u64, got: u64 },
}

/// One in-progress planning session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub step: WizardStep,
    pub project_name: String,
    pub description: String,
    /// All candidate features in their current manual order.
    pub features: Vec<Feature>,
    /// Ids of the features that will be expanded into tasks.
    pub selected: BTreeSet<String>,
    pub competitors: Option<CompetitorAnalysis>,
    /// Generated (and possibly hand-edited) WBS. Cleared whenever features change.
    pub wbs: Option<WbsResponse>,
    /// Message from the last failed network phase.
    pub last_error: Option<String>,
    /// Bumped whenever discovery or generation is started.
    #[serde(default)]
    pub request: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            step: WizardStep::ProjectInput,
            project_name: String::new(),
            description: String::new(),
            features: Vec::new(),
            selected: BTreeSet::new(),
            competitors: None,
            wbs: None,
            last_error: None,
            request: 0,
        }
    }

    /// Selected features in manual order with `execution_order` restamped 1..N.
    pub fn selected_features(&self) -> Vec<Feature> {
        let mut selected: Vec<Feature> = self
            .features
            .iter()
            .filter(|f| self.selected.contains(&f.id))
            .cloned()
            .collect();
        engine::restamp_order(&mut selected);
        selected
    }

    /// Payload for the export formatters, once a WBS exists.
    pub fn export_request(&self) -> Option<ExportRequest> {
        self.wbs.as_ref().map(|wbs| ExportRequest {
            project_name: wbs.project_name.clone(),
            tasks: wbs.tasks.clone(),
        })
    }

    /// Apply one event, returning the next state.
    pub fn apply(&self, event: SessionEvent) -> Result<Self, SessionError> {
        let step = self.step;
        let reject = |event: &SessionEvent| SessionError::InvalidTransition {
            step,
            event: event.name(),
        };

        let mut next = self.clone();

        match (step, event) {
            (_, SessionEvent::Reset) => return Ok(Self::new()),

            (WizardStep::ProjectInput, SessionEvent::SubmitProject { project_name, description }) => {
                let project_name = project_name.trim().to_string();
                if project_name.is_empty() || project_name.chars().count() > MAX_PROJECT_NAME {
                    return Err(SessionError::InvalidInput(format!(
                        "project name must be 1 to {} characters",
                        MAX_PROJECT_NAME
                    )));
                }
                if description.trim().chars().count() < MIN_DESCRIPTION {
                    return Err(SessionError::InvalidInput(format!(
                        "description must be at least {} characters",
                        MIN_DESCRIPTION
                    )));
                }
                next.project_name = project_name;
                next.description = description;
                next.last_error = None;
                next.request += 1;
                next.step = WizardStep::Discovering;
            }

            (
                WizardStep::Discovering,
                SessionEvent::DiscoveryCompleted {
                    request,
                    features,
                    competitors,
                },
            ) => {
                self.check_request(request)?;
                let mut ids = BTreeSet::new();
                if let Some(dup) = features.iter().find(|f| !ids.insert(f.id.clone())) {
                    return Err(SessionError::InvalidInput(format!(
                        "duplicate feature id '{}'",
                        dup.id
                    )));
                }
                let mut features: Vec<Feature> = engine::sort_by_execution_order(&features)
                    .into_iter()
                    .cloned()
                    .collect();
                engine::restamp_order(&mut features);

                next.selected = ids;
                next.features = features;
                next.competitors = competitors;
                next.wbs = None;
                next.last_error = None;
                next.step = WizardStep::FeatureSelection;
            }

            (WizardStep::Discovering, SessionEvent::DiscoveryFailed { request, message }) => {
                self.check_request(request)?;
                next.last_error = Some(message);
                next.step = WizardStep::ProjectInput;
            }

            (WizardStep::FeatureSelection, event) => {
                next.apply_feature_event(event)?;
            }

            (WizardStep::Generating, SessionEvent::WbsGenerated { request, wbs }) => {
                self.check_request(request)?;
                next.wbs = Some(wbs);
                next.last_error = None;
                next.step = WizardStep::WbsReview;
            }

            (WizardStep::Generating, SessionEvent::GenerationFailed { request, message }) => {
                self.check_request(request)?;
                next.last_error = Some(message);
                next.step = WizardStep::FeatureSelection;
            }

            (WizardStep::WbsReview, SessionEvent::ProceedToExport) => {
                next.step = WizardStep::Export;
            }

            (WizardStep::WbsReview, SessionEvent::Back) => {
                next.step = WizardStep::FeatureSelection;
            }

            (WizardStep::WbsReview, event) => {
                next.apply_task_event(event)?;
            }

            (WizardStep::Export, SessionEvent::Back) => {
                next.step = WizardStep::WbsReview;
            }

            // Abandoning an in-flight call: its result will arrive in a step that rejects it.
            (WizardStep::Discovering, SessionEvent::Back) => {
                next.step = WizardStep::ProjectInput;
            }
            (WizardStep::Generating, SessionEvent::Back) => {
                next.step = WizardStep::FeatureSelection;
            }

            (_, event) => return Err(reject(&event)),
        }

        tracing::debug!(session = %next.id, from = %step, to = %next.step, "Session transition");
        Ok(next)
    }

    fn check_request(&self, got: u64) -> Result<(), SessionError> {
        if got == self.request {
            Ok(())
        } else {
            tracing::debug!(session = %self.id, expected = self.request, got, "Dropping stale result");
            Err(SessionError::StaleResult {
                expected: self.request,
                got,
            })
        }
    }

    fn apply_feature_event(&mut self, event: SessionEvent) -> Result<(), SessionError> {
        match event {
            SessionEvent::AddFeature { name, description } => {
                let name = non_blank(name, "feature name")?;
                let id = self.fresh_feature_id();
                let order = self.features.len() as u32 + 1;
                self.features
                    .push(Feature::new(id.clone(), name, description).with_order(order));
                self.selected.insert(id);
            }
            SessionEvent::EditFeature {
                id,
                name,
                description,
            } => {
                let name = non_blank(name, "feature name")?;
                let feature = self
                    .features
                    .iter_mut()
                    .find(|f| f.id == id)
                    .ok_or(SessionError::FeatureNotFound(id))?;
                // Hours computed for the old wording no longer apply.
                feature.name = name;
                feature.description = description;
                feature.classification = None;
                feature.analysis = None;
            }
            SessionEvent::RemoveFeature { id } => {
                let before = self.features.len();
                self.features.retain(|f| f.id != id);
                if self.features.len() == before {
                    return Err(SessionError::FeatureNotFound(id));
                }
                self.selected.remove(&id);
                engine::restamp_order(&mut self.features);
            }
            SessionEvent::ToggleFeature { id } => {
                if !self.features.iter().any(|f| f.id == id) {
                    return Err(SessionError::FeatureNotFound(id));
                }
                if !self.selected.remove(&id) {
                    self.selected.insert(id);
                }
            }
            SessionEvent::ToggleAll => {
                if self.selected.len() == self.features.len() {
                    self.selected.clear();
                } else {
                    self.selected = self.features.iter().map(|f| f.id.clone()).collect();
                }
            }
            SessionEvent::MoveFeature { id, direction } => {
                engine::move_feature(&mut self.features, &id, direction)
                    .ok_or(SessionError::FeatureNotFound(id))?;
            }
            SessionEvent::ConfirmFeatures => {
                if self.selected.is_empty() {
                    return Err(SessionError::NothingSelected);
                }
                self.step = WizardStep::Generating;
                self.last_error = None;
                self.request += 1;
                return Ok(());
            }
            SessionEvent::Back => {
                self.step = WizardStep::ProjectInput;
                return Ok(());
            }
            other => {
                return Err(SessionError::InvalidTransition {
                    step: self.step,
                    event: other.name(),
                })
            }
        }

        self.wbs = None;
        Ok(())
    }

    fn apply_task_event(&mut self, event: SessionEvent) -> Result<(), SessionError> {
        let Some(wbs) = self.wbs.take() else {
            return Err(SessionError::InvalidTransition {
                step: self.step,
                event: event.name(),
            });
        };
        let project_name = wbs.project_name;
        let mut tasks = wbs.tasks;

        let outcome = match event {
            SessionEvent::AddTask {
                name,
                description,
                duration_hours,
            } => non_blank(name, "task name").and_then(|name| {
                let duration_hours = check_duration(duration_hours)?;
                let id = fresh_task_id(&tasks);
                tasks.push(WbsTask {
                    id,
                    name,
                    description,
                    duration_hours,
                    dependencies: Vec::new(),
                    level: 1,
                    parent_id: None,
                    task_type: TaskType::Dev,
                });
                Ok(())
            }),
            SessionEvent::EditTask {
                id,
                name,
                description,
                duration_hours,
            } => non_blank(name, "task name").and_then(|name| {
                let duration_hours = check_duration(duration_hours)?;
                let task = tasks
                    .iter_mut()
                    .find(|t| t.id == id)
                    .ok_or(SessionError::TaskNotFound(id))?;
                task.name = name;
                task.description = description;
                task.duration_hours = duration_hours;
                Ok(())
            }),
            SessionEvent::RemoveTask { id } => {
                let before = tasks.len();
                tasks.retain(|t| t.id != id);
                if tasks.len() == before {
                    Err(SessionError::TaskNotFound(id))
                } else {
                    for task in &mut tasks {
                        task.dependencies.retain(|d| d != &id);
                    }
                    Ok(())
                }
            }
            other => Err(SessionError::InvalidTransition {
                step: self.step,
                event: other.name(),
            }),
        };

        self.wbs = Some(WbsResponse::from_tasks(project_name, tasks));
        outcome
    }

    fn fresh_feature_id(&self) -> String {
        (self.features.len() + 1..)
            .map(|n| format!("f-{}", n))
            .find(|id| !self.features.iter().any(|f| &f.id == id))
            .unwrap_or_default()
    }
}

fn fresh_task_id(tasks: &[WbsTask]) -> String {
    (tasks.len() + 1..)
        .map(|n| format!("M{}", n))
        .find(|id| !tasks.iter().any(|t| &t.id == id))
        .unwrap_or_default()
}

fn non_blank(value: String, what: &str) -> Result<String, SessionError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(SessionError::InvalidInput(format!("{} must not be blank", what)))
    } else {
        Ok(trimmed.to_string())
    }
}

fn check_duration(hours: f64) -> Result<f64, SessionError> {
    if hours.is_finite() && hours >= 0.0 {
        Ok(engine::round_hours(hours))
    } else {
        Err(SessionError::InvalidInput(format!(
            "duration must be a non-negative number of hours, got {}",
            hours
        )))
    }
}
