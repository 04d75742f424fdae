use speculate2::speculate;
use wbs_planner::engine::{ExpandOptions, HourAllocationEngine, MoveDirection};
use wbs_planner::models::*;
use wbs_planner::session::{SessionError, SessionEvent, SessionState, WizardStep};

fn submit(state: &SessionState) -> SessionState {
    state
        .apply(SessionEvent::SubmitProject {
            project_name: "  Tracker  ".to_string(),
            description: "Time tracking for small teams".to_string(),
        })
        .unwrap()
}

fn discovered(features: Vec<Feature>) -> SessionState {
    let discovering = submit(&SessionState::new());
    discovering
        .apply(SessionEvent::DiscoveryCompleted {
            request: discovering.request,
            features,
            competitors: None,
        })
        .unwrap()
}

fn candidates() -> Vec<Feature> {
    vec![
        Feature::new("b", "Reports", "Weekly summaries").with_order(2),
        Feature::new("a", "Login", "Email sign-in").with_order(1),
        Feature::new("c", "Export", "CSV export").with_order(3),
    ]
}

fn order_of(state: &SessionState) -> Vec<(String, Option<u32>)> {
    state
        .features
        .iter()
        .map(|f| (f.id.clone(), f.execution_order))
        .collect()
}

/// Drive a session to WBS review using the real engine.
fn reviewed() -> SessionState {
    let selecting = discovered(candidates());
    let generating = selecting.apply(SessionEvent::ConfirmFeatures).unwrap();
    let wbs = HourAllocationEngine::default()
        .expand(
            &generating.project_name,
            &generating.selected_features(),
            &ExpandOptions::default(),
        )
        .unwrap();
    generating
        .apply(SessionEvent::WbsGenerated {
            request: generating.request,
            wbs,
        })
        .unwrap()
}

/// Expand the currently selected features the way the caller would.
fn generate_for(state: &SessionState) -> WbsResponse {
    HourAllocationEngine::default()
        .expand(&state.project_name, &state.selected_features(), &ExpandOptions::default())
        .unwrap()
}

speculate! {
    describe "project input" {
        it "starts at project input" {
            let state = SessionState::new();
            assert_eq!(state.step, WizardStep::ProjectInput);
            assert!(state.features.is_empty());
        }

        it "trims the name and moves to discovery" {
            let state = submit(&SessionState::new());
            assert_eq!(state.step, WizardStep::Discovering);
            assert_eq!(state.project_name, "Tracker");
        }

        it "rejects short descriptions" {
            let result = SessionState::new().apply(SessionEvent::SubmitProject {
                project_name: "Tracker".to_string(),
                description: "short".to_string(),
            });
            assert!(matches!(result, Err(SessionError::InvalidInput(_))));
        }

        it "rejects blank and overlong names" {
            for name in ["   ".to_string(), "x".repeat(201)] {
                let result = SessionState::new().apply(SessionEvent::SubmitProject {
                    project_name: name,
                    description: "Time tracking for small teams".to_string(),
                });
                assert!(matches!(result, Err(SessionError::InvalidInput(_))));
            }
        }

        it "rejects events from other steps" {
            let err = SessionState::new()
                .apply(SessionEvent::ConfirmFeatures)
                .unwrap_err();
            assert_eq!(
                err,
                SessionError::InvalidTransition {
                    step: WizardStep::ProjectInput,
                    event: "confirm_features"
                }
            );
        }
    }

    describe "discovery" {
        it "sorts, restamps and selects every feature" {
            let state = discovered(candidates());

            assert_eq!(state.step, WizardStep::FeatureSelection);
            let ids: Vec<&str> = state.features.iter().map(|f| f.id.as_str()).collect();
            assert_eq!(ids, ["a", "b", "c"]);
            assert_eq!(state.selected.len(), 3);
        }

        it "returns to project input on failure" {
            let discovering = submit(&SessionState::new());
            let state = discovering
                .apply(SessionEvent::DiscoveryFailed {
                    request: discovering.request,
                    message: "backend down".to_string(),
                })
                .unwrap();

            assert_eq!(state.step, WizardStep::ProjectInput);
            assert_eq!(state.last_error.as_deref(), Some("backend down"));
            assert_eq!(state.project_name, "Tracker");
        }

        it "rejects duplicate feature ids" {
            let discovering = submit(&SessionState::new());
            let result = discovering.apply(SessionEvent::DiscoveryCompleted {
                request: discovering.request,
                features: vec![Feature::new("a", "One", ""), Feature::new("a", "Two", "")],
                competitors: None,
            });
            assert!(matches!(result, Err(SessionError::InvalidInput(_))));
        }

        it "ignores a late result after going back" {
            let state = submit(&SessionState::new())
                .apply(SessionEvent::Back)
                .unwrap();
            assert_eq!(state.step, WizardStep::ProjectInput);

            let late = state.apply(SessionEvent::DiscoveryCompleted {
                request: state.request,
                features: candidates(),
                competitors: None,
            });
            assert!(matches!(late, Err(SessionError::InvalidTransition { .. })));
        }

        it "rejects the result of an earlier submission" {
            let first = submit(&SessionState::new());
            let resubmitted = first
                .apply(SessionEvent::Back)
                .unwrap()
                .apply(SessionEvent::SubmitProject {
                    project_name: "Tracker Pro".to_string(),
                    description: "Time tracking for large teams".to_string(),
                })
                .unwrap();
            assert_eq!(resubmitted.step, WizardStep::Discovering);

            let late = resubmitted.apply(SessionEvent::DiscoveryCompleted {
                request: first.request,
                features: candidates(),
                competitors: None,
            });
            assert_eq!(
                late.unwrap_err(),
                SessionError::StaleResult { expected: resubmitted.request, got: first.request }
            );

            let current = resubmitted
                .apply(SessionEvent::DiscoveryCompleted {
                    request: resubmitted.request,
                    features: candidates(),
                    competitors: None,
                })
                .unwrap();
            assert_eq!(current.step, WizardStep::FeatureSelection);
        }
    }

    describe "feature selection" {
        before {
            let state = discovered(candidates());
        }

        it "adds a selected feature at the end" {
            let next = state
                .apply(SessionEvent::AddFeature {
                    name: " Billing ".to_string(),
                    description: "Invoices".to_string(),
                })
                .unwrap();

            let added = next.features.last().unwrap();
            assert_eq!(added.id, "f-4");
            assert_eq!(added.name, "Billing");
            assert_eq!(added.execution_order, Some(4));
            assert!(next.selected.contains("f-4"));
        }

        it "rejects blank feature names" {
            let result = state.apply(SessionEvent::AddFeature {
                name: " ".to_string(),
                description: String::new(),
            });
            assert!(matches!(result, Err(SessionError::InvalidInput(_))));
        }

        it "clears stale hours on edit" {
            let with_analysis = {
                let mut s = state.clone();
                s.features[0].classification =
                    Some(FeatureClassification::new(DevComplexity::Complex));
                s
            };
            let next = with_analysis
                .apply(SessionEvent::EditFeature {
                    id: "a".to_string(),
                    name: "Login with SSO".to_string(),
                    description: "SAML".to_string(),
                })
                .unwrap();

            assert_eq!(next.features[0].name, "Login with SSO");
            assert!(next.features[0].classification.is_none());
            assert!(next.features[0].analysis.is_none());
        }

        it "removes and restamps" {
            let next = state
                .apply(SessionEvent::RemoveFeature { id: "a".to_string() })
                .unwrap();

            assert_eq!(
                order_of(&next),
                [("b".to_string(), Some(1)), ("c".to_string(), Some(2))]
            );
            assert!(!next.selected.contains("a"));
        }

        it "reports unknown features" {
            let result = state.apply(SessionEvent::RemoveFeature { id: "zzz".to_string() });
            assert_eq!(result.unwrap_err(), SessionError::FeatureNotFound("zzz".to_string()));
        }

        it "toggles single features and everything" {
            let one_off = state
                .apply(SessionEvent::ToggleFeature { id: "b".to_string() })
                .unwrap();
            assert!(!one_off.selected.contains("b"));

            let all_on = one_off.apply(SessionEvent::ToggleAll).unwrap();
            assert_eq!(all_on.selected.len(), 3);

            let all_off = all_on.apply(SessionEvent::ToggleAll).unwrap();
            assert!(all_off.selected.is_empty());
        }

        it "moves features and keeps orders contiguous" {
            let next = state
                .apply(SessionEvent::MoveFeature {
                    id: "c".to_string(),
                    direction: MoveDirection::Up,
                })
                .unwrap();

            assert_eq!(
                order_of(&next),
                [
                    ("a".to_string(), Some(1)),
                    ("c".to_string(), Some(2)),
                    ("b".to_string(), Some(3))
                ]
            );
        }

        it "restamps only the selected features" {
            let next = state
                .apply(SessionEvent::ToggleFeature { id: "a".to_string() })
                .unwrap();
            let selected = next.selected_features();

            let order: Vec<_> = selected
                .iter()
                .map(|f| (f.id.as_str(), f.execution_order))
                .collect();
            assert_eq!(order, [("b", Some(1)), ("c", Some(2))]);
        }

        it "refuses to confirm an empty selection" {
            let empty = state.apply(SessionEvent::ToggleAll).unwrap();
            assert_eq!(
                empty.apply(SessionEvent::ConfirmFeatures).unwrap_err(),
                SessionError::NothingSelected
            );
        }

        it "rejects a wbs built for an earlier confirmation" {
            let both = state
                .apply(SessionEvent::ToggleFeature { id: "c".to_string() })
                .unwrap()
                .apply(SessionEvent::ConfirmFeatures)
                .unwrap();
            let wbs_for_both = generate_for(&both);

            let only_a = both
                .apply(SessionEvent::Back)
                .unwrap()
                .apply(SessionEvent::RemoveFeature { id: "b".to_string() })
                .unwrap()
                .apply(SessionEvent::ConfirmFeatures)
                .unwrap();

            let late = only_a.apply(SessionEvent::WbsGenerated {
                request: both.request,
                wbs: wbs_for_both,
            });
            assert!(matches!(late, Err(SessionError::StaleResult { .. })));

            let failed_late = only_a.apply(SessionEvent::GenerationFailed {
                request: both.request,
                message: "timeout".to_string(),
            });
            assert!(matches!(failed_late, Err(SessionError::StaleResult { .. })));

            let review = only_a
                .apply(SessionEvent::WbsGenerated {
                    request: only_a.request,
                    wbs: generate_for(&only_a),
                })
                .unwrap();
            let parents: Vec<_> = review
                .wbs
                .as_ref()
                .unwrap()
                .tasks
                .iter()
                .map(|t| t.parent_id.clone())
                .collect();
            assert!(parents.iter().all(|p| p.as_deref() == Some("a")));
        }

        it "leaves the original state untouched" {
            let _ = state.apply(SessionEvent::RemoveFeature { id: "a".to_string() });
            assert_eq!(state.features.len(), 3);
        }

        it "returns to generation failures with the message" {
            let generating = state.apply(SessionEvent::ConfirmFeatures).unwrap();
            let next = generating
                .apply(SessionEvent::GenerationFailed {
                    request: generating.request,
                    message: "timeout".to_string(),
                })
                .unwrap();

            assert_eq!(next.step, WizardStep::FeatureSelection);
            assert_eq!(next.last_error.as_deref(), Some("timeout"));
        }
    }

    describe "wbs review" {
        before {
            let state = reviewed();
        }

        it "holds the generated wbs" {
            assert_eq!(state.step, WizardStep::WbsReview);
            let wbs = state.wbs.as_ref().unwrap();
            assert_eq!(wbs.project_name, "Tracker");
            assert_eq!(wbs.total_tasks, 3);
        }

        it "adds manual tasks and recomputes totals" {
            let before_hours = state.wbs.as_ref().unwrap().total_hours;
            let next = state
                .apply(SessionEvent::AddTask {
                    name: "Deployment".to_string(),
                    description: "Ship it".to_string(),
                    duration_hours: 3.0,
                })
                .unwrap();

            let wbs = next.wbs.as_ref().unwrap();
            let added = wbs.tasks.last().unwrap();
            assert_eq!(added.id, "M4");
            assert_eq!(added.task_type, TaskType::Dev);
            assert_eq!(wbs.total_tasks, 4);
            assert!((wbs.total_hours - (before_hours + 3.0)).abs() < 1e-9);
        }

        it "rejects negative durations" {
            let result = state.apply(SessionEvent::EditTask {
                id: "T1".to_string(),
                name: "Development - Login".to_string(),
                description: String::new(),
                duration_hours: -1.0,
            });
            assert!(matches!(result, Err(SessionError::InvalidInput(_))));
        }

        it "edits a task in place" {
            let next = state
                .apply(SessionEvent::EditTask {
                    id: "T1".to_string(),
                    name: "Login".to_string(),
                    description: "Trimmed scope".to_string(),
                    duration_hours: 5.0,
                })
                .unwrap();

            let task = &next.wbs.as_ref().unwrap().tasks[0];
            assert_eq!(task.name, "Login");
            assert_eq!(task.duration_hours, 5.0);
        }

        it "drops dependencies on removed tasks" {
            let next = state
                .apply(SessionEvent::RemoveTask { id: "T1".to_string() })
                .unwrap();

            let wbs = next.wbs.as_ref().unwrap();
            assert_eq!(wbs.total_tasks, 2);
            assert!(wbs.tasks.iter().all(|t| !t.dependencies.contains(&"T1".to_string())));
        }

        it "goes to export and back" {
            let export = state.apply(SessionEvent::ProceedToExport).unwrap();
            assert_eq!(export.step, WizardStep::Export);
            assert!(export.export_request().is_some());

            let review = export.apply(SessionEvent::Back).unwrap();
            assert_eq!(review.step, WizardStep::WbsReview);
        }

        it "clears the wbs when features change" {
            let selecting = state.apply(SessionEvent::Back).unwrap();
            assert!(selecting.wbs.is_some());

            let edited = selecting
                .apply(SessionEvent::ToggleFeature { id: "c".to_string() })
                .unwrap();
            assert!(edited.wbs.is_none());
        }

        it "resets to a fresh session" {
            let fresh = state.apply(SessionEvent::Reset).unwrap();
            assert_eq!(fresh.step, WizardStep::ProjectInput);
            assert_ne!(fresh.id, state.id);
            assert!(fresh.wbs.is_none());
        }
    }

    describe "events" {
        it "deserialize from tagged json" {
            let event: SessionEvent = serde_json::from_str(
                r#"{"type": "move_feature", "id": "a", "direction": "down"}"#,
            )
            .unwrap();
            assert!(matches!(
                event,
                SessionEvent::MoveFeature { direction: MoveDirection::Down, .. }
            ));
        }
    }
}
