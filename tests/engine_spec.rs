use std::collections::BTreeMap;

use speculate2::speculate;
use tokio_test::{assert_err, assert_ok};
use wbs_planner::engine::{validate_wbs, AllocationPolicy, EngineError, ExpandOptions, HourAllocationEngine};
use wbs_planner::models::*;

fn classified(id: &str, name: &str, classification: FeatureClassification) -> Feature {
    Feature::new(id, name, "").with_classification(classification)
}

fn medium() -> FeatureClassification {
    FeatureClassification::new(DevComplexity::Medium)
}

fn dev_tasks(wbs: &WbsResponse) -> Vec<&WbsTask> {
    wbs.tasks
        .iter()
        .filter(|t| t.task_type == TaskType::Dev)
        .collect()
}

speculate! {
    before {
        let engine = HourAllocationEngine::default();
        let options = ExpandOptions::default();
    }

    describe "allocate" {
        it "computes the medium research example" {
            let feature = classified("f1", "Login", medium().rnd());
            let analysis = assert_ok!(engine.allocate(&feature));

            assert_eq!(analysis.dev_hours, 8.0);
            assert_eq!(analysis.rnd_hours, 4.0);
            assert_eq!(analysis.ui_hours, 0.0);
            assert_eq!(analysis.db_hours, 0.0);
            assert_eq!(analysis.unit_test_hours, 1.6);
            assert_eq!(analysis.qa_hours, 2.0);
            assert_eq!(analysis.total_hours, 15.6);
        }

        it "keeps the total equal to the buckets for every flag combination" {
            let policy = AllocationPolicy::STANDARD;
            for complexity in [DevComplexity::Simple, DevComplexity::Medium, DevComplexity::Complex] {
                for bits in 0..8u8 {
                    let mut c = FeatureClassification::new(complexity);
                    c.needs_rnd = bits & 1 != 0;
                    c.needs_ui = bits & 2 != 0;
                    c.needs_db = bits & 4 != 0;

                    let a = assert_ok!(engine.allocate(&classified("f", "F", c)));
                    let expected = a.dev_hours + a.rnd_hours + a.ui_hours + a.db_hours
                        + policy.unit_test_hours(a.dev_hours) + 2.0;
                    assert!((a.total_hours - expected).abs() < 1e-9);
                    assert_eq!(a.rnd_hours > 0.0, a.needs_rnd);
                    assert_eq!(a.ui_hours > 0.0, a.needs_ui);
                    assert_eq!(a.db_hours > 0.0, a.needs_db);
                }
            }
        }

        it "passes a consistent supplied analysis through unchanged" {
            let mut supplied = AllocationPolicy::STANDARD.analyze(&medium().ui());
            supplied.reasoning = "From the classifier".to_string();
            let feature = Feature::new("f1", "Profile page", "").with_analysis(supplied.clone());

            assert_eq!(assert_ok!(engine.allocate(&feature)), supplied);
        }

        it "rejects ui hours without the ui flag" {
            let mut supplied = AllocationPolicy::STANDARD.analyze(&medium());
            supplied.ui_hours = 5.0;
            supplied.total_hours += 5.0;
            let feature = Feature::new("f1", "Profile page", "").with_analysis(supplied);

            let err = assert_err!(engine.allocate(&feature));
            assert!(matches!(err, EngineError::InvalidAnalysis { .. }));
            assert_eq!(err.code(), "invalid_analysis");
        }

        it "rejects a wrong total" {
            let mut supplied = AllocationPolicy::STANDARD.analyze(&medium());
            supplied.total_hours = 20.0;
            let feature = Feature::new("f1", "Search", "").with_analysis(supplied);

            assert!(matches!(
                engine.allocate(&feature),
                Err(EngineError::InvalidAnalysis { .. })
            ));
        }

        it "rejects hours finer than a hundredth" {
            let mut supplied = AllocationPolicy::STANDARD.analyze(&medium().rnd());
            supplied.rnd_hours = 4.125;
            supplied.total_hours = 15.725;
            let feature = Feature::new("f1", "Search", "").with_analysis(supplied);

            let err = assert_err!(engine.allocate(&feature));
            assert_eq!(err.code(), "invalid_analysis");
            assert!(matches!(
                engine.expand("Tracker", &[feature], &options),
                Err(EngineError::InvalidAnalysis { .. })
            ));
        }

        it "falls back to keywords without a classification" {
            let feature = Feature::new("f1", "Simple settings form", "Saves preferences to the database");
            let analysis = assert_ok!(engine.allocate(&feature));

            assert_eq!(analysis.dev_complexity, DevComplexity::Simple);
            assert!(analysis.needs_ui);
            assert!(analysis.needs_db);
            assert!(!analysis.needs_rnd);
            assert_eq!(analysis.total_hours, 10.8);
        }
    }

    describe "expand" {
        it "returns an empty response for no features" {
            let wbs = assert_ok!(engine.expand("Empty", &[], &options));

            assert!(wbs.tasks.is_empty());
            assert_eq!(wbs.total_tasks, 0);
            assert_eq!(wbs.total_hours, 0.0);
        }

        it "emits research and development tasks for the example feature" {
            let wbs = assert_ok!(engine.expand(
                "Tracker",
                &[classified("f1", "Login", medium().rnd())],
                &options,
            ));

            assert_eq!(wbs.total_tasks, 2);
            assert_eq!(wbs.tasks[0].task_type, TaskType::Rnd);
            assert_eq!(wbs.tasks[0].duration_hours, 4.0);
            assert!(wbs.tasks[0].dependencies.is_empty());
            assert_eq!(wbs.tasks[1].task_type, TaskType::Dev);
            assert_eq!(wbs.tasks[1].duration_hours, 11.6);
            assert_eq!(wbs.total_hours, 15.6);
            assert!(wbs.tasks.iter().all(|t| t.parent_id.as_deref() == Some("f1")));
            assert!(wbs.tasks.iter().all(|t| t.level == 1));
        }

        it "emits no research task when research is not needed" {
            let wbs = assert_ok!(engine.expand(
                "Tracker",
                &[classified("f1", "Login", medium().ui().db())],
                &options,
            ));

            assert_eq!(wbs.total_tasks, 1);
            assert_eq!(wbs.tasks[0].task_type, TaskType::Dev);
            // 8 dev + 2 UI + 2 DB + 1.6 tests + 2 QA
            assert_eq!(wbs.tasks[0].duration_hours, 15.6);
        }

        it "sequences dev tasks by execution order" {
            let features = vec![
                classified("c", "Third", medium()).with_order(3),
                classified("a", "First", medium().rnd()).with_order(1),
                classified("b", "Second", medium()).with_order(2),
            ];
            let wbs = assert_ok!(engine.expand("Tracker", &features, &options));
            let devs = dev_tasks(&wbs);

            let parents: Vec<_> = devs.iter().map(|t| t.parent_id.clone().unwrap()).collect();
            assert_eq!(parents, ["a", "b", "c"]);
            assert!(devs[0].dependencies.is_empty());
            assert_eq!(devs[1].dependencies, vec![devs[0].id.clone()]);
            assert_eq!(devs[2].dependencies, vec![devs[1].id.clone()]);
        }

        it "is idempotent" {
            let features = vec![
                classified("a", "Auth", medium().rnd()).with_order(2),
                classified("b", "Billing", FeatureClassification::new(DevComplexity::Complex).db()).with_order(1),
            ];
            let first = assert_ok!(engine.expand("Tracker", &features, &options));
            let second = assert_ok!(engine.expand("Tracker", &features, &options));

            assert_eq!(first, second);
            let ids: Vec<&str> = first.tasks.iter().map(|t| t.id.as_str()).collect();
            assert_eq!(ids, ["T1", "T2", "T3"]);
        }

        it "matches the summed analysis totals" {
            let features = vec![
                classified("a", "Auth", medium().rnd().ui()),
                classified("b", "Reports", FeatureClassification::new(DevComplexity::Simple).db()),
            ];
            let wbs = assert_ok!(engine.expand("Tracker", &features, &options));
            let analysed: f64 = features
                .iter()
                .map(|f| engine.allocate(f).unwrap().total_hours)
                .sum();

            assert!((wbs.total_hours - analysed).abs() < 1e-9);
        }

        it "copies supplied hours into tasks exactly" {
            let mut supplied = AllocationPolicy::STANDARD.analyze(&medium().rnd());
            supplied.dev_hours = 8.35;
            supplied.unit_test_hours = 1.67;
            supplied.total_hours = 16.02;
            let feature = Feature::new("f1", "Search", "").with_analysis(supplied.clone());

            let wbs = assert_ok!(engine.expand("Tracker", &[feature], &options));
            assert_eq!(wbs.tasks[0].duration_hours, supplied.rnd_hours);
            assert_eq!(wbs.tasks[1].duration_hours, 12.02);
            assert_eq!(wbs.total_hours, supplied.total_hours);
        }

        it "rejects gaps in strict mode" {
            let features = vec![
                classified("a", "A", medium()).with_order(1),
                classified("b", "B", medium()).with_order(3),
            ];
            let strict = ExpandOptions { strict_ordering: true, ..Default::default() };

            assert!(engine.expand("Tracker", &features, &options).is_ok());
            assert!(matches!(
                engine.expand("Tracker", &features, &strict),
                Err(EngineError::InvalidOrdering { .. })
            ));
        }

        it "rejects duplicate feature ids" {
            let features = vec![classified("a", "A", medium()), classified("a", "B", medium())];

            assert!(matches!(
                engine.expand("Tracker", &features, &options),
                Err(EngineError::InvalidFeature { .. })
            ));
        }

        it "applies dependency overrides" {
            let features = vec![
                classified("a", "A", medium()).with_order(1),
                classified("b", "B", medium()).with_order(2),
                classified("c", "C", medium()).with_order(3),
            ];
            let mut overrides = BTreeMap::new();
            overrides.insert("b".to_string(), vec![]);
            overrides.insert("c".to_string(), vec!["a".to_string(), "b".to_string()]);
            let options = ExpandOptions { strict_ordering: false, dependency_overrides: overrides };

            let wbs = assert_ok!(engine.expand("Tracker", &features, &options));
            assert!(wbs.tasks[1].dependencies.is_empty());
            assert_eq!(wbs.tasks[2].dependencies, vec!["T1".to_string(), "T2".to_string()]);
        }

        it "rejects unknown and circular overrides" {
            let features = vec![classified("a", "A", medium()), classified("b", "B", medium())];

            let mut unknown = BTreeMap::new();
            unknown.insert("a".to_string(), vec!["zzz".to_string()]);
            let options = ExpandOptions { strict_ordering: false, dependency_overrides: unknown };
            let err = assert_err!(engine.expand("Tracker", &features, &options));
            assert_eq!(err.code(), "unknown_dependency");

            let mut circular = BTreeMap::new();
            circular.insert("a".to_string(), vec!["b".to_string()]);
            let options = ExpandOptions { strict_ordering: false, dependency_overrides: circular };
            let err = assert_err!(engine.expand("Tracker", &features, &options));
            assert_eq!(err.code(), "dependency_cycle");
        }

        it "produces a valid WBS" {
            let features = vec![
                classified("a", "Auth", medium().rnd()),
                classified("b", "Search", FeatureClassification::new(DevComplexity::Complex).rnd().db()),
            ];
            let wbs = assert_ok!(engine.expand("Tracker", &features, &options));
            let report = validate_wbs(&wbs.tasks);

            assert!(report.valid, "{:?}", report.issues);
            assert!((report.total_hours - wbs.total_hours).abs() < 1e-9);
            assert_eq!(report.total_tasks, 4);
        }
    }
}
