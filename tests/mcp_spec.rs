//! MCP server integration tests.
//!
//! These call the tool logic directly. The stdio protocol itself is covered
//! by `mcp_protocol_spec.rs`.

use std::collections::BTreeMap;

use wbs_planner::engine::HourAllocationEngine;
use wbs_planner::mcp::*;
use wbs_planner::models::*;

fn setup() -> McpServer {
    McpServer::new(HourAllocationEngine::default())
}

fn feature(id: &str, name: &str, order: u32, classification: FeatureClassification) -> Feature {
    Feature::new(id, name, "")
        .with_order(order)
        .with_classification(classification)
}

fn two_features() -> Vec<Feature> {
    vec![
        feature(
            "auth",
            "Auth",
            1,
            FeatureClassification::new(DevComplexity::Medium).rnd(),
        ),
        feature(
            "billing",
            "Billing",
            2,
            FeatureClassification::new(DevComplexity::Complex).ui().db(),
        ),
    ]
}

fn generate(server: &McpServer, features: Vec<Feature>) -> WbsResponse {
    server
        .generate_wbs_response(GenerateWbsRequest {
            project_name: "Shop".to_string(),
            features,
            strict_ordering: false,
            dependency_overrides: BTreeMap::new(),
        })
        .expect("Failed to generate WBS")
}

// ============================================================
// Allocation
// ============================================================

mod allocate_feature {
    use super::*;

    #[test]
    fn computes_hours_from_classification() {
        let server = setup();

        let analysis = server
            .allocate_feature_analysis(AllocateFeatureRequest {
                feature: feature(
                    "f1",
                    "Checkout",
                    1,
                    FeatureClassification::new(DevComplexity::Complex).ui().db(),
                ),
            })
            .unwrap();

        assert_eq!(analysis.dev_hours, 16.0);
        assert_eq!(analysis.ui_hours, 2.0);
        assert_eq!(analysis.db_hours, 2.0);
        assert_eq!(analysis.unit_test_hours, 3.2);
        assert_eq!(analysis.total_hours, 25.2);
    }

    #[test]
    fn rejects_inconsistent_analysis() {
        let server = setup();
        let mut analysis = server
            .allocate_feature_analysis(AllocateFeatureRequest {
                feature: feature("f1", "Checkout", 1, FeatureClassification::new(DevComplexity::Medium)),
            })
            .unwrap();
        analysis.qa_hours = 0.0;
        analysis.total_hours -= 2.0;

        let result = server.allocate_feature_analysis(AllocateFeatureRequest {
            feature: Feature::new("f1", "Checkout", "").with_analysis(analysis),
        });

        let err = result.unwrap_err();
        assert!(err.message.contains("qa_hours"));
    }
}

// ============================================================
// WBS generation
// ============================================================

mod generate_wbs {
    use super::*;

    #[test]
    fn expands_and_chains_dev_tasks() {
        let server = setup();

        let wbs = generate(&server, two_features());

        assert_eq!(wbs.total_tasks, 3);
        let ids: Vec<&str> = wbs.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["T1", "T2", "T3"]);
        assert_eq!(wbs.tasks[0].task_type, TaskType::Rnd);
        assert_eq!(wbs.tasks[2].dependencies, vec!["T2".to_string()]);
        // 4 R&D + 11.6 Auth Dev + 25.2 Billing Dev
        assert_eq!(wbs.total_hours, 40.8);
    }

    #[test]
    fn rejects_blank_project_name() {
        let server = setup();

        let result = server.generate_wbs_response(GenerateWbsRequest {
            project_name: " ".to_string(),
            features: two_features(),
            strict_ordering: false,
            dependency_overrides: BTreeMap::new(),
        });

        assert!(result.is_err());
    }

    #[test]
    fn reports_cycles_with_their_code() {
        let server = setup();
        let mut overrides = BTreeMap::new();
        overrides.insert("auth".to_string(), vec!["billing".to_string()]);

        let err = server
            .generate_wbs_response(GenerateWbsRequest {
                project_name: "Shop".to_string(),
                features: two_features(),
                strict_ordering: false,
                dependency_overrides: overrides,
            })
            .unwrap_err();

        let data = err.data.expect("Expected error data");
        assert_eq!(data["code"], "dependency_cycle");
    }
}

// ============================================================
// Validation and export
// ============================================================

mod validate_wbs {
    use super::*;

    #[test]
    fn accepts_generated_wbs() {
        let server = setup();
        let wbs = generate(&server, two_features());

        let report = server.validate_wbs_report(ValidateWbsRequest { tasks: wbs.tasks });

        assert!(report.valid);
        assert_eq!(report.rnd_hours, 4.0);
    }

    #[test]
    fn flags_duplicate_ids() {
        let server = setup();
        let mut tasks = generate(&server, two_features()).tasks;
        tasks[1].id = "T1".to_string();

        let report = server.validate_wbs_report(ValidateWbsRequest { tasks });

        assert!(!report.valid);
        assert!(report.issues.iter().any(|i| i.contains("Duplicate")));
    }
}

mod export_wbs {
    use super::*;

    #[test]
    fn renders_each_format() {
        let server = setup();
        let tasks = generate(&server, two_features()).tasks;

        for (format, needle) in [
            ("csv", "ID,Task Name"),
            ("json", "\"total_tasks\": 3"),
            ("excel", "<Workbook"),
            ("text", "Development - Billing"),
        ] {
            let document = server
                .export_wbs_document(ExportWbsRequest {
                    project_name: "Shop".to_string(),
                    tasks: tasks.clone(),
                    format: format.to_string(),
                })
                .unwrap();
            assert!(document.contains(needle), "{} export missing {:?}", format, needle);
        }
    }

    #[test]
    fn rejects_unknown_format() {
        let server = setup();

        let result = server.export_wbs_document(ExportWbsRequest {
            project_name: "Shop".to_string(),
            tasks: vec![],
            format: "docx".to_string(),
        });

        assert!(result.is_err());
    }
}
