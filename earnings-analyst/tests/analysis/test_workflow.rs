//! Tests for WorkflowConfig and end-to-end workflow runs

use super::common::*;
use earnings_analyst::analysis::{
    run_analysis_workflow, ResearchPlanRecord, SectionAnalysisRecord, Snapshot, SnapshotStore,
    WorkflowConfig,
};
use earnings_analyst::workflow_utils::ModelError;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SECTIONS_YAML: &str = r#"
sections:
  - id: a
    name: Alpha
    description: Cover Alpha
  - id: skipped
    name: Disabled
    enabled: false
  - id: b
    name: Bravo
    description: Cover Bravo
  - id: c
    name: Charlie
    description: Cover Charlie
"#;

const TRANSCRIPT: &str = "Operator: Good morning and welcome to the third quarter call.\n\
Jane Doe, CFO: Net interest income rose 8% year over year.";

fn write_inputs(dir: &Path) -> (PathBuf, PathBuf) {
    let transcript = dir.join("transcript.txt");
    let sections = dir.join("sections.yaml");
    std::fs::write(&transcript, TRANSCRIPT).unwrap();
    std::fs::write(&sections, SECTIONS_YAML).unwrap();
    (transcript, sections)
}

fn config(dir: &Path, transcript: PathBuf, sections: Option<PathBuf>) -> WorkflowConfig {
    WorkflowConfig {
        transcript,
        sections_file: sections,
        output_dir: dir.join("OUTPUT"),
        step_delay: Duration::ZERO,
        ..Default::default()
    }
}

#[test]
fn test_workflow_config_default() {
    let config = WorkflowConfig::default();

    assert_eq!(config.phases, vec![1, 2]);
    assert!(config.sections_file.is_none());
    assert!(config.plans_file.is_none());
    assert_eq!(config.output_dir, PathBuf::from("./OUTPUT"));
    assert_eq!(config.step_delay, Duration::from_secs(2));
    assert!(!config.debug);
}

#[tokio::test]
async fn test_full_run_plans_then_analyzes() {
    let dir = create_temp_dir("wf_full");
    let (transcript, sections) = write_inputs(&dir);
    let client = ScriptedClient::ok([
        plan_response("a", "Alpha", &["loan growth"]),
        plan_response("b", "Bravo", &["deposit costs"]),
        plan_response("c", "Charlie", &["buybacks"]),
        analysis_response("Alpha", "Alpha statement."),
        analysis_response("Bravo", "Bravo statement."),
        analysis_response("Charlie", "Charlie statement."),
    ]);

    let summary = run_analysis_workflow(&config(&dir, transcript, Some(sections)), &client)
        .await
        .unwrap();

    assert_eq!(client.calls(), 6);
    assert_eq!(
        client.task_ids(),
        vec![
            "research_planning_a",
            "research_planning_b",
            "research_planning_c",
            "section_analysis_a",
            "section_analysis_b",
            "section_analysis_c",
        ]
    );

    let planning = summary.planning.unwrap();
    assert_eq!((planning.completed, planning.total), (3, 3));
    let plans: Snapshot<ResearchPlanRecord> =
        SnapshotStore::new(&planning.snapshot_path).load().await.unwrap();
    assert_eq!(plans.metadata.run_id, summary.run_id);
    assert_eq!(plans.metadata.stage, "research_planning");

    let analysis = summary.analysis.unwrap();
    assert_eq!((analysis.completed, analysis.total), (3, 3));
    let analyses: Snapshot<SectionAnalysisRecord> =
        SnapshotStore::new(&analysis.snapshot_path).load().await.unwrap();
    let names: Vec<&str> = analyses
        .items
        .iter()
        .map(|r| r.section_name.as_str())
        .collect();
    assert_eq!(names, vec!["Alpha", "Bravo", "Charlie"]);
    assert_eq!(analyses.metadata.run_id, summary.run_id);

    // Stage 2 reads the plan, and sees stage 2 results as prior context
    let prompts = client.prompts();
    assert!(prompts[3].contains("Alpha requirements from the plan"));
    assert!(prompts[5].contains("Statement: Alpha statement."));
    assert!(prompts[5].contains("Statement: Bravo statement."));
    assert!(!prompts[5].contains("## Alpha\nHigh priority"));

    cleanup_temp_dir(&dir);
}

#[tokio::test]
async fn test_section_failing_planning_is_absent_from_analysis() {
    let dir = create_temp_dir("wf_skip");
    let (transcript, sections) = write_inputs(&dir);
    let client = ScriptedClient::new(vec![
        Ok(plan_response("a", "Alpha", &[])),
        Err(ModelError::Transport("connection reset".into())),
        Ok(plan_response("c", "Charlie", &[])),
        Ok(analysis_response("Alpha", "A.")),
        Ok(analysis_response("Charlie", "C.")),
    ]);

    let summary = run_analysis_workflow(&config(&dir, transcript, Some(sections)), &client)
        .await
        .unwrap();

    let planning = summary.planning.unwrap();
    assert_eq!(planning.failed_sections, vec!["b"]);
    assert_eq!(planning.completed, 2);

    let analysis = summary.analysis.unwrap();
    assert_eq!(analysis.total, 2);
    assert_eq!(analysis.completed, 2);
    assert_eq!(
        client.task_ids()[3..],
        ["section_analysis_a", "section_analysis_c"]
    );
    let prompts = client.prompts();
    assert!(!prompts[2].contains("## Bravo"));
    for prompt in &prompts[3..] {
        assert!(!prompt.contains("Bravo"));
    }

    cleanup_temp_dir(&dir);
}

#[tokio::test]
async fn test_all_planning_failures_skip_analysis() {
    let dir = create_temp_dir("wf_all_failed");
    let (transcript, sections) = write_inputs(&dir);
    let client = ScriptedClient::new(vec![
        Err(ModelError::Transport("connection reset".into())),
        Err(ModelError::RateLimited("slow down".into())),
        Err(ModelError::Authentication("invalid API key".into())),
    ]);

    let summary = run_analysis_workflow(&config(&dir, transcript, Some(sections)), &client)
        .await
        .unwrap();

    assert_eq!(client.calls(), 3);
    let planning = summary.planning.unwrap();
    assert_eq!(planning.completed, 0);
    assert_eq!(planning.failed_sections, vec!["a", "b", "c"]);
    assert!(planning.snapshot_path.exists());
    assert!(summary.analysis.is_none());

    cleanup_temp_dir(&dir);
}

#[tokio::test]
async fn test_empty_plans_file_is_rejected() {
    let dir = create_temp_dir("wf_empty_plans");
    let (transcript, _) = write_inputs(&dir);
    let plans_file = dir.join("plans.json");
    std::fs::write(&plans_file, "[]").unwrap();
    let client = ScriptedClient::ok(Vec::<String>::new());
    let config = WorkflowConfig {
        phases: vec![2],
        plans_file: Some(plans_file),
        ..config(&dir, transcript, None)
    };

    let err = run_analysis_workflow(&config, &client).await.unwrap_err();
    assert!(err.to_string().contains("No research plans"));
    assert_eq!(client.calls(), 0);

    cleanup_temp_dir(&dir);
}

#[tokio::test]
async fn test_phase_two_resumes_from_plans_file() {
    let dir = create_temp_dir("wf_resume");
    let (transcript, _) = write_inputs(&dir);
    let plans_file = dir.join("plans.json");
    let plans = vec![
        serde_json::from_str::<serde_json::Value>(&plan_response("z", "Zulu", &[])).unwrap(),
        serde_json::from_str::<serde_json::Value>(&plan_response("y", "Yankee", &[])).unwrap(),
    ];
    std::fs::write(&plans_file, serde_json::to_string(&plans).unwrap()).unwrap();

    let client = ScriptedClient::ok([
        analysis_response("Zulu", "Z."),
        analysis_response("Yankee", "Y."),
    ]);
    let config = WorkflowConfig {
        phases: vec![2],
        plans_file: Some(plans_file),
        ..config(&dir, transcript, None)
    };

    let summary = run_analysis_workflow(&config, &client).await.unwrap();

    assert!(summary.planning.is_none());
    assert_eq!(summary.analysis.unwrap().completed, 2);
    assert_eq!(client.task_ids(), vec!["section_analysis_z", "section_analysis_y"]);

    cleanup_temp_dir(&dir);
}

#[tokio::test]
async fn test_phase_two_alone_requires_plans_file() {
    let dir = create_temp_dir("wf_no_plans");
    let (transcript, _) = write_inputs(&dir);
    let client = ScriptedClient::ok(Vec::<String>::new());
    let config = WorkflowConfig {
        phases: vec![2],
        ..config(&dir, transcript, None)
    };

    let err = run_analysis_workflow(&config, &client).await.unwrap_err();
    assert!(err.to_string().contains("--plans-file"));
    assert_eq!(client.calls(), 0);

    cleanup_temp_dir(&dir);
}

#[tokio::test]
async fn test_missing_transcript_fails_before_any_call() {
    let dir = create_temp_dir("wf_no_transcript");
    let (_, sections) = write_inputs(&dir);
    let client = ScriptedClient::ok(Vec::<String>::new());

    let result = run_analysis_workflow(
        &config(&dir, dir.join("missing.txt"), Some(sections)),
        &client,
    )
    .await;

    assert!(result.is_err());
    assert_eq!(client.calls(), 0);
    assert!(!dir.join("OUTPUT").exists());

    cleanup_temp_dir(&dir);
}

#[tokio::test]
async fn test_blank_transcript_fails() {
    let dir = create_temp_dir("wf_blank_transcript");
    let (transcript, sections) = write_inputs(&dir);
    std::fs::write(&transcript, "  \n ").unwrap();
    let client = ScriptedClient::ok(Vec::<String>::new());

    let result = run_analysis_workflow(&config(&dir, transcript, Some(sections)), &client).await;

    assert!(result.is_err());
    assert_eq!(client.calls(), 0);

    cleanup_temp_dir(&dir);
}

#[tokio::test]
async fn test_no_enabled_sections_fails() {
    let dir = create_temp_dir("wf_no_sections");
    let (transcript, sections) = write_inputs(&dir);
    std::fs::write(&sections, "- id: a\n  name: Alpha\n  enabled: false\n").unwrap();
    let client = ScriptedClient::ok(Vec::<String>::new());

    let result = run_analysis_workflow(&config(&dir, transcript, Some(sections)), &client).await;

    assert!(result.is_err());
    assert_eq!(client.calls(), 0);

    cleanup_temp_dir(&dir);
}

#[tokio::test]
async fn test_phase_one_requires_sections_file() {
    let dir = create_temp_dir("wf_no_sections_file");
    let (transcript, _) = write_inputs(&dir);
    let client = ScriptedClient::ok(Vec::<String>::new());

    let err = run_analysis_workflow(&config(&dir, transcript, None), &client)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("--sections"));
    assert_eq!(client.calls(), 0);

    cleanup_temp_dir(&dir);
}

#[tokio::test]
async fn test_unknown_phase_is_rejected() {
    let dir = create_temp_dir("wf_bad_phase");
    let (transcript, sections) = write_inputs(&dir);
    let client = ScriptedClient::ok(Vec::<String>::new());
    let config = WorkflowConfig {
        phases: vec![1, 3],
        ..config(&dir, transcript, Some(sections))
    };

    assert!(run_analysis_workflow(&config, &client).await.is_err());
    assert_eq!(client.calls(), 0);

    cleanup_temp_dir(&dir);
}
