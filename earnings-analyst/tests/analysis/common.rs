//! Common utilities for analysis module tests

#![allow(dead_code)]

use async_trait::async_trait;
use earnings_analyst::analysis::{
    PipelineSettings, PromptLimits, RunContext, SectionDescriptor, Stage,
};
use earnings_analyst::workflow_utils::json::extract_record;
use earnings_analyst::workflow_utils::{
    ExtractionTier, ModelClient, ModelError, ModelRequest, OutputShape,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Create a temporary test directory
pub fn create_temp_dir(name: &str) -> PathBuf {
    let temp_dir = env::temp_dir().join(format!(
        "earnings_analyst_test_{}_{}",
        name,
        uuid::Uuid::new_v4()
    ));
    std::fs::create_dir_all(&temp_dir).unwrap();
    temp_dir
}

/// Clean up a temporary directory
pub fn cleanup_temp_dir(path: &PathBuf) {
    if path.exists() {
        let _ = std::fs::remove_dir_all(path);
    }
}

pub fn section(id: &str, name: &str) -> SectionDescriptor {
    SectionDescriptor::new(id, name, format!("Cover {}", name))
}

pub fn abc_sections() -> Vec<SectionDescriptor> {
    vec![
        section("a", "Alpha"),
        section("b", "Bravo"),
        section("c", "Charlie"),
    ]
}

/// Run context with no throttle delay
pub fn test_ctx(output_dir: &Path) -> RunContext {
    RunContext::new(
        vec!["transcript.txt".to_string()],
        "scripted",
        PipelineSettings {
            step_delay: Duration::ZERO,
            output_dir: output_dir.to_path_buf(),
            ..Default::default()
        },
    )
}

/// Model client that replays queued responses and records every request.
///
/// Once the queue is empty every call fails.
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<String, ModelError>>>,
    requests: Mutex<Vec<ModelRequest>>,
    /// Snapshot read at the start of every call, if set
    watch: Option<PathBuf>,
    observed_items: Mutex<Vec<Option<usize>>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<Result<String, ModelError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            watch: None,
            observed_items: Mutex::new(Vec::new()),
        }
    }

    pub fn ok<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        Self::new(responses.into_iter().map(|r| Ok(r.into())).collect())
    }

    /// Record the snapshot item count at `path` at the start of every call
    pub fn watching(mut self, path: impl Into<PathBuf>) -> Self {
        self.watch = Some(path.into());
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.prompt.clone())
            .collect()
    }

    pub fn task_ids(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.task_id.clone())
            .collect()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn observed_items(&self) -> Vec<Option<usize>> {
        self.observed_items.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ModelRequest) -> Result<String, ModelError> {
        if let Some(path) = &self.watch {
            let items = std::fs::read_to_string(path)
                .ok()
                .and_then(|content| serde_json::from_str::<Value>(&content).ok())
                .and_then(|snapshot| snapshot["items"].as_array().map(|a| a.len()));
            self.observed_items.lock().unwrap().push(items);
        }

        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::MalformedResponse("script exhausted".to_string())))
    }
}

/// What a stage saw when composing one prompt
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub current: String,
    pub prior: Vec<String>,
    pub downstream: Vec<String>,
}

/// Stage whose records are `{"id": ...}` objects; records what each
/// prompt was composed from
#[derive(Default)]
pub struct RecordingStage {
    observations: Mutex<Vec<Observation>>,
}

impl RecordingStage {
    pub fn observations(&self) -> Vec<Observation> {
        self.observations.lock().unwrap().clone()
    }
}

impl Stage for RecordingStage {
    type Input = SectionDescriptor;
    type Record = Value;

    fn number(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "Recording"
    }

    fn key(&self) -> &str {
        "recording"
    }

    fn section<'a>(&self, input: &'a SectionDescriptor) -> &'a SectionDescriptor {
        input
    }

    fn output_shape(&self) -> OutputShape {
        OutputShape::new("recording", &["id"])
    }

    fn compose_prompt(
        &self,
        current: &SectionDescriptor,
        prior: &[Value],
        downstream: &[SectionDescriptor],
        _source_text: &str,
        _limits: &PromptLimits,
    ) -> String {
        let observation = Observation {
            current: current.id.clone(),
            prior: prior
                .iter()
                .map(|r| r["id"].as_str().unwrap_or_default().to_string())
                .collect(),
            downstream: downstream.iter().map(|s| s.id.clone()).collect(),
        };
        self.observations.lock().unwrap().push(observation);
        format!("prompt for {}", current.id)
    }

    fn extract(&self, raw: &str, current: &SectionDescriptor) -> (Value, ExtractionTier) {
        extract_record::<Value>(raw, "id").unwrap_or_else(|| {
            (
                json!({"id": current.id, "fallback": true}),
                ExtractionTier::Fallback,
            )
        })
    }
}

/// Response a [`RecordingStage`] accepts for `id`
pub fn record_response(id: &str) -> String {
    json!({ "id": id }).to_string()
}

/// Well-formed planning response for a section
pub fn plan_response(id: &str, name: &str, high_priority: &[&str]) -> String {
    json!({
        "section_id": id,
        "section_name": name,
        "research_plan": {
            "description": format!("{} requirements from the plan", name),
            "content_availability": {
                "high_priority": high_priority,
                "medium_priority": [],
                "low_priority": []
            },
            "extraction_strategy": {
                "approach": "quote management directly",
                "quote_targets": ["guidance"],
                "metric_targets": ["NIM"]
            },
            "organization": {"structure": ["Highlights"]},
            "integration_notes": [],
            "quality_considerations": []
        }
    })
    .to_string()
}

/// Well-formed analysis response for a section
pub fn analysis_response(name: &str, statement: &str) -> String {
    json!({
        "section_name": name,
        "section_title": name,
        "section_statement": statement,
        "content": [{
            "subsection_title": "Highlights",
            "quotes": [{
                "quote": "Net interest income rose **8%** year over year.",
                "context": null,
                "speaker": {"name": "Jane Doe", "title": "CFO", "company": "Example Bancorp"},
                "sentiment": {"label": "positive", "rationale": "growth"},
                "metrics": ["NII +8% YoY"]
            }]
        }]
    })
    .to_string()
}
