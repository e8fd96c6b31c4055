//! Workflow orchestration for the transcript analysis pipeline
//!
//! The primary entry point is [`run_analysis_workflow`], which checks every
//! precondition up front, then runs research planning (stage 1) and section
//! analysis (stage 2) according to the provided [`WorkflowConfig`].
//!
//! Stage 2 starts only after the stage 1 snapshot is fully written, and reads
//! its work list from the persisted plan records rather than from the section
//! template.

use anyhow::{bail, Context, Result};
use chrono::Local;
use earnings_analyst_sdk::{
    log_file_saved, log_info, log_stage_complete_console, log_stage_start_console, log_warning,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

use super::cli::Provider;
use super::context::{PipelineSettings, PromptLimits, RunContext, DEFAULT_STEP_DELAY};
use super::inputs::{load_sections, load_transcript};
use super::orchestrator::{SectionOrchestrator, StageOutput};
use super::phase1_plan::PlanningStage;
use super::phase2_analyze::AnalysisStage;
use super::snapshot::{load_items, SnapshotStore};
use super::types::{AnalysisTarget, ResearchPlanRecord, SectionDescriptor};
use crate::workflow_utils::{ClaudeAgentClient, ModelClient, OpenAiClient};

/// Configuration for the analysis workflow
///
/// # Examples
///
/// ```no_run
/// use earnings_analyst::analysis::WorkflowConfig;
///
/// // Analysis only, resuming from saved plans
/// let config = WorkflowConfig {
///     transcript: "calls/q3.txt".into(),
///     phases: vec![2],
///     plans_file: Some("OUTPUT/research_plans_20250101_120000.json".into()),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub transcript: PathBuf,
    /// Section template (required for phase 1)
    pub sections_file: Option<PathBuf>,
    /// Which phases to execute (1-2)
    pub phases: Vec<u32>,
    /// Saved plans snapshot (required for phase 2 without phase 1)
    pub plans_file: Option<PathBuf>,
    pub provider: Provider,
    pub model: String,
    pub output_dir: PathBuf,
    pub step_delay: Duration,
    pub limits: PromptLimits,
    pub debug: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            transcript: PathBuf::new(),
            sections_file: None,
            phases: vec![1, 2],
            plans_file: None,
            provider: Provider::Claude,
            model: Provider::Claude.default_model().to_string(),
            output_dir: PathBuf::from("./OUTPUT"),
            step_delay: DEFAULT_STEP_DELAY,
            limits: PromptLimits::default(),
            debug: false,
        }
    }
}

impl WorkflowConfig {
    fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            step_delay: self.step_delay,
            limits: self.limits,
            debug: self.debug,
            output_dir: self.output_dir.clone(),
        }
    }
}

/// Build the model client selected by `config`, reading API keys from the
/// environment
pub fn build_client(config: &WorkflowConfig) -> Result<Box<dyn ModelClient>> {
    match config.provider {
        Provider::Claude => {
            if std::env::var("ANTHROPIC_API_KEY").is_err() {
                log_info!("ANTHROPIC_API_KEY not set, relying on the Claude CLI login");
            }
            Ok(Box::new(ClaudeAgentClient::new(&config.model, config.debug)))
        }
        Provider::Openai => {
            let api_key = std::env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY must be set for --provider openai")?;
            let mut client = OpenAiClient::new(api_key, &config.model, config.debug);
            if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
                client = client.with_base_url(base_url);
            }
            Ok(Box::new(client))
        }
    }
}

/// Map persisted plan records to stage 2 work items, in record order
pub fn analysis_targets(plans: &[ResearchPlanRecord]) -> Vec<AnalysisTarget> {
    plans.iter().map(AnalysisTarget::from_plan_record).collect()
}

/// Counts for one finished stage
#[derive(Debug, Clone, PartialEq)]
pub struct StageSummary {
    pub name: String,
    pub total: usize,
    pub completed: usize,
    pub failed_sections: Vec<String>,
    pub snapshot_path: PathBuf,
}

impl StageSummary {
    fn new<R>(name: &str, total: usize, output: &StageOutput<R>) -> Self {
        Self {
            name: name.to_string(),
            total,
            completed: output.items.len(),
            failed_sections: output.failed_sections.clone(),
            snapshot_path: output.snapshot_path.clone(),
        }
    }
}

/// What a workflow run produced
#[derive(Debug, Clone, Default)]
pub struct WorkflowSummary {
    pub run_id: String,
    pub planning: Option<StageSummary>,
    pub analysis: Option<StageSummary>,
}

impl WorkflowSummary {
    pub fn print(&self) {
        println!("\n{}", "=".repeat(80));
        println!("RUN SUMMARY ({})", self.run_id);
        println!("{}", "=".repeat(80));
        for stage in [&self.planning, &self.analysis].into_iter().flatten() {
            println!(
                "{}: {}/{} sections -> {}",
                stage.name,
                stage.completed,
                stage.total,
                stage.snapshot_path.display()
            );
            if !stage.failed_sections.is_empty() {
                log_warning!("{} skipped: {}", stage.name, stage.failed_sections.join(", "));
            }
        }
    }
}

/// Run the analysis workflow with the given configuration
///
/// # Errors
///
/// Returns an error before any model call if:
/// - no phase, or an unknown phase, is selected
/// - phase 1 runs without a section template, or the template has no enabled sections
/// - the transcript is missing or blank
/// - phase 2 runs alone without `plans_file`, or the plans file is empty
///
/// and during the run if a snapshot cannot be written. When every planning
/// step is skipped, analysis does not run and the summary has no analysis
/// stage.
pub async fn run_analysis_workflow(
    config: &WorkflowConfig,
    client: &dyn ModelClient,
) -> Result<WorkflowSummary> {
    let run_planning = config.phases.contains(&1);
    let run_analysis = config.phases.contains(&2);

    // Validate required arguments based on phases
    if config.phases.is_empty() || config.phases.iter().any(|p| !(1..=2).contains(p)) {
        bail!("--phases must list 1, 2 or both (got {:?})", config.phases);
    }
    if run_analysis && !run_planning && config.plans_file.is_none() {
        bail!("--plans-file is required when running phase 2 without phase 1");
    }

    let sections: Vec<SectionDescriptor> = if run_planning {
        let Some(sections_file) = &config.sections_file else {
            bail!("--sections is required when running phase 1");
        };
        load_sections(sections_file).await?
    } else {
        Vec::new()
    };

    let transcript = load_transcript(&config.transcript).await?;

    let mut plans: Vec<ResearchPlanRecord> = Vec::new();
    if !run_planning {
        if let Some(plans_file) = &config.plans_file {
            plans = load_items(plans_file).await?;
            log_info!("Loaded {} research plans from {}", plans.len(), plans_file.display());
            if plans.is_empty() {
                bail!("No research plans in {}", plans_file.display());
            }
        }
    }

    fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.output_dir.display()))?;

    let ctx = RunContext::new(
        vec![config.transcript.display().to_string()],
        client.name(),
        config.settings(),
    );
    let orchestrator = SectionOrchestrator::new(client, &ctx);
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let mut summary = WorkflowSummary {
        run_id: ctx.run_id.clone(),
        ..Default::default()
    };

    // Stage 1: Research planning
    if run_planning {
        log_stage_start_console!(
            1,
            "Research Planning",
            format!("Planning {} sections", sections.len())
        );

        let store = SnapshotStore::new(
            ctx.settings
                .output_dir
                .join(format!("research_plans_{}.json", timestamp)),
        );
        let output = orchestrator
            .run(&PlanningStage, &sections, &transcript, &store)
            .await?;

        log_file_saved!(store.path().display());
        log_stage_complete_console!(1);

        summary.planning = Some(StageSummary::new("Research Planning", sections.len(), &output));
        plans = output.items;
    }

    // Stage 2: Section analysis
    if run_analysis {
        let targets = analysis_targets(&plans);
        if targets.is_empty() {
            log_warning!("No research plans were produced, skipping section analysis");
            return Ok(summary);
        }

        log_stage_start_console!(
            2,
            "Section Analysis",
            format!("Analyzing {} sections", targets.len())
        );

        let store = SnapshotStore::new(
            ctx.settings
                .output_dir
                .join(format!("section_analyses_{}.json", timestamp)),
        );
        let output = orchestrator
            .run(&AnalysisStage, &targets, &transcript, &store)
            .await?;

        log_file_saved!(store.path().display());
        log_stage_complete_console!(2);

        summary.analysis = Some(StageSummary::new("Section Analysis", targets.len(), &output));
    }

    Ok(summary)
}
