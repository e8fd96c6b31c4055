//! Earnings call transcript analysis workflow
//!
//! Two sequential stages run over an ordered list of report sections:
//! research planning, then section analysis. Each step sees the records
//! completed before it and a preview of the sections still ahead, and every
//! model response goes through tiered JSON extraction with a deterministic
//! fallback.

pub mod cli;
pub mod context;
pub mod inputs;
pub mod lenient;
pub mod orchestrator;
pub mod phase1_plan;
pub mod phase2_analyze;
pub mod prompts;
pub mod snapshot;
pub mod types;
pub mod workflow;

// Re-export commonly used types
pub use context::{PipelineSettings, PromptLimits, RunContext};
pub use orchestrator::{SectionOrchestrator, Stage, StageOutput};
pub use phase1_plan::PlanningStage;
pub use phase2_analyze::AnalysisStage;
pub use snapshot::{Snapshot, SnapshotMetadata, SnapshotStore};
pub use types::{
    AnalysisTarget, Quote, ResearchPlan, ResearchPlanRecord, SectionAnalysisRecord,
    SectionDescriptor, Sentiment, SentimentLabel, Speaker, Subsection,
};
pub use workflow::{build_client, run_analysis_workflow, WorkflowConfig, WorkflowSummary};
