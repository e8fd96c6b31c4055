//! Stage 1: Research planning
//!
//! Produces one research plan per report section. Each plan records what the
//! transcript actually offers for the section, which quotes and metrics to
//! pull, and how to organize them, taking already planned sections into
//! account so later sections do not re-plan the same material.
//!
//! The stage output is persisted to `research_plans_<timestamp>.json` and is
//! the only input of stage 2.

use serde_json::json;

use super::context::PromptLimits;
use super::orchestrator::Stage;
use super::prompts::{
    current_section_block, downstream_block, output_shape_block, prior_block, summarize_plan,
    PromptParts, BASE_INSTRUCTIONS,
};
use super::types::{ResearchPlanRecord, SectionDescriptor};
use crate::workflow_utils::{extract_record, ExtractionTier, OutputShape};

/// Key every accepted planning record must carry
pub const PLAN_DISCRIMINATOR: &str = "research_plan";

const PLANNING_TASK: &str = "\
Plan the research for the current section only.
1. Inventory what the transcript offers for this section and bucket it into \
high, medium and low priority.
2. Choose an extraction approach and list the specific quotes and metrics to \
capture.
3. Propose an ordered list of subsection headings.
4. Note how this section connects to the prior sections without repeating \
their material, and which topics to leave for the downstream sections.
5. Flag quality risks such as forward-looking statements, non-GAAP figures or \
ambiguous attributions.
Include a one-sentence `description` of what the finished section must cover.";

pub fn plan_output_shape() -> OutputShape {
    OutputShape::new(PLAN_DISCRIMINATOR, &["section_id", "section_name", PLAN_DISCRIMINATOR])
}

fn plan_skeleton() -> serde_json::Value {
    json!({
        "section_id": "<section id>",
        "section_name": "<section name>",
        "research_plan": {
            "description": "<what this section must cover>",
            "content_availability": {
                "high_priority": ["<topic>"],
                "medium_priority": ["<topic>"],
                "low_priority": ["<topic>"]
            },
            "extraction_strategy": {
                "approach": "<how to extract>",
                "quote_targets": ["<quote to capture>"],
                "metric_targets": ["<metric to capture>"]
            },
            "organization": {
                "structure": ["<subsection heading>"]
            },
            "integration_notes": ["<link to prior or downstream section>"],
            "quality_considerations": ["<risk>"]
        }
    })
}

/// Compose the planning prompt for `current`
pub fn planning_prompt(
    current: &SectionDescriptor,
    prior: &[ResearchPlanRecord],
    downstream: &[SectionDescriptor],
    source_text: &str,
    limits: &PromptLimits,
) -> String {
    PromptParts {
        base: BASE_INSTRUCTIONS,
        methodology: None,
        prior: prior_block(prior.iter().map(|r| summarize_plan(r, limits)).collect()),
        current: current_section_block(current),
        downstream: downstream_block(downstream),
        source_text,
        task: PLANNING_TASK.to_string(),
        output_shape: output_shape_block(&plan_output_shape(), &plan_skeleton()),
    }
    .render()
}

/// Parse a planning response, falling back to a minimal plan
pub fn extract_plan(
    raw: &str,
    section: &SectionDescriptor,
) -> (ResearchPlanRecord, ExtractionTier) {
    match extract_record::<ResearchPlanRecord>(raw, PLAN_DISCRIMINATOR) {
        Some((mut record, tier)) => {
            record.format = None;
            (record.normalize(section), tier)
        }
        None => (
            ResearchPlanRecord::fallback(section, raw),
            ExtractionTier::Fallback,
        ),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlanningStage;

impl Stage for PlanningStage {
    type Input = SectionDescriptor;
    type Record = ResearchPlanRecord;

    fn number(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "Research Planning"
    }

    fn key(&self) -> &str {
        "research_planning"
    }

    fn section<'a>(&self, input: &'a SectionDescriptor) -> &'a SectionDescriptor {
        input
    }

    fn output_shape(&self) -> OutputShape {
        plan_output_shape()
    }

    fn compose_prompt(
        &self,
        current: &SectionDescriptor,
        prior: &[ResearchPlanRecord],
        downstream: &[SectionDescriptor],
        source_text: &str,
        limits: &PromptLimits,
    ) -> String {
        planning_prompt(current, prior, downstream, source_text, limits)
    }

    fn extract(
        &self,
        raw: &str,
        current: &SectionDescriptor,
    ) -> (ResearchPlanRecord, ExtractionTier) {
        extract_plan(raw, current)
    }
}
