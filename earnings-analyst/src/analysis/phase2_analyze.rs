//! Stage 2: Section analysis
//!
//! Executes each research plan from stage 1 against the transcript and
//! produces the structured section content a report renderer consumes:
//! a section statement plus subsections of attributed, sentiment-tagged
//! quotes.

use serde_json::json;

use super::context::PromptLimits;
use super::orchestrator::Stage;
use super::prompts::{
    current_section_block, downstream_block, output_shape_block, prior_block, summarize_analysis,
    PromptParts, BASE_INSTRUCTIONS,
};
use super::types::{AnalysisTarget, SectionAnalysisRecord, SectionDescriptor};
use crate::workflow_utils::{extract_record, ExtractionTier, OutputShape};

/// Key every accepted analysis record must carry
pub const ANALYSIS_DISCRIMINATOR: &str = "section_name";

/// Quote selection and attribution rules
pub const ANALYSIS_METHODOLOGY: &str = "\
- Quote the transcript verbatim. Do not paraphrase inside `quote`; mark the key \
phrase with **double asterisks**.
- Use `context` for one sentence explaining what prompted the remark, or null \
when the quote stands on its own.
- Attribute every quote with the speaker's name, title and company exactly as \
introduced on the call. Use \"Unknown\" for any part you cannot determine.
- Label sentiment as one of positive, negative, neutral or mixed, with a short \
rationale grounded in the wording.
- List every figure the quote contains in `metrics` (e.g. \"NIM 2.85%\", \
\"CET1 13.6%\"); use an empty list when there are none.
- Prefer management's prepared remarks for guidance and the Q&A for \
clarifications and pushback.";

const ANALYSIS_TASK: &str = "\
Execute the research plan for the current section. Write a `section_statement` \
of two to four sentences synthesizing the section, then group the supporting \
quotes into the subsections the plan proposes. Drop a planned subsection if the \
transcript has nothing for it rather than padding it.";

pub fn analysis_output_shape() -> OutputShape {
    OutputShape::new(
        ANALYSIS_DISCRIMINATOR,
        &[ANALYSIS_DISCRIMINATOR, "section_title", "section_statement", "content"],
    )
}

fn analysis_skeleton() -> serde_json::Value {
    json!({
        "section_name": "<section name>",
        "section_title": "<display title>",
        "section_statement": "<two to four sentence synthesis>",
        "content": [
            {
                "subsection_title": "<heading>",
                "quotes": [
                    {
                        "quote": "<verbatim text with **emphasis**>",
                        "context": "<what prompted it, or null>",
                        "speaker": {"name": "<name>", "title": "<title>", "company": "<company>"},
                        "sentiment": {"label": "positive|negative|neutral|mixed", "rationale": "<why>"},
                        "metrics": ["<figure>"]
                    }
                ]
            }
        ]
    })
}

fn target_block(target: &AnalysisTarget) -> String {
    let plan = serde_json::to_string_pretty(&target.plan).unwrap_or_default();
    format!(
        "{}\n\nResearch plan:\n```json\n{}\n```",
        current_section_block(&target.descriptor),
        plan
    )
}

/// Compose the analysis prompt for `current`
pub fn analysis_prompt(
    current: &AnalysisTarget,
    prior: &[SectionAnalysisRecord],
    downstream: &[AnalysisTarget],
    source_text: &str,
    limits: &PromptLimits,
) -> String {
    PromptParts {
        base: BASE_INSTRUCTIONS,
        methodology: Some(ANALYSIS_METHODOLOGY),
        prior: prior_block(prior.iter().map(|r| summarize_analysis(r, limits)).collect()),
        current: target_block(current),
        downstream: downstream_block(downstream.iter().map(|t| &t.descriptor)),
        source_text,
        task: ANALYSIS_TASK.to_string(),
        output_shape: output_shape_block(&analysis_output_shape(), &analysis_skeleton()),
    }
    .render()
}

/// Parse an analysis response, falling back to a minimal analysis
pub fn extract_analysis(
    raw: &str,
    section: &SectionDescriptor,
) -> (SectionAnalysisRecord, ExtractionTier) {
    match extract_record::<SectionAnalysisRecord>(raw, ANALYSIS_DISCRIMINATOR) {
        Some((record, tier)) => (record.normalize(section), tier),
        None => (
            SectionAnalysisRecord::fallback(section),
            ExtractionTier::Fallback,
        ),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisStage;

impl Stage for AnalysisStage {
    type Input = AnalysisTarget;
    type Record = SectionAnalysisRecord;

    fn number(&self) -> usize {
        2
    }

    fn name(&self) -> &str {
        "Section Analysis"
    }

    fn key(&self) -> &str {
        "section_analysis"
    }

    fn section<'a>(&self, input: &'a AnalysisTarget) -> &'a SectionDescriptor {
        &input.descriptor
    }

    fn output_shape(&self) -> OutputShape {
        analysis_output_shape()
    }

    fn compose_prompt(
        &self,
        current: &AnalysisTarget,
        prior: &[SectionAnalysisRecord],
        downstream: &[AnalysisTarget],
        source_text: &str,
        limits: &PromptLimits,
    ) -> String {
        analysis_prompt(current, prior, downstream, source_text, limits)
    }

    fn extract(
        &self,
        raw: &str,
        current: &AnalysisTarget,
    ) -> (SectionAnalysisRecord, ExtractionTier) {
        extract_analysis(raw, &current.descriptor)
    }
}
