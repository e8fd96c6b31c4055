//! Prompt building blocks shared by the planning and analysis stages
//!
//! Every prompt is assembled from the same ordered blocks; stages only
//! differ in what they put in each one. All functions here are pure.

use serde_json::Value;

use super::context::PromptLimits;
use super::types::{ResearchPlanRecord, SectionAnalysisRecord, SectionDescriptor};
use crate::workflow_utils::OutputShape;

/// Rendered in place of an empty prior-context list
pub const NO_PRIOR_CONTEXT: &str = "No prior sections have been completed yet.";

/// Rendered in place of an empty downstream list
pub const NO_DOWNSTREAM_SECTIONS: &str = "No downstream sections remain after this one.";

/// Role and ground rules common to both stages
pub const BASE_INSTRUCTIONS: &str = "\
You are a senior equity research analyst preparing a structured report from an \
earnings call transcript. Work only from the transcript provided. Never invent \
figures, quotes or speakers. Each report section has its own scope: build on the \
sections already completed without repeating them, and leave topics that belong \
to later sections for those sections.";

/// Blocks of one prompt, rendered in field order
#[derive(Debug, Clone)]
pub struct PromptParts<'a> {
    pub base: &'a str,
    /// Analysis stage only
    pub methodology: Option<&'a str>,
    pub prior: String,
    pub current: String,
    pub downstream: String,
    pub source_text: &'a str,
    pub task: String,
    pub output_shape: String,
}

impl PromptParts<'_> {
    pub fn render(&self) -> String {
        let mut blocks: Vec<String> = vec![self.base.trim().to_string()];
        if let Some(methodology) = self.methodology {
            blocks.push(format!("# Methodology\n{}", methodology.trim()));
        }
        blocks.push(format!("# Prior Sections\n{}", self.prior));
        blocks.push(format!("# Current Section\n{}", self.current));
        blocks.push(format!("# Downstream Sections\n{}", self.downstream));
        blocks.push(format!(
            "# Transcript\n<transcript>\n{}\n</transcript>",
            self.source_text.trim()
        ));
        blocks.push(format!("# Task\n{}", self.task.trim()));
        blocks.push(format!("# Output Format\n{}", self.output_shape));
        blocks.join("\n\n")
    }
}

/// Full description of the section being worked on
pub fn current_section_block(section: &SectionDescriptor) -> String {
    format!(
        "ID: {}\nName: {}\nRequirements: {}",
        section.display_id(),
        section.display_name(),
        section.display_description()
    )
}

/// One line per downstream section, or [`NO_DOWNSTREAM_SECTIONS`]
pub fn downstream_block<'a>(downstream: impl IntoIterator<Item = &'a SectionDescriptor>) -> String {
    let lines: Vec<String> = downstream
        .into_iter()
        .map(|s| {
            format!(
                "- {} ({}): {}",
                s.display_name(),
                s.display_id(),
                s.display_description()
            )
        })
        .collect();

    if lines.is_empty() {
        NO_DOWNSTREAM_SECTIONS.to_string()
    } else {
        lines.join("\n")
    }
}

/// Prior summaries in completion order, or [`NO_PRIOR_CONTEXT`]
pub fn prior_block(summaries: Vec<String>) -> String {
    if summaries.is_empty() {
        NO_PRIOR_CONTEXT.to_string()
    } else {
        summaries.join("\n\n")
    }
}

/// Abridged planning record: name plus the first high-priority items
pub fn summarize_plan(record: &ResearchPlanRecord, limits: &PromptLimits) -> String {
    let mut summary = format!("## {}", display_or(&record.section_name, &record.section_id));
    let items = &record.research_plan.content_availability.high_priority;
    if items.is_empty() {
        summary.push_str("\nHigh priority: none identified");
    } else {
        summary.push_str("\nHigh priority:");
        for item in items.iter().take(limits.max_priority_items) {
            summary.push_str(&format!("\n- {}", item));
        }
    }
    summary
}

/// Abridged analysis record: truncated statement plus subsection titles
pub fn summarize_analysis(record: &SectionAnalysisRecord, limits: &PromptLimits) -> String {
    let title = display_or(&record.section_title, &record.section_name);
    let mut summary = format!(
        "## {}\nStatement: {}",
        title,
        truncate_chars(&record.section_statement, limits.max_statement_chars)
    );

    let titles: Vec<&str> = record
        .content
        .iter()
        .map(|s| s.subsection_title.as_str())
        .filter(|t| !t.trim().is_empty())
        .collect();
    if !titles.is_empty() {
        summary.push_str(&format!("\nSubsections: {}", titles.join("; ")));
    }
    summary
}

/// Required keys plus a skeleton of the expected object
pub fn output_shape_block(shape: &OutputShape, skeleton: &Value) -> String {
    let skeleton = serde_json::to_string_pretty(skeleton).unwrap_or_else(|_| skeleton.to_string());
    format!(
        "Respond with a single JSON object (the `{}` record) and nothing else.\n\
         Required top-level keys: {}\n\n```json\n{}\n```",
        shape.name,
        shape.required_keys.join(", "),
        skeleton
    )
}

/// First `max_chars` characters, with an ellipsis when cut
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

fn display_or<'a>(preferred: &'a str, fallback: &'a str) -> &'a str {
    if preferred.trim().is_empty() {
        fallback
    } else {
        preferred
    }
}
