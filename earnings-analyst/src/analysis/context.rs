//! Run-scoped settings passed explicitly to every collaborator

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Default pause between consecutive model calls
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_secs(2);

/// How much of each prior record is repeated in later prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptLimits {
    /// High-priority items listed per prior plan
    pub max_priority_items: usize,
    /// Characters of each prior section statement
    pub max_statement_chars: usize,
}

impl Default for PromptLimits {
    fn default() -> Self {
        Self {
            max_priority_items: 3,
            max_statement_chars: 400,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Sleep between steps, never after the last one
    pub step_delay: Duration,
    pub limits: PromptLimits,
    /// Log raw model output and extraction details
    pub debug: bool,
    pub output_dir: PathBuf,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            step_delay: DEFAULT_STEP_DELAY,
            limits: PromptLimits::default(),
            debug: false,
            output_dir: PathBuf::from("./OUTPUT"),
        }
    }
}

/// Identity and settings of one pipeline run
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    /// Source documents the run reads from, e.g. the transcript path
    pub source_ids: Vec<String>,
    /// Model label recorded in snapshot metadata
    pub model: String,
    pub settings: PipelineSettings,
}

impl RunContext {
    pub fn new(
        source_ids: Vec<String>,
        model: impl Into<String>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            source_ids,
            model: model.into(),
            settings,
        }
    }
}
