//! Sequential section orchestrator
//!
//! Drives one stage over an ordered list of inputs. Each step composes a
//! prompt from the current input, the records completed so far and the
//! inputs still ahead, calls the model, extracts a record, appends it and
//! rewrites the stage snapshot. A model error skips the section: it gets no
//! record and never shows up in later prompts.

use anyhow::Result;
use chrono::Utc;
use earnings_analyst_sdk::{
    log_debug, log_extraction, log_info, log_progress, log_snapshot, log_stage_complete,
    log_stage_failed, log_stage_start, log_warning,
};
use serde::Serialize;
use std::path::PathBuf;

use super::context::{PromptLimits, RunContext};
use super::snapshot::{SnapshotMetadata, SnapshotStore};
use super::types::SectionDescriptor;
use crate::workflow_utils::{
    execute_step, ExtractionTier, ModelClient, ModelError, ModelRequest, OutputShape, StepContext,
};

/// One pipeline stage: how to prompt for a section and how to read the answer
pub trait Stage {
    /// Work item for one step
    type Input;
    /// What one successful step appends
    type Record: Serialize;

    /// 1-based stage number used in logs
    fn number(&self) -> usize;

    /// Human-readable stage name
    fn name(&self) -> &str;

    /// Machine label recorded in snapshot metadata and task ids
    fn key(&self) -> &str;

    fn section<'a>(&self, input: &'a Self::Input) -> &'a SectionDescriptor;

    fn output_shape(&self) -> OutputShape;

    fn system_prompt(&self) -> Option<String> {
        None
    }

    fn compose_prompt(
        &self,
        current: &Self::Input,
        prior: &[Self::Record],
        downstream: &[Self::Input],
        source_text: &str,
        limits: &PromptLimits,
    ) -> String;

    /// Never fails: unusable responses become a fallback record
    fn extract(&self, raw: &str, current: &Self::Input) -> (Self::Record, ExtractionTier);
}

/// Result of running one stage to the end
#[derive(Debug, Clone)]
pub struct StageOutput<R> {
    /// Completed records in input order, skipped sections omitted
    pub items: Vec<R>,
    /// Ids of sections skipped after a model error
    pub failed_sections: Vec<String>,
    pub snapshot_path: PathBuf,
}

pub struct SectionOrchestrator<'a> {
    client: &'a dyn ModelClient,
    ctx: &'a RunContext,
}

impl<'a> SectionOrchestrator<'a> {
    pub fn new(client: &'a dyn ModelClient, ctx: &'a RunContext) -> Self {
        Self { client, ctx }
    }

    /// Run `stage` over `inputs` in order.
    ///
    /// Only snapshot write failures are returned as errors.
    pub async fn run<S: Stage>(
        &self,
        stage: &S,
        inputs: &[S::Input],
        source_text: &str,
        store: &SnapshotStore,
    ) -> Result<StageOutput<S::Record>> {
        let settings = &self.ctx.settings;
        let total = inputs.len();

        log_stage_start!(stage.number(), stage.name(), total);

        let mut completed: Vec<S::Record> = Vec::with_capacity(total);
        let mut failed_sections: Vec<String> = Vec::new();
        let mut metadata = SnapshotMetadata::new(self.ctx, stage.key(), total);

        for (index, current) in inputs.iter().enumerate() {
            let section_id = stage.section(current).display_id().to_string();
            let downstream = &inputs[index + 1..];

            let prompt = stage.compose_prompt(
                current,
                &completed,
                downstream,
                source_text,
                &settings.limits,
            );
            let request = ModelRequest {
                task_id: format!("{}_{}", stage.key(), section_id),
                system_prompt: stage.system_prompt(),
                prompt,
                shape: stage.output_shape(),
            };
            let step = StepContext {
                stage: stage.number(),
                position: index + 1,
                total,
            };

            let client = self.client;
            let debug = settings.debug;
            let id = section_id.as_str();
            let outcome = execute_step(id, step, || async move {
                let raw = client.complete(request).await?;
                if debug {
                    log_debug!("Raw response for {}:\n{}", id, raw);
                }
                let (record, tier) = stage.extract(&raw, current);
                log_extraction!(id, tier);
                if tier == ExtractionTier::Fallback {
                    log_warning!("{}: no structured record in response, using fallback", id);
                }
                Ok::<_, ModelError>((record, format!("Extracted via {}", tier)))
            })
            .await;

            match outcome {
                Ok(record) => completed.push(record),
                Err(e) => {
                    log_warning!("Skipping section {}: {}", section_id, e);
                    failed_sections.push(section_id);
                }
            }

            metadata.updated_at = Utc::now();
            metadata.completed_sections = completed.len();
            metadata.failed_sections = failed_sections.clone();
            if let Err(e) = store.write(&metadata, &completed).await {
                log_stage_failed!(stage.number(), stage.name(), format!("{:#}", e));
                return Err(e);
            }
            log_snapshot!(stage.number(), store.path().display(), completed.len());
            log_progress!(index + 1, total, "sections");

            if index + 1 < total && !settings.step_delay.is_zero() {
                tokio::time::sleep(settings.step_delay).await;
            }
        }

        if completed.len() < total {
            log_info!(
                "{}: {} of {} sections completed",
                stage.name(),
                completed.len(),
                total
            );
        }
        log_stage_complete!(stage.number(), stage.name(), completed.len(), total);

        Ok(StageOutput {
            items: completed,
            failed_sections,
            snapshot_path: store.path().to_path_buf(),
        })
    }
}
