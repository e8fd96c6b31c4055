//! Section step execution with automatic logging

use earnings_analyst_sdk::{log_section_complete, log_section_skipped, log_section_start};
use std::fmt::Display;
use std::future::Future;

/// Position of one step within a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepContext {
    pub stage: usize,
    /// 1-based
    pub position: usize,
    pub total: usize,
}

/// Execute one section step with automatic logging
///
/// Wraps step execution with:
/// - `log_section_start` before execution
/// - `log_section_complete` on success, with the executor's summary
/// - `log_section_skipped` on error
///
/// # Example
/// ```rust,ignore
/// let record = execute_step("credit", ctx, || async {
///     let raw = client.complete(request).await?;
///     Ok((raw, "Response received".to_string()))
/// })
/// .await?;
/// ```
pub async fn execute_step<F, Fut, R, E>(
    section_id: &str,
    ctx: StepContext,
    executor: F,
) -> Result<R, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(R, String), E>>,
    E: Display,
{
    log_section_start!(ctx.stage, section_id, ctx.position, ctx.total);

    match executor().await {
        Ok((result, summary)) => {
            log_section_complete!(section_id, summary);
            Ok(result)
        }
        Err(e) => {
            log_section_skipped!(section_id, e.to_string());
            Err(e)
        }
    }
}
