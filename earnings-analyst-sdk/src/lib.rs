//! Event log and console helpers shared by earnings-analyst pipelines.
//!
//! Pipelines report progress two ways:
//! - [`PipelineLog`] events, one JSON line per event on stderr prefixed with
//!   [`EVENT_PREFIX`], meant for machine consumers tailing the process
//! - colored console macros on stdout for the operator

use serde::{Deserialize, Serialize};

/// Prefix marking a structured event line on stderr
pub const EVENT_PREFIX: &str = "__EA_EVENT__:";

/// Structured logging events emitted by the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineLog {
    /// Stage started
    StageStarted {
        stage: usize,
        name: String,
        total_sections: usize,
    },
    /// Stage completed
    StageCompleted {
        stage: usize,
        name: String,
        completed: usize,
        total: usize,
    },
    /// Stage failed before or between steps
    StageFailed {
        stage: usize,
        name: String,
        error: String,
    },
    /// One section step started
    SectionStarted {
        stage: usize,
        section_id: String,
        position: usize,
        total: usize,
    },
    /// One section step appended a record
    SectionCompleted {
        section_id: String,
        result: Option<String>,
    },
    /// Model invocation failed, section left out of the run
    SectionSkipped {
        section_id: String,
        error: String,
    },
    /// Which extraction tier produced the record
    ExtractionResolved {
        section_id: String,
        tier: String,
    },
    /// Model call started
    ModelStarted {
        task_id: String,
        model: String,
        description: String,
    },
    /// Model output (streaming text)
    ModelMessage {
        task_id: String,
        model: String,
        message: String,
    },
    /// Model call finished
    ModelCompleted {
        task_id: String,
        model: String,
        result: Option<String>,
    },
    /// Model call failed
    ModelFailed {
        task_id: String,
        model: String,
        error: String,
    },
    /// Snapshot rewritten on disk
    SnapshotWritten {
        stage: usize,
        file_path: String,
        items: usize,
    },
}

impl PipelineLog {
    /// Render this event as a single prefixed line
    pub fn to_line(&self) -> Option<String> {
        serde_json::to_string(self)
            .ok()
            .map(|json| format!("{}{}", EVENT_PREFIX, json))
    }

    /// Emit this event to stderr
    pub fn emit(&self) {
        if let Some(line) = self.to_line() {
            use std::io::Write;
            eprintln!("{}", line);
            let _ = std::io::stderr().flush();
        }
    }

    /// Parse a stderr line back into an event, if it carries one
    pub fn parse_line(line: &str) -> Option<Self> {
        let json = line.trim().strip_prefix(EVENT_PREFIX)?;
        serde_json::from_str(json).ok()
    }
}

#[macro_export]
macro_rules! log_stage_start {
    ($stage:expr, $name:expr, $total:expr) => {
        $crate::PipelineLog::StageStarted {
            stage: $stage,
            name: $name.to_string(),
            total_sections: $total,
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_stage_complete {
    ($stage:expr, $name:expr, $completed:expr, $total:expr) => {
        $crate::PipelineLog::StageCompleted {
            stage: $stage,
            name: $name.to_string(),
            completed: $completed,
            total: $total,
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_stage_failed {
    ($stage:expr, $name:expr, $error:expr) => {
        $crate::PipelineLog::StageFailed {
            stage: $stage,
            name: $name.to_string(),
            error: $error.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_section_start {
    ($stage:expr, $section_id:expr, $position:expr, $total:expr) => {
        $crate::PipelineLog::SectionStarted {
            stage: $stage,
            section_id: $section_id.to_string(),
            position: $position,
            total: $total,
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_section_complete {
    ($section_id:expr) => {
        $crate::PipelineLog::SectionCompleted {
            section_id: $section_id.to_string(),
            result: None,
        }
        .emit();
    };
    ($section_id:expr, $result:expr) => {
        $crate::PipelineLog::SectionCompleted {
            section_id: $section_id.to_string(),
            result: Some($result.to_string()),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_section_skipped {
    ($section_id:expr, $error:expr) => {
        $crate::PipelineLog::SectionSkipped {
            section_id: $section_id.to_string(),
            error: $error.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_extraction {
    ($section_id:expr, $tier:expr) => {
        $crate::PipelineLog::ExtractionResolved {
            section_id: $section_id.to_string(),
            tier: $tier.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_model_start {
    ($task_id:expr, $model:expr, $desc:expr) => {
        $crate::PipelineLog::ModelStarted {
            task_id: $task_id.to_string(),
            model: $model.to_string(),
            description: $desc.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_model_message {
    ($task_id:expr, $model:expr, $msg:expr) => {
        $crate::PipelineLog::ModelMessage {
            task_id: $task_id.to_string(),
            model: $model.to_string(),
            message: $msg.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_model_complete {
    ($task_id:expr, $model:expr) => {
        $crate::PipelineLog::ModelCompleted {
            task_id: $task_id.to_string(),
            model: $model.to_string(),
            result: None,
        }
        .emit();
    };
    ($task_id:expr, $model:expr, $result:expr) => {
        $crate::PipelineLog::ModelCompleted {
            task_id: $task_id.to_string(),
            model: $model.to_string(),
            result: Some($result.to_string()),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_model_failed {
    ($task_id:expr, $model:expr, $error:expr) => {
        $crate::PipelineLog::ModelFailed {
            task_id: $task_id.to_string(),
            model: $model.to_string(),
            error: $error.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_snapshot {
    ($stage:expr, $path:expr, $items:expr) => {
        $crate::PipelineLog::SnapshotWritten {
            stage: $stage,
            file_path: $path.to_string(),
            items: $items,
        }
        .emit();
    };
}

// ============================================================================
// Console Logging Macros
// ============================================================================
// Colored, human-readable output on stdout. These complement the structured
// PipelineLog events above.
// ============================================================================

/// Logs the start of a pipeline stage with a header and description.
///
/// # Example
/// ```
/// use earnings_analyst_sdk::log_stage_start_console;
/// log_stage_start_console!(1, "Research Planning", "Plan extraction for 6 sections");
/// ```
///
/// Outputs:
/// ```text
/// ═══ STAGE 1: Research Planning ═══
/// Plan extraction for 6 sections
/// ```
#[macro_export]
macro_rules! log_stage_start_console {
    ($stage:expr, $title:expr, $description:expr) => {
        println!("\x1b[1;36m═══ STAGE {}: {} ═══\x1b[0m", $stage, $title);
        println!("\x1b[36m{}\x1b[0m", $description);
    };
}

/// Logs the completion of a pipeline stage.
///
/// Outputs:
/// ```text
/// ✓ Stage 1 complete
/// ```
#[macro_export]
macro_rules! log_stage_complete_console {
    ($stage:expr) => {
        println!("\x1b[32m✓ Stage {} complete\x1b[0m", $stage);
    };
}

/// Logs progress of an operation.
///
/// # Example
/// ```
/// use earnings_analyst_sdk::log_progress;
/// log_progress!(3, 5, "sections");
/// ```
///
/// Outputs:
/// ```text
/// Progress: 3/5 sections
/// ```
#[macro_export]
macro_rules! log_progress {
    ($current:expr, $total:expr, $item_type:expr) => {
        println!(
            "\x1b[36mProgress: {}/{} {}\x1b[0m",
            $current, $total, $item_type
        );
    };
}

/// Logs an informational message.
#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        println!("\x1b[36mℹ {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[36mℹ {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs a warning message.
///
/// Outputs:
/// ```text
/// ⚠ Warning: 2 of 6 sections skipped
/// ```
#[macro_export]
macro_rules! log_warning {
    ($message:expr) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs that a file has been saved.
#[macro_export]
macro_rules! log_file_saved {
    ($path:expr) => {
        println!("\x1b[32m✓ Saved: {}\x1b[0m", $path);
    };
}

/// Logs a debug message (intended to be used conditionally).
///
/// # Example
/// ```
/// use earnings_analyst_sdk::log_debug;
/// let count = 42;
/// log_debug!("Scanned {} candidates", count);
/// ```
#[macro_export]
macro_rules! log_debug {
    ($message:expr) => {
        println!("\x1b[2m[DEBUG] {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[2m[DEBUG] {}\x1b[0m", format!($fmt, $($arg)*));
    };
}
