//! CLI argument parsing for the transcript analysis workflow

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use super::context::PromptLimits;
use super::workflow::WorkflowConfig;

/// Model backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    /// Claude agent SDK (uses the local Claude CLI)
    Claude,
    /// OpenAI-compatible chat completions
    Openai,
}

impl Provider {
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Claude => "claude",
            Provider::Openai => "gpt-4o",
        }
    }
}

/// Earnings call analysis: plan each report section, then analyze it
#[derive(Parser, Debug, Clone)]
#[command(name = "earnings-analyst", version)]
pub struct Args {
    /// Transcript text file
    #[arg(short, long)]
    pub transcript: PathBuf,

    /// Section template YAML (required for phase 1)
    #[arg(short, long)]
    pub sections: Option<PathBuf>,

    /// Comma-separated phases to execute (1=plan, 2=analyze)
    #[arg(long, default_value = "1,2")]
    pub phases: String,

    /// Saved research plans (for running phase 2 on its own)
    #[arg(long)]
    pub plans_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Provider::Claude)]
    pub provider: Provider,

    /// Model name; defaults per provider
    #[arg(short, long)]
    pub model: Option<String>,

    /// Directory for snapshot files
    #[arg(short, long, default_value = "./OUTPUT")]
    pub output_dir: PathBuf,

    /// Pause between model calls, in milliseconds
    #[arg(long, default_value = "2000")]
    pub step_delay_ms: u64,

    /// High-priority items repeated per prior plan
    #[arg(long, default_value = "3")]
    pub max_priority_items: usize,

    /// Characters of each prior section statement repeated in later prompts
    #[arg(long, default_value = "400")]
    pub max_statement_chars: usize,

    /// Log raw model output and extraction tiers
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Parse the comma-separated phases string into a Vec<u32>
    pub fn parse_phases(&self) -> Vec<u32> {
        self.phases
            .split(',')
            .filter_map(|p| p.trim().parse().ok())
            .collect()
    }
}

impl From<Args> for WorkflowConfig {
    fn from(args: Args) -> Self {
        let phases = args.parse_phases();
        let model = args
            .model
            .unwrap_or_else(|| args.provider.default_model().to_string());
        WorkflowConfig {
            transcript: args.transcript,
            sections_file: args.sections,
            phases,
            plans_file: args.plans_file,
            provider: args.provider,
            model,
            output_dir: args.output_dir,
            step_delay: Duration::from_millis(args.step_delay_ms),
            limits: PromptLimits {
                max_priority_items: args.max_priority_items,
                max_statement_chars: args.max_statement_chars,
            },
            debug: args.debug,
        }
    }
}
