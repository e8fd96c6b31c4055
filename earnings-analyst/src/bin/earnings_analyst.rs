/*
┌─────────────────────────────────────────────────────────────────────────────┐
│                     EARNINGS CALL ANALYSIS WORKFLOW                          │
└─────────────────────────────────────────────────────────────────────────────┘

  Stage 1: RESEARCH PLANNING (one section at a time, in template order)
    │
    ├─> Input: transcript + sections.yaml
    ├─> Prompt: prior plans (abridged) + current section + downstream preview
    ├─> Extract plan JSON (direct → fenced block → brace scan → fallback)
    └─> Output: research_plans_<timestamp>.json (rewritten after every section)

         ↓

  Stage 2: SECTION ANALYSIS (one plan at a time, in plan order)
    │
    ├─> Input: transcript + research_plans.json
    ├─> Prompt: prior analyses (abridged) + plan + downstream preview
    ├─> Extract analysis JSON (same tiers)
    └─> Output: section_analyses_<timestamp>.json

EXAMPLE COMMANDS:

  # Both stages
  cargo run -- --transcript demos/transcript.txt --sections demos/sections.yaml

  # Stage 2 only, from saved plans, against an OpenAI-compatible endpoint
  cargo run -- \
    --transcript demos/transcript.txt \
    --phases 2 \
    --plans-file OUTPUT/research_plans_20250101_120000.json \
    --provider openai --model gpt-4o
*/

use clap::Parser;
use earnings_analyst::analysis::{build_client, cli::Args, run_analysis_workflow, WorkflowConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let args = Args::parse();
    let config: WorkflowConfig = args.into();

    let client = build_client(&config)?;
    let summary = run_analysis_workflow(&config, client.as_ref()).await?;
    summary.print();
    Ok(())
}
