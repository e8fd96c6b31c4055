//! Workflow utilities shared by pipeline stages
//!
//! - **model**: model client trait, request shape and error kinds
//! - **agent**: Claude agent backend with stream handling
//! - **openai**: OpenAI-compatible chat completions backend
//! - **json**: tiered JSON extraction from model responses
//! - **task**: per-section step logging

pub mod agent;
pub mod json;
pub mod model;
pub mod openai;
pub mod task;

// Re-export commonly used types and functions
pub use agent::ClaudeAgentClient;
pub use json::{extract_record, ExtractionTier};
pub use model::{ModelClient, ModelError, ModelRequest, OutputShape};
pub use openai::OpenAiClient;
pub use task::{execute_step, StepContext};
