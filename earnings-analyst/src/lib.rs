// Transcript analysis pipeline module
pub mod analysis;

// Model clients, extraction and step helpers
pub mod workflow_utils;
