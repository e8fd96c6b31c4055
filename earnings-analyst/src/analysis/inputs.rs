//! Loading the section template and transcript text

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

use super::types::{enabled_sections, SectionDescriptor};

/// A bare list of sections or a document with a `sections` key
#[derive(Deserialize)]
#[serde(untagged)]
enum SectionsFile {
    Document { sections: Vec<SectionDescriptor> },
    List(Vec<SectionDescriptor>),
}

/// Parse section descriptors from YAML, keeping enabled ones in order
pub fn parse_sections(yaml: &str) -> Result<Vec<SectionDescriptor>> {
    let file: SectionsFile = serde_yaml::from_str(yaml).context("Failed to parse sections YAML")?;
    let sections = match file {
        SectionsFile::Document { sections } => sections,
        SectionsFile::List(sections) => sections,
    };
    Ok(enabled_sections(sections))
}

/// Load the section template. No enabled sections is an error.
pub async fn load_sections(path: &Path) -> Result<Vec<SectionDescriptor>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read sections file: {}", path.display()))?;
    let sections = parse_sections(&content)
        .with_context(|| format!("Invalid sections file: {}", path.display()))?;

    if sections.is_empty() {
        bail!("No enabled sections in {}", path.display());
    }
    Ok(sections)
}

/// Load the transcript text. A missing or blank transcript is an error.
pub async fn load_transcript(path: &Path) -> Result<String> {
    if !path.is_file() {
        bail!("Transcript not found: {}", path.display());
    }
    let text = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read transcript: {}", path.display()))?;

    if text.trim().is_empty() {
        bail!("Transcript is empty: {}", path.display());
    }
    Ok(text)
}
