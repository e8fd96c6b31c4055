//! On-disk snapshots of a stage's accumulated records
//!
//! A snapshot is rewritten whole after every step. Writes go to a temporary
//! sibling first and are renamed into place, so a reader never sees a
//! partially written file.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use super::context::RunContext;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub run_id: String,
    pub stage: String,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub source_ids: Vec<String>,
    pub model: String,
    pub total_sections: usize,
    pub completed_sections: usize,
    /// Ids of sections skipped after a model error
    #[serde(default)]
    pub failed_sections: Vec<String>,
}

impl SnapshotMetadata {
    pub fn new(ctx: &RunContext, stage: impl Into<String>, total_sections: usize) -> Self {
        Self {
            run_id: ctx.run_id.clone(),
            stage: stage.into(),
            started_at: ctx.started_at,
            updated_at: Utc::now(),
            source_ids: ctx.source_ids.clone(),
            model: ctx.model.clone(),
            total_sections,
            completed_sections: 0,
            failed_sections: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<T> {
    pub metadata: SnapshotMetadata,
    pub items: Vec<T>,
}

#[derive(Serialize)]
struct SnapshotView<'a, T> {
    metadata: &'a SnapshotMetadata,
    items: &'a [T],
}

/// Either a full snapshot or a bare list of records
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotFile<T> {
    Full(Snapshot<T>),
    Items(Vec<T>),
}

/// Single-writer store for one snapshot file
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Overwrite the snapshot file
    pub async fn write<T: Serialize>(
        &self,
        metadata: &SnapshotMetadata,
        items: &[T],
    ) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(&SnapshotView { metadata, items })
            .context("Failed to serialize snapshot")?;
        let temp_path = self.temp_path();
        fs::write(&temp_path, json)
            .await
            .with_context(|| format!("Failed to write snapshot: {}", temp_path.display()))?;
        fs::rename(&temp_path, &self.path)
            .await
            .with_context(|| {
                format!(
                    "Failed to move snapshot into place: {}",
                    self.path.display()
                )
            })?;
        Ok(())
    }

    pub async fn load<T: DeserializeOwned>(&self) -> Result<Snapshot<T>> {
        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read snapshot: {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot JSON from: {}", self.path.display()))
    }
}

/// Records from a snapshot file, or from a file holding a bare JSON array
pub async fn load_items<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let file: SnapshotFile<T> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse records from: {}", path.display()))?;

    Ok(match file {
        SnapshotFile::Full(snapshot) => snapshot.items,
        SnapshotFile::Items(items) => items,
    })
}
