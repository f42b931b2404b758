// ============================================================
// Layer 2 — Unpack Use Case
// ============================================================
// Fetches an artifact archive (local path, gs:// or s3://),
// checks it and extracts it, then reads the checkpoint inside so
// a broken artifact is reported here rather than at load time.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::infra::{artifact::unpack_artifact, checkpoint::CheckpointRecord};

#[derive(Debug, Clone)]
pub struct UnpackSummary {
    pub model_dir:    PathBuf,
    pub model_module: String,
    pub timestamp:    String,
    pub random_tag:   u32,
}

pub fn execute(artifact_path: &str, download_dir: &Path) -> Result<UnpackSummary> {
    let model_dir = unpack_artifact(artifact_path, download_dir)
        .with_context(|| format!("Could not unpack '{artifact_path}'"))?;
    let record = CheckpointRecord::load_dir(&model_dir)?;

    tracing::info!(
        "Unpacked {} (run {}__{}) into '{}'",
        record.model_module,
        record.timestamp,
        record.random_tag,
        model_dir.display()
    );
    Ok(UnpackSummary {
        model_dir,
        model_module: record.model_module,
        timestamp:    record.timestamp,
        random_tag:   record.random_tag,
    })
}
