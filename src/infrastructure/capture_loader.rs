use crate::api::dto::CaptureDto;
use crate::domain::snapshot::SnapshotChain;
use crate::ports::SnapshotSource;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Parse a capture from JSON text.
///
/// Nested captures put every parent one object deeper, so serde_json's
/// recursion limit is lifted and the stack grows on demand instead. Chain
/// length is bounded later by the traversal.
pub fn parse_capture(json: &str) -> Result<SnapshotChain> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    deserializer.disable_recursion_limit();
    let dto = CaptureDto::deserialize(serde_stacker::Deserializer::new(&mut deserializer))
        .context("Invalid capture JSON")?;
    deserializer.end().context("Invalid capture JSON")?;
    Ok(dto.into())
}

/// A capture stored as a JSON file on disk.
pub struct CaptureFile {
    path: PathBuf,
}

impl CaptureFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSource for CaptureFile {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<SnapshotChain> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read capture {}", self.path.display()))?;
        let chain = parse_capture(&content)
            .with_context(|| format!("Failed to parse capture {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), snapshots = chain.len(), "loaded capture");
        Ok(chain)
    }
}
