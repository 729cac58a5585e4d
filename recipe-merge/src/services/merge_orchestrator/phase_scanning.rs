//! Phase 1: SCANNING
//!
//! Corpus discovery only; no record is opened here.

use super::MergeOrchestrator;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

impl MergeOrchestrator {
    /// Phase 1: SCANNING - list record files under the input directory
    pub(super) fn phase_scanning(&self, input_dir: &Path) -> Result<Vec<PathBuf>> {
        tracing::info!(input = %input_dir.display(), "Phase 1: SCANNING");

        let paths = self
            .scanner
            .scan(input_dir)
            .with_context(|| format!("Failed to scan corpus {}", input_dir.display()))?;

        tracing::info!(files = paths.len(), "{} potential records found", paths.len());
        Ok(paths)
    }
}
