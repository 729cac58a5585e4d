//! Post-run provenance check against the output directory

use super::MergeOrchestrator;
use crate::models::MergedRecord;
use crate::services::provenance_verifier::{self, ProvenanceReport};
use anyhow::{Context, Result};
use std::path::Path;

impl MergeOrchestrator {
    /// Re-match the corpus and confirm every grouped record appears in exactly
    /// one merged output
    pub fn verify(&self, input_dir: &Path) -> Result<ProvenanceReport> {
        let _span = tracing::info_span!("verification").entered();

        let paths = self.phase_scanning(input_dir)?;
        let grouping = self
            .matcher
            .group_under(input_dir, &paths, self.settings.min_group_size);
        let expected = grouping
            .groups
            .values()
            .flatten()
            .map(|reference| reference.id().to_string());

        let output_dir = &self.settings.output_dir;
        let outputs = self
            .scanner
            .scan(output_dir)
            .with_context(|| format!("Failed to scan output dir {}", output_dir.display()))?;

        let merged = outputs
            .iter()
            .map(|path| {
                MergedRecord::load(path)
                    .with_context(|| format!("Failed to read merged record {}", path.display()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(provenance_verifier::verify(expected, &merged))
    }
}
