//! Phase 3: MERGING
//!
//! One canonical record per fingerprint group, written as YAML.

use super::MergeOrchestrator;
use crate::error::MergeError;
use crate::services::{GroupingResult, MergeOutcome};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Longest slug taken from a canonical name
const MAX_SLUG_LEN: usize = 60;

/// Hex digits of the fingerprint used in output file names
const FINGERPRINT_PREFIX_LEN: usize = 12;

/// A merged group that reached disk
#[derive(Debug, Clone)]
pub(super) struct WrittenGroup {
    pub path: PathBuf,
    pub outcome: MergeOutcome,
}

/// Everything phase 3 produced
#[derive(Debug, Clone, Default)]
pub(super) struct MergedGroups {
    pub written: Vec<WrittenGroup>,
    pub failed: usize,
}

impl MergeOrchestrator {
    /// Phase 3: MERGING - merge and write each group, skipping failures
    pub(super) fn phase_merging(&self, grouping: &GroupingResult) -> Result<MergedGroups> {
        tracing::info!(groups = grouping.groups.len(), "Phase 3: MERGING");

        let output_dir = &self.settings.output_dir;
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create output dir {}", output_dir.display()))?;

        let mut merged = MergedGroups::default();

        for (fingerprint, refs) in &grouping.groups {
            let result = self
                .merger
                .merge_group(refs, Some(fingerprint.as_str()))
                .and_then(|outcome| write_merged(output_dir, outcome));

            match result {
                Ok(written) => merged.written.push(written),
                Err(e) => {
                    merged.failed += 1;
                    tracing::warn!(
                        fingerprint = %fingerprint,
                        members = refs.len(),
                        error = %e,
                        "Skipping group"
                    );
                }
            }
        }

        tracing::info!(
            written = merged.written.len(),
            failed = merged.failed,
            "Merged records written"
        );

        Ok(merged)
    }
}

fn write_merged(output_dir: &Path, outcome: MergeOutcome) -> Result<WrittenGroup, MergeError> {
    let path = output_dir.join(output_file_name(
        outcome.merged.name(),
        &outcome.merged.merge_fingerprint,
    ));

    let yaml = outcome.merged.to_yaml().map_err(|e| MergeError::Output {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    std::fs::write(&path, yaml).map_err(|e| MergeError::Output {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    tracing::debug!(path = %path.display(), "Wrote merged record");
    Ok(WrittenGroup { path, outcome })
}

/// `<slug-of-name>_<fingerprint prefix>.yaml`
pub fn output_file_name(name: &str, fingerprint: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }

    let mut slug: String = slug.trim_matches('_').chars().take(MAX_SLUG_LEN).collect();
    while slug.ends_with('_') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("medium");
    }

    let prefix: String = fingerprint.chars().take(FINGERPRINT_PREFIX_LEN).collect();
    format!("{}_{}.yaml", slug, prefix)
}
