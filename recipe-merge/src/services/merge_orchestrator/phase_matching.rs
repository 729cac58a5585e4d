//! Phase 2: MATCHING
//!
//! Fingerprint every record and bucket by fingerprint.

use super::MergeOrchestrator;
use crate::services::GroupingResult;
use std::path::{Path, PathBuf};

impl MergeOrchestrator {
    /// Phase 2: MATCHING - never fails; bad records become skip tallies
    pub(super) fn phase_matching(&self, root: Option<&Path>, paths: &[PathBuf]) -> GroupingResult {
        tracing::info!(
            records = paths.len(),
            parallel = self.settings.parallel,
            "Phase 2: MATCHING"
        );

        let min_group_size = self.settings.min_group_size;
        let grouping = match root {
            Some(root) => self.matcher.group_under(root, paths, min_group_size),
            None => self.matcher.group(paths, min_group_size),
        };

        tracing::info!("{}", grouping.stats.display_string());
        tracing::info!("{}", grouping.duplicates.display_string());

        grouping
    }
}
