//! Phase 4: REPORTING
//!
//! Builds the run statistics artifact and writes it as pretty JSON.

use super::phase_merging::MergedGroups;
use super::MergeOrchestrator;
use crate::services::statistics::percentage;
use crate::services::{GroupSummary, GroupingResult, RunStatistics};
use anyhow::{Context, Result};
use std::collections::BTreeSet;

impl MergeOrchestrator {
    /// Phase 4: REPORTING - aggregate and persist run statistics
    pub(super) fn phase_reporting(
        &self,
        grouping: &GroupingResult,
        merged: &MergedGroups,
    ) -> Result<RunStatistics> {
        tracing::info!("Phase 4: REPORTING");

        let statistics = build_statistics(grouping, merged, self.settings.top_groups);

        if let Some(stats_file) = &self.settings.stats_file {
            if let Some(parent) = stats_file.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let json = statistics.to_json()?;
            std::fs::write(stats_file, json)
                .with_context(|| format!("Failed to write {}", stats_file.display()))?;
            tracing::info!(path = %stats_file.display(), "Wrote run statistics");
        }

        Ok(statistics)
    }
}

fn build_statistics(
    grouping: &GroupingResult,
    merged: &MergedGroups,
    top_groups: usize,
) -> RunStatistics {
    let input_records = grouping.stats.total_scanned;
    let output_records = merged.written.len();

    let mut reduction_count = 0;
    let mut cross_source_merges = 0;
    let mut largest_group_size = 0;
    let mut summaries = Vec::new();

    for written in &merged.written {
        let merged_record = &written.outcome.merged;
        let size = merged_record.merged_from.len();

        reduction_count += size.saturating_sub(1);
        largest_group_size = largest_group_size.max(size);

        if size < 2 {
            continue;
        }
        if written.outcome.is_cross_source() {
            cross_source_merges += 1;
        }

        let mut names: Vec<String> = Vec::new();
        for name in &written.outcome.names {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }

        summaries.push(GroupSummary {
            fingerprint: merged_record.merge_fingerprint.clone(),
            size,
            canonical_name: merged_record.name().to_string(),
            names,
            sources: written
                .outcome
                .sources
                .iter()
                .map(|s| s.name().to_string())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        });
    }

    summaries.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.fingerprint.cmp(&b.fingerprint)));
    summaries.truncate(top_groups);

    RunStatistics {
        input_records,
        output_records,
        reduction_count,
        reduction_percent: percentage(reduction_count, input_records),
        cross_source_merges,
        largest_group_size,
        failed_merges: merged.failed,
        matching: grouping.stats.clone(),
        top_groups: summaries,
    }
}
