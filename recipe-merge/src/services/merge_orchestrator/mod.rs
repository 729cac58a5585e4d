//! Merge run orchestrator
//!
//! Drives one full corpus pass:
//! SCANNING → MATCHING → MERGING → REPORTING
//!
//! Each phase is handled by a dedicated `phase_*` method. Per-record failures
//! are absorbed by the matcher; per-group merge failures are logged, counted
//! and skipped, so one bad group never stops the run.

use crate::services::{Matcher, Merger, RecordScanner, RunStatistics};
use anyhow::Result;
use recipe_common::config::TomlConfig;
use std::path::{Path, PathBuf};
use tracing::info;

mod phase_matching;
mod phase_merging;
mod phase_reporting;
mod phase_scanning;
mod verification;

pub use phase_merging::output_file_name;

/// Knobs for one merge run
#[derive(Debug, Clone)]
pub struct MergeSettings {
    /// Directory merged records are written into
    pub output_dir: PathBuf,
    /// Where the JSON statistics artifact goes, if anywhere
    pub stats_file: Option<PathBuf>,
    pub min_group_size: usize,
    pub parallel: bool,
    /// Number of largest duplicate groups listed in the statistics
    pub top_groups: usize,
}

impl MergeSettings {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let defaults = TomlConfig::default();
        Self {
            output_dir: output_dir.into(),
            stats_file: None,
            min_group_size: defaults.min_group_size,
            parallel: defaults.parallel,
            top_groups: defaults.top_groups,
        }
    }

    /// Take run knobs from bootstrap config
    pub fn from_config(config: &TomlConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            stats_file: config.stats_file.clone(),
            min_group_size: config.min_group_size,
            parallel: config.parallel,
            top_groups: config.top_groups,
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct MergeRun {
    pub statistics: RunStatistics,
    /// Written merged record files, in fingerprint order
    pub outputs: Vec<PathBuf>,
}

/// Merge orchestrator service
pub struct MergeOrchestrator {
    settings: MergeSettings,
    scanner: RecordScanner,
    matcher: Matcher,
    merger: Merger,
}

impl MergeOrchestrator {
    pub fn new(settings: MergeSettings) -> Self {
        let matcher = Matcher::new().with_parallel(settings.parallel);
        Self {
            settings,
            scanner: RecordScanner::new(),
            matcher,
            merger: Merger::new(),
        }
    }

    pub fn settings(&self) -> &MergeSettings {
        &self.settings
    }

    /// Run all phases over a corpus directory
    pub fn run(&self, input_dir: &Path) -> Result<MergeRun> {
        let _span = tracing::info_span!("orchestrator").entered();
        info!(
            input = %input_dir.display(),
            output = %self.settings.output_dir.display(),
            "Starting merge run"
        );

        let paths = self.phase_scanning(input_dir)?;
        self.run_phases(Some(input_dir), &paths)
    }

    /// Run matching, merging and reporting over an explicit record list
    ///
    /// Record identifiers are taken relative to the deepest directory the
    /// paths share.
    pub fn run_paths(&self, paths: &[PathBuf]) -> Result<MergeRun> {
        self.run_phases(None, paths)
    }

    fn run_phases(&self, root: Option<&Path>, paths: &[PathBuf]) -> Result<MergeRun> {
        let grouping = self.phase_matching(root, paths);
        let merged = self.phase_merging(&grouping)?;
        let statistics = self.phase_reporting(&grouping, &merged)?;

        info!(
            input = statistics.input_records,
            output = statistics.output_records,
            reduction = statistics.reduction_count,
            failed = statistics.failed_merges,
            "Merge run complete"
        );

        Ok(MergeRun {
            statistics,
            outputs: merged.written.iter().map(|w| w.path.clone()).collect(),
        })
    }
}
