//! Corpus matcher
//!
//! Fingerprints every record and buckets references by fingerprint. A single
//! malformed or unmatchable record never aborts the pass: failures become
//! tallied skip reasons in [`MatchStats`].
//!
//! Fingerprinting can fan out over rayon. Outcomes are collected in input order
//! and inserted serially, so bucket order matches input order either way. The
//! whole fingerprint map is held in memory; tens of thousands of small records
//! is the expected ceiling.

use super::fingerprinter::{Fingerprint, Fingerprinter};
use super::statistics::{DuplicateStats, MatchStats, MergeGroups, SkipReason};
use crate::models::RecordRef;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of fingerprinting one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Fingerprint computed - record joins that bucket
    Grouped(Fingerprint),
    /// Valid record without derivable identity
    NoIdentity,
    /// Load or fingerprint failure
    Skipped(SkipReason),
}

/// Groups plus the statistics side-channel
#[derive(Debug, Clone, Default)]
pub struct GroupingResult {
    /// Buckets that passed the `min_group_size` filter
    pub groups: MergeGroups,
    pub stats: MatchStats,
    /// Duplicate diagnostics over all buckets, before filtering
    pub duplicates: DuplicateStats,
}

/// Corpus matcher
#[derive(Debug, Clone)]
pub struct Matcher {
    fingerprinter: Fingerprinter,
    parallel: bool,
}

impl Matcher {
    /// Create new sequential matcher
    pub fn new() -> Self {
        Self {
            fingerprinter: Fingerprinter::new(),
            parallel: false,
        }
    }

    /// Fingerprint across rayon's thread pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Fingerprint one record and classify the outcome
    pub fn classify(&self, path: &Path) -> MatchOutcome {
        match self.fingerprinter.fingerprint_file(path) {
            Ok(Some(fingerprint)) => {
                debug!(path = %path.display(), fingerprint = %fingerprint, "Fingerprinted");
                MatchOutcome::Grouped(fingerprint)
            }
            Ok(None) => {
                debug!(path = %path.display(), "No valid ingredients");
                MatchOutcome::NoIdentity
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping record");
                MatchOutcome::Skipped(SkipReason::from(&e))
            }
        }
    }

    /// Group records by fingerprint, keeping buckets with at least
    /// `min_group_size` members
    ///
    /// Record identifiers are taken relative to the deepest directory
    /// containing every path.
    pub fn group<P>(&self, paths: &[P], min_group_size: usize) -> GroupingResult
    where
        P: AsRef<Path> + Sync,
    {
        let root = common_root(paths);
        self.group_under(&root, paths, min_group_size)
    }

    /// Group records found under a corpus root; identifiers are the
    /// root-relative paths
    pub fn group_under<P>(&self, root: &Path, paths: &[P], min_group_size: usize) -> GroupingResult
    where
        P: AsRef<Path> + Sync,
    {
        let _span = tracing::info_span!("matcher", records = paths.len()).entered();

        let outcomes: Vec<MatchOutcome> = if self.parallel {
            paths.par_iter().map(|p| self.classify(p.as_ref())).collect()
        } else {
            paths.iter().map(|p| self.classify(p.as_ref())).collect()
        };

        let mut stats = MatchStats {
            total_scanned: paths.len(),
            ..Default::default()
        };
        let mut groups = MergeGroups::new();

        for (path, outcome) in paths.iter().zip(outcomes) {
            match outcome {
                MatchOutcome::Grouped(fingerprint) => {
                    stats.grouped += 1;
                    groups
                        .entry(fingerprint)
                        .or_default()
                        .push(RecordRef::under_root(root, path.as_ref()));
                }
                MatchOutcome::NoIdentity => stats.no_valid_ingredients += 1,
                MatchOutcome::Skipped(reason) => stats.errors.record(reason),
            }
        }

        let duplicates =
            DuplicateStats::from_sizes(stats.total_scanned, groups.values().map(Vec::len));
        groups.retain(|_, members| members.len() >= min_group_size);

        info!(
            scanned = stats.total_scanned,
            grouped = stats.grouped,
            no_identity = stats.no_valid_ingredients,
            errors = stats.error_count(),
            buckets = duplicates.unique_groups,
            kept = groups.len(),
            min_group_size,
            "Grouping complete"
        );

        GroupingResult {
            groups,
            stats,
            duplicates,
        }
    }

    /// Buckets with two or more members
    pub fn find_duplicates<P>(&self, paths: &[P]) -> GroupingResult
    where
        P: AsRef<Path> + Sync,
    {
        self.group(paths, 2)
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Deepest directory that contains every path
fn common_root<P: AsRef<Path>>(paths: &[P]) -> PathBuf {
    let mut parents = paths
        .iter()
        .map(|p| p.as_ref().parent().unwrap_or_else(|| Path::new("")));

    let Some(first) = parents.next() else {
        return PathBuf::new();
    };

    let mut root = first.to_path_buf();
    for parent in parents {
        while !parent.starts_with(&root) {
            if !root.pop() {
                break;
            }
        }
    }
    root
}
