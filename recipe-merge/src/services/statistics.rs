//! Matching and merge run statistics
//!
//! Counters here are what operators read to tell irreducibly unidentifiable
//! data (`no_valid_ingredients`) apart from upstream bugs (`errors`).

use super::fingerprinter::Fingerprint;
use crate::error::RecordError;
use crate::models::RecordRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fingerprint → record references sharing it, in input order
pub type MergeGroups = BTreeMap<Fingerprint, Vec<RecordRef>>;

/// Why a record was excluded from grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingIngredientsField,
    EmptyIngredientsList,
    Unparseable,
    Other,
}

impl From<&RecordError> for SkipReason {
    fn from(err: &RecordError) -> Self {
        match err {
            RecordError::MissingIngredientsField => SkipReason::MissingIngredientsField,
            RecordError::EmptyIngredientsList => SkipReason::EmptyIngredientsList,
            RecordError::UnparseableRecord { .. } => SkipReason::Unparseable,
            RecordError::NotARecord(_) | RecordError::Io { .. } => SkipReason::Other,
        }
    }
}

/// Error counts by reason
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBreakdown {
    pub missing_ingredients_field: usize,
    pub empty_ingredients_list: usize,
    pub unparseable: usize,
    pub other: usize,
}

impl ErrorBreakdown {
    pub fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::MissingIngredientsField => self.missing_ingredients_field += 1,
            SkipReason::EmptyIngredientsList => self.empty_ingredients_list += 1,
            SkipReason::Unparseable => self.unparseable += 1,
            SkipReason::Other => self.other += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.missing_ingredients_field + self.empty_ingredients_list + self.unparseable + self.other
    }
}

/// Per-run matcher tallies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStats {
    /// Records the matcher attempted
    pub total_scanned: usize,
    /// Records placed into a fingerprint bucket
    pub grouped: usize,
    /// Valid records with no derivable ingredient identity
    pub no_valid_ingredients: usize,
    /// Records that failed to load or fingerprint
    pub errors: ErrorBreakdown,
}

impl MatchStats {
    pub fn error_count(&self) -> usize {
        self.errors.total()
    }

    pub fn display_string(&self) -> String {
        format!(
            "{} scanned, {} grouped, {} without identity, {} errors \
             ({} missing ingredients, {} empty ingredients, {} unparseable, {} other)",
            self.total_scanned,
            self.grouped,
            self.no_valid_ingredients,
            self.error_count(),
            self.errors.missing_ingredients_field,
            self.errors.empty_ingredients_list,
            self.errors.unparseable,
            self.errors.other
        )
    }
}

/// Duplicate diagnostics over every identity bucket of a matcher pass
///
/// Built before any `min_group_size` filtering, so singletons count toward
/// `unique_groups`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicateStats {
    /// Records the matcher scanned, grouped or not
    pub total_records: usize,
    /// Distinct fingerprints
    pub unique_groups: usize,
    /// Buckets with at least two members
    pub duplicate_groups: usize,
    /// Σ(size − 1) over duplicate buckets
    pub total_duplicates: usize,
    /// `total_duplicates` as a percentage of `total_records`
    pub reduction_percent: f64,
    pub largest_group_size: usize,
}

impl DuplicateStats {
    /// Summarize bucket sizes against the number of records scanned
    pub fn from_sizes<I: IntoIterator<Item = usize>>(total_records: usize, sizes: I) -> Self {
        let mut stats = DuplicateStats {
            total_records,
            ..Default::default()
        };
        for size in sizes {
            stats.unique_groups += 1;
            if size >= 2 {
                stats.duplicate_groups += 1;
                stats.total_duplicates += size - 1;
            }
            stats.largest_group_size = stats.largest_group_size.max(size);
        }
        stats.reduction_percent = percentage(stats.total_duplicates, stats.total_records);
        stats
    }

    pub fn display_string(&self) -> String {
        format!(
            "{} records in {} groups, {} duplicate groups, {} redundant records ({:.1}% reduction), largest group {}",
            self.total_records,
            self.unique_groups,
            self.duplicate_groups,
            self.total_duplicates,
            self.reduction_percent,
            self.largest_group_size
        )
    }
}

/// Summary of one duplicate group in the run artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub fingerprint: Fingerprint,
    pub size: usize,
    pub canonical_name: String,
    pub names: Vec<String>,
    pub sources: Vec<String>,
}

/// Run-level statistics artifact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub input_records: usize,
    pub output_records: usize,
    pub reduction_count: usize,
    pub reduction_percent: f64,
    /// Groups whose members came from two or more distinct known sources
    pub cross_source_merges: usize,
    pub largest_group_size: usize,
    /// Groups rejected because a member failed to load
    pub failed_merges: usize,
    pub matching: MatchStats,
    /// Largest duplicate groups, biggest first
    pub top_groups: Vec<GroupSummary>,
}

impl RunStatistics {
    pub fn to_json(&self) -> recipe_common::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
