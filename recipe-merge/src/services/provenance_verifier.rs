//! Provenance verification
//!
//! Checks that merged output accounts for every grouped input exactly once:
//! each expected identifier appears in exactly one `merged_from` list, and no
//! output claims an identifier that was never an input.

use crate::models::MergedRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Verification findings; empty lists mean consistent provenance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceReport {
    /// Expected identifiers absent from every output
    pub missing: Vec<String>,
    /// Identifiers claimed by more than one output (or twice by one)
    pub duplicated: Vec<String>,
    /// Identifiers in outputs that were never expected
    pub unexpected: Vec<String>,
    /// Outputs with an empty `merged_from`
    pub empty_outputs: usize,
}

impl ProvenanceReport {
    pub fn is_consistent(&self) -> bool {
        self.missing.is_empty()
            && self.duplicated.is_empty()
            && self.unexpected.is_empty()
            && self.empty_outputs == 0
    }
}

/// Verify merged outputs against the identifiers that should be consumed
pub fn verify<'a, I, M>(expected_ids: I, merged: M) -> ProvenanceReport
where
    I: IntoIterator<Item = String>,
    M: IntoIterator<Item = &'a MergedRecord>,
{
    let expected: BTreeSet<String> = expected_ids.into_iter().collect();
    let mut claims: BTreeMap<&str, usize> = BTreeMap::new();
    let mut report = ProvenanceReport::default();

    for record in merged {
        if record.merged_from.is_empty() {
            report.empty_outputs += 1;
        }
        for id in &record.merged_from {
            *claims.entry(id.as_str()).or_insert(0) += 1;
        }
    }

    report.missing = expected
        .iter()
        .filter(|id| !claims.contains_key(id.as_str()))
        .cloned()
        .collect();

    for (id, count) in &claims {
        if *count > 1 {
            report.duplicated.push(id.to_string());
        }
        if !expected.contains(*id) {
            report.unexpected.push(id.to_string());
        }
    }

    if report.is_consistent() {
        tracing::info!(records = expected.len(), "Provenance consistent");
    } else {
        tracing::warn!(
            missing = report.missing.len(),
            duplicated = report.duplicated.len(),
            unexpected = report.unexpected.len(),
            empty_outputs = report.empty_outputs,
            "Provenance inconsistencies found"
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;

    fn merged(ids: &[&str]) -> MergedRecord {
        MergedRecord::new(
            Record::default(),
            "fp".to_string(),
            ids.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_consistent_provenance() {
        let outputs = vec![merged(&["a", "b"]), merged(&["c"])];
        let report = verify(ids(&["a", "b", "c"]), &outputs);
        assert!(report.is_consistent());
    }

    #[test]
    fn test_detects_missing_duplicated_unexpected() {
        let outputs = vec![merged(&["a", "b"]), merged(&["b", "z"]), merged(&[])];
        let report = verify(ids(&["a", "b", "c"]), &outputs);

        assert_eq!(report.missing, ids(&["c"]));
        assert_eq!(report.duplicated, ids(&["b"]));
        assert_eq!(report.unexpected, ids(&["z"]));
        assert_eq!(report.empty_outputs, 1);
        assert!(!report.is_consistent());
    }
}
