//! Canonical merge of one fingerprint group
//!
//! **Algorithm (multi-member group):**
//! 1. Canonical name: most frequent name; ties go to the name carried by the
//!    highest-priority source, then alphabetical
//! 2. Canonical body: among records bearing that name, the one with the most
//!    CHEBI-typed ingredients (first in input order on ties)
//! 3. Synonyms: one entry per member whose name differs, no deduplication
//! 4. Categories: sorted distinct categories across the group
//! 5. Provenance: every input identifier, in input order
//! 6. Curation history: one entry appended to the canonical record's history
//!
//! A member that fails to load rejects the whole group.

use super::fingerprinter::{Fingerprint, Fingerprinter};
use super::source_classifier::Source;
use crate::error::{MergeError, MergeResult};
use crate::models::{CurationEvent, MergedRecord, Record, RecordRef, Synonym, GROUP_KEYS};
use chrono::{SecondsFormat, Utc};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// Curator recorded on merge history entries
pub const MERGE_CURATOR: &str = "recipe-merger";

/// A loaded group member
#[derive(Debug, Clone)]
pub struct GroupMember {
    pub reference: RecordRef,
    pub record: Record,
    pub source: Source,
}

impl GroupMember {
    pub fn new(reference: RecordRef, record: Record) -> Self {
        let source = Source::of(&record);
        Self {
            reference,
            record,
            source,
        }
    }
}

/// Merged record plus per-member details the orchestrator reports on
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub merged: MergedRecord,
    /// Member names in input order
    pub names: Vec<String>,
    /// Member sources in input order
    pub sources: Vec<Source>,
}

impl MergeOutcome {
    /// Members span two or more distinct known sources
    pub fn is_cross_source(&self) -> bool {
        self.sources
            .iter()
            .filter(|s| **s != Source::Unknown)
            .collect::<BTreeSet<_>>()
            .len()
            >= 2
    }
}

/// Recipe merger
#[derive(Debug, Clone)]
pub struct Merger {
    fingerprinter: Fingerprinter,
    curator: String,
}

impl Merger {
    pub fn new() -> Self {
        Self {
            fingerprinter: Fingerprinter::new(),
            curator: MERGE_CURATOR.to_string(),
        }
    }

    /// Merge a group read from disk
    pub fn merge(
        &self,
        refs: &[RecordRef],
        fingerprint: Option<&str>,
    ) -> MergeResult<MergedRecord> {
        self.merge_group(refs, fingerprint).map(|outcome| outcome.merged)
    }

    /// Merge a group read from disk, keeping per-member details
    pub fn merge_group(
        &self,
        refs: &[RecordRef],
        fingerprint: Option<&str>,
    ) -> MergeResult<MergeOutcome> {
        if refs.is_empty() {
            return Err(MergeError::EmptyGroup);
        }

        let members = refs
            .iter()
            .map(|reference| {
                reference
                    .load()
                    .map(|record| GroupMember::new(reference.clone(), record))
                    .map_err(|source| MergeError::MemberLoad {
                        path: reference.path.clone(),
                        source,
                    })
            })
            .collect::<MergeResult<Vec<_>>>()?;

        self.merge_members(members, fingerprint)
    }

    /// Merge already-loaded members
    pub fn merge_members(
        &self,
        members: Vec<GroupMember>,
        fingerprint: Option<&str>,
    ) -> MergeResult<MergeOutcome> {
        let first = members.first().ok_or(MergeError::EmptyGroup)?;
        let _span = tracing::debug_span!("merger", members = members.len()).entered();

        let fingerprint = match fingerprint {
            Some(fp) => fp.to_string(),
            None => self.compute_fingerprint(first)?,
        };

        let merged_from: Vec<String> = members.iter().map(|m| m.reference.id().to_string()).collect();
        let names: Vec<String> = members.iter().map(|m| m.record.name().to_string()).collect();
        let sources: Vec<Source> = members.iter().map(|m| m.source).collect();

        if members.len() == 1 {
            debug!(record = %merged_from[0], "Singleton group passes through");
            let record = members.into_iter().next().map(|m| m.record).unwrap_or_default();
            return Ok(MergeOutcome {
                merged: MergedRecord::new(record, fingerprint, merged_from),
                names,
                sources,
            });
        }

        let canonical_name = select_canonical_name(&members);
        let canonical_index = select_canonical_body(&members, &canonical_name);

        let synonyms: Vec<Synonym> = members
            .iter()
            .filter(|m| m.record.name() != canonical_name)
            .map(|m| Synonym {
                name: m.record.name().to_string(),
                source: m.source.name().to_string(),
                source_id: m.record.source_id().map(str::to_string),
                original_category: m.record.category().map(str::to_string),
            })
            .collect();

        let categories: Vec<String> = members
            .iter()
            .filter_map(|m| m.record.category())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut body = members[canonical_index].record.clone();
        body.name = Some(canonical_name.clone());
        for key in GROUP_KEYS {
            body.extra.remove(key);
        }
        body.curation_history.push(CurationEvent {
            timestamp: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            curator: Some(self.curator.clone()),
            action: Some(format!(
                "Merged {} duplicate recipes into canonical record",
                members.len()
            )),
            notes: Some(format!("Merged from: {}", merged_from.join(", "))),
            ..Default::default()
        });

        info!(
            canonical = %canonical_name,
            body = %members[canonical_index].reference.id(),
            members = members.len(),
            synonyms = synonyms.len(),
            fingerprint = %fingerprint,
            "Merged group"
        );

        let mut merged = MergedRecord::new(body, fingerprint, merged_from);
        merged.synonyms = (!synonyms.is_empty()).then_some(synonyms);
        merged.categories = (!categories.is_empty()).then_some(categories);

        Ok(MergeOutcome {
            merged,
            names,
            sources,
        })
    }

    fn compute_fingerprint(&self, member: &GroupMember) -> MergeResult<Fingerprint> {
        match self.fingerprinter.fingerprint(&member.record) {
            Ok(Some(fp)) => Ok(fp),
            Ok(None) => Err(MergeError::NoIdentity(member.reference.path.clone())),
            Err(source) => Err(MergeError::MemberLoad {
                path: member.reference.path.clone(),
                source,
            }),
        }
    }
}

impl Default for Merger {
    fn default() -> Self {
        Self::new()
    }
}

/// Most frequent name; ties by best source priority, then alphabetical
pub fn select_canonical_name(members: &[GroupMember]) -> String {
    // name -> (occurrences, best source rank)
    let mut tally: HashMap<&str, (usize, usize)> = HashMap::new();
    for member in members {
        let entry = tally
            .entry(member.record.name())
            .or_insert((0, usize::MAX));
        entry.0 += 1;
        entry.1 = entry.1.min(member.source.rank());
    }

    tally
        .into_iter()
        .min_by(|(name_a, (count_a, rank_a)), (name_b, (count_b, rank_b))| {
            count_b
                .cmp(count_a)
                .then(rank_a.cmp(rank_b))
                .then(name_a.cmp(name_b))
        })
        .map(|(name, _)| name.to_string())
        .unwrap_or_default()
}

/// Index of the most complete record bearing the canonical name
pub fn select_canonical_body(members: &[GroupMember], canonical_name: &str) -> usize {
    let mut best: Option<(usize, usize)> = None;
    for (index, member) in members.iter().enumerate() {
        if member.record.name() != canonical_name {
            continue;
        }
        let chebi = member.record.chebi_ingredient_count();
        if best.map_or(true, |(_, best_chebi)| chebi > best_chebi) {
            best = Some((index, chebi));
        }
    }
    best.map(|(index, _)| index).unwrap_or(0)
}
