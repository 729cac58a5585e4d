//! Source database classification
//!
//! Maps a record's cross-reference ID (CURIE or URI) to the database it was
//! imported from. The declaration order of [`Source`] is the priority order
//! used to break canonical-name ties, most authoritative first.

use crate::models::Record;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Originating database of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Source {
    Togo,
    MediaDive,
    Atcc,
    Dsmz,
    Jcm,
    Nbrc,
    BacDive,
    Komodo,
    MediaDb,
    Ccap,
    Utex,
    Sag,
    Unknown,
}

/// Recognized ID prefixes, matched case-insensitively
const PREFIXES: &[(&str, Source)] = &[
    ("togo:", Source::Togo),
    ("togo.medium:", Source::Togo),
    ("http://togodb.org/", Source::Togo),
    ("https://togomedium.org/", Source::Togo),
    ("mediadive.medium:", Source::MediaDive),
    ("mediadive:", Source::MediaDive),
    ("https://mediadive.dsmz.de/", Source::MediaDive),
    ("atcc:", Source::Atcc),
    ("https://www.atcc.org/", Source::Atcc),
    ("dsmz:", Source::Dsmz),
    ("jcm:", Source::Jcm),
    ("https://www.jcm.riken.jp/", Source::Jcm),
    ("nbrc:", Source::Nbrc),
    ("nbrc.medium:", Source::Nbrc),
    ("bacdive:", Source::BacDive),
    ("https://bacdive.dsmz.de/", Source::BacDive),
    ("komodo:", Source::Komodo),
    ("mediadb:", Source::MediaDb),
    ("ccap:", Source::Ccap),
    ("https://www.ccap.ac.uk/", Source::Ccap),
    ("utex:", Source::Utex),
    ("https://utex.org/", Source::Utex),
    ("sag:", Source::Sag),
];

impl Source {
    /// Every known source, highest priority first
    pub const PRIORITY: [Source; 13] = [
        Source::Togo,
        Source::MediaDive,
        Source::Atcc,
        Source::Dsmz,
        Source::Jcm,
        Source::Nbrc,
        Source::BacDive,
        Source::Komodo,
        Source::MediaDb,
        Source::Ccap,
        Source::Utex,
        Source::Sag,
        Source::Unknown,
    ];

    /// Lower rank = higher priority; `Unknown` ranks last
    pub fn rank(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Source::Togo => "TOGO",
            Source::MediaDive => "MediaDive",
            Source::Atcc => "ATCC",
            Source::Dsmz => "DSMZ",
            Source::Jcm => "JCM",
            Source::Nbrc => "NBRC",
            Source::BacDive => "BacDive",
            Source::Komodo => "KOMODO",
            Source::MediaDb => "MediaDB",
            Source::Ccap => "CCAP",
            Source::Utex => "UTEX",
            Source::Sag => "SAG",
            Source::Unknown => "unknown",
        }
    }

    /// Classify a cross-reference ID
    pub fn from_id(id: &str) -> Self {
        let lowered = id.trim().to_lowercase();
        PREFIXES
            .iter()
            .find(|(prefix, _)| lowered.starts_with(prefix))
            .map(|(_, source)| *source)
            .unwrap_or(Source::Unknown)
    }

    /// Classify a record by its cross-reference structure
    pub fn of(record: &Record) -> Self {
        record.source_id().map(Source::from_id).unwrap_or(Source::Unknown)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaTerm, OntologyTerm};

    #[test]
    fn test_curie_prefixes() {
        assert_eq!(Source::from_id("TOGO:M001"), Source::Togo);
        assert_eq!(Source::from_id("mediadive.medium:123"), Source::MediaDive);
        assert_eq!(Source::from_id("ATCC:1234"), Source::Atcc);
        assert_eq!(Source::from_id("nbrc.medium:802"), Source::Nbrc);
        assert_eq!(Source::from_id("KOMODO:55"), Source::Komodo);
    }

    #[test]
    fn test_uri_prefixes() {
        assert_eq!(
            Source::from_id("https://mediadive.dsmz.de/medium/1"),
            Source::MediaDive
        );
        assert_eq!(Source::from_id("https://utex.org/pages/medium"), Source::Utex);
    }

    #[test]
    fn test_unrecognized_is_unknown() {
        assert_eq!(Source::from_id("FOO:1"), Source::Unknown);
        assert_eq!(Source::from_id(""), Source::Unknown);
        assert_eq!(Source::of(&Record::default()), Source::Unknown);
    }

    #[test]
    fn test_priority_order_matches_rank() {
        for (i, source) in Source::PRIORITY.iter().enumerate() {
            assert_eq!(source.rank(), i);
        }
        assert!(Source::Togo.rank() < Source::MediaDive.rank());
        assert!(Source::Sag.rank() < Source::Unknown.rank());
    }

    #[test]
    fn test_record_classification() {
        let record = Record {
            media_term: Some(MediaTerm {
                term: Some(OntologyTerm {
                    id: Some("mediadive.medium:123".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(Source::of(&record), Source::MediaDive);
        assert_eq!(Source::of(&record).to_string(), "MediaDive");
    }
}
