//! Error types for recipe-merge
//!
//! `RecordError` covers everything that can go wrong reading or fingerprinting
//! one record. The matcher tallies these per record and never propagates them.
//! `MergeError` is fatal to a single merge call; orchestrators catch it per
//! group and continue.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to load or fingerprint a single record
#[derive(Debug, Error)]
pub enum RecordError {
    /// Record has no `ingredients` key at all
    #[error("Record has no ingredients field")]
    MissingIngredientsField,

    /// `ingredients` is present but lists nothing
    #[error("Record has an empty ingredients list")]
    EmptyIngredientsList,

    /// File content could not be parsed as a record
    #[error("Unparseable record {path}: {reason}")]
    UnparseableRecord { path: PathBuf, reason: String },

    /// Parsed content is not a mapping
    #[error("Not a record (top level is not a mapping): {0}")]
    NotARecord(PathBuf),

    /// File could not be read
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of one merge call
#[derive(Debug, Error)]
pub enum MergeError {
    /// Merge called with zero references
    #[error("Cannot merge an empty group")]
    EmptyGroup,

    /// A group member could not be loaded; the whole group is rejected
    #[error("Failed to load group member {path}: {source}")]
    MemberLoad {
        path: PathBuf,
        #[source]
        source: RecordError,
    },

    /// No fingerprint was supplied and none could be derived from the record
    #[error("Record has no ingredient identity to fingerprint: {0}")]
    NoIdentity(PathBuf),

    /// Writing a merged record failed
    #[error("Failed to write merged record {path}: {reason}")]
    Output { path: PathBuf, reason: String },
}

/// Result alias for merge operations
pub type MergeResult<T> = Result<T, MergeError>;
