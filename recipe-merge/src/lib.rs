//! recipe-merge library interface
//!
//! Identity, matching and canonical-merge engine for growth-medium recipes
//! imported from heterogeneous source databases:
//!
//! - [`services::SignatureExtractor`]: one ingredient → optional identifier
//! - [`services::Fingerprinter`]: one record → optional SHA-256 fingerprint
//! - [`services::Matcher`]: corpus → fingerprint groups + skip tallies
//! - [`services::Merger`]: one group → one canonical [`models::MergedRecord`]
//! - [`services::MergeOrchestrator`]: full corpus run with statistics

pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{MergeError, MergeResult, RecordError};
