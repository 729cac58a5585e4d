pub mod file_scanner;
pub mod fingerprinter;
pub mod matcher;
pub mod merge_orchestrator;
pub mod merger;
pub mod provenance_verifier;
pub mod signature_extractor;
pub mod source_classifier;
pub mod statistics;

pub use file_scanner::{RecordScanner, ScanError};
pub use fingerprinter::{Fingerprint, Fingerprinter};
pub use matcher::{GroupingResult, MatchOutcome, Matcher};
pub use merge_orchestrator::{MergeOrchestrator, MergeRun, MergeSettings};
pub use merger::{GroupMember, MergeOutcome, Merger, MERGE_CURATOR};
pub use provenance_verifier::ProvenanceReport;
pub use signature_extractor::{IngredientSignature, SignatureExtractor};
pub use source_classifier::Source;
pub use statistics::{
    DuplicateStats, ErrorBreakdown, GroupSummary, MatchStats, MergeGroups, RunStatistics,
    SkipReason,
};
