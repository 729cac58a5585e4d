//! Record shapes consumed and produced by the engine

pub mod merged;
pub mod record;

pub use merged::{MergedRecord, Synonym, GROUP_KEYS};
pub use record::{
    load_record, CurationEvent, Ingredient, MediaTerm, OntologyTerm, Record, RecordRef, Solution,
};
