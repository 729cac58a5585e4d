//! Recipe fingerprinting
//!
//! A fingerprint is the SHA-256 of a record's sorted, deduplicated ingredient
//! identifiers (direct ingredients plus every solution's composition) joined
//! with `|`. Concentrations, pH and preparation never participate, so the
//! fingerprint is order-independent, duplicate-insensitive and
//! concentration-independent.

use super::signature_extractor::SignatureExtractor;
use crate::error::RecordError;
use crate::models::{load_record, Record};
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::path::Path;

/// Separator between identifiers in the hashed text
pub const IDENTIFIER_SEPARATOR: char = '|';

/// Prefixed to a separator or escape character occurring inside an identifier
pub const IDENTIFIER_ESCAPE: char = '\\';

/// Hex-encoded SHA-256 over a record's identifier set
pub type Fingerprint = String;

/// Recipe fingerprinter
#[derive(Debug, Default, Clone)]
pub struct Fingerprinter {
    extractor: SignatureExtractor,
}

impl Fingerprinter {
    pub fn new() -> Self {
        Self {
            extractor: SignatureExtractor::new(),
        }
    }

    /// Sorted, deduplicated identifiers of every ingredient in the record
    ///
    /// Fails when the ingredients key is absent or lists nothing.
    pub fn identifiers(&self, record: &Record) -> Result<BTreeSet<String>, RecordError> {
        match &record.ingredients {
            None => return Err(RecordError::MissingIngredientsField),
            Some(list) if list.is_empty() => return Err(RecordError::EmptyIngredientsList),
            Some(_) => {}
        }

        Ok(record
            .all_ingredients()
            .filter_map(|ingredient| self.extractor.extract(ingredient))
            .map(|signature| signature.into_identifier())
            .collect())
    }

    /// Fingerprint a record
    ///
    /// Returns `Ok(None)` when the record is structurally valid but no
    /// ingredient yields a signature (e.g. all placeholders).
    pub fn fingerprint(&self, record: &Record) -> Result<Option<Fingerprint>, RecordError> {
        let identifiers = self.identifiers(record)?;

        if identifiers.is_empty() {
            tracing::debug!(name = %record.name(), "No ingredient identity");
            return Ok(None);
        }

        Ok(Some(hash_identifiers(&identifiers)))
    }

    /// Load a record from disk and fingerprint it
    pub fn fingerprint_file(&self, path: &Path) -> Result<Option<Fingerprint>, RecordError> {
        let record = load_record(path)?;
        self.fingerprint(&record)
    }
}

/// SHA-256 hex digest of the joined identifier set
///
/// Identifiers are escaped before joining, so `{"a|b"}` and `{"a", "b"}`
/// never hash the same text. Sets without `|` or `\` hash exactly as a
/// plain join.
pub fn hash_identifiers(identifiers: &BTreeSet<String>) -> Fingerprint {
    let mut joined = String::new();
    for (i, identifier) in identifiers.iter().enumerate() {
        if i > 0 {
            joined.push(IDENTIFIER_SEPARATOR);
        }
        joined.push_str(&escape_identifier(identifier));
    }

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn escape_identifier(identifier: &str) -> Cow<'_, str> {
    if !identifier.contains(&[IDENTIFIER_SEPARATOR, IDENTIFIER_ESCAPE][..]) {
        return Cow::Borrowed(identifier);
    }
    let mut escaped = String::with_capacity(identifier.len() + 2);
    for c in identifier.chars() {
        if c == IDENTIFIER_SEPARATOR || c == IDENTIFIER_ESCAPE {
            escaped.push(IDENTIFIER_ESCAPE);
        }
        escaped.push(c);
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ingredient, OntologyTerm, Solution};
    use serde_yaml::Value;

    fn named(name: &str) -> Ingredient {
        Ingredient {
            preferred_term: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn chebi(name: &str, id: &str) -> Ingredient {
        Ingredient {
            preferred_term: Some(name.to_string()),
            term: Some(OntologyTerm {
                id: Some(id.to_string()),
                label: Some(name.to_lowercase()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn record(ingredients: Vec<Ingredient>) -> Record {
        Record {
            name: Some("Test medium".to_string()),
            ingredients: Some(ingredients),
            ..Default::default()
        }
    }

    #[test]
    fn test_deterministic() {
        let fp = Fingerprinter::new();
        let r = record(vec![chebi("Tryptone", "CHEBI:36316"), named("Agar")]);
        assert_eq!(fp.fingerprint(&r).unwrap(), fp.fingerprint(&r).unwrap());
    }

    #[test]
    fn test_known_digest() {
        let fp = Fingerprinter::new();
        let r = record(vec![named("b"), named("a")]);
        // sha256("a|b")
        assert_eq!(
            fp.fingerprint(&r).unwrap().unwrap(),
            "0eab8a0a3380abf4c7d1fb0b43b66aafbb64a4b953e4eb2dccca579461912d0c"
        );
    }

    #[test]
    fn test_order_independent() {
        let fp = Fingerprinter::new();
        let a = record(vec![named("Agar"), chebi("NaCl", "CHEBI:26710"), named("Peptone")]);
        let b = record(vec![named("Peptone"), named("Agar"), chebi("NaCl", "CHEBI:26710")]);
        assert_eq!(fp.fingerprint(&a).unwrap(), fp.fingerprint(&b).unwrap());
    }

    #[test]
    fn test_duplicate_insensitive() {
        let fp = Fingerprinter::new();
        let a = record(vec![chebi("NaCl", "CHEBI:26710"), named("Agar")]);
        let b = record(vec![
            chebi("NaCl", "CHEBI:26710"),
            chebi("Sodium chloride", "CHEBI:26710"),
            named("Agar"),
            named("AGAR "),
        ]);
        assert_eq!(fp.fingerprint(&a).unwrap(), fp.fingerprint(&b).unwrap());
    }

    #[test]
    fn test_concentration_independent() {
        let fp = Fingerprinter::new();
        let mut low = named("Glucose");
        low.concentration = Some(serde_yaml::from_str::<Value>("{value: '1', unit: G_PER_L}").unwrap());
        let mut high = named("Glucose");
        high.concentration = Some(serde_yaml::from_str::<Value>("{value: '20', unit: MG_PER_L}").unwrap());

        assert_eq!(
            fp.fingerprint(&record(vec![low])).unwrap(),
            fp.fingerprint(&record(vec![high])).unwrap()
        );
    }

    #[test]
    fn test_solution_ingredients_participate() {
        let fp = Fingerprinter::new();
        let plain = record(vec![named("Agar")]);
        let mut with_solution = record(vec![named("Agar")]);
        with_solution.solutions = Some(vec![Solution {
            preferred_term: Some("Trace element solution".to_string()),
            composition: vec![named("ZnSO4 · 7H2O")],
            ..Default::default()
        }]);

        assert_ne!(
            fp.fingerprint(&plain).unwrap(),
            fp.fingerprint(&with_solution).unwrap()
        );

        let flattened = record(vec![named("Agar"), named("ZnSO4")]);
        assert_eq!(
            fp.fingerprint(&flattened).unwrap(),
            fp.fingerprint(&with_solution).unwrap()
        );
    }

    #[test]
    fn test_placeholder_collapse() {
        let fp = Fingerprinter::new();
        let r = record(vec![named("See source for composition"), named("Not specified")]);
        assert_eq!(fp.fingerprint(&r).unwrap(), None);
    }

    #[test]
    fn test_required_field_errors() {
        let fp = Fingerprinter::new();
        let missing = Record {
            name: Some("No ingredients".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            fp.fingerprint(&missing),
            Err(RecordError::MissingIngredientsField)
        ));
        assert!(matches!(
            fp.fingerprint(&record(vec![])),
            Err(RecordError::EmptyIngredientsList)
        ));
    }

    #[test]
    fn test_chebi_and_name_records_differ() {
        let fp = Fingerprinter::new();
        let by_chebi = record(vec![chebi("NaCl", "CHEBI:26710")]);
        let by_name = record(vec![named("NaCl")]);
        assert_ne!(fp.fingerprint(&by_chebi).unwrap(), fp.fingerprint(&by_name).unwrap());
    }

    #[test]
    fn test_separator_inside_a_name_does_not_collide() {
        let joined: BTreeSet<String> = ["a|b".to_string()].into();
        let split: BTreeSet<String> = ["a".to_string(), "b".to_string()].into();
        assert_ne!(hash_identifiers(&joined), hash_identifiers(&split));

        let fp = Fingerprinter::new();
        assert_ne!(
            fp.fingerprint(&record(vec![named("A|B")])).unwrap(),
            fp.fingerprint(&record(vec![named("a"), named("b")])).unwrap()
        );
    }

    #[test]
    fn test_escape_character_inside_a_name_does_not_collide() {
        // Unescaped these would both hash `a\|b`
        let trailing: BTreeSet<String> = ["a\\".to_string(), "b".to_string()].into();
        let inner: BTreeSet<String> = ["a\\|b".to_string()].into();
        assert_ne!(hash_identifiers(&trailing), hash_identifiers(&inner));
        assert_eq!(escape_identifier("a\\|b"), "a\\\\\\|b");
        assert!(matches!(escape_identifier("CHEBI:26710"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_digest_is_hex_sha256() {
        let fp = Fingerprinter::new();
        let digest = fp.fingerprint(&record(vec![named("Agar")])).unwrap().unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
