//! Ingredient signature extraction
//!
//! Reduces one ingredient to the identifier that participates in recipe
//! identity. A CHEBI term always wins over the free-text name; placeholder
//! names ("see source for composition", ...) never produce a signature.
//!
//! Name normalisation strips hydration notation, so an anhydrous salt and its
//! hydrate share one identity when neither carries a CHEBI term.

use crate::models::Ingredient;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Free-text fragments that mark an ingredient as a placeholder
pub const PLACEHOLDER_PATTERNS: [&str; 9] = [
    "see source",
    "refer to",
    "available at",
    "contact source",
    "not specified",
    "unknown",
    r"medium no\.",
    "composition not available",
    "proprietary",
];

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("(?i){}", PLACEHOLDER_PATTERNS.join("|")))
        .expect("placeholder patterns are valid")
});

// ·7H2O, .6H2O, x 2 H2O, (0.5H2O) on an already lowercased name
static HYDRATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*(?:[·.x]\s*\d*(?:\.\d+)?\s*h2o|\(\s*\d*(?:\.\d+)?\s*h2o\s*\))")
        .expect("hydration pattern is valid")
});

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Identity contribution of one ingredient
///
/// Equality, hashing and ordering consider only the identifier, never the
/// variant.
#[derive(Debug, Clone)]
pub enum IngredientSignature {
    /// CHEBI CURIE taken from the ontology term
    Chebi(String),
    /// Normalized free-text name
    Name(String),
}

impl IngredientSignature {
    pub fn identifier(&self) -> &str {
        match self {
            IngredientSignature::Chebi(id) | IngredientSignature::Name(id) => id,
        }
    }

    pub fn into_identifier(self) -> String {
        match self {
            IngredientSignature::Chebi(id) | IngredientSignature::Name(id) => id,
        }
    }

    pub fn is_chebi(&self) -> bool {
        matches!(self, IngredientSignature::Chebi(_))
    }
}

impl PartialEq for IngredientSignature {
    fn eq(&self, other: &Self) -> bool {
        self.identifier() == other.identifier()
    }
}

impl Eq for IngredientSignature {}

impl Hash for IngredientSignature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier().hash(state);
    }
}

impl PartialOrd for IngredientSignature {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IngredientSignature {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.identifier().cmp(other.identifier())
    }
}

impl fmt::Display for IngredientSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// True when the name only points elsewhere instead of naming a chemical
pub fn is_placeholder(name: &str) -> bool {
    PLACEHOLDER.is_match(name)
}

/// Lowercase, strip hydration notation, collapse whitespace
pub fn normalize_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let dehydrated = HYDRATION.replace_all(&lowered, "");
    WHITESPACE.replace_all(&dehydrated, " ").trim().to_string()
}

/// Signature extractor
#[derive(Debug, Default, Clone, Copy)]
pub struct SignatureExtractor;

impl SignatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the identity signature of one ingredient
    ///
    /// **Algorithm:**
    /// 1. CHEBI CURIE on the ontology term → `Chebi`
    /// 2. Non-empty, non-placeholder `preferred_term` → `Name(normalized)`
    /// 3. Otherwise `None`
    pub fn extract(&self, ingredient: &Ingredient) -> Option<IngredientSignature> {
        if let Some(chebi) = ingredient.term.as_ref().and_then(|t| t.chebi_id()) {
            return Some(IngredientSignature::Chebi(chebi.to_string()));
        }

        let name = ingredient.preferred_term.as_deref()?.trim();
        if name.is_empty() {
            return None;
        }

        if is_placeholder(name) {
            tracing::trace!(name = %name, "Placeholder ingredient carries no identity");
            return None;
        }

        let normalized = normalize_name(name);
        if normalized.is_empty() {
            return None;
        }

        Some(IngredientSignature::Name(normalized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OntologyTerm;

    fn ingredient(name: Option<&str>, term_id: Option<&str>) -> Ingredient {
        Ingredient {
            preferred_term: name.map(str::to_string),
            term: term_id.map(|id| OntologyTerm {
                id: Some(id.to_string()),
                label: None,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_chebi_wins_over_name() {
        let sig = SignatureExtractor::new()
            .extract(&ingredient(Some("Sodium chloride"), Some("CHEBI:26710")))
            .unwrap();
        assert!(sig.is_chebi());
        assert_eq!(sig.identifier(), "CHEBI:26710");
    }

    #[test]
    fn test_non_chebi_term_falls_back_to_name() {
        let sig = SignatureExtractor::new()
            .extract(&ingredient(Some("Yeast Extract"), Some("FOODON:03315426")))
            .unwrap();
        assert_eq!(sig, IngredientSignature::Name("yeast extract".to_string()));
    }

    #[test]
    fn test_placeholders_rejected_case_insensitively() {
        let extractor = SignatureExtractor::new();
        for name in [
            "See source for composition",
            "Please REFER TO the original paper",
            "Recipe available at DSMZ",
            "Contact source",
            "Not specified",
            "unknown supplement",
            "Medium No. 42",
            "Composition not available",
            "Proprietary mix",
        ] {
            assert!(extractor.extract(&ingredient(Some(name), None)).is_none(), "{name}");
        }
    }

    #[test]
    fn test_absent_or_blank_name_yields_none() {
        let extractor = SignatureExtractor::new();
        assert!(extractor.extract(&ingredient(None, None)).is_none());
        assert!(extractor.extract(&ingredient(Some("   "), None)).is_none());
    }

    #[test]
    fn test_hydration_notation_stripped() {
        assert_eq!(normalize_name("MgSO4·7H2O"), "mgso4");
        assert_eq!(normalize_name("MgCl2.6H2O"), "mgcl2");
        assert_eq!(normalize_name("CaCl2 x 2 H2O"), "cacl2");
        assert_eq!(normalize_name("CaSO4 (0.5 H2O)"), "caso4");
        assert_eq!(normalize_name("FeSO4 · 7 H2O"), "feso4");
    }

    #[test]
    fn test_hydrate_forms_conflate_without_chebi() {
        assert_eq!(normalize_name("MgSO4"), normalize_name("MgSO4 · 7H2O"));
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(normalize_name("  Beef    Extract \t"), "beef extract");
    }

    #[test]
    fn test_equality_ignores_variant() {
        let a = IngredientSignature::Chebi("x".to_string());
        let b = IngredientSignature::Name("x".to_string());
        assert_eq!(a, b);
    }
}
