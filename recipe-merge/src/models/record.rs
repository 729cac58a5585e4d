//! Growth-medium recipe records as read from the normalized corpus
//!
//! Only the fields the matching engine consumes are typed. Everything else a
//! record carries is kept in `extra` so a merged record reproduces its source
//! content verbatim.

use crate::error::RecordError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// CURIE prefix that marks an ontology term as a CHEBI chemical
pub const CHEBI_PREFIX: &str = "CHEBI:";

/// Filler substituted for stray hex-escape artifacts
pub const HEX_ESCAPE_FILLER: &str = "_";

/// Upstream PDF/text extraction leaves `\x..` fragments that are not valid
/// YAML escapes.
static HEX_ESCAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\x[0-9A-Fa-f]{0,2}").expect("hex escape pattern is valid")
});

/// Ontology term reference `{id, label}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OntologyTerm {
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl OntologyTerm {
    /// CHEBI CURIE, if this term carries one
    pub fn chebi_id(&self) -> Option<&str> {
        self.id
            .as_deref()
            .map(str::trim)
            .filter(|id| id.starts_with(CHEBI_PREFIX))
    }
}

/// One ingredient entry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub preferred_term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<OntologyTerm>,
    /// Read but never part of identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concentration: Option<Value>,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl Ingredient {
    pub fn is_chebi_typed(&self) -> bool {
        self.term.as_ref().and_then(OntologyTerm::chebi_id).is_some()
    }
}

/// Named sub-solution with its own composition
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Solution {
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub preferred_term: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub composition: Vec<Ingredient>,
    #[serde(flatten)]
    pub extra: Mapping,
}

/// Cross-reference to the originating database and its native ID
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaTerm {
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub preferred_term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<OntologyTerm>,
    #[serde(flatten)]
    pub extra: Mapping,
}

/// Append-only curation history entry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CurationEvent {
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub curator: Option<String>,
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub extra: Mapping,
}

/// A medium recipe
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_term: Option<MediaTerm>,
    /// `None` when the key is absent (or null)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<Ingredient>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solutions: Option<Vec<Solution>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub curation_history: Vec<CurationEvent>,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl Record {
    /// Recipe name, empty when absent
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Native ID from the cross-reference structure
    pub fn source_id(&self) -> Option<&str> {
        self.media_term
            .as_ref()
            .and_then(|m| m.term.as_ref())
            .and_then(|t| t.id.as_deref())
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Category with surrounding whitespace removed, if meaningful
    pub fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Direct ingredients followed by every solution's composition
    pub fn all_ingredients(&self) -> impl Iterator<Item = &Ingredient> + '_ {
        let direct = self.ingredients.iter().flatten();
        let nested = self
            .solutions
            .iter()
            .flatten()
            .flat_map(|s| s.composition.iter());
        direct.chain(nested)
    }

    /// Count of direct ingredients typed with a CHEBI term
    pub fn chebi_ingredient_count(&self) -> usize {
        self.ingredients
            .iter()
            .flatten()
            .filter(|i| i.is_chebi_typed())
            .count()
    }
}

/// Reference to a record on disk
///
/// The identifier is what provenance lists record: the path relative to the
/// corpus root, `/`-separated, so same-named files from different source
/// directories stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordRef {
    pub path: PathBuf,
    id: String,
}

impl RecordRef {
    /// Reference identified by its file name
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let id = file_name_id(&path);
        Self { path, id }
    }

    /// Reference identified by its path below `root`
    pub fn under_root(root: &Path, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let id = match path.strip_prefix(root) {
            Ok(relative) if relative.components().next().is_some() => relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            _ => file_name_id(&path),
        };
        Self { path, id }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn load(&self) -> Result<Record, RecordError> {
        load_record(&self.path)
    }
}

impl From<PathBuf> for RecordRef {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

fn file_name_id(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Any YAML scalar as text; numbered media often carry `name: 2216`
fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text)),
        Value::Number(number) => Ok(Some(number.to_string())),
        Value::Bool(flag) => Ok(Some(flag.to_string())),
        other => Err(de::Error::custom(format!(
            "expected a scalar, found {}",
            value_kind(&other)
        ))),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
        _ => "a scalar",
    }
}

/// Replace stray `\x..` artifacts with a filler character
pub fn repair_hex_escapes(content: &str) -> Cow<'_, str> {
    HEX_ESCAPE.replace_all(content, HEX_ESCAPE_FILLER)
}

/// Parse record text, attributing failures to `path`
pub fn parse_record(content: &str, path: &Path) -> Result<Record, RecordError> {
    let repaired = repair_hex_escapes(content);
    if repaired.trim().is_empty() {
        return Err(RecordError::NotARecord(path.to_path_buf()));
    }

    let value: Value =
        serde_yaml::from_str(&repaired).map_err(|e| RecordError::UnparseableRecord {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if !value.is_mapping() {
        return Err(RecordError::NotARecord(path.to_path_buf()));
    }

    serde_yaml::from_value(value).map_err(|e| RecordError::UnparseableRecord {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Load one record from its YAML file
pub fn load_record(path: &Path) -> Result<Record, RecordError> {
    let content = std::fs::read_to_string(path).map_err(|source| RecordError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_record(&content, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<Record, RecordError> {
        parse_record(content, Path::new("test.yaml"))
    }

    #[test]
    fn test_parse_typed_and_extra_fields() {
        let record = parse(
            r#"
name: LB Medium
category: bacterial
media_term:
  preferred_term: LB Medium
  term:
    id: "TOGO:M001"
    label: LB Medium
ingredients:
  - preferred_term: Tryptone
    term:
      id: "CHEBI:36316"
      label: tryptone
    concentration:
      value: "10"
      unit: G_PER_L
  - preferred_term: Yeast extract
ph_value: 7.0
"#,
        )
        .unwrap();

        assert_eq!(record.name(), "LB Medium");
        assert_eq!(record.category(), Some("bacterial"));
        assert_eq!(record.source_id(), Some("TOGO:M001"));
        assert_eq!(record.ingredients.as_ref().unwrap().len(), 2);
        assert_eq!(record.chebi_ingredient_count(), 1);
        assert!(record.extra.contains_key("ph_value"));
    }

    #[test]
    fn test_all_ingredients_includes_solutions() {
        let record = parse(
            r#"
name: Mineral medium
ingredients:
  - preferred_term: Agar
solutions:
  - preferred_term: Trace elements
    composition:
      - preferred_term: ZnSO4
      - preferred_term: MnCl2
"#,
        )
        .unwrap();

        let names: Vec<_> = record
            .all_ingredients()
            .filter_map(|i| i.preferred_term.as_deref())
            .collect();
        assert_eq!(names, vec!["Agar", "ZnSO4", "MnCl2"]);
    }

    #[test]
    fn test_missing_and_null_ingredients_are_none() {
        assert!(parse("name: A").unwrap().ingredients.is_none());
        assert!(parse("name: A\ningredients: null").unwrap().ingredients.is_none());
        assert_eq!(parse("name: A\ningredients: []").unwrap().ingredients, Some(vec![]));
    }

    #[test]
    fn test_non_mapping_is_not_a_record() {
        assert!(matches!(parse("- a\n- b"), Err(RecordError::NotARecord(_))));
        assert!(matches!(parse(""), Err(RecordError::NotARecord(_))));
    }

    #[test]
    fn test_invalid_yaml_is_unparseable() {
        assert!(matches!(
            parse("name: [unclosed"),
            Err(RecordError::UnparseableRecord { .. })
        ));
    }

    #[test]
    fn test_hex_escape_repair() {
        assert_eq!(repair_hex_escapes(r"Fe\x0SO4"), "Fe_SO4");
        assert_eq!(repair_hex_escapes(r"a\xZZ"), "a_ZZ");
        assert_eq!(repair_hex_escapes("plain"), "plain");

        let record = parse("name: \"Medium \\xZ9 one\"\ningredients:\n  - preferred_term: NaCl\n")
            .unwrap();
        assert_eq!(record.name(), "Medium _Z9 one");
    }

    #[test]
    fn test_record_ref_ids() {
        let r = RecordRef::new("/corpus/togo/TOGO_M001.yaml");
        assert_eq!(r.id(), "TOGO_M001.yaml");

        let root = Path::new("/corpus");
        let togo = RecordRef::under_root(root, "/corpus/togo/medium_1.yaml");
        let atcc = RecordRef::under_root(root, "/corpus/atcc/medium_1.yaml");
        assert_eq!(togo.id(), "togo/medium_1.yaml");
        assert_ne!(togo.id(), atcc.id());

        let outside = RecordRef::under_root(root, "/elsewhere/x.yml");
        assert_eq!(outside.id(), "x.yml");
    }

    #[test]
    fn test_numeric_text_fields_accepted() {
        let record = parse(
            r#"
name: 2216
category: 3
media_term:
  term:
    id: 2216
ingredients:
  - preferred_term: 42
    term:
      id: "CHEBI:26710"
      label: true
curation_history:
  - timestamp: 20240501
    action: Imported
"#,
        )
        .unwrap();

        assert_eq!(record.name(), "2216");
        assert_eq!(record.category(), Some("3"));
        assert_eq!(record.source_id(), Some("2216"));
        let ingredient = &record.ingredients.as_ref().unwrap()[0];
        assert_eq!(ingredient.preferred_term.as_deref(), Some("42"));
        assert_eq!(ingredient.term.as_ref().unwrap().label.as_deref(), Some("true"));
        assert_eq!(record.curation_history[0].timestamp.as_deref(), Some("20240501"));
    }

    #[test]
    fn test_structured_name_is_unparseable() {
        assert!(matches!(
            parse("name: [a, b]\ningredients:\n  - preferred_term: NaCl\n"),
            Err(RecordError::UnparseableRecord { .. })
        ));
    }
}
