//! Canonical records produced by the merger

use super::record::Record;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;
use std::path::Path;

/// Provenance keys a source inherited from an earlier merge; always replaced
const MERGE_KEYS: [&str; 2] = ["merge_fingerprint", "merged_from"];

/// Keys describing the group a record stands for
pub const GROUP_KEYS: [&str; 2] = ["synonyms", "categories"];

/// Non-canonical name retained with its provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synonym {
    pub name: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_category: Option<String>,
}

/// One canonical record per distinct formulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    #[serde(flatten)]
    pub record: Record,
    pub merge_fingerprint: String,
    /// Every consumed input, in input order. Never empty.
    pub merged_from: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<Vec<Synonym>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

impl MergedRecord {
    pub fn new(mut record: Record, merge_fingerprint: String, merged_from: Vec<String>) -> Self {
        for key in MERGE_KEYS {
            record.extra.remove(key);
        }
        let synonyms = lift(&mut record.extra, GROUP_KEYS[0]);
        let categories = lift(&mut record.extra, GROUP_KEYS[1]);
        Self {
            record,
            merge_fingerprint,
            merged_from,
            synonyms,
            categories,
        }
    }

    pub fn name(&self) -> &str {
        self.record.name()
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Read a merged record previously written by the orchestrator
    pub fn load(path: &Path) -> recipe_common::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }
}

/// Move `key` out of the passthrough fields when it has the typed shape
fn lift<T: DeserializeOwned>(extra: &mut Mapping, key: &str) -> Option<T> {
    let typed = serde_yaml::from_value(extra.get(key)?.clone()).ok()?;
    extra.remove(key);
    Some(typed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_merge_keys_dropped_from_source() {
        let mut record = Record {
            name: Some("LB".to_string()),
            ..Default::default()
        };
        record.extra.insert("merged_from".into(), vec!["old"].into());
        record.extra.insert("ph".into(), 7.into());

        let merged = MergedRecord::new(record, "abc".to_string(), vec!["new".to_string()]);
        assert!(!merged.record.extra.contains_key("merged_from"));
        assert!(merged.record.extra.contains_key("ph"));

        let yaml = merged.to_yaml().unwrap();
        assert_eq!(yaml.matches("merged_from").count(), 1);
    }

    #[test]
    fn test_existing_categories_become_typed() {
        let mut record = Record::default();
        record.extra.insert("categories".into(), vec!["algal"].into());
        record.extra.insert("synonyms".into(), "free text".into());

        let merged = MergedRecord::new(record, "abc".to_string(), vec!["x.yaml".to_string()]);
        assert_eq!(merged.categories, Some(vec!["algal".to_string()]));
        assert!(!merged.record.extra.contains_key("categories"));
        // Not a synonym list; left as it was
        assert!(merged.synonyms.is_none());
        assert!(merged.record.extra.contains_key("synonyms"));
    }

    #[test]
    fn test_yaml_omits_absent_optional_fields() {
        let merged = MergedRecord::new(
            Record {
                name: Some("M9".to_string()),
                ..Default::default()
            },
            "f00d".to_string(),
            vec!["m9".to_string()],
        );
        let yaml = merged.to_yaml().unwrap();
        assert!(yaml.contains("merge_fingerprint: f00d"));
        assert!(!yaml.contains("synonyms"));
        assert!(!yaml.contains("categories"));

        let back: MergedRecord = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, merged);
    }
}
