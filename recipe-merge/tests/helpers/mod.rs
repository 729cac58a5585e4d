//! Corpus fixture builder
//!
//! Writes small recipe YAML files into a temporary directory.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// One ingredient line for a fixture
pub enum Ing<'a> {
    Chebi(&'a str, &'a str),
    Named(&'a str),
    WithConcentration(&'a str, &'a str),
}

/// Temporary corpus directory
pub struct Corpus {
    pub dir: TempDir,
}

impl Corpus {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp corpus"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write raw text under a relative path
    pub fn raw(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture dir");
        }
        std::fs::write(&path, content).expect("write fixture");
        path
    }

    /// Write a recipe record
    pub fn recipe(
        &self,
        rel: &str,
        name: &str,
        source_id: Option<&str>,
        category: Option<&str>,
        ingredients: &[Ing],
    ) -> PathBuf {
        self.raw(rel, &recipe_yaml(name, source_id, category, ingredients))
    }
}

pub fn recipe_yaml(
    name: &str,
    source_id: Option<&str>,
    category: Option<&str>,
    ingredients: &[Ing],
) -> String {
    let mut yaml = format!("name: \"{}\"\n", name);
    if let Some(category) = category {
        yaml.push_str(&format!("category: {}\n", category));
    }
    if let Some(id) = source_id {
        yaml.push_str(&format!(
            "media_term:\n  preferred_term: \"{}\"\n  term:\n    id: \"{}\"\n    label: \"{}\"\n",
            name, id, name
        ));
    }
    yaml.push_str("ingredients:\n");
    for ing in ingredients {
        match ing {
            Ing::Chebi(term, id) => yaml.push_str(&format!(
                "  - preferred_term: \"{}\"\n    term:\n      id: \"{}\"\n      label: \"{}\"\n",
                term, id, term
            )),
            Ing::Named(term) => yaml.push_str(&format!("  - preferred_term: \"{}\"\n", term)),
            Ing::WithConcentration(term, value) => yaml.push_str(&format!(
                "  - preferred_term: \"{}\"\n    concentration:\n      value: \"{}\"\n      unit: G_PER_L\n",
                term, value
            )),
        }
    }
    yaml.push_str(
        "curation_history:\n  - timestamp: \"2024-05-01T00:00:00Z\"\n    curator: importer\n    action: Imported from source\n",
    );
    yaml
}

/// LB ingredients keyed by CHEBI
pub fn lb() -> Vec<Ing<'static>> {
    vec![
        Ing::Chebi("Tryptone", "CHEBI:36316"),
        Ing::Chebi("NaCl", "CHEBI:26710"),
    ]
}
