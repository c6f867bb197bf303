//! Alias table: known free-text name variants mapped to a canonical
//! display name.
//!
//! Earlier tooling hard-coded transliteration checks ("Ayshe" → "Ayşe")
//! inline. Administrators instead maintain a JSON file so the resolver can
//! learn new variants without a code change:
//!
//! ```json
//! [
//!   { "canonical": "Ayşe Yılmaz", "variants": ["Ayshe Yilmaz", "A. Yilmaz"] }
//! ]
//! ```
//!
//! Variants are matched after folding, so spelling out every case/diacritic
//! permutation is unnecessary.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::util::fold_name;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasEntry {
    pub canonical: String,
    #[serde(default)]
    pub variants: Vec<String>,
}

/// Folded variant → canonical display name.
#[derive(Debug, Default)]
pub struct AliasTable {
    entries: HashMap<String, String>,
}

impl AliasTable {
    /// Build a table from entries, folding every variant key. A variant
    /// claimed by two canonicals keeps the first and logs the conflict.
    pub fn from_entries(entries: Vec<AliasEntry>) -> Self {
        let mut map: HashMap<String, String> = HashMap::new();
        for entry in entries {
            for variant in &entry.variants {
                let key = fold_name(variant);
                if key.is_empty() {
                    continue;
                }
                if let Some(existing) = map.get(&key) {
                    if existing != &entry.canonical {
                        log::warn!(
                            "alias table: variant '{}' claimed by both '{}' and '{}', keeping the first",
                            variant,
                            existing,
                            entry.canonical
                        );
                    }
                    continue;
                }
                map.insert(key, entry.canonical.clone());
            }
        }
        Self { entries: map }
    }

    /// Load the table from a JSON file. A missing file is an empty table,
    /// not an error — the resolver works without aliases.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let entries: Vec<AliasEntry> = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;
        Ok(Self::from_entries(entries))
    }

    /// Canonical display name for an already-folded variant, if taught.
    pub fn resolve_folded(&self, folded_variant: &str) -> Option<&str> {
        self.entries.get(folded_variant).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
