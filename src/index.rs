//! Identity index built once per run from the full user collection.
//!
//! Exact lookup is by raw display name. Display names are not unique across
//! identities; colliding names are tracked and reported as ambiguous rather
//! than resolved last-write-wins. A folded-name map backs the fuzzy rules.

use std::collections::HashMap;

use crate::types::Identity;
use crate::util::fold_name;

/// Result of an exact display-name lookup.
#[derive(Debug)]
pub enum ExactHit<'a> {
    Unique(&'a Identity),
    /// Two or more identities share this display name.
    Duplicate(Vec<&'a Identity>),
    Missing,
}

pub struct IdentityIndex {
    by_name: HashMap<String, Vec<Identity>>,
    by_folded: HashMap<String, Vec<Identity>>,
    identities: Vec<Identity>,
}

impl IdentityIndex {
    /// Build the index from the full identity collection.
    pub fn build(identities: Vec<Identity>) -> Self {
        let mut by_name: HashMap<String, Vec<Identity>> = HashMap::new();
        let mut by_folded: HashMap<String, Vec<Identity>> = HashMap::new();

        for identity in &identities {
            by_name
                .entry(identity.display_name.clone())
                .or_default()
                .push(identity.clone());
            let folded = fold_name(&identity.display_name);
            if !folded.is_empty() {
                by_folded.entry(folded).or_default().push(identity.clone());
            }
        }

        let duplicate_names = by_name.values().filter(|v| v.len() > 1).count();
        if duplicate_names > 0 {
            log::warn!(
                "identity index: {} display name(s) shared by multiple users",
                duplicate_names
            );
        }

        Self {
            by_name,
            by_folded,
            identities,
        }
    }

    /// O(1) exact lookup by raw display name.
    pub fn lookup_exact(&self, name: &str) -> ExactHit<'_> {
        match self.by_name.get(name) {
            Some(matches) if matches.len() == 1 => ExactHit::Unique(&matches[0]),
            Some(matches) => ExactHit::Duplicate(matches.iter().collect()),
            None => ExactHit::Missing,
        }
    }

    /// Identities whose folded display name equals `folded`.
    pub fn lookup_folded(&self, folded: &str) -> &[Identity] {
        self.by_folded.get(folded).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate (folded display name, identity) pairs for containment scans.
    pub fn folded_iter(&self) -> impl Iterator<Item = (&str, &Identity)> {
        self.by_folded
            .iter()
            .flat_map(|(folded, ids)| ids.iter().map(move |id| (folded.as_str(), id)))
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn identity(id: &str, name: &str) -> Identity {
        Identity {
            id: id.to_string(),
            display_name: name.to_string(),
            role: Role::Staff,
            active: true,
        }
    }

    #[test]
    fn test_exact_lookup_unique() {
        let index = IdentityIndex::build(vec![
            identity("u1", "Ayşe Yılmaz"),
            identity("u2", "Mehmet Kaya"),
        ]);
        match index.lookup_exact("Ayşe Yılmaz") {
            ExactHit::Unique(found) => assert_eq!(found.id, "u1"),
            other => panic!("expected unique hit, got {:?}", other),
        }
    }

    #[test]
    fn test_exact_lookup_missing() {
        let index = IdentityIndex::build(vec![identity("u1", "Ayşe Yılmaz")]);
        assert!(matches!(index.lookup_exact("Nobody"), ExactHit::Missing));
    }

    #[test]
    fn test_duplicate_names_are_reported_not_overwritten() {
        let index = IdentityIndex::build(vec![
            identity("u1", "Ayşe Yılmaz"),
            identity("u2", "Ayşe Yılmaz"),
        ]);
        match index.lookup_exact("Ayşe Yılmaz") {
            ExactHit::Duplicate(candidates) => {
                assert_eq!(candidates.len(), 2);
            }
            other => panic!("expected duplicate hit, got {:?}", other),
        }
    }

    #[test]
    fn test_folded_lookup_bridges_diacritics() {
        let index = IdentityIndex::build(vec![identity("u1", "Ayşe Yılmaz")]);
        let hits = index.lookup_folded("ayse yilmaz");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "u1");
    }
}
