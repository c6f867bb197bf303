//! Mismatch detection and fuzzy name resolution.
//!
//! Classification is pure: one sale record against the identity index and
//! the alias table, no store access. The fuzzy cascade runs only when exact
//! lookup misses, in order:
//!
//! 1. folded-name equality (case/diacritic variants)
//! 2. folded substring containment, either direction, active identities only
//! 3. alias table (folded variant → canonical display name → exact index)
//!
//! A rule that yields exactly one candidate wins. More than one candidate is
//! never auto-picked: the record classifies ambiguous and is deferred to the
//! operator, candidates ordered by jaro-winkler similarity for display.

use crate::aliases::AliasTable;
use crate::index::{ExactHit, IdentityIndex};
use crate::types::{FuzzyRule, Identity, MatchOutcome, SaleRecord};
use crate::util::fold_name;

/// Folded names shorter than this never participate in containment —
/// single initials would match half the roster.
const MIN_CONTAINMENT_LEN: usize = 3;

/// Classify one record against the index.
pub fn classify(record: &SaleRecord, index: &IdentityIndex, aliases: &AliasTable) -> MatchOutcome {
    match index.lookup_exact(&record.personnel_name) {
        ExactHit::Unique(identity) => outcome_for(record, identity.clone(), FuzzyRule::Exact),
        ExactHit::Duplicate(candidates) => ambiguous(
            record,
            candidates.into_iter().cloned().collect(),
        ),
        ExactHit::Missing => resolve_fuzzy(record, index, aliases),
    }
}

/// A resolved candidate whose id already matches the record's attribution is
/// correct, not fixable — this is what makes a second run a no-op.
fn outcome_for(record: &SaleRecord, identity: Identity, rule: FuzzyRule) -> MatchOutcome {
    if identity.id == record.attributed_to {
        MatchOutcome::Correct
    } else {
        MatchOutcome::Fixable { identity, rule }
    }
}

fn resolve_fuzzy(
    record: &SaleRecord,
    index: &IdentityIndex,
    aliases: &AliasTable,
) -> MatchOutcome {
    let folded = fold_name(&record.personnel_name);
    if folded.is_empty() {
        return MatchOutcome::Unmatched;
    }

    // Rule 1: folded equality.
    let hits = index.lookup_folded(&folded);
    match hits {
        [only] => return outcome_for(record, only.clone(), FuzzyRule::NormalizedExact),
        [_, ..] => return ambiguous(record, hits.to_vec()),
        [] => {}
    }

    // Rule 2: containment in either direction, active identities only so a
    // loose match cannot re-attach records to departed staff.
    if folded.len() >= MIN_CONTAINMENT_LEN {
        let candidates: Vec<Identity> = index
            .folded_iter()
            .filter(|(_, identity)| identity.active)
            .filter(|(identity_folded, _)| {
                identity_folded.len() >= MIN_CONTAINMENT_LEN
                    && (identity_folded.contains(&folded) || folded.contains(identity_folded))
            })
            .map(|(_, identity)| identity.clone())
            .collect();
        match candidates.len() {
            1 => {
                return outcome_for(
                    record,
                    candidates.into_iter().next().unwrap(),
                    FuzzyRule::Containment,
                )
            }
            n if n > 1 => return ambiguous(record, candidates),
            _ => {}
        }
    }

    // Rule 3: alias table.
    if let Some(canonical) = aliases.resolve_folded(&folded) {
        match index.lookup_exact(canonical) {
            ExactHit::Unique(identity) => {
                return outcome_for(record, identity.clone(), FuzzyRule::Alias)
            }
            ExactHit::Duplicate(candidates) => {
                return ambiguous(record, candidates.into_iter().cloned().collect())
            }
            ExactHit::Missing => {
                log::warn!(
                    "alias table maps '{}' to '{}', but no such identity exists",
                    record.personnel_name,
                    canonical
                );
            }
        }
    }

    MatchOutcome::Unmatched
}

/// Order candidates by similarity to the recorded name (descending) so the
/// operator sees the most plausible match first. Presentation only — the
/// ordering never picks a winner.
fn ambiguous(record: &SaleRecord, mut candidates: Vec<Identity>) -> MatchOutcome {
    let folded = fold_name(&record.personnel_name);
    candidates.sort_by(|a, b| {
        let sa = strsim::jaro_winkler(&folded, &fold_name(&a.display_name));
        let sb = strsim::jaro_winkler(&folded, &fold_name(&b.display_name));
        sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
    });
    MatchOutcome::Ambiguous { candidates }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aliases::AliasEntry;
    use crate::types::Role;

    fn identity(id: &str, name: &str) -> Identity {
        Identity {
            id: id.to_string(),
            display_name: name.to_string(),
            role: Role::Staff,
            active: true,
        }
    }

    fn record(id: &str, personnel: &str, attributed_to: &str) -> SaleRecord {
        SaleRecord {
            id: id.to_string(),
            personnel_name: personnel.to_string(),
            attributed_to: attributed_to.to_string(),
            attributed_name: None,
            created_at: "2024-03-01T09:12:00Z".to_string(),
            outcome: None,
            notes: None,
        }
    }

    fn index() -> IdentityIndex {
        IdentityIndex::build(vec![
            identity("u1", "Ayşe Yılmaz"),
            identity("u2", "Mehmet Kaya"),
        ])
    }

    #[test]
    fn test_exact_match_same_attribution_is_correct() {
        let outcome = classify(
            &record("r1", "Ayşe Yılmaz", "u1"),
            &index(),
            &AliasTable::default(),
        );
        assert_eq!(outcome, MatchOutcome::Correct);
    }

    #[test]
    fn test_exact_match_wrong_attribution_is_fixable() {
        let outcome = classify(
            &record("r1", "Ayşe Yılmaz", "admin"),
            &index(),
            &AliasTable::default(),
        );
        match outcome {
            MatchOutcome::Fixable { identity, rule } => {
                assert_eq!(identity.id, "u1");
                assert_eq!(rule, FuzzyRule::Exact);
            }
            other => panic!("expected fixable, got {:?}", other),
        }
    }

    #[test]
    fn test_ascii_variant_resolves_via_folding() {
        let outcome = classify(
            &record("r2", "Ayse Yilmaz", "admin"),
            &index(),
            &AliasTable::default(),
        );
        match outcome {
            MatchOutcome::Fixable { identity, rule } => {
                assert_eq!(identity.id, "u1");
                assert_eq!(rule, FuzzyRule::NormalizedExact);
            }
            other => panic!("expected fuzzy fix, got {:?}", other),
        }
    }

    #[test]
    fn test_fuzzy_resolution_already_attributed_is_correct() {
        // Second run after a fix: name still folds to u1, attribution now u1.
        let outcome = classify(
            &record("r2", "Ayse Yilmaz", "u1"),
            &index(),
            &AliasTable::default(),
        );
        assert_eq!(outcome, MatchOutcome::Correct);
    }

    #[test]
    fn test_partial_name_resolves_via_containment() {
        let outcome = classify(
            &record("r3", "Mehmet", "admin"),
            &index(),
            &AliasTable::default(),
        );
        match outcome {
            MatchOutcome::Fixable { identity, rule } => {
                assert_eq!(identity.id, "u2");
                assert_eq!(rule, FuzzyRule::Containment);
            }
            other => panic!("expected containment fix, got {:?}", other),
        }
    }

    #[test]
    fn test_containment_skips_inactive_identities() {
        let mut departed = identity("u3", "Mehmet Demir");
        departed.active = false;
        let idx = IdentityIndex::build(vec![departed]);
        let outcome = classify(
            &record("r3", "Mehmet", "admin"),
            &idx,
            &AliasTable::default(),
        );
        assert_eq!(outcome, MatchOutcome::Unmatched);
    }

    #[test]
    fn test_containment_with_two_candidates_is_ambiguous() {
        let idx = IdentityIndex::build(vec![
            identity("u2", "Mehmet Kaya"),
            identity("u3", "Mehmet Demir"),
        ]);
        let outcome = classify(
            &record("r3", "Mehmet", "admin"),
            &idx,
            &AliasTable::default(),
        );
        match outcome {
            MatchOutcome::Ambiguous { candidates } => assert_eq!(candidates.len(), 2),
            other => panic!("expected ambiguous, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_display_name_is_ambiguous() {
        let idx = IdentityIndex::build(vec![
            identity("u1", "Ayşe Yılmaz"),
            identity("u9", "Ayşe Yılmaz"),
        ]);
        let outcome = classify(
            &record("r1", "Ayşe Yılmaz", "u1"),
            &idx,
            &AliasTable::default(),
        );
        assert!(matches!(outcome, MatchOutcome::Ambiguous { .. }));
    }

    #[test]
    fn test_alias_table_resolves_taught_variant() {
        let aliases = AliasTable::from_entries(vec![AliasEntry {
            canonical: "Ayşe Yılmaz".to_string(),
            variants: vec!["Ayshe Jilmaz".to_string()],
        }]);
        let outcome = classify(&record("r4", "Ayshe Jilmaz", "admin"), &index(), &aliases);
        match outcome {
            MatchOutcome::Fixable { identity, rule } => {
                assert_eq!(identity.id, "u1");
                assert_eq!(rule, FuzzyRule::Alias);
            }
            other => panic!("expected alias fix, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_name_stays_unmatched() {
        let outcome = classify(
            &record("r5", "Completely Unknown Name", "admin"),
            &index(),
            &AliasTable::default(),
        );
        assert_eq!(outcome, MatchOutcome::Unmatched);
    }

    #[test]
    fn test_ambiguous_candidates_ordered_by_similarity() {
        let idx = IdentityIndex::build(vec![
            identity("u3", "Mehmet Demirel"),
            identity("u2", "Mehmet Kaya"),
        ]);
        let outcome = classify(
            &record("r6", "Mehmet", "admin"),
            &idx,
            &AliasTable::default(),
        );
        match outcome {
            MatchOutcome::Ambiguous { candidates } => {
                // Closer folded name first
                assert_eq!(candidates[0].id, "u2");
                assert_eq!(candidates[1].id, "u3");
            }
            other => panic!("expected ambiguous, got {:?}", other),
        }
    }
}
