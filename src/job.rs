//! One-shot reconciliation pipeline: fetch → index → classify → confirm →
//! apply.
//!
//! The plan phase is read-only and side-effect free; the mutating phase is
//! only reachable through `ReconcilePlan::confirm()`, so a caller cannot
//! write to the store without explicitly acknowledging what the plan will
//! change. Running the pipeline twice without intervening edits produces
//! zero updates on the second run.

use serde::Serialize;

use crate::aliases::AliasTable;
use crate::index::IdentityIndex;
use crate::resolver::classify;
use crate::store::{RecordStore, StoreError};
use crate::types::{MatchOutcome, RunSummary, SaleRecord};
use crate::updater::{apply_fixes, AttributionFix, BatchSettings, StopFlag};

/// Classification of one record, kept with the record for operator review.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOutcome {
    pub record: SaleRecord,
    #[serde(flatten)]
    pub outcome: MatchOutcome,
}

/// Per-classification counts shown to the operator before confirmation.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub total: usize,
    pub correct: usize,
    pub fixable: usize,
    pub ambiguous: usize,
    pub unmatched: usize,
}

/// Read-only result of the plan phase.
pub struct ReconcilePlan {
    outcomes: Vec<RecordOutcome>,
    fixes: Vec<AttributionFix>,
}

impl ReconcilePlan {
    pub fn summary(&self) -> PlanSummary {
        let mut s = PlanSummary {
            total: self.outcomes.len(),
            correct: 0,
            fixable: 0,
            ambiguous: 0,
            unmatched: 0,
        };
        for ro in &self.outcomes {
            match ro.outcome {
                MatchOutcome::Correct => s.correct += 1,
                MatchOutcome::Fixable { .. } => s.fixable += 1,
                MatchOutcome::Ambiguous { .. } => s.ambiguous += 1,
                MatchOutcome::Unmatched => s.unmatched += 1,
            }
        }
        s
    }

    /// The corrections the mutating phase would apply.
    pub fn fixes(&self) -> &[AttributionFix] {
        &self.fixes
    }

    /// Records needing manual resolution (ambiguous and unmatched), for the
    /// operator report.
    pub fn needs_review(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.outcomes.iter().filter(|ro| {
            matches!(
                ro.outcome,
                MatchOutcome::Ambiguous { .. } | MatchOutcome::Unmatched
            )
        })
    }

    pub fn outcomes(&self) -> &[RecordOutcome] {
        &self.outcomes
    }

    /// Explicitly acknowledge the plan. This is the only way to reach the
    /// mutating phase.
    pub fn confirm(self) -> ConfirmedPlan {
        ConfirmedPlan { plan: self }
    }
}

/// Proof that an operator reviewed and accepted a plan.
pub struct ConfirmedPlan {
    plan: ReconcilePlan,
}

/// Plan phase: fetch both collections wholesale and classify every record.
/// Read-only; safe to run any number of times.
pub async fn build_plan(
    store: &dyn RecordStore,
    aliases: &AliasTable,
) -> Result<ReconcilePlan, StoreError> {
    let identities = store.fetch_identities().await?;
    let records = store.fetch_sale_records().await?;
    log::info!(
        "plan phase: {} identities, {} sale records, {} alias variant(s)",
        identities.len(),
        records.len(),
        aliases.len()
    );

    let index = IdentityIndex::build(identities);
    if index.is_empty() {
        log::warn!("identity collection is empty; every record will classify unmatched");
    }

    let mut outcomes = Vec::with_capacity(records.len());
    let mut fixes = Vec::new();
    for record in records {
        let outcome = classify(&record, &index, aliases);
        if let MatchOutcome::Fixable { identity, rule } = &outcome {
            fixes.push(AttributionFix {
                record_id: record.id.clone(),
                identity: identity.clone(),
                rule: *rule,
            });
        }
        outcomes.push(RecordOutcome { record, outcome });
    }

    let plan = ReconcilePlan { outcomes, fixes };
    let s = plan.summary();
    log::info!(
        "plan: {} correct, {} fixable, {} ambiguous, {} unmatched",
        s.correct,
        s.fixable,
        s.ambiguous,
        s.unmatched
    );
    Ok(plan)
}

/// Mutating phase: apply the confirmed plan's fixes through the batch
/// updater and assemble the operator summary.
pub async fn apply(
    store: &dyn RecordStore,
    confirmed: ConfirmedPlan,
    settings: &BatchSettings,
    stop: &StopFlag,
) -> RunSummary {
    let plan = confirmed.plan;
    let plan_summary = plan.summary();

    let report = apply_fixes(store, &plan.fixes, settings, stop).await;

    let mut summary = RunSummary::new(plan_summary.total);
    summary.skipped = plan_summary.ambiguous + plan_summary.unmatched;
    summary.updated = report.updated;
    summary.attempted = report.attempted;
    summary.halted = report.halted;
    summary.errors = report.failures.len();
    summary.error_details = report
        .failures
        .into_iter()
        .take(settings.max_error_details)
        .collect();

    log::info!(
        "run {}: {} updated, {} skipped, {} error(s){}",
        summary.run_id,
        summary.updated,
        summary.skipped,
        summary.errors,
        if summary.halted { " (halted early)" } else { "" }
    );
    summary
}
