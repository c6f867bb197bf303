//! Wire types shared across the reconciliation pipeline.
//!
//! Field names follow the document-store JSON (camelCase). Historical sale
//! records spell the personnel field `personel`; the alias keeps old
//! documents deserializable without a migration.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Audit marker written onto every record this job corrects.
pub const CORRECTED_BY: &str = "reattrib-batch";

/// A user identity: stable id, mutable display name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    #[serde(alias = "name")]
    pub display_name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    TeamLead,
    #[default]
    Staff,
}

/// A sale/call record. Only the attribution fields are ever mutated here;
/// `personnel_name` is immutable after creation and `outcome`/`notes` ride
/// along untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub id: String,
    /// Free-text name entered at call-logging time.
    #[serde(alias = "personel")]
    pub personnel_name: String,
    /// Identity id currently credited with the record.
    pub attributed_to: String,
    /// Denormalized copy of the identity's display name at attribution time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributed_name: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// The correction applied to one record: new attribution plus audit marker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttributionPatch {
    pub attributed_to: String,
    pub attributed_name: String,
    pub corrected_by: String,
    pub corrected_at: String,
}

impl AttributionPatch {
    /// Build a patch crediting `identity`, stamped with the current time.
    pub fn for_identity(identity: &Identity) -> Self {
        Self {
            attributed_to: identity.id.clone(),
            attributed_name: identity.display_name.clone(),
            corrected_by: CORRECTED_BY.to_string(),
            corrected_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Which fuzzy rule produced a candidate.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FuzzyRule {
    /// Display name equals the record's name exactly.
    Exact,
    /// Folded names are equal (case/diacritic variants).
    NormalizedExact,
    /// One folded name contains the other.
    Containment,
    /// Matched through the configured alias table.
    Alias,
}

/// Classification of one sale record against the identity index.
/// Ephemeral: lives for one run and the operator summary.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "classification", rename_all = "snake_case")]
pub enum MatchOutcome {
    /// Attribution already points at the identity the name resolves to.
    Correct,
    /// A single identity resolved; attribution should be rewritten.
    Fixable { identity: Identity, rule: FuzzyRule },
    /// More than one identity could plausibly match — operator decides.
    Ambiguous { candidates: Vec<Identity> },
    /// No identity corresponds to the recorded name.
    Unmatched,
}

/// One failed update, kept for the operator summary.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFailure {
    pub record_id: String,
    pub message: String,
}

/// Operator-facing result of one batch run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: String,
    /// Records examined in the plan phase.
    pub total: usize,
    /// Updates applied successfully.
    pub updated: usize,
    /// Records deferred to the operator (unmatched + ambiguous).
    pub skipped: usize,
    /// Failed updates (count; details capped below).
    pub errors: usize,
    pub error_details: Vec<UpdateFailure>,
    /// Updates attempted before the run ended (differs from `updated + errors`
    /// only when the run halted early).
    pub attempted: usize,
    /// True when a rate-limit error or the stop flag ended the run early.
    pub halted: bool,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            total,
            updated: 0,
            skipped: 0,
            errors: 0,
            error_details: Vec::new(),
            attempted: 0,
            halted: false,
        }
    }
}
