//! Document-store boundary.
//!
//! The CRM delegates persistence to a hosted document store; this crate only
//! needs collection scans, single-document attribution updates, and a
//! presence ping. `RecordStore` is the seam: the pipeline and the tests run
//! against the same trait, backed by HTTP in production and by
//! `store::memory` in tests.

pub mod http;
pub mod memory;

use async_trait::async_trait;

use crate::types::{AttributionPatch, Identity, SaleRecord};

/// Errors from the store, classified by recoverability.
///
/// A rate-limit error is fatal to the remaining batch (the updater halts
/// early); everything else on a single update is recorded and skipped.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Request rate limit exhausted")]
    RateLimited,
    #[error("Credentials expired or revoked")]
    AuthExpired,
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// True when the remaining batch should stop rather than continue.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, StoreError::RateLimited)
    }

    /// True for errors worth recording and skipping past on a single update.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Http(_) => true,
            StoreError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// The store operations the reconciliation job needs.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the full identity collection. No server-side filtering —
    /// all matching happens client-side.
    async fn fetch_identities(&self) -> Result<Vec<Identity>, StoreError>;

    /// Fetch the full sale-record collection, wholesale.
    async fn fetch_sale_records(&self) -> Result<Vec<SaleRecord>, StoreError>;

    /// Rewrite one record's attribution fields (and audit marker).
    async fn update_attribution(
        &self,
        record_id: &str,
        patch: &AttributionPatch,
    ) -> Result<(), StoreError>;

    /// Online-presence heartbeat for the signed-in operator.
    async fn record_presence(&self, operator_id: &str) -> Result<(), StoreError>;
}
