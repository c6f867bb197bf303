//! Batch updater: applies attribution corrections in fixed-size chunks with
//! throttle delays between updates and between chunks.
//!
//! Everything is strictly sequential — the delays are deliberate throughput
//! throttles against the store's request-rate limits, not incidental. A
//! transient failure on one record is recorded and skipped; a rate-limit
//! error stops the remaining batch (already-applied updates are kept). The
//! stop flag is polled before each update; nothing is rolled back and
//! nothing is retried.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::store::RecordStore;
use crate::types::{AttributionPatch, FuzzyRule, Identity, UpdateFailure};

/// Tunables for the mutating phase. The defaults are deliberately gentle.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchSettings {
    pub chunk_size: usize,
    /// Pause between chunks.
    pub chunk_delay_ms: u64,
    /// Pause after each individual update within a chunk.
    pub update_delay_ms: u64,
    /// Cap on error details surfaced in the summary.
    pub max_error_details: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            chunk_size: 25,
            chunk_delay_ms: 2_000,
            update_delay_ms: 150,
            max_error_details: 10,
        }
    }
}

/// Cooperative stop flag. The operator sets it; the updater polls it before
/// each unit of work. Updates already applied stay applied.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One correction to apply: which record, which identity, which rule found it.
#[derive(Debug, Clone)]
pub struct AttributionFix {
    pub record_id: String,
    pub identity: Identity,
    pub rule: FuzzyRule,
}

/// What the mutating phase actually did.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub updated: usize,
    pub attempted: usize,
    pub halted: bool,
    pub failures: Vec<UpdateFailure>,
}

/// Number of chunks for `total` fixes at `chunk_size`.
pub fn chunk_count(total: usize, chunk_size: usize) -> usize {
    total.div_ceil(chunk_size.max(1))
}

/// Apply fixes sequentially, chunked and throttled.
pub async fn apply_fixes(
    store: &dyn RecordStore,
    fixes: &[AttributionFix],
    settings: &BatchSettings,
    stop: &StopFlag,
) -> BatchReport {
    let mut report = BatchReport::default();
    let chunk_size = settings.chunk_size.max(1);
    let total_chunks = chunk_count(fixes.len(), chunk_size);

    'outer: for (chunk_idx, chunk) in fixes.chunks(chunk_size).enumerate() {
        if chunk_idx > 0 && settings.chunk_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(settings.chunk_delay_ms)).await;
        }
        log::info!(
            "applying chunk {}/{} ({} update(s))",
            chunk_idx + 1,
            total_chunks,
            chunk.len()
        );

        for fix in chunk {
            if stop.is_stopped() {
                log::warn!(
                    "stop requested after {} update(s); leaving the rest for a later run",
                    report.updated
                );
                report.halted = true;
                break 'outer;
            }

            report.attempted += 1;
            let patch = AttributionPatch::for_identity(&fix.identity);
            match store.update_attribution(&fix.record_id, &patch).await {
                Ok(()) => report.updated += 1,
                Err(e) if e.is_rate_limited() => {
                    log::error!(
                        "rate limit exhausted on record {} after {} update(s); halting batch",
                        fix.record_id,
                        report.updated
                    );
                    report.failures.push(UpdateFailure {
                        record_id: fix.record_id.clone(),
                        message: e.to_string(),
                    });
                    report.halted = true;
                    break 'outer;
                }
                Err(e) => {
                    if e.is_transient() {
                        log::warn!(
                            "transient failure for record {}, skipping: {}",
                            fix.record_id,
                            e
                        );
                    } else {
                        log::error!("update failed for record {}: {}", fix.record_id, e);
                    }
                    report.failures.push(UpdateFailure {
                        record_id: fix.record_id.clone(),
                        message: e.to_string(),
                    });
                }
            }

            if settings.update_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(settings.update_delay_ms)).await;
            }
        }
    }

    report
}
