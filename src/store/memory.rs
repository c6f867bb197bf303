//! In-memory store for tests: seeded collections, scriptable per-record
//! failures, and an update log so tests can assert order and progress.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{RecordStore, StoreError};
use crate::types::{AttributionPatch, Identity, SaleRecord};

/// Failure to inject when a given record is updated.
#[derive(Debug, Clone, Copy)]
pub enum FailureKind {
    RateLimited,
    Transient,
}

#[derive(Default)]
pub struct MemoryStore {
    identities: Mutex<Vec<Identity>>,
    records: Mutex<Vec<SaleRecord>>,
    failures: Mutex<HashMap<String, FailureKind>>,
    update_log: Mutex<Vec<String>>,
    presence_log: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new(identities: Vec<Identity>, records: Vec<SaleRecord>) -> Self {
        Self {
            identities: Mutex::new(identities),
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    /// Script a failure for the next updates of `record_id`.
    pub fn fail_update(&self, record_id: &str, kind: FailureKind) {
        self.failures.lock().insert(record_id.to_string(), kind);
    }

    pub fn record(&self, record_id: &str) -> Option<SaleRecord> {
        self.records
            .lock()
            .iter()
            .find(|r| r.id == record_id)
            .cloned()
    }

    /// Record ids in the order updates were applied.
    pub fn update_log(&self) -> Vec<String> {
        self.update_log.lock().clone()
    }

    pub fn update_count(&self) -> usize {
        self.update_log.lock().len()
    }

    pub fn presence_count(&self) -> usize {
        self.presence_log.lock().len()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch_identities(&self) -> Result<Vec<Identity>, StoreError> {
        Ok(self.identities.lock().clone())
    }

    async fn fetch_sale_records(&self) -> Result<Vec<SaleRecord>, StoreError> {
        Ok(self.records.lock().clone())
    }

    async fn update_attribution(
        &self,
        record_id: &str,
        patch: &AttributionPatch,
    ) -> Result<(), StoreError> {
        if let Some(kind) = self.failures.lock().get(record_id) {
            return Err(match kind {
                FailureKind::RateLimited => StoreError::RateLimited,
                FailureKind::Transient => StoreError::Api {
                    status: 503,
                    message: format!("simulated transient failure for {}", record_id),
                },
            });
        }

        let mut records = self.records.lock();
        let record = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| StoreError::Api {
                status: 404,
                message: format!("no such record: {}", record_id),
            })?;
        record.attributed_to = patch.attributed_to.clone();
        record.attributed_name = Some(patch.attributed_name.clone());
        drop(records);

        self.update_log.lock().push(record_id.to_string());
        Ok(())
    }

    async fn record_presence(&self, operator_id: &str) -> Result<(), StoreError> {
        self.presence_log.lock().push(operator_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn seed() -> MemoryStore {
        MemoryStore::new(
            vec![Identity {
                id: "u1".to_string(),
                display_name: "Ayşe Yılmaz".to_string(),
                role: Role::Staff,
                active: true,
            }],
            vec![SaleRecord {
                id: "r1".to_string(),
                personnel_name: "Ayşe Yılmaz".to_string(),
                attributed_to: "admin".to_string(),
                attributed_name: None,
                created_at: "2024-03-01T09:12:00Z".to_string(),
                outcome: None,
                notes: None,
            }],
        )
    }

    #[tokio::test]
    async fn test_update_rewrites_attribution() {
        let store = seed();
        let identity = store.fetch_identities().await.unwrap().remove(0);
        let patch = AttributionPatch::for_identity(&identity);
        store.update_attribution("r1", &patch).await.unwrap();

        let record = store.record("r1").unwrap();
        assert_eq!(record.attributed_to, "u1");
        assert_eq!(record.attributed_name.as_deref(), Some("Ayşe Yılmaz"));
        assert_eq!(store.update_log(), vec!["r1".to_string()]);
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let store = seed();
        store.fail_update("r1", FailureKind::RateLimited);
        let identity = store.fetch_identities().await.unwrap().remove(0);
        let patch = AttributionPatch::for_identity(&identity);
        let err = store.update_attribution("r1", &patch).await.unwrap_err();
        assert!(err.is_rate_limited());
        assert_eq!(store.update_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_record_is_api_error() {
        let store = seed();
        let identity = store.fetch_identities().await.unwrap().remove(0);
        let patch = AttributionPatch::for_identity(&identity);
        let err = store.update_attribution("nope", &patch).await.unwrap_err();
        assert!(matches!(err, StoreError::Api { status: 404, .. }));
    }
}
