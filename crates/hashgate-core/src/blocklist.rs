use hashgate_storage::EncryptedStore;
use hashgate_types::Fingerprint;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::CoreError;
use crate::time::now_ms;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockReason {
    LocalHeuristic(String),
    GlobalRegistry,
}

/// Device-owned block decision. Never transmitted anywhere; removed when
/// the content is judged safe again or evicted by local policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalBlockRecord {
    pub fingerprint: Fingerprint,
    pub reason: BlockReason,
    pub blocked_at_ms: u64,
}

#[derive(Clone)]
pub struct LocalBlocklist {
    store: Arc<Mutex<EncryptedStore>>,
}

impl LocalBlocklist {
    pub fn new(store: Arc<Mutex<EncryptedStore>>) -> Self {
        Self { store }
    }

    pub async fn block(
        &self,
        fingerprint: &Fingerprint,
        reason: BlockReason,
    ) -> Result<LocalBlockRecord, CoreError> {
        let record = LocalBlockRecord {
            fingerprint: fingerprint.clone(),
            reason,
            blocked_at_ms: now_ms(),
        };
        let bytes = serde_json::to_vec(&record).map_err(|_| CoreError::Storage)?;
        let guard = self.store.lock().await;
        guard
            .put(&Self::key(fingerprint), &bytes)
            .map_err(|_| CoreError::Storage)?;
        Ok(record)
    }

    pub async fn unblock(&self, fingerprint: &Fingerprint) -> Result<(), CoreError> {
        let guard = self.store.lock().await;
        guard
            .delete(&Self::key(fingerprint))
            .map_err(|_| CoreError::Storage)
    }

    pub async fn lookup(&self, fingerprint: &Fingerprint) -> Option<LocalBlockRecord> {
        let guard = self.store.lock().await;
        guard
            .get(&Self::key(fingerprint))
            .ok()
            .flatten()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
    }

    pub async fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.lookup(fingerprint).await.is_some()
    }

    pub async fn list(&self) -> Vec<LocalBlockRecord> {
        let guard = self.store.lock().await;
        let keys = guard.keys_with_prefix("block:").unwrap_or_default();
        let mut records = Vec::new();
        for key in keys {
            if let Ok(Some(bytes)) = guard.get(&key) {
                if let Ok(record) = serde_json::from_slice(&bytes) {
                    records.push(record);
                }
            }
        }
        records
    }

    fn key(fingerprint: &Fingerprint) -> String {
        format!("block:{}", fingerprint.to_hex())
    }
}
