use async_trait::async_trait;
use hashgate_types::Fingerprint;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::CoreError;

/// Gate-facing view of the shared registry. The resilient HTTP client
/// lives in its own crate; whatever implements this trait has already
/// spent its retry budget, so an `Err` here means the registry is
/// unreachable for this operation and the gate applies its own policy.
#[async_trait]
pub trait FingerprintRegistry: Send + Sync {
    async fn is_listed(&self, fingerprint: &Fingerprint) -> Result<bool, CoreError>;
    async fn publish(&self, fingerprint: &Fingerprint) -> Result<(), CoreError>;
}

#[derive(Clone, Default)]
pub struct InMemoryFingerprintRegistry {
    listed: Arc<Mutex<HashSet<Fingerprint>>>,
    fail_checks: Arc<Mutex<bool>>,
    fail_publish: Arc<Mutex<bool>>,
    check_calls: Arc<Mutex<u32>>,
}

impl InMemoryFingerprintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn list(&self, fingerprint: &Fingerprint) {
        self.listed.lock().await.insert(fingerprint.clone());
    }

    pub async fn unlist(&self, fingerprint: &Fingerprint) {
        self.listed.lock().await.remove(fingerprint);
    }

    pub async fn is_known(&self, fingerprint: &Fingerprint) -> bool {
        self.listed.lock().await.contains(fingerprint)
    }

    pub async fn set_failing_checks(&self, failing: bool) {
        *self.fail_checks.lock().await = failing;
    }

    pub async fn set_failing_publish(&self, failing: bool) {
        *self.fail_publish.lock().await = failing;
    }

    pub async fn check_count(&self) -> u32 {
        *self.check_calls.lock().await
    }
}

#[async_trait]
impl FingerprintRegistry for InMemoryFingerprintRegistry {
    async fn is_listed(&self, fingerprint: &Fingerprint) -> Result<bool, CoreError> {
        {
            let mut calls = self.check_calls.lock().await;
            *calls += 1;
        }
        if *self.fail_checks.lock().await {
            return Err(CoreError::Registry("server_fault".to_string()));
        }
        Ok(self.listed.lock().await.contains(fingerprint))
    }

    async fn publish(&self, fingerprint: &Fingerprint) -> Result<(), CoreError> {
        if *self.fail_publish.lock().await {
            return Err(CoreError::Registry("connectivity".to_string()));
        }
        self.listed.lock().await.insert(fingerprint.clone());
        Ok(())
    }
}
