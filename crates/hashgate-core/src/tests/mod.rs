
use crate::config::GateConfig;
use crate::messaging::MockTransport;
use crate::policy::GatePolicy;
use crate::registry::InMemoryFingerprintRegistry;
use crate::ContentGate;
use hashgate_storage::{KeyProvider, MasterKey, StorageError};
use hashgate_types::Fingerprint;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct TestKeyProvider;

impl KeyProvider for TestKeyProvider {
    fn get_or_create_master_key(&self) -> Result<MasterKey, StorageError> {
        Ok(MasterKey::new([7u8; 32]))
    }

    fn get_master_key(&self) -> Result<MasterKey, StorageError> {
        Ok(MasterKey::new([7u8; 32]))
    }
}

pub fn temp_path(label: &str) -> String {
    format!("/tmp/{}-{}", label, Uuid::new_v4())
}

pub fn fast_policy() -> GatePolicy {
    GatePolicy {
        remote_check_timeout_ms: 1000,
        retry_poll_interval_ms: 20,
        retry_backoff_initial_ms: 5,
        retry_backoff_max_ms: 20,
        retry_max_attempts: 3,
        retry_batch: 16,
    }
}

pub fn base_config(path: String) -> GateConfig {
    GateConfig {
        storage_path: path,
        namespace: "test".to_string(),
    }
}

pub async fn gate_at(
    path: String,
    registry: Arc<InMemoryFingerprintRegistry>,
    transport: MockTransport,
) -> ContentGate {
    ContentGate::init(
        base_config(path),
        fast_policy(),
        Arc::new(TestKeyProvider),
        registry,
        Arc::new(transport),
    )
    .await
    .expect("gate")
}

pub async fn gate_with(
    label: &str,
    registry: Arc<InMemoryFingerprintRegistry>,
    transport: MockTransport,
) -> ContentGate {
    gate_at(temp_path(label), registry, transport).await
}

pub fn fp(label: &str) -> Fingerprint {
    Fingerprint::compute(label.as_bytes())
}
