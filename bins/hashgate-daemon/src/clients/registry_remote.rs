use async_trait::async_trait;
use hashgate_core::error::CoreError;
use hashgate_core::registry::FingerprintRegistry;
use hashgate_registry_client::{RegistryClient, RegistryError};
use hashgate_types::Fingerprint;

/// Adapts the resilient HTTP client onto the core's gate-facing trait.
/// Only the error kind crosses the boundary; the gates decide policy.
pub struct RemoteRegistry {
    client: RegistryClient,
}

impl RemoteRegistry {
    pub fn new(client: RegistryClient) -> Self {
        Self { client }
    }
}

fn map_err(err: RegistryError) -> CoreError {
    CoreError::Registry(err.kind_label().to_string())
}

#[async_trait]
impl FingerprintRegistry for RemoteRegistry {
    async fn is_listed(&self, fingerprint: &Fingerprint) -> Result<bool, CoreError> {
        self.client.lookup(fingerprint).await.map_err(map_err)
    }

    async fn publish(&self, fingerprint: &Fingerprint) -> Result<(), CoreError> {
        // Ok(false) is a conditional-write collision: the entry already
        // exists, which is exactly what a contribution wants
        self.client
            .store(fingerprint)
            .await
            .map(|_| ())
            .map_err(map_err)
    }
}
