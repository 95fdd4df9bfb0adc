pub mod blocklist;
pub mod config;
pub mod download;
pub mod error;
pub mod events;
pub mod messaging;
pub mod policy;
pub mod registry;
pub mod retry;
pub mod send;
pub mod time;

use blocklist::LocalBlocklist;
use config::GateConfig;
use download::DownloadGate;
use error::CoreError;
use events::{EventBus, EventReceiver};
use hashgate_storage::{EncryptedStore, KeyProvider};
use messaging::MessageTransport;
use policy::GatePolicy;
use registry::FingerprintRegistry;
use retry::{RetryQueue, RetryRunner, RetryRunnerHandle};
use send::SendGate;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Wires the fingerprint gate out of its injected collaborators: the
/// durable store, the registry view and the outgoing-message transport.
/// No global state; everything a gate needs is passed in here.
#[derive(Clone)]
pub struct ContentGate {
    policy: GatePolicy,
    store: Arc<Mutex<EncryptedStore>>,
    blocklist: LocalBlocklist,
    retry_queue: RetryQueue,
    registry: Arc<dyn FingerprintRegistry>,
    transport: Arc<dyn MessageTransport>,
    events: EventBus,
}

impl ContentGate {
    pub async fn init(
        config: GateConfig,
        policy: GatePolicy,
        key_provider: Arc<dyn KeyProvider>,
        registry: Arc<dyn FingerprintRegistry>,
        transport: Arc<dyn MessageTransport>,
    ) -> Result<Self, CoreError> {
        let store = EncryptedStore::open(
            &config.storage_path,
            &config.namespace,
            key_provider.as_ref(),
        )
        .map_err(|_| CoreError::Storage)?;
        let store = Arc::new(Mutex::new(store));
        let blocklist = LocalBlocklist::new(store.clone());
        let retry_queue = RetryQueue::new(store.clone());
        Ok(Self {
            policy,
            store,
            blocklist,
            retry_queue,
            registry,
            transport,
            events: EventBus::new(256),
        })
    }

    pub fn send_gate(&self) -> SendGate {
        SendGate::new(
            self.blocklist.clone(),
            self.registry.clone(),
            self.transport.clone(),
            self.events.clone(),
            self.policy.clone(),
        )
    }

    pub fn download_gate(&self) -> DownloadGate {
        DownloadGate::new(
            self.blocklist.clone(),
            self.retry_queue.clone(),
            self.registry.clone(),
            self.policy.clone(),
        )
    }

    pub fn start_retry_runner(&self) -> RetryRunnerHandle {
        RetryRunner::new(
            self.retry_queue.clone(),
            self.blocklist.clone(),
            self.registry.clone(),
            self.events.clone(),
            self.policy.clone(),
        )
        .start()
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    pub fn blocklist(&self) -> LocalBlocklist {
        self.blocklist.clone()
    }

    pub fn retry_queue(&self) -> RetryQueue {
        self.retry_queue.clone()
    }

    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    pub fn store(&self) -> Arc<Mutex<EncryptedStore>> {
        self.store.clone()
    }
}

#[cfg(test)]
mod tests;
