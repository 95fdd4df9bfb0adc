use hashgate_types::Fingerprint;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

use crate::blocklist::LocalBlocklist;
use crate::events::{EventBus, GateEvent};
use crate::messaging::MessageTransport;
use crate::policy::GatePolicy;
use crate::registry::FingerprintRegistry;
use crate::time::now_ms;

/// User-facing send failure. Messages deliberately carry no fingerprint,
/// error code or registry detail.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("this content could not be sent")]
    Blocked,
    #[error("message could not be delivered")]
    Transport,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendReceipt {
    pub fingerprint: Fingerprint,
    pub transmitted_at_ms: u64,
}

/// Pre-transmission gate: local blocklist, then the shared registry,
/// then the actual transmit. A positive match denies; registry failures
/// never do. Successful sends contribute their fingerprint back to the
/// registry off the critical path.
#[derive(Clone)]
pub struct SendGate {
    blocklist: LocalBlocklist,
    registry: Arc<dyn FingerprintRegistry>,
    transport: Arc<dyn MessageTransport>,
    events: EventBus,
    policy: GatePolicy,
}

impl SendGate {
    pub fn new(
        blocklist: LocalBlocklist,
        registry: Arc<dyn FingerprintRegistry>,
        transport: Arc<dyn MessageTransport>,
        events: EventBus,
        policy: GatePolicy,
    ) -> Self {
        Self {
            blocklist,
            registry,
            transport,
            events,
            policy,
        }
    }

    pub async fn send(&self, recipient: &str, payload: &[u8]) -> Result<SendReceipt, SendError> {
        let fingerprint = Fingerprint::compute(payload);
        if self.blocklist.contains(&fingerprint).await {
            log::info!("send denied locally fp={}", fingerprint.log_prefix());
            return Err(SendError::Blocked);
        }
        if self.remote_listed(&fingerprint).await {
            log::info!("send denied by registry fp={}", fingerprint.log_prefix());
            return Err(SendError::Blocked);
        }
        self.transport
            .transmit(recipient, payload)
            .await
            .map_err(|_| SendError::Transport)?;
        self.spawn_contribution(fingerprint.clone());
        Ok(SendReceipt {
            fingerprint,
            transmitted_at_ms: now_ms(),
        })
    }

    async fn remote_listed(&self, fingerprint: &Fingerprint) -> bool {
        let check = self.registry.is_listed(fingerprint);
        match timeout(
            Duration::from_millis(self.policy.remote_check_timeout_ms),
            check,
        )
        .await
        {
            Ok(Ok(listed)) => listed,
            Ok(Err(err)) => {
                log::warn!(
                    "send remote check fp={} failing open: {}",
                    fingerprint.log_prefix(),
                    err
                );
                false
            }
            Err(_) => {
                log::warn!(
                    "send remote check fp={} timed out, failing open",
                    fingerprint.log_prefix()
                );
                false
            }
        }
    }

    fn spawn_contribution(&self, fingerprint: Fingerprint) {
        let registry = self.registry.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            if let Err(err) = registry.publish(&fingerprint).await {
                // the send already succeeded; the registry just stays
                // unaware of this content
                log::warn!(
                    "contribution fp={} failed: {}",
                    fingerprint.log_prefix(),
                    err
                );
                events.publish(GateEvent::ContributionFailed {
                    fingerprint,
                    kind: err.to_string(),
                });
            }
        });
    }
}
