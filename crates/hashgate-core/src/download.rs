use hashgate_types::Fingerprint;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use uuid::Uuid;

use crate::blocklist::{BlockReason, LocalBlocklist};
use crate::error::CoreError;
use crate::policy::GatePolicy;
use crate::registry::FingerprintRegistry;
use crate::retry::RetryQueue;

pub enum DownloadSource<'a> {
    Bytes(&'a [u8]),
    Precomputed(Fingerprint),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadDecision {
    Allow,
    Blocked(BlockReason),
}

impl DownloadDecision {
    pub fn allowed(&self) -> bool {
        matches!(self, DownloadDecision::Allow)
    }
}

/// Pre-materialization gate for attachments. A registry hit blocks the
/// download, records the block locally and queues the attachment for
/// periodic re-evaluation; registry failures allow the download.
#[derive(Clone)]
pub struct DownloadGate {
    blocklist: LocalBlocklist,
    retry_queue: RetryQueue,
    registry: Arc<dyn FingerprintRegistry>,
    policy: GatePolicy,
}

impl DownloadGate {
    pub fn new(
        blocklist: LocalBlocklist,
        retry_queue: RetryQueue,
        registry: Arc<dyn FingerprintRegistry>,
        policy: GatePolicy,
    ) -> Self {
        Self {
            blocklist,
            retry_queue,
            registry,
            policy,
        }
    }

    pub async fn evaluate(
        &self,
        source: DownloadSource<'_>,
        attachment_ref: Uuid,
    ) -> Result<DownloadDecision, CoreError> {
        let fingerprint = match source {
            DownloadSource::Bytes(bytes) => Fingerprint::compute(bytes),
            DownloadSource::Precomputed(fingerprint) => fingerprint,
        };
        if let Some(record) = self.blocklist.lookup(&fingerprint).await {
            log::info!("download denied locally fp={}", fingerprint.log_prefix());
            return Ok(DownloadDecision::Blocked(record.reason));
        }
        let check = self.registry.is_listed(&fingerprint);
        match timeout(
            Duration::from_millis(self.policy.remote_check_timeout_ms),
            check,
        )
        .await
        {
            Ok(Ok(true)) => {
                self.blocklist
                    .block(&fingerprint, BlockReason::GlobalRegistry)
                    .await?;
                self.retry_queue.upsert(&fingerprint, attachment_ref).await?;
                log::info!("download denied by registry fp={}", fingerprint.log_prefix());
                Ok(DownloadDecision::Blocked(BlockReason::GlobalRegistry))
            }
            Ok(Ok(false)) => Ok(DownloadDecision::Allow),
            Ok(Err(err)) => {
                log::warn!(
                    "download remote check fp={} failing open: {}",
                    fingerprint.log_prefix(),
                    err
                );
                Ok(DownloadDecision::Allow)
            }
            Err(_) => {
                log::warn!(
                    "download remote check fp={} timed out, failing open",
                    fingerprint.log_prefix()
                );
                Ok(DownloadDecision::Allow)
            }
        }
    }
}
