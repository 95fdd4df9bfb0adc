use hashgate_storage::EncryptedStore;
use hashgate_types::Fingerprint;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use uuid::Uuid;

use crate::blocklist::LocalBlocklist;
use crate::error::CoreError;
use crate::events::{EventBus, GateEvent};
use crate::policy::GatePolicy;
use crate::registry::FingerprintRegistry;
use crate::time::now_ms;

const ITEM_PREFIX: &str = "retry:item:";
const RETIRED_PREFIX: &str = "retry:retired:";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRetryItem {
    pub fingerprint: Fingerprint,
    pub attachment_ref: Uuid,
    pub created_at_ms: u64,
    pub last_checked_ms: u64,
    pub next_check_ms: u64,
    pub attempts: u32,
}

/// Durable set of blocked downloads awaiting re-evaluation. Each item
/// carries its own schedule, so heavily retried fingerprints back off
/// independently of fresh ones.
#[derive(Clone)]
pub struct RetryQueue {
    store: Arc<Mutex<EncryptedStore>>,
}

impl RetryQueue {
    pub fn new(store: Arc<Mutex<EncryptedStore>>) -> Self {
        Self { store }
    }

    /// Re-blocking an attachment refreshes its reference and schedule
    /// but keeps the attempt count, so flapping items still converge to
    /// retirement.
    pub async fn upsert(
        &self,
        fingerprint: &Fingerprint,
        attachment_ref: Uuid,
    ) -> Result<PendingRetryItem, CoreError> {
        let guard = self.store.lock().await;
        let key = Self::item_key(fingerprint);
        let now = now_ms();
        let item = match load::<PendingRetryItem>(&guard, &key) {
            Some(mut existing) => {
                existing.attachment_ref = attachment_ref;
                existing.next_check_ms = now;
                existing
            }
            None => PendingRetryItem {
                fingerprint: fingerprint.clone(),
                attachment_ref,
                created_at_ms: now,
                last_checked_ms: 0,
                next_check_ms: now,
                attempts: 0,
            },
        };
        persist(&guard, &key, &item)?;
        Ok(item)
    }

    pub async fn due(&self, now: u64, limit: usize) -> Result<Vec<PendingRetryItem>, CoreError> {
        let guard = self.store.lock().await;
        let keys = guard
            .keys_with_prefix(ITEM_PREFIX)
            .map_err(|_| CoreError::Storage)?;
        let mut items: Vec<PendingRetryItem> = keys
            .iter()
            .filter_map(|key| load(&guard, key))
            .filter(|item: &PendingRetryItem| item.next_check_ms <= now)
            .collect();
        items.sort_by_key(|item| item.next_check_ms);
        items.truncate(limit);
        Ok(items)
    }

    /// Records a failed re-check: bumps the attempt count and schedules
    /// the next one with the jittered exponential backoff.
    pub async fn mark_checked(
        &self,
        fingerprint: &Fingerprint,
        policy: &GatePolicy,
    ) -> Result<Option<PendingRetryItem>, CoreError> {
        let guard = self.store.lock().await;
        let key = Self::item_key(fingerprint);
        let Some(mut item) = load::<PendingRetryItem>(&guard, &key) else {
            return Ok(None);
        };
        let now = now_ms();
        item.attempts = item.attempts.saturating_add(1);
        item.last_checked_ms = now;
        item.next_check_ms = now.saturating_add(backoff_delay_ms(policy, item.attempts - 1));
        persist(&guard, &key, &item)?;
        Ok(Some(item))
    }

    pub async fn remove(&self, fingerprint: &Fingerprint) -> Result<(), CoreError> {
        let guard = self.store.lock().await;
        guard
            .delete(&Self::item_key(fingerprint))
            .map_err(|_| CoreError::Storage)
    }

    /// Moves an item out of the active polling set for good; it is kept
    /// under a separate prefix for manual review.
    pub async fn retire(&self, fingerprint: &Fingerprint) -> Result<(), CoreError> {
        let guard = self.store.lock().await;
        let key = Self::item_key(fingerprint);
        let Some(item) = load::<PendingRetryItem>(&guard, &key) else {
            return Ok(());
        };
        guard.delete(&key).map_err(|_| CoreError::Storage)?;
        persist(&guard, &Self::retired_key(fingerprint), &item)
    }

    pub async fn get(&self, fingerprint: &Fingerprint) -> Option<PendingRetryItem> {
        let guard = self.store.lock().await;
        load(&guard, &Self::item_key(fingerprint))
    }

    pub async fn len(&self) -> usize {
        let guard = self.store.lock().await;
        guard
            .keys_with_prefix(ITEM_PREFIX)
            .map(|keys| keys.len())
            .unwrap_or(0)
    }

    pub async fn permanently_blocked(&self) -> Vec<PendingRetryItem> {
        let guard = self.store.lock().await;
        guard
            .keys_with_prefix(RETIRED_PREFIX)
            .unwrap_or_default()
            .iter()
            .filter_map(|key| load(&guard, key))
            .collect()
    }

    fn item_key(fingerprint: &Fingerprint) -> String {
        format!("{}{}", ITEM_PREFIX, fingerprint.to_hex())
    }

    fn retired_key(fingerprint: &Fingerprint) -> String {
        format!("{}{}", RETIRED_PREFIX, fingerprint.to_hex())
    }
}

fn load<T: serde::de::DeserializeOwned>(store: &EncryptedStore, key: &str) -> Option<T> {
    store
        .get(key)
        .ok()
        .flatten()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
}

fn persist<T: Serialize>(store: &EncryptedStore, key: &str, value: &T) -> Result<(), CoreError> {
    let bytes = serde_json::to_vec(value).map_err(|_| CoreError::Storage)?;
    store.put(key, &bytes).map_err(|_| CoreError::Storage)
}

fn backoff_delay_ms(policy: &GatePolicy, attempt: u32) -> u64 {
    let factor = 1u64 << attempt.min(16);
    let base = policy
        .retry_backoff_initial_ms
        .saturating_mul(factor)
        .min(policy.retry_backoff_max_ms);
    let permille = rand::thread_rng().gen_range(750..=1250u64);
    base.saturating_mul(permille) / 1000
}

pub struct RetryRunnerHandle {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl RetryRunnerHandle {
    /// Cooperative stop: the current pass finishes its in-flight check,
    /// no new pass starts.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }
}

/// Background re-evaluation loop over the pending set. One cooperative
/// task for all items, never a task per item.
pub struct RetryRunner {
    queue: RetryQueue,
    blocklist: LocalBlocklist,
    registry: Arc<dyn FingerprintRegistry>,
    events: EventBus,
    policy: GatePolicy,
}

impl RetryRunner {
    pub fn new(
        queue: RetryQueue,
        blocklist: LocalBlocklist,
        registry: Arc<dyn FingerprintRegistry>,
        events: EventBus,
        policy: GatePolicy,
    ) -> Self {
        Self {
            queue,
            blocklist,
            registry,
            events,
            policy,
        }
    }

    pub fn start(self) -> RetryRunnerHandle {
        let (shutdown, mut shutdown_rx) = oneshot::channel();
        let interval = Duration::from_millis(self.policy.retry_poll_interval_ms.max(1));
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        self.run_pass().await;
                    }
                }
            }
        });
        RetryRunnerHandle { shutdown, handle }
    }

    /// One re-evaluation sweep. Public so callers can drive a pass
    /// outside the background schedule.
    pub async fn run_pass(&self) {
        let now = now_ms();
        let due = match self.queue.due(now, self.policy.retry_batch).await {
            Ok(items) => items,
            Err(_) => return,
        };
        for item in due {
            let check = timeout(
                Duration::from_millis(self.policy.remote_check_timeout_ms),
                self.registry.is_listed(&item.fingerprint),
            )
            .await;
            match check {
                Ok(Ok(false)) => self.reactivate(item).await,
                _ => self.still_blocked(item).await,
            }
        }
    }

    async fn reactivate(&self, item: PendingRetryItem) {
        let _ = self.queue.remove(&item.fingerprint).await;
        let _ = self.blocklist.unblock(&item.fingerprint).await;
        log::info!("download reactivated fp={}", item.fingerprint.log_prefix());
        self.events.publish(GateEvent::DownloadReactivated {
            fingerprint: item.fingerprint,
            attachment_ref: item.attachment_ref,
        });
    }

    async fn still_blocked(&self, item: PendingRetryItem) {
        let attempts = item.attempts.saturating_add(1);
        if attempts >= self.policy.retry_max_attempts {
            let _ = self.queue.retire(&item.fingerprint).await;
            log::warn!(
                "download permanently blocked after {} checks fp={}",
                attempts,
                item.fingerprint.log_prefix()
            );
            self.events.publish(GateEvent::DownloadPermanentlyBlocked {
                fingerprint: item.fingerprint,
                attachment_ref: item.attachment_ref,
            });
        } else {
            let _ = self
                .queue
                .mark_checked(&item.fingerprint, &self.policy)
                .await;
        }
    }
}
