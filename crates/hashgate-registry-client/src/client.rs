use chrono::Utc;
use futures_util::future::join_all;
use hashgate_types::{BatchJob, BulkImportFormat, Fingerprint, RegistryEntry};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::backoff::Backoff;
use crate::config::RegistryClientConfig;
use crate::error::{map_status, RegistryError, Result};
use crate::jobs::JobTracker;
use crate::transport::{RegistryTransport, TransportResponse};
use crate::urls;

#[derive(Deserialize)]
struct SubmitResponse {
    job_id: String,
}

/// Client for the shared fingerprint registry. Owns the retry budget,
/// the error taxonomy and the idempotency contract; it never decides
/// allow/deny semantics, that policy belongs to its callers.
pub struct RegistryClient {
    transport: Arc<dyn RegistryTransport>,
    cfg: RegistryClientConfig,
    backoff: Backoff,
    jobs: JobTracker,
}

impl std::fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("cfg", &self.cfg)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl RegistryClient {
    pub fn new(
        transport: Arc<dyn RegistryTransport>,
        cfg: RegistryClientConfig,
    ) -> Result<RegistryClient> {
        if cfg.retry_max_attempts == 0 {
            return Err(RegistryError::InvalidInput("retry_max_attempts"));
        }
        if cfg.retry_initial_delay_ms == 0 {
            return Err(RegistryError::InvalidInput("retry_initial_delay_ms"));
        }
        if cfg.entry_ttl_secs == 0 {
            return Err(RegistryError::InvalidInput("entry_ttl_secs"));
        }
        let backoff = Backoff::new(cfg.retry_initial_delay_ms, cfg.retry_max_delay_ms);
        Ok(RegistryClient {
            transport,
            cfg,
            backoff,
            jobs: JobTracker::new(),
        })
    }

    /// Raw existence check. `Ok(false)` means the registry holds no
    /// unexpired entry; errors propagate with their kind so callers that
    /// must distinguish "absent" from "unknown" can.
    pub async fn lookup(&self, fingerprint: &Fingerprint) -> Result<bool> {
        let prefix = fingerprint.log_prefix();
        self.retry("lookup", &prefix, || self.lookup_once(fingerprint))
            .await
    }

    /// Fail-open existence check: any unrecoverable error reads as "not
    /// listed". Availability wins over false blocking; the error kind is
    /// still logged for diagnosis.
    pub async fn contains(&self, fingerprint: &Fingerprint) -> bool {
        match self.lookup(fingerprint).await {
            Ok(listed) => listed,
            Err(err) => {
                log::warn!(
                    "registry contains fp={} failing open kind={}",
                    fingerprint.log_prefix(),
                    err.kind_label()
                );
                false
            }
        }
    }

    /// Conditional insert. The write succeeds only if no entry exists;
    /// a collision (the registry already holds this fingerprint) is
    /// success by contract, reported as `Ok(false)`. Repeated stores of
    /// the same fingerprint therefore never error and never
    /// double-count. `Ok(true)` means this call created the entry.
    pub async fn store(&self, fingerprint: &Fingerprint) -> Result<bool> {
        let prefix = fingerprint.log_prefix();
        self.retry("store", &prefix, || self.store_once(fingerprint))
            .await
    }

    /// Removes the entry if present; deleting an absent fingerprint is
    /// success (`Ok(false)`), not an error.
    pub async fn delete(&self, fingerprint: &Fingerprint) -> Result<bool> {
        let prefix = fingerprint.log_prefix();
        self.retry("delete", &prefix, || self.delete_once(fingerprint))
            .await
    }

    /// Per-element application of the `lookup` contract; each
    /// fingerprint carries its own outcome, so partial failure never
    /// masks the rest of the batch.
    pub async fn batch_lookup(
        &self,
        fingerprints: &[Fingerprint],
    ) -> HashMap<Fingerprint, Result<bool>> {
        let futures = fingerprints
            .iter()
            .map(|fp| async move { (fp.clone(), self.lookup(fp).await) });
        join_all(futures).await.into_iter().collect()
    }

    pub async fn batch_store(
        &self,
        fingerprints: &[Fingerprint],
    ) -> HashMap<Fingerprint, Result<bool>> {
        let futures = fingerprints
            .iter()
            .map(|fp| async move { (fp.clone(), self.store(fp).await) });
        join_all(futures).await.into_iter().collect()
    }

    pub async fn batch_delete(
        &self,
        fingerprints: &[Fingerprint],
    ) -> HashMap<Fingerprint, Result<bool>> {
        let futures = fingerprints
            .iter()
            .map(|fp| async move { (fp.clone(), self.delete(fp).await) });
        join_all(futures).await.into_iter().collect()
    }

    /// Hands a fingerprint set to the out-of-band bulk loader and
    /// returns the job id. Submission is deliberately not retried:
    /// resubmitting after an ambiguous failure could enqueue the import
    /// twice, and that tradeoff belongs to the caller.
    pub async fn submit_bulk_import(
        &self,
        fingerprints: &[Fingerprint],
        format: BulkImportFormat,
    ) -> Result<String> {
        if fingerprints.is_empty() {
            return Err(RegistryError::InvalidInput("fingerprints"));
        }
        let hexes: Vec<String> = fingerprints.iter().map(Fingerprint::to_hex).collect();
        let body = json!({
            "format": format,
            "fingerprints": hexes,
        });
        let resp = self.transport.post(&urls::imports(), body).await?;
        if !matches!(resp.status, 200 | 201 | 202) {
            return Err(map_status(resp.status));
        }
        let submitted: SubmitResponse = parse_json(&resp)?;
        let now = Utc::now().to_rfc3339();
        self.jobs
            .seed(BatchJob {
                job_id: submitted.job_id.clone(),
                status: hashgate_types::JobStatus::Pending,
                total_items: fingerprints.len() as u64,
                processed_items: 0,
                failed_items: 0,
                created_at: now.clone(),
                updated_at: now,
            })
            .await;
        Ok(submitted.job_id)
    }

    /// Fetches remote job state and merges it through the tracker, so a
    /// job observed in a terminal state never regresses.
    pub async fn job_status(&self, job_id: &str) -> Result<BatchJob> {
        let path = urls::import_job(job_id)?;
        let fetched = self
            .retry("job_status", job_id, || self.fetch_job_once(&path))
            .await?;
        Ok(self.jobs.merge_fetched(fetched).await)
    }

    /// Requests cancellation. `Ok(false)` means the job had already
    /// reached a terminal state and could not be cancelled.
    pub async fn cancel_job(&self, job_id: &str) -> Result<bool> {
        let path = urls::import_job_cancel(job_id)?;
        let accepted = self
            .retry("cancel_job", job_id, || self.cancel_once(&path))
            .await?;
        if accepted {
            self.jobs
                .mark_cancelled(job_id, Utc::now().to_rfc3339())
                .await;
        }
        Ok(accepted)
    }

    /// Last state this client knows for a job, without a network call.
    pub async fn tracked_job(&self, job_id: &str) -> Option<BatchJob> {
        self.jobs.get(job_id).await
    }

    async fn lookup_once(&self, fingerprint: &Fingerprint) -> Result<bool> {
        let resp = self.transport.get(&urls::entry(fingerprint)).await?;
        match resp.status {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(map_status(status)),
        }
    }

    async fn store_once(&self, fingerprint: &Fingerprint) -> Result<bool> {
        let now = Utc::now();
        let entry = RegistryEntry {
            fingerprint: fingerprint.clone(),
            created_at: now.to_rfc3339(),
            expires_at: now.timestamp().max(0) as u64 + self.cfg.entry_ttl_secs,
        };
        let body = serde_json::to_value(&entry)
            .map_err(|_| RegistryError::InvalidInput("entry"))?;
        let resp = self.transport.post(&urls::entries(), body).await?;
        match resp.status {
            200 | 201 => Ok(true),
            409 => Ok(false),
            status => Err(map_status(status)),
        }
    }

    async fn delete_once(&self, fingerprint: &Fingerprint) -> Result<bool> {
        let resp = self.transport.delete(&urls::entry(fingerprint)).await?;
        match resp.status {
            200 | 204 => Ok(true),
            404 => Ok(false),
            status => Err(map_status(status)),
        }
    }

    async fn fetch_job_once(&self, path: &str) -> Result<BatchJob> {
        let resp = self.transport.get(path).await?;
        if resp.status != 200 {
            return Err(map_status(resp.status));
        }
        parse_json(&resp)
    }

    async fn cancel_once(&self, path: &str) -> Result<bool> {
        let resp = self.transport.post(path, json!({})).await?;
        match resp.status {
            200 | 202 => Ok(true),
            409 => Ok(false),
            status => Err(map_status(status)),
        }
    }

    async fn retry<T, F, Fut>(&self, op: &'static str, key: &str, call: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if err.retryable() && attempt + 1 < self.cfg.retry_max_attempts => {
                    let delay = self.backoff.delay(attempt);
                    log::debug!(
                        "registry {} key={} kind={} retry in {:?}",
                        op,
                        key,
                        err.kind_label(),
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    log::warn!(
                        "registry {} key={} failed kind={}",
                        op,
                        key,
                        err.kind_label()
                    );
                    return Err(err);
                }
            }
        }
    }
}

fn parse_json<T: DeserializeOwned>(resp: &TransportResponse) -> Result<T> {
    serde_json::from_slice(&resp.body).map_err(|_| RegistryError::ServerFault)
}
