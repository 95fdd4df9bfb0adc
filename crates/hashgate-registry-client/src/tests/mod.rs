pub mod client_tests;

use async_trait::async_trait;
use hashgate_types::{BatchJob, Fingerprint, JobStatus, RegistryEntry};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{RegistryError, Result};
use crate::transport::{RegistryTransport, TransportResponse};
use crate::{RegistryClient, RegistryClientConfig};

pub fn fp(label: &str) -> Fingerprint {
    Fingerprint::compute(label.as_bytes())
}

pub fn fast_config() -> RegistryClientConfig {
    RegistryClientConfig {
        retry_initial_delay_ms: 5,
        retry_max_delay_ms: 20,
        retry_max_attempts: 3,
        entry_ttl_secs: 3600,
        ..RegistryClientConfig::default()
    }
}

pub fn client_over(transport: Arc<dyn RegistryTransport>) -> RegistryClient {
    RegistryClient::new(transport, fast_config()).expect("client")
}

fn json_response(status: u16, value: &impl serde::Serialize) -> TransportResponse {
    TransportResponse {
        status,
        body: serde_json::to_vec(value).expect("json"),
    }
}

fn empty_response(status: u16) -> TransportResponse {
    TransportResponse {
        status,
        body: Vec::new(),
    }
}

/// In-memory stand-in for the remote registry: conditional writes on the
/// entries table, a minimal bulk-import job store, and an optional path
/// substring that fails with a server error (to exercise per-item batch
/// outcomes).
#[derive(Default)]
pub struct InMemoryRegistryServer {
    entries: Mutex<HashMap<String, RegistryEntry>>,
    jobs: Mutex<HashMap<String, BatchJob>>,
    job_seq: AtomicU64,
    fail_paths_containing: Mutex<Option<String>>,
}

impl InMemoryRegistryServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn entry_count(&self) -> usize {
        self.entries.lock().expect("entries").len()
    }

    pub fn entry(&self, fingerprint: &Fingerprint) -> Option<RegistryEntry> {
        self.entries
            .lock()
            .expect("entries")
            .get(&fingerprint.to_hex())
            .cloned()
    }

    pub fn fail_paths_containing(&self, needle: &str) {
        *self.fail_paths_containing.lock().expect("fail") = Some(needle.to_string());
    }

    pub fn set_job_status(&self, job_id: &str, status: JobStatus) {
        let mut jobs = self.jobs.lock().expect("jobs");
        if let Some(job) = jobs.get_mut(job_id) {
            job.status = status;
        }
    }

    fn should_fail(&self, path: &str) -> bool {
        self.fail_paths_containing
            .lock()
            .expect("fail")
            .as_ref()
            .map(|needle| path.contains(needle))
            .unwrap_or(false)
    }

    fn handle_get(&self, path: &str) -> TransportResponse {
        if let Some(hex) = path.strip_prefix("/v1/entries/") {
            let entries = self.entries.lock().expect("entries");
            return if entries.contains_key(hex) {
                empty_response(200)
            } else {
                empty_response(404)
            };
        }
        if let Some(job_id) = path.strip_prefix("/v1/imports/") {
            let jobs = self.jobs.lock().expect("jobs");
            return match jobs.get(job_id) {
                Some(job) => json_response(200, job),
                None => empty_response(404),
            };
        }
        empty_response(404)
    }

    fn handle_post(&self, path: &str, body: Value) -> TransportResponse {
        if path == "/v1/entries" {
            let entry: RegistryEntry = match serde_json::from_value(body) {
                Ok(entry) => entry,
                Err(_) => return empty_response(400),
            };
            let mut entries = self.entries.lock().expect("entries");
            let hex = entry.fingerprint.to_hex();
            if entries.contains_key(&hex) {
                return empty_response(409);
            }
            entries.insert(hex, entry);
            return empty_response(201);
        }
        if path == "/v1/imports" {
            let count = body
                .get("fingerprints")
                .and_then(Value::as_array)
                .map(Vec::len)
                .unwrap_or(0) as u64;
            let job_id = format!("job-{}", self.job_seq.fetch_add(1, Ordering::SeqCst));
            let job = BatchJob {
                job_id: job_id.clone(),
                status: JobStatus::Pending,
                total_items: count,
                processed_items: 0,
                failed_items: 0,
                created_at: "2024-01-01T00:00:00Z".to_string(),
                updated_at: "2024-01-01T00:00:00Z".to_string(),
            };
            self.jobs.lock().expect("jobs").insert(job_id.clone(), job);
            return json_response(202, &serde_json::json!({ "job_id": job_id }));
        }
        if let Some(rest) = path.strip_prefix("/v1/imports/") {
            if let Some(job_id) = rest.strip_suffix("/cancel") {
                let mut jobs = self.jobs.lock().expect("jobs");
                return match jobs.get_mut(job_id) {
                    Some(job) if job.status.is_terminal() => empty_response(409),
                    Some(job) => {
                        job.status = JobStatus::Cancelled;
                        empty_response(202)
                    }
                    None => empty_response(404),
                };
            }
        }
        empty_response(404)
    }

    fn handle_delete(&self, path: &str) -> TransportResponse {
        if let Some(hex) = path.strip_prefix("/v1/entries/") {
            let mut entries = self.entries.lock().expect("entries");
            return if entries.remove(hex).is_some() {
                empty_response(204)
            } else {
                empty_response(404)
            };
        }
        empty_response(404)
    }
}

#[async_trait]
impl RegistryTransport for InMemoryRegistryServer {
    async fn get(&self, path: &str) -> Result<TransportResponse> {
        if self.should_fail(path) {
            return Ok(empty_response(500));
        }
        Ok(self.handle_get(path))
    }

    async fn post(&self, path: &str, body: Value) -> Result<TransportResponse> {
        if self.should_fail(path) {
            return Ok(empty_response(500));
        }
        Ok(self.handle_post(path, body))
    }

    async fn delete(&self, path: &str) -> Result<TransportResponse> {
        if self.should_fail(path) {
            return Ok(empty_response(500));
        }
        Ok(self.handle_delete(path))
    }
}

/// Plays back a fixed sequence of responses regardless of path, counting
/// every call; an exhausted script reports connectivity loss.
#[derive(Default)]
pub struct ScriptedTransport {
    plan: Mutex<VecDeque<Result<TransportResponse>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(plan: Vec<Result<TransportResponse>>) -> Arc<Self> {
        Arc::new(Self {
            plan: Mutex::new(plan.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn status(status: u16) -> Result<TransportResponse> {
        Ok(empty_response(status))
    }

    pub fn io_error() -> Result<TransportResponse> {
        Err(RegistryError::Connectivity)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls").len()
    }

    fn next(&self, method: &str, path: &str) -> Result<TransportResponse> {
        self.calls
            .lock()
            .expect("calls")
            .push(format!("{} {}", method, path));
        self.plan
            .lock()
            .expect("plan")
            .pop_front()
            .unwrap_or(Err(RegistryError::Connectivity))
    }
}

#[async_trait]
impl RegistryTransport for ScriptedTransport {
    async fn get(&self, path: &str) -> Result<TransportResponse> {
        self.next("GET", path)
    }

    async fn post(&self, path: &str, _body: Value) -> Result<TransportResponse> {
        self.next("POST", path)
    }

    async fn delete(&self, path: &str) -> Result<TransportResponse> {
        self.next("DELETE", path)
    }
}
