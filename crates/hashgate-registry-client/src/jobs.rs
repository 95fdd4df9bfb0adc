use hashgate_types::{BatchJob, JobStatus};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Last-known state of submitted bulk-import jobs. Merges are monotonic:
/// a job that reached a terminal status never regresses, whatever a
/// later fetch claims.
#[derive(Default)]
pub struct JobTracker {
    jobs: Mutex<HashMap<String, BatchJob>>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, job: BatchJob) {
        let mut guard = self.jobs.lock().await;
        guard.entry(job.job_id.clone()).or_insert(job);
    }

    pub async fn merge_fetched(&self, fetched: BatchJob) -> BatchJob {
        let mut guard = self.jobs.lock().await;
        let known = guard.get(&fetched.job_id).cloned();
        let merged = BatchJob::merge(known, fetched);
        guard.insert(merged.job_id.clone(), merged.clone());
        merged
    }

    pub async fn mark_cancelled(&self, job_id: &str, updated_at: String) {
        let mut guard = self.jobs.lock().await;
        if let Some(job) = guard.get_mut(job_id) {
            if !job.status.is_terminal() {
                job.status = JobStatus::Cancelled;
                job.updated_at = updated_at;
            }
        }
    }

    pub async fn get(&self, job_id: &str) -> Option<BatchJob> {
        let guard = self.jobs.lock().await;
        guard.get(job_id).cloned()
    }
}
