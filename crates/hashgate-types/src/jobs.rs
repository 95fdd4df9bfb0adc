use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkImportFormat {
    Csv,
    Json,
}

/// Tracked state of a bulk-import submission. Transitions are monotonic:
/// once a job reports a terminal status it never regresses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchJob {
    pub job_id: String,
    pub status: JobStatus,
    pub total_items: u64,
    pub processed_items: u64,
    pub failed_items: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl BatchJob {
    /// Merge a freshly fetched snapshot into a previously known one,
    /// refusing any regression out of a terminal status.
    pub fn merge(known: Option<BatchJob>, fetched: BatchJob) -> BatchJob {
        match known {
            Some(prev) if prev.status.is_terminal() && !fetched.status.is_terminal() => prev,
            _ => fetched,
        }
    }
}
