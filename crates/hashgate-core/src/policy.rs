use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GatePolicy {
    /// Upper bound on a single remote check from a gate; a timeout is
    /// treated like connectivity loss and the gate fails open.
    pub remote_check_timeout_ms: u64,
    pub retry_poll_interval_ms: u64,
    pub retry_backoff_initial_ms: u64,
    pub retry_backoff_max_ms: u64,
    /// Checks before a pending item is retired as permanently blocked.
    pub retry_max_attempts: u32,
    pub retry_batch: usize,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            remote_check_timeout_ms: 5000,
            retry_poll_interval_ms: 60_000,
            retry_backoff_initial_ms: 60_000,
            retry_backoff_max_ms: 3_600_000,
            retry_max_attempts: 10,
            retry_batch: 64,
        }
    }
}
