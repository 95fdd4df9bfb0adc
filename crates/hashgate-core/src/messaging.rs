use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::CoreError;

/// Seam to the outgoing-message pipeline. The pipeline itself (framing,
/// encryption, relays) is outside this crate; the gate only needs a way
/// to hand it an approved payload.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn transmit(&self, recipient: &str, payload: &[u8]) -> Result<(), CoreError>;
}

#[derive(Clone, Default)]
pub struct MockTransport {
    sent: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    fail_sends: Arc<Mutex<usize>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<(String, Vec<u8>)> {
        self.sent.lock().await.clone()
    }

    pub async fn fail_next_sends(&self, count: usize) {
        *self.fail_sends.lock().await = count;
    }
}

#[async_trait]
impl MessageTransport for MockTransport {
    async fn transmit(&self, recipient: &str, payload: &[u8]) -> Result<(), CoreError> {
        let mut failing = self.fail_sends.lock().await;
        if *failing > 0 {
            *failing -= 1;
            return Err(CoreError::Transport("send".to_string()));
        }
        drop(failing);
        self.sent
            .lock()
            .await
            .push((recipient.to_string(), payload.to_vec()));
        Ok(())
    }
}
