use hashgate_types::Fingerprint;
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateEvent {
    DownloadReactivated {
        fingerprint: Fingerprint,
        attachment_ref: Uuid,
    },
    DownloadPermanentlyBlocked {
        fingerprint: Fingerprint,
        attachment_ref: Uuid,
    },
    ContributionFailed {
        fingerprint: Fingerprint,
        kind: String,
    },
}

pub type EventReceiver = broadcast::Receiver<GateEvent>;

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<GateEvent>,
}

impl EventBus {
    pub fn new(size: usize) -> Self {
        let (tx, _) = broadcast::channel(size);
        Self { tx }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: GateEvent) {
        let _ = self.tx.send(event);
    }
}
