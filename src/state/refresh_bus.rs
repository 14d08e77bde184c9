use crate::types::RefreshOutcome;
use tokio::sync::{mpsc, oneshot};

/// Handle for asking the refresh task to run now instead of at its next tick.
#[derive(Clone)]
pub struct RefreshBus {
    tx: mpsc::UnboundedSender<RefreshRequest>,
}

pub struct RefreshRequest {
    pub(crate) respond_to: Option<oneshot::Sender<RefreshOutcome>>,
}

impl RefreshBus {
    pub(crate) fn new(tx: mpsc::UnboundedSender<RefreshRequest>) -> Self {
        Self { tx }
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(RefreshRequest { respond_to: None });
    }

    /// Runs one refresh on the task and waits for its outcome. Reports
    /// `Skipped` once the task has stopped.
    pub async fn refresh_now(&self) -> RefreshOutcome {
        let (tx, rx) = oneshot::channel();
        if self
            .tx
            .send(RefreshRequest {
                respond_to: Some(tx),
            })
            .is_err()
        {
            return RefreshOutcome::Skipped;
        }
        rx.await.unwrap_or(RefreshOutcome::Skipped)
    }
}
