use super::policy::should_attempt_refresh;
use crate::error::ClientError;
use crate::state::{RefreshBus, RefreshRequest, SessionManager};
use crate::types::RefreshOutcome;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// The background token refresher. Owned by whoever spawned it; stops on
/// [`RefreshTask::shutdown`] or when dropped together with every bus handle
/// and its cancellation token.
pub struct RefreshTask {
    bus: RefreshBus,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RefreshTask {
    pub fn bus(&self) -> RefreshBus {
        self.bus.clone()
    }

    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}

async fn refresh_once(manager: &SessionManager) -> RefreshOutcome {
    if !should_attempt_refresh(manager.status().await) {
        return RefreshOutcome::Skipped;
    }

    match manager.refresh().await {
        Ok(outcome) => outcome,
        Err(ClientError::NotAuthenticated) => RefreshOutcome::Skipped,
        Err(err) => {
            tracing::warn!(error = %err, "token refresh errored");
            RefreshOutcome::Skipped
        }
    }
}

/// `None` when cancelled before the refresh finished; the in-flight request
/// is dropped.
async fn refresh_unless_cancelled(
    manager: &SessionManager,
    stop: &CancellationToken,
) -> Option<RefreshOutcome> {
    tokio::select! {
        _ = stop.cancelled() => None,
        outcome = refresh_once(manager) => Some(outcome),
    }
}

/// Spawns the periodic refresher. The first tick fires one full `interval`
/// after spawning; on-demand requests arrive through the returned bus.
pub fn spawn_refresh_loop(manager: SessionManager, interval: Duration) -> RefreshTask {
    let (tx, mut rx) = mpsc::unbounded_channel::<RefreshRequest>();
    let cancel = CancellationToken::new();
    let stop = cancel.clone();

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
              _ = stop.cancelled() => break,
              req = rx.recv() => {
                let Some(req) = req else { break; };
                let Some(outcome) = refresh_unless_cancelled(&manager, &stop).await else { break; };
                tracing::debug!(?outcome, "requested refresh finished");
                if let Some(tx) = req.respond_to {
                  let _ = tx.send(outcome);
                }
              }
              _ = ticker.tick() => {
                let Some(outcome) = refresh_unless_cancelled(&manager, &stop).await else { break; };
                tracing::debug!(?outcome, "scheduled refresh finished");
              }
            }
        }
        tracing::debug!("refresh loop stopped");
    });

    RefreshTask {
        bus: RefreshBus::new(tx),
        cancel,
        handle,
    }
}
