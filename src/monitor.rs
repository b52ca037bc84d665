//! Transfer completion monitor
//!
//! Polls the destination ledger until the token shows up, the deadline
//! passes, or the caller cancels. The monitor owns a background task and is
//! safe to drop; dropping it detaches the task without cancelling it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::adapter::ChainAdapter;
use crate::types::UniversalTokenId;

/// Observable state of a watched transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    /// Still polling the destination.
    Waiting,
    /// Token appeared on the destination ledger.
    Completed,
    /// Deadline passed without the token appearing.
    TimedOut,
    /// Caller asked the monitor to stop.
    Cancelled,
}

impl TransferStage {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransferStage::Waiting)
    }
}

/// Handle to a background polling task watching one transfer.
pub struct TransferMonitor {
    token_id: UniversalTokenId,
    stage: watch::Receiver<TransferStage>,
    cancel: Mutex<Option<oneshot::Sender<()>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TransferMonitor {
    /// Spawn a monitor polling `destination` for `token_id`.
    pub fn spawn(
        destination: Arc<dyn ChainAdapter>,
        token_id: UniversalTokenId,
        poll_interval: Duration,
        deadline: Duration,
    ) -> Self {
        let (stage_tx, stage_rx) = watch::channel(TransferStage::Waiting);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let task = tokio::spawn(poll_until_settled(
            destination,
            token_id,
            poll_interval,
            deadline,
            stage_tx,
            cancel_rx,
        ));
        Self {
            token_id,
            stage: stage_rx,
            cancel: Mutex::new(Some(cancel_tx)),
            task: Mutex::new(Some(task)),
        }
    }

    pub fn token_id(&self) -> UniversalTokenId {
        self.token_id
    }

    /// Current stage without waiting.
    pub fn status(&self) -> TransferStage {
        *self.stage.borrow()
    }

    /// Ask the background task to stop. Idempotent; a no-op once the
    /// monitor reached a terminal stage.
    pub async fn cancel(&self) {
        if let Some(tx) = self.cancel.lock().await.take() {
            let _ = tx.send(());
        }
    }

    /// Wait until the monitor reaches a terminal stage and return it.
    pub async fn wait(&self) -> TransferStage {
        let mut stage = self.stage.clone();
        loop {
            let current = *stage.borrow_and_update();
            if current.is_terminal() {
                if let Some(task) = self.task.lock().await.take() {
                    let _ = task.await;
                }
                return current;
            }
            if stage.changed().await.is_err() {
                return *stage.borrow();
            }
        }
    }
}

async fn poll_until_settled(
    destination: Arc<dyn ChainAdapter>,
    token_id: UniversalTokenId,
    poll_interval: Duration,
    deadline: Duration,
    stage: watch::Sender<TransferStage>,
    mut cancel: oneshot::Receiver<()>,
) {
    let expiry = tokio::time::sleep(deadline);
    tokio::pin!(expiry);
    let mut ticker = tokio::time::interval(poll_interval);
    loop {
        tokio::select! {
            _ = &mut cancel => {
                debug!(token_id, "transfer watch cancelled");
                let _ = stage.send(TransferStage::Cancelled);
                return;
            }
            _ = expiry.as_mut() => {
                warn!(token_id, ?deadline, "transfer watch deadline passed");
                let _ = stage.send(TransferStage::TimedOut);
                return;
            }
            _ = ticker.tick() => {}
        }
        // cancellation and expiry stay live while a query is in flight; a
        // hung RPC must not pin the monitor
        let query = destination.query(token_id);
        tokio::pin!(query);
        tokio::select! {
            _ = &mut cancel => {
                debug!(token_id, "transfer watch cancelled");
                let _ = stage.send(TransferStage::Cancelled);
                return;
            }
            _ = expiry.as_mut() => {
                warn!(token_id, ?deadline, "transfer watch deadline passed");
                let _ = stage.send(TransferStage::TimedOut);
                return;
            }
            result = &mut query => match result {
                Ok(Some(_)) => {
                    debug!(token_id, ledger = ?destination.ledger(), "transfer settled");
                    let _ = stage.send(TransferStage::Completed);
                    return;
                }
                Ok(None) => {}
                // transient; the next tick retries
                Err(e) => debug!(token_id, error = %e, "destination poll failed"),
            }
        }
    }
}
