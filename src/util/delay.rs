//! Cancellable delayed task
//!
//! A small handle around a spawned timer task: the callback runs after the
//! delay unless the handle is cancelled (or dropped) first. Once the delay
//! has elapsed and the callback has started, cancellation no longer affects
//! it; an already-dispatched write is allowed to finish.

use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Handle to a pending delayed task.
///
/// Dropping the handle cancels a task whose delay has not yet elapsed.
pub struct DelayedTask {
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

/// Run `task` after `delay`, unless cancelled first.
pub fn spawn_after<F, Fut>(delay: Duration, task: F) -> DelayedTask
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(delay) => task().await,
            _ = cancel_rx => {}
        }
    });

    DelayedTask {
        cancel: Some(cancel_tx),
        handle,
    }
}

impl DelayedTask {
    /// Cancel the task if its delay has not elapsed yet.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            // Send fails if the task already fired; that is fine.
            let _ = cancel.send(());
        }
    }

    /// Whether the underlying task has finished (fired or cancelled).
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
