//! Retry timer backed by tokio tasks.

use crate::actor::Command;
use quiet_session::{RetryScheduler, TimerHandle};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Arms the debounce timer as a tokio task that posts
/// `Command::TimerFired` back into the actor's queue.
///
/// Keeps at most one task alive: arming aborts the previous one.
pub struct TokioRetryScheduler {
    tx: UnboundedSender<Command>,
    next_id: u64,
    armed: Option<(TimerHandle, JoinHandle<()>)>,
}

impl TokioRetryScheduler {
    pub(crate) fn new(tx: UnboundedSender<Command>) -> Self {
        Self {
            tx,
            next_id: 0,
            armed: None,
        }
    }

    fn abort_armed(&mut self) {
        if let Some((handle, task)) = self.armed.take() {
            task.abort();
            tracing::trace!(timer = %handle, "timer task aborted");
        }
    }
}

impl RetryScheduler for TokioRetryScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerHandle {
        self.abort_armed();

        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(Command::TimerFired(handle)).is_err() {
                tracing::debug!(timer = %handle, "session gone before timer fired");
            }
        });

        self.armed = Some((handle, task));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if self.armed.as_ref().is_some_and(|(armed, _)| *armed == handle) {
            self.abort_armed();
        }
    }
}

impl Drop for TokioRetryScheduler {
    fn drop(&mut self) {
        self.abort_armed();
    }
}
