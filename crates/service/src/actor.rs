//! Single-threaded session actor.

use quiet_dispatch::Subscription;
use quiet_events::{Event, SessionEndReason, WarningKind};
use quiet_session::{QuietSession, SessionState, TimerHandle};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Message processed by the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Event from the dispatcher or the user.
    Event(Event),
    /// A retry timer elapsed. Ignored unless it is the session's pending timer.
    TimerFired(TimerHandle),
}

/// Owns the session and serializes every mutation of it.
pub(crate) struct SessionActor {
    pub(crate) session: QuietSession,
    pub(crate) rx: mpsc::UnboundedReceiver<Command>,
    pub(crate) subscription: Option<Subscription>,
    pub(crate) cancel: CancellationToken,
    pub(crate) ended_tx: watch::Sender<Option<SessionEndReason>>,
    pub(crate) active: Arc<AtomicBool>,
}

impl SessionActor {
    pub(crate) async fn run(mut self) {
        tracing::info!(session_id = %self.session.id(), "session actor started");

        while self.session.state() != SessionState::Terminated {
            tokio::select! {
                command = self.rx.recv() => match command {
                    Some(command) => self.process(command),
                    None => {
                        tracing::warn!(session_id = %self.session.id(), "command channel closed");
                        self.session.terminate(SessionEndReason::UserCancelled);
                    }
                },
                _ = self.cancel.cancelled() => {
                    tracing::info!(session_id = %self.session.id(), "service shutting down, ending session");
                    self.session.terminate(SessionEndReason::UserCancelled);
                }
            }
        }

        self.finish();
    }

    fn process(&mut self, command: Command) {
        match command {
            Command::Event(event) => self.deliver(event),
            Command::TimerFired(handle) if self.session.pending_timer() == Some(handle) => {
                self.deliver(Event::RetryTimerFired)
            }
            Command::TimerFired(handle) => {
                tracing::debug!(timer = %handle, "stale timer, dropping");
            }
        }
    }

    /// Hand one event to the session. A panic inside a port is contained here
    /// and the event is treated as dropped.
    fn deliver(&mut self, event: Event) {
        let session = &mut self.session;
        match catch_unwind(AssertUnwindSafe(|| session.handle(event))) {
            Ok(state) => {
                tracing::debug!(event = %event, state = %state, "event handled");
            }
            Err(_) => {
                tracing::error!(event = %event, "fault while handling event, dropping it");
                self.session
                    .warn(WarningKind::EventDropped, format!("fault while handling {event}"));
            }
        }
    }

    /// Release everything bound to the session.
    fn finish(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.rx.close();

        let reason = self.session.end_reason();
        self.active.store(false, Ordering::SeqCst);
        let _ = self.ended_tx.send(reason);

        tracing::info!(session_id = %self.session.id(), ?reason, "session actor stopped");
    }
}
