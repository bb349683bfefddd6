//! Service entry point and the caller-facing session handle.

use crate::actor::{Command, SessionActor};
use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::scheduler::TokioRetryScheduler;
use quiet_context::{DeviceLockRef, KeyguardProviderRef, TelephonyProviderRef};
use quiet_dispatch::{new_sink, EventDispatcher, NotificationSourceRef};
use quiet_events::{Event, EventBusRef, SessionEndReason};
use quiet_ringer::{AudioSettingsRef, RingerController, RingerMode};
use quiet_session::{QuietSession, SessionError, SessionPorts};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Host capabilities the service binds a session to.
#[derive(Clone)]
pub struct ServicePorts {
    pub audio: AudioSettingsRef,
    pub telephony: TelephonyProviderRef,
    pub keyguard: KeyguardProviderRef,
    pub lock: DeviceLockRef,
    pub notifications: NotificationSourceRef,
}

/// Runs at most one quiet session at a time.
pub struct QuietUnlockService {
    ports: ServicePorts,
    bus: EventBusRef,
    config: ServiceConfig,
    active: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl QuietUnlockService {
    pub fn new(ports: ServicePorts, bus: EventBusRef, config: ServiceConfig) -> Self {
        Self {
            ports,
            bus,
            config,
            active: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Whether a session is currently running.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Start a quiet session.
    ///
    /// `mode` defaults to the configured quiet mode. The host notification
    /// subscription is in place before the ringer is touched, so nothing the
    /// host reports after the quiet mode lands can be missed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_session(&self, mode: Option<RingerMode>) -> Result<SessionHandle, ServiceError> {
        if self.cancel.is_cancelled() {
            return Err(ServiceError::ShutDown);
        }
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| ServiceError::NoRuntime)?;

        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("quiet session already active, rejecting start");
            return Err(SessionError::AlreadyActive.into());
        }

        match self.spawn_session(&runtime, mode) {
            Ok(handle) => Ok(handle),
            Err(e) => {
                self.active.store(false, Ordering::SeqCst);
                tracing::warn!(error = %e, "failed to start quiet session");
                Err(e)
            }
        }
    }

    fn spawn_session(
        &self,
        runtime: &tokio::runtime::Handle,
        mode: Option<RingerMode>,
    ) -> Result<SessionHandle, ServiceError> {
        let requested = mode.unwrap_or(self.config.default_quiet_mode);
        if !requested.is_quiet() {
            return Err(SessionError::NotQuietMode(requested).into());
        }

        let ringer = RingerController::new(Arc::clone(&self.ports.audio));
        let current = ringer.capture_current_mode()?;

        let (tx, rx) = mpsc::unbounded_channel();

        let dispatcher = EventDispatcher::new(ringer.applied_mode_handle());
        let sink_tx = tx.clone();
        let subscription = dispatcher.attach(
            self.ports.notifications.as_ref(),
            new_sink(move |event| {
                if sink_tx.send(Command::Event(event)).is_err() {
                    tracing::trace!(event = %event, "session closed, notification dropped");
                }
            }),
        )?;

        let ports = SessionPorts {
            ringer,
            telephony: Arc::clone(&self.ports.telephony),
            keyguard: Arc::clone(&self.ports.keyguard),
            lock: Arc::clone(&self.ports.lock),
            bus: Arc::clone(&self.bus),
        };
        let scheduler = TokioRetryScheduler::new(tx.clone());
        let mut session = QuietSession::new(ports, Box::new(scheduler), self.config.session.clone());
        session.start(requested, current)?;

        let id = session.id().to_string();
        let (ended_tx, ended_rx) = watch::channel(None);

        let actor = SessionActor {
            session,
            rx,
            subscription: Some(subscription),
            cancel: self.cancel.child_token(),
            ended_tx,
            active: Arc::clone(&self.active),
        };
        runtime.spawn(actor.run());

        Ok(SessionHandle {
            id,
            tx,
            selected: Mutex::new(requested),
            ended: ended_rx,
        })
    }

    /// End any running session (restoring the ringer) and refuse new ones.
    pub fn shutdown(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!("quiet-unlock service shutting down");
            self.cancel.cancel();
        }
    }
}

impl Drop for QuietUnlockService {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Handle to a running session, held by whatever presents the dialog.
///
/// All actions are queued behind any host notifications already in flight.
pub struct SessionHandle {
    id: String,
    tx: mpsc::UnboundedSender<Command>,
    selected: Mutex<RingerMode>,
    ended: watch::Receiver<Option<SessionEndReason>>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("ended", &self.end_reason())
            .finish_non_exhaustive()
    }
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The quiet mode the next `confirm` will report.
    pub fn selected_mode(&self) -> RingerMode {
        *self.selected.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Switch the session to another quiet mode while it runs.
    pub fn select_mode(&self, mode: RingerMode) -> Result<(), ServiceError> {
        if !mode.is_quiet() {
            return Err(SessionError::NotQuietMode(mode).into());
        }
        *self.selected.lock().unwrap_or_else(|p| p.into_inner()) = mode;
        self.send(Event::QuietModeSelected(mode))
    }

    /// The user accepted the dialog with the currently selected mode.
    pub fn confirm(&self) -> Result<(), ServiceError> {
        self.send(Event::UserConfirmed(self.selected_mode()))
    }

    /// The user accepted the dialog with `mode`.
    pub fn confirm_with(&self, mode: RingerMode) -> Result<(), ServiceError> {
        self.send(Event::UserConfirmed(mode))
    }

    /// The user dismissed the dialog.
    pub fn cancel(&self) -> Result<(), ServiceError> {
        self.send(Event::UserCancelled)
    }

    pub fn is_finished(&self) -> bool {
        self.ended.borrow().is_some()
    }

    pub fn end_reason(&self) -> Option<SessionEndReason> {
        *self.ended.borrow()
    }

    /// Wait for the session to end and return why it ended.
    pub async fn wait(&self) -> Option<SessionEndReason> {
        let mut ended = self.ended.clone();
        let reason = match ended.wait_for(|reason| reason.is_some()).await {
            Ok(reason) => *reason,
            Err(_) => None,
        };
        reason
    }

    fn send(&self, event: Event) -> Result<(), ServiceError> {
        self.tx
            .send(Command::Event(event))
            .map_err(|_| ServiceError::SessionEnded)
    }
}
