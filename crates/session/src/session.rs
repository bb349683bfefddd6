//! The quiet session state machine.

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::state::SessionState;
use crate::timer::{RetryScheduler, TimerHandle};
use quiet_context::{DeviceLockRef, KeyguardProviderRef, QueryError, TelephonyProviderRef};
use quiet_events::{
    now_ms, BusEvent, Event, EventBusRef, SessionEndReason, SessionEndedEvent,
    SessionStartedEvent, SessionWarningEvent, WarningKind,
};
use quiet_ringer::{RingerController, RingerMode};

/// Everything a session talks to.
pub struct SessionPorts {
    pub ringer: RingerController,
    pub telephony: TelephonyProviderRef,
    pub keyguard: KeyguardProviderRef,
    pub lock: DeviceLockRef,
    pub bus: EventBusRef,
}

/// One quiet session.
///
/// Invariant: `pending_timer` is `Some` exactly when the state is
/// `AwaitingRestore`.
pub struct QuietSession {
    id: String,
    state: SessionState,
    requested_mode: RingerMode,
    restore_mode: RingerMode,
    telephone_was_active: bool,
    pending_timer: Option<TimerHandle>,
    retries: u32,
    end_reason: Option<SessionEndReason>,
    config: SessionConfig,
    ports: SessionPorts,
    scheduler: Box<dyn RetryScheduler>,
}

impl QuietSession {
    /// Create an inactive session. Call [`QuietSession::start`] to begin.
    pub fn new(
        ports: SessionPorts,
        scheduler: Box<dyn RetryScheduler>,
        config: SessionConfig,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            state: SessionState::Inactive,
            requested_mode: RingerMode::Vibrate,
            restore_mode: RingerMode::Normal,
            telephone_was_active: false,
            pending_timer: None,
            retries: 0,
            end_reason: None,
            config,
            ports,
            scheduler,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn requested_mode(&self) -> RingerMode {
        self.requested_mode
    }

    pub fn restore_mode(&self) -> RingerMode {
        self.restore_mode
    }

    pub fn pending_timer(&self) -> Option<TimerHandle> {
        self.pending_timer
    }

    pub fn end_reason(&self) -> Option<SessionEndReason> {
        self.end_reason
    }

    pub fn ringer(&self) -> &RingerController {
        &self.ports.ringer
    }

    /// Start the session: remember `current_mode` for the restore and force
    /// the ringer into `requested_mode`.
    ///
    /// A failure to apply the quiet mode is reported as a warning; the
    /// session still starts.
    pub fn start(
        &mut self,
        requested_mode: RingerMode,
        current_mode: RingerMode,
    ) -> Result<(), SessionError> {
        match self.state {
            SessionState::Inactive => {}
            SessionState::Active | SessionState::AwaitingRestore => {
                return Err(SessionError::AlreadyActive)
            }
            SessionState::Terminated => return Err(SessionError::AlreadyTerminated),
        }
        if !requested_mode.is_quiet() {
            return Err(SessionError::NotQuietMode(requested_mode));
        }

        self.restore_mode = current_mode;
        self.requested_mode = requested_mode;
        self.telephone_was_active = false;
        self.apply_mode(requested_mode);
        self.state = SessionState::Active;

        tracing::info!(
            session_id = %self.id,
            requested = %requested_mode,
            restore = %current_mode,
            "quiet session started"
        );
        self.ports.bus.emit(BusEvent::Started(SessionStartedEvent {
            session_id: self.id.clone(),
            requested_mode,
            restore_mode: current_mode,
            timestamp_ms: now_ms(),
        }));
        Ok(())
    }

    /// Feed one event to the state machine and return the resulting state.
    pub fn handle(&mut self, event: Event) -> SessionState {
        tracing::debug!(session_id = %self.id, state = %self.state, event = %event, "handling event");

        match (self.state, event) {
            (SessionState::Inactive, _) => {
                tracing::debug!(event = %event, "session not started, ignoring event");
            }
            (SessionState::Terminated, _) => {
                tracing::debug!(event = %event, "session terminated, ignoring event");
            }
            (_, Event::UserCancelled) => self.terminate(SessionEndReason::UserCancelled),
            (_, Event::UserConfirmed(mode)) => self.confirm(mode),
            (_, Event::RingerModeChangedExternally) => {
                tracing::info!(session_id = %self.id, "ringer changed by user, leaving it as is");
                self.terminate(SessionEndReason::ExternalRingerChange);
            }
            (_, Event::QuietModeSelected(mode)) => self.select_quiet_mode(mode),
            (_, Event::ScreenOff) => {}
            (_, Event::ScreenOn | Event::UserPresent) => self.evaluate_restore(),
            (SessionState::AwaitingRestore, Event::RetryTimerFired) => {
                self.pending_timer = None;
                self.retries += 1;
                self.evaluate_restore();
            }
            (SessionState::Active, Event::RetryTimerFired) => {
                tracing::debug!(session_id = %self.id, "stale retry timer, ignoring");
            }
        }

        self.state
    }

    /// End the session.
    ///
    /// Cancels the pending timer, restores the captured ringer mode unless the
    /// reason says otherwise, and publishes `session:ended`. Calling it again
    /// after the session ended does nothing.
    pub fn terminate(&mut self, reason: SessionEndReason) {
        match self.state {
            SessionState::Terminated => {
                tracing::debug!(session_id = %self.id, %reason, "already terminated");
                return;
            }
            SessionState::Inactive => {
                tracing::debug!(session_id = %self.id, %reason, "terminate before start, ignoring");
                return;
            }
            SessionState::Active | SessionState::AwaitingRestore => {}
        }

        self.cancel_timer();

        let restored_mode = if reason.restores_ringer() {
            let mode = self.restore_mode;
            self.apply_mode(mode).then_some(mode)
        } else {
            None
        };

        self.state = SessionState::Terminated;
        self.end_reason = Some(reason);

        tracing::info!(
            session_id = %self.id,
            %reason,
            restored = ?restored_mode,
            "quiet session ended"
        );
        self.ports.bus.emit(BusEvent::Ended(SessionEndedEvent {
            session_id: self.id.clone(),
            reason,
            restored_mode,
            timestamp_ms: now_ms(),
        }));
    }

    fn confirm(&mut self, mode: RingerMode) {
        if mode.is_quiet() {
            self.requested_mode = mode;
        }
        let lock = self.ports.lock.clone();
        if lock.is_lock_permitted() {
            tracing::info!(session_id = %self.id, mode = %mode, "locking device");
            lock.request_device_lock();
            self.terminate(SessionEndReason::UserConfirmed);
        } else {
            tracing::info!(session_id = %self.id, "lock privilege missing, requesting it");
            lock.request_lock_permission();
            self.terminate(SessionEndReason::LockPermissionRequired);
        }
    }

    fn select_quiet_mode(&mut self, mode: RingerMode) {
        if !mode.is_quiet() {
            tracing::warn!(session_id = %self.id, mode = %mode, "not a quiet mode, ignoring selection");
            return;
        }
        if mode == self.requested_mode {
            return;
        }
        self.requested_mode = mode;
        self.apply_mode(mode);
    }

    /// Decide whether the ringer can be restored now.
    fn evaluate_restore(&mut self) {
        let call_active = match self.ports.telephony.is_call_active() {
            Ok(active) => active,
            Err(e) => return self.defer(e),
        };

        if call_active {
            self.telephone_was_active = true;
            if let Some(max) = self.config.max_retries {
                if self.retries >= max {
                    tracing::warn!(session_id = %self.id, retries = self.retries, "call still active after retry limit");
                    return self.terminate(SessionEndReason::RetryLimitReached);
                }
            }
            self.arm_retry_timer();
            self.state = SessionState::AwaitingRestore;
            return;
        }

        if self.telephone_was_active {
            tracing::debug!(session_id = %self.id, "call ended, restoring");
            self.telephone_was_active = false;
            return self.terminate(SessionEndReason::RestoredAfterUnlock);
        }

        match self.ports.keyguard.is_device_locked() {
            Ok(true) => {
                tracing::debug!(session_id = %self.id, "keyguard still engaged, not restoring yet");
                self.cancel_timer();
                self.retries = 0;
                self.state = SessionState::Active;
            }
            Ok(false) => self.terminate(SessionEndReason::RestoredAfterUnlock),
            Err(e) => self.defer(e),
        }
    }

    /// A query failed: keep the current state rather than guess.
    ///
    /// If the failure came from a fired retry timer the timer is re-armed so
    /// the evaluation is attempted again.
    fn defer(&mut self, error: QueryError) {
        self.warn(WarningKind::QueryUnavailable, error.to_string());
        if self.state == SessionState::AwaitingRestore && self.pending_timer.is_none() {
            self.arm_retry_timer();
        }
    }

    /// Arm the debounce timer, replacing any armed one.
    fn arm_retry_timer(&mut self) {
        self.cancel_timer();
        let delay = self.config.retry_delay();
        let handle = self.scheduler.schedule(delay);
        tracing::debug!(session_id = %self.id, timer = %handle, ?delay, retries = self.retries, "retry timer armed");
        self.pending_timer = Some(handle);
    }

    fn cancel_timer(&mut self) {
        if let Some(handle) = self.pending_timer.take() {
            tracing::debug!(session_id = %self.id, timer = %handle, "retry timer cancelled");
            self.scheduler.cancel(handle);
        }
    }

    /// Apply a mode, turning a failure into a warning. Returns whether it stuck.
    fn apply_mode(&mut self, mode: RingerMode) -> bool {
        match self.ports.ringer.set_mode(mode) {
            Ok(()) => true,
            Err(e) => {
                self.warn(WarningKind::RingerApplyFailed, e.to_string());
                false
            }
        }
    }

    /// Log a warning and publish it for the caller.
    pub fn warn(&self, kind: WarningKind, message: String) {
        tracing::warn!(session_id = %self.id, ?kind, %message, "session warning");
        self.ports.bus.emit(BusEvent::Warning(SessionWarningEvent {
            session_id: self.id.clone(),
            kind,
            message,
            timestamp_ms: now_ms(),
        }));
    }
}
