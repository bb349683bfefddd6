//! Shared event contracts for quiet-unlock.
//!
//! Three families of values live here:
//! - [`Notification`]: raw host notifications as delivered by the platform.
//! - [`Event`]: the session's own event taxonomy, produced by the dispatcher
//!   or the UI layer and consumed by the session state machine.
//! - Outbound DTOs ([`SessionEndedEvent`], [`SessionWarningEvent`]) published
//!   on the [`EventBus`] for the caller.

mod bus;

pub use bus::{BusEvent, EventBus, EventBusRef, InMemoryEventBus, NullEventBus};

use quiet_ringer::RingerMode;
use serde::{Deserialize, Serialize};

/// Input to the session state machine.
///
/// Events are transient: the session consumes them and never keeps them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The screen turned off.
    ScreenOff,
    /// The screen turned on. Not proof of an unlock on its own.
    ScreenOn,
    /// The user completed the unlock.
    UserPresent,
    /// Someone other than the session changed the ringer mode.
    RingerModeChangedExternally,
    /// The debounce timer elapsed.
    RetryTimerFired,
    /// The user switched the quiet mode before confirming.
    QuietModeSelected(RingerMode),
    /// The user confirmed the dialog: lock the device now.
    UserConfirmed(RingerMode),
    /// The user dismissed the dialog.
    UserCancelled,
}

impl Event {
    /// Whether this event triggers a restore evaluation.
    pub fn triggers_restore_check(&self) -> bool {
        matches!(
            self,
            Event::ScreenOn | Event::UserPresent | Event::RetryTimerFired
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Event::ScreenOff => "screen_off",
            Event::ScreenOn => "screen_on",
            Event::UserPresent => "user_present",
            Event::RingerModeChangedExternally => "ringer_mode_changed_externally",
            Event::RetryTimerFired => "retry_timer_fired",
            Event::QuietModeSelected(_) => "quiet_mode_selected",
            Event::UserConfirmed(_) => "user_confirmed",
            Event::UserCancelled => "user_cancelled",
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::QuietModeSelected(mode) | Event::UserConfirmed(mode) => {
                write!(f, "{}({})", self.name(), mode)
            }
            _ => f.write_str(self.name()),
        }
    }
}

/// Kinds of host notification the dispatcher can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ScreenOff,
    ScreenOn,
    UserPresent,
    RingerModeChanged,
}

impl NotificationKind {
    /// Every kind a quiet session listens to.
    pub const ALL: [NotificationKind; 4] = [
        NotificationKind::ScreenOff,
        NotificationKind::ScreenOn,
        NotificationKind::UserPresent,
        NotificationKind::RingerModeChanged,
    ];
}

/// Raw notification from the host notification bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    ScreenOff,
    ScreenOn,
    UserPresent,
    /// The ringer mode changed. `mode` is the new mode when the host reports it.
    RingerModeChanged {
        #[serde(default)]
        mode: Option<RingerMode>,
    },
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::ScreenOff => NotificationKind::ScreenOff,
            Notification::ScreenOn => NotificationKind::ScreenOn,
            Notification::UserPresent => NotificationKind::UserPresent,
            Notification::RingerModeChanged { .. } => NotificationKind::RingerModeChanged,
        }
    }

    /// Parse a host action name into a notification.
    ///
    /// `extra` carries the new ringer mode for ringer-mode-changed actions.
    pub fn from_action(action: &str, extra: Option<&str>) -> Option<Self> {
        match action {
            actions::SCREEN_OFF => Some(Notification::ScreenOff),
            actions::SCREEN_ON => Some(Notification::ScreenOn),
            actions::USER_PRESENT => Some(Notification::UserPresent),
            actions::RINGER_MODE_CHANGED => Some(Notification::RingerModeChanged {
                mode: extra.and_then(|s| s.parse().ok()),
            }),
            _ => None,
        }
    }
}

/// Host action names for the notifications a session cares about.
pub mod actions {
    pub const SCREEN_OFF: &str = "android.intent.action.SCREEN_OFF";
    pub const SCREEN_ON: &str = "android.intent.action.SCREEN_ON";
    pub const USER_PRESENT: &str = "android.intent.action.USER_PRESENT";
    pub const RINGER_MODE_CHANGED: &str = "android.media.RINGER_MODE_CHANGED";
}

/// Why a quiet session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEndReason {
    /// The user confirmed and the device was locked.
    UserConfirmed,
    /// The user dismissed the dialog.
    UserCancelled,
    /// The ringer was changed by someone else; it is left as they set it.
    ExternalRingerChange,
    /// The device was unlocked and idle; the ringer was restored.
    RestoredAfterUnlock,
    /// The user confirmed but the lock privilege is missing; it was requested.
    LockPermissionRequired,
    /// A configured cap on debounce retries was reached.
    RetryLimitReached,
}

impl SessionEndReason {
    /// Whether ending for this reason restores the captured ringer mode.
    pub fn restores_ringer(&self) -> bool {
        !matches!(self, SessionEndReason::ExternalRingerChange)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionEndReason::UserConfirmed => "user_confirmed",
            SessionEndReason::UserCancelled => "user_cancelled",
            SessionEndReason::ExternalRingerChange => "external_ringer_change",
            SessionEndReason::RestoredAfterUnlock => "restored_after_unlock",
            SessionEndReason::LockPermissionRequired => "lock_permission_required",
            SessionEndReason::RetryLimitReached => "retry_limit_reached",
        }
    }
}

impl std::fmt::Display for SessionEndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Event emitted when a quiet session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStartedEvent {
    pub session_id: String,
    pub requested_mode: RingerMode,
    pub restore_mode: RingerMode,
    pub timestamp_ms: i64,
}

/// Event emitted exactly once when a quiet session ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEndedEvent {
    pub session_id: String,
    pub reason: SessionEndReason,
    /// Mode re-applied on the way out, if any.
    #[serde(default)]
    pub restored_mode: Option<RingerMode>,
    pub timestamp_ms: i64,
}

/// What went wrong when a session warns its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// The device's ringer may not match the intended mode.
    RingerApplyFailed,
    /// A telephony or keyguard query could not be answered; restore deferred.
    QueryUnavailable,
    /// An event could not be handled and was dropped.
    EventDropped,
}

/// Event emitted when a session keeps going despite a fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionWarningEvent {
    pub session_id: String,
    pub kind: WarningKind,
    pub message: String,
    pub timestamp_ms: i64,
}

/// Event names as constants to prevent typos.
pub mod event_names {
    /// Session started event.
    pub const SESSION_STARTED: &str = "session:started";
    /// Session ended event.
    pub const SESSION_ENDED: &str = "session:ended";
    /// Session warning event.
    pub const SESSION_WARNING: &str = "session:warning";
}

/// Current wall-clock time in milliseconds, for event timestamps.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
