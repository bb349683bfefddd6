//! Session state definitions.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a quiet session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Not started yet. Never re-entered once a session ends.
    #[default]
    Inactive,
    /// Ringer forced to the quiet mode, no timer armed.
    Active,
    /// A restore condition was seen during a call; the debounce timer is armed.
    AwaitingRestore,
    /// Session over. Further events are ignored.
    Terminated,
}

impl SessionState {
    /// Returns a human-readable description of the state
    pub fn description(&self) -> &'static str {
        match self {
            SessionState::Inactive => "No quiet session running",
            SessionState::Active => "Ringer quieted, waiting for unlock",
            SessionState::AwaitingRestore => "Waiting for the call to end",
            SessionState::Terminated => "Session ended",
        }
    }

    /// Whether the session is started and not yet terminated.
    pub fn is_running(&self) -> bool {
        matches!(self, SessionState::Active | SessionState::AwaitingRestore)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Inactive => "inactive",
            SessionState::Active => "active",
            SessionState::AwaitingRestore => "awaiting_restore",
            SessionState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}
