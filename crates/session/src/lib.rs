//! Quiet session state machine.
//!
//! A quiet session forces the ringer into a quiet mode while the device is
//! being locked and restores the captured mode once the device is unlocked
//! and idle. The state machine here is synchronous and owns no threads: the
//! caller feeds it [`Event`](quiet_events::Event)s one at a time and provides
//! a [`RetryScheduler`] for the debounce timer.
//!
//! ```text
//!            start()
//!  Inactive ─────────▶ Active ◀──────────────┐ keyguard still engaged
//!                        │  ScreenOn/UserPresent, call active
//!                        ▼                   │
//!                  AwaitingRestore ──────────┘
//!                        │ RetryTimerFired, call ended
//!                        ▼
//!                    Terminated
//! ```
//!
//! Cancel, confirm, and external ringer changes terminate from any running
//! state.

mod config;
mod error;
mod session;
mod state;
mod timer;

pub use config::{SessionConfig, DEFAULT_RETRY_DELAY_MS};
pub use error::SessionError;
pub use session::{QuietSession, SessionPorts};
pub use state::SessionState;
pub use timer::{ManualScheduler, RetryScheduler, TimerHandle};
