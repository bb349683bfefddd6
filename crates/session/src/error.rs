//! Error types for the session state machine.

use quiet_ringer::{RingerError, RingerMode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// A session is already running.
    #[error("a quiet session is already active")]
    AlreadyActive,

    /// This session has ended; start a new one instead.
    #[error("quiet session already terminated")]
    AlreadyTerminated,

    /// The requested mode would not quiet the ringer.
    #[error("{0} is not a quiet ringer mode")]
    NotQuietMode(RingerMode),

    /// The ringer could not be read or written.
    #[error(transparent)]
    Ringer(#[from] RingerError),

    /// Configuration rejected.
    #[error("invalid session config: {0}")]
    InvalidConfig(String),
}
