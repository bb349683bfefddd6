//! Error types for ringer control.

use crate::mode::RingerMode;
use thiserror::Error;

/// Result type for ringer operations.
pub type RingerResult<T> = Result<T, RingerError>;

/// Errors reported by the audio-settings port.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RingerError {
    /// The host refused or failed to apply a ringer mode.
    #[error("failed to apply ringer mode {mode}: {reason}")]
    ApplyFailed { mode: RingerMode, reason: String },

    /// The current ringer mode could not be read.
    #[error("failed to read ringer mode: {0}")]
    ReadFailed(String),
}
