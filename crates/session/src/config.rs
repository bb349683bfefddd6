//! Session configuration.

use crate::error::SessionError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default debounce delay before re-checking a call (10 seconds).
pub const DEFAULT_RETRY_DELAY_MS: u64 = 10_000;

/// Tunables for a quiet session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Delay before re-evaluating restore while a call is active.
    pub retry_delay_ms: u64,

    /// Maximum number of retry timer expiries that may find the call still
    /// active before the session gives up and restores. Screen or unlock
    /// events that re-arm the timer in between do not count. `None` retries
    /// for as long as the call lasts.
    pub max_retries: Option<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            max_retries: None,
        }
    }
}

impl SessionConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.retry_delay_ms == 0 {
            return Err(SessionError::InvalidConfig(
                "retry_delay_ms must be greater than zero".into(),
            ));
        }
        if self.max_retries == Some(0) {
            return Err(SessionError::InvalidConfig(
                "max_retries must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }
}
