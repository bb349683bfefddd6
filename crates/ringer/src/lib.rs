//! Ringer control for quiet-unlock.
//!
//! Wraps the host's audio-settings API behind the [`AudioSettings`] trait and
//! exposes a [`RingerController`] that applies modes and remembers the last
//! one it applied successfully.
//!
//! # Example
//!
//! ```ignore
//! use quiet_ringer::{InMemoryAudioSettings, RingerController, RingerMode};
//! use std::sync::Arc;
//!
//! let settings = Arc::new(InMemoryAudioSettings::new(RingerMode::Normal));
//! let controller = RingerController::new(settings);
//!
//! let restore = controller.capture_current_mode()?;
//! controller.set_mode(RingerMode::Vibrate)?;
//! ```

mod controller;
mod error;
mod mode;
mod provider;

pub use controller::{AppliedModeHandle, RingerController};
pub use error::{RingerError, RingerResult};
pub use mode::RingerMode;
pub use provider::{AudioSettings, AudioSettingsRef, InMemoryAudioSettings};
