//! Audio-settings port.
//!
//! The host platform owns the actual ringer setting; the controller only talks
//! to it through this trait.

use crate::error::{RingerError, RingerResult};
use crate::mode::RingerMode;
use std::sync::{Arc, Mutex, MutexGuard};

/// Host audio-settings API.
pub trait AudioSettings: Send + Sync {
    /// Read the device's current ringer mode.
    fn get_ringer_mode(&self) -> RingerResult<RingerMode>;

    /// Set the device's ringer mode.
    fn set_ringer_mode(&self, mode: RingerMode) -> RingerResult<()>;
}

/// Type alias for a shared audio-settings port.
pub type AudioSettingsRef = Arc<dyn AudioSettings>;

/// In-memory audio settings for testing and simulation.
///
/// Records every successful `set_ringer_mode` call so tests can assert on the
/// exact sequence of applied modes.
#[derive(Debug, Default)]
pub struct InMemoryAudioSettings {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    current: RingerMode,
    history: Vec<RingerMode>,
    fail_sets: bool,
    fail_reads: bool,
}

impl InMemoryAudioSettings {
    /// Create settings starting at the given mode.
    pub fn new(initial: RingerMode) -> Self {
        Self {
            inner: Mutex::new(Inner {
                current: initial,
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current mode as seen by the "device".
    pub fn current(&self) -> RingerMode {
        self.lock().current
    }

    /// Every mode applied through `set_ringer_mode`, in order.
    pub fn history(&self) -> Vec<RingerMode> {
        self.lock().history.clone()
    }

    /// Change the mode behind the controller's back (e.g. volume keys).
    pub fn change_externally(&self, mode: RingerMode) {
        self.lock().current = mode;
    }

    /// Make subsequent `set_ringer_mode` calls fail.
    pub fn set_fail_sets(&self, fail: bool) {
        self.lock().fail_sets = fail;
    }

    /// Make subsequent `get_ringer_mode` calls fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }
}

impl AudioSettings for InMemoryAudioSettings {
    fn get_ringer_mode(&self) -> RingerResult<RingerMode> {
        let inner = self.lock();
        if inner.fail_reads {
            return Err(RingerError::ReadFailed("audio service unavailable".into()));
        }
        Ok(inner.current)
    }

    fn set_ringer_mode(&self, mode: RingerMode) -> RingerResult<()> {
        let mut inner = self.lock();
        if inner.fail_sets {
            return Err(RingerError::ApplyFailed {
                mode,
                reason: "permission denied".into(),
            });
        }
        inner.current = mode;
        inner.history.push(mode);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_records_successful_sets() {
        let settings = InMemoryAudioSettings::new(RingerMode::Normal);
        settings.set_ringer_mode(RingerMode::Silent).unwrap();
        settings.set_ringer_mode(RingerMode::Normal).unwrap();

        assert_eq!(settings.history(), vec![RingerMode::Silent, RingerMode::Normal]);
        assert_eq!(settings.current(), RingerMode::Normal);
    }

    #[test]
    fn test_failed_set_leaves_mode_untouched() {
        let settings = InMemoryAudioSettings::new(RingerMode::Normal);
        settings.set_fail_sets(true);

        let err = settings.set_ringer_mode(RingerMode::Vibrate).unwrap_err();
        assert!(matches!(err, RingerError::ApplyFailed { mode: RingerMode::Vibrate, .. }));
        assert_eq!(settings.current(), RingerMode::Normal);
        assert!(settings.history().is_empty());
    }

    #[test]
    fn test_external_change_not_in_history() {
        let settings = InMemoryAudioSettings::new(RingerMode::Normal);
        settings.change_externally(RingerMode::Vibrate);

        assert_eq!(settings.get_ringer_mode().unwrap(), RingerMode::Vibrate);
        assert!(settings.history().is_empty());
    }
}
