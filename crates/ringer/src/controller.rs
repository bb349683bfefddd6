//! Ringer controller that applies modes through the audio-settings port.

use crate::error::RingerResult;
use crate::mode::RingerMode;
use crate::provider::AudioSettingsRef;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Writes remembered while waiting for the host to report them back.
const MAX_UNECHOED: usize = 8;

#[derive(Debug, Default)]
struct Applied {
    last: Option<RingerMode>,
    /// Oldest first.
    unechoed: VecDeque<RingerMode>,
}

/// Shared view of the modes the controller applied.
///
/// The event dispatcher uses this to recognise the host echoing back the
/// controller's own writes. Host broadcasts are asynchronous, so an echo may
/// arrive after a later write has already gone out.
#[derive(Debug, Clone, Default)]
pub struct AppliedModeHandle {
    inner: Arc<Mutex<Applied>>,
}

impl AppliedModeHandle {
    fn lock(&self) -> MutexGuard<'_, Applied> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Last mode applied, or the one being written right now.
    pub fn get(&self) -> Option<RingerMode> {
        self.lock().last
    }

    /// Whether a host report of the ringer changing to `mode` is the echo of
    /// one of our own writes.
    ///
    /// The matching write is consumed along with any older ones the host
    /// coalesced. A report that merely repeats the current mode also counts.
    pub fn claim_echo(&self, mode: RingerMode) -> bool {
        let mut applied = self.lock();
        if let Some(pos) = applied.unechoed.iter().position(|m| *m == mode) {
            applied.unechoed.drain(..=pos);
            return true;
        }
        applied.last == Some(mode)
    }

    /// Number of writes not yet reported back by the host.
    pub fn unechoed(&self) -> usize {
        self.lock().unechoed.len()
    }

    fn begin_write(&self, mode: RingerMode) -> Option<RingerMode> {
        let mut applied = self.lock();
        let previous = applied.last.replace(mode);
        if applied.unechoed.len() == MAX_UNECHOED {
            applied.unechoed.pop_front();
        }
        applied.unechoed.push_back(mode);
        previous
    }

    fn abort_write(&self, mode: RingerMode, previous: Option<RingerMode>) {
        let mut applied = self.lock();
        applied.last = previous;
        if applied.unechoed.back() == Some(&mode) {
            applied.unechoed.pop_back();
        }
    }
}

/// Adapter over the host audio settings.
///
/// Holds no state beyond the last mode it applied.
pub struct RingerController {
    settings: AudioSettingsRef,
    applied: AppliedModeHandle,
}

impl RingerController {
    pub fn new(settings: AudioSettingsRef) -> Self {
        Self {
            settings,
            applied: AppliedModeHandle::default(),
        }
    }

    /// Read the current ringer mode, used as the restore mode of a session.
    pub fn capture_current_mode(&self) -> RingerResult<RingerMode> {
        let mode = self.settings.get_ringer_mode()?;
        tracing::debug!(mode = %mode, "captured ringer mode");
        Ok(mode)
    }

    /// Apply a ringer mode.
    ///
    /// # Errors
    ///
    /// Returns `RingerError::ApplyFailed` when the host rejects the change. The
    /// last applied mode is left unchanged in that case.
    pub fn set_mode(&self, mode: RingerMode) -> RingerResult<()> {
        // Recorded before the write: hosts may report the change synchronously.
        let previous = self.applied.begin_write(mode);

        match self.settings.set_ringer_mode(mode) {
            Ok(()) => {
                tracing::info!(mode = %mode, "ringer mode applied");
                Ok(())
            }
            Err(e) => {
                self.applied.abort_write(mode, previous);
                tracing::warn!(mode = %mode, error = %e, "ringer mode not applied");
                Err(e)
            }
        }
    }

    /// Last mode applied successfully by this controller.
    pub fn applied_mode(&self) -> Option<RingerMode> {
        self.applied.get()
    }

    /// Handle for reading the applied mode from another component.
    pub fn applied_mode_handle(&self) -> AppliedModeHandle {
        self.applied.clone()
    }
}
