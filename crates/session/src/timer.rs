//! Debounce timer port.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Identifies one armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

impl std::fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Schedules the retry timer for a session.
///
/// When a scheduled timer elapses the owner must deliver
/// `Event::RetryTimerFired` to the session, but only if the handle is still the
/// session's pending timer.
pub trait RetryScheduler: Send {
    /// Arm a one-shot timer.
    fn schedule(&mut self, delay: Duration) -> TimerHandle;

    /// Disarm a timer. Unknown or already fired handles are ignored.
    fn cancel(&mut self, handle: TimerHandle);
}

/// Scheduler driven by hand, for tests and step-by-step simulation.
///
/// Clones share state, so a test can keep one clone to inspect and fire
/// timers while the session owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualInner>>,
}

#[derive(Debug, Default)]
struct ManualInner {
    next_id: u64,
    outstanding: Vec<(TimerHandle, Duration)>,
    scheduled: usize,
    cancelled: usize,
    max_outstanding: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ManualInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Handles currently armed.
    pub fn outstanding(&self) -> Vec<TimerHandle> {
        self.lock().outstanding.iter().map(|(h, _)| *h).collect()
    }

    /// Delay the given timer was armed with, if it is still outstanding.
    pub fn delay_of(&self, handle: TimerHandle) -> Option<Duration> {
        self.lock()
            .outstanding
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, d)| *d)
    }

    /// Total timers ever armed.
    pub fn scheduled_count(&self) -> usize {
        self.lock().scheduled
    }

    /// Total timers disarmed before firing.
    pub fn cancelled_count(&self) -> usize {
        self.lock().cancelled
    }

    /// Highest number of timers that were armed at the same time.
    pub fn max_outstanding(&self) -> usize {
        self.lock().max_outstanding
    }

    /// Fire the oldest outstanding timer, removing it.
    ///
    /// The caller is responsible for delivering `RetryTimerFired`.
    pub fn fire_next(&self) -> Option<TimerHandle> {
        let mut inner = self.lock();
        if inner.outstanding.is_empty() {
            return None;
        }
        let (handle, _) = inner.outstanding.remove(0);
        Some(handle)
    }
}

impl RetryScheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerHandle {
        let mut inner = self.lock();
        inner.next_id += 1;
        let handle = TimerHandle(inner.next_id);
        inner.outstanding.push((handle, delay));
        inner.scheduled += 1;
        inner.max_outstanding = inner.max_outstanding.max(inner.outstanding.len());
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        let mut inner = self.lock();
        let before = inner.outstanding.len();
        inner.outstanding.retain(|(h, _)| *h != handle);
        if inner.outstanding.len() < before {
            inner.cancelled += 1;
        }
    }
}
