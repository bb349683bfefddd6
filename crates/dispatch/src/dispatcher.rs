//! Translates host notifications into session events.

use crate::error::DispatchError;
use crate::source::{NotificationCallback, NotificationSource, Subscription};
use quiet_events::{Event, Notification, NotificationKind};
use quiet_ringer::AppliedModeHandle;
use std::sync::Arc;

/// Receiver of translated events, typically the session actor's queue.
pub type EventSink = Arc<dyn Fn(Event) + Send + Sync + 'static>;

pub fn new_sink<F>(f: F) -> EventSink
where
    F: Fn(Event) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Subscribes a session to the host notification bus.
///
/// Forwards every translated notification in arrival order, without
/// deduplication or reordering.
#[derive(Clone)]
pub struct EventDispatcher {
    applied: AppliedModeHandle,
}

impl EventDispatcher {
    /// `applied` is the ringer controller's record of its own writes, used to
    /// drop the host echoing them back.
    pub fn new(applied: AppliedModeHandle) -> Self {
        Self { applied }
    }

    /// Map a raw notification to a session event.
    ///
    /// Returns `None` for a ringer change that reports a mode the controller
    /// wrote and the host has not reported back yet, or the current mode.
    pub fn translate(&self, notification: Notification) -> Option<Event> {
        match notification {
            Notification::ScreenOff => Some(Event::ScreenOff),
            Notification::ScreenOn => Some(Event::ScreenOn),
            Notification::UserPresent => Some(Event::UserPresent),
            Notification::RingerModeChanged { mode: Some(mode) }
                if self.applied.claim_echo(mode) =>
            {
                tracing::debug!(mode = %mode, "ringer change matches our own write, dropping");
                None
            }
            Notification::RingerModeChanged { .. } => Some(Event::RingerModeChangedExternally),
        }
    }

    /// Subscribe to every notification kind a session needs and forward the
    /// translated events to `sink`.
    pub fn attach(
        &self,
        source: &dyn NotificationSource,
        sink: EventSink,
    ) -> Result<Subscription, DispatchError> {
        let dispatcher = self.clone();
        let callback: NotificationCallback = Arc::new(move |notification| {
            tracing::trace!(?notification, "host notification");
            if let Some(event) = dispatcher.translate(notification) {
                sink(event);
            }
        });

        let subscription = source.subscribe(&NotificationKind::ALL, callback)?;
        tracing::info!(subscription = subscription.id(), "subscribed to host notifications");
        Ok(subscription)
    }
}
