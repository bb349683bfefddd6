//! Host notification source port.

use crate::error::DispatchError;
use quiet_events::{Notification, NotificationKind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Callback invoked for every delivered notification.
pub type NotificationCallback = Arc<dyn Fn(Notification) + Send + Sync + 'static>;

/// Host notification bus.
pub trait NotificationSource: Send + Sync {
    /// Register `callback` for the given kinds.
    ///
    /// Notifications must be delivered in the order the host produces them.
    /// Dropping or unsubscribing the returned [`Subscription`] must stop
    /// delivery.
    fn subscribe(
        &self,
        kinds: &[NotificationKind],
        callback: NotificationCallback,
    ) -> Result<Subscription, DispatchError>;
}

pub type NotificationSourceRef = Arc<dyn NotificationSource>;

/// A live registration on a notification source.
///
/// Unsubscribes when dropped.
pub struct Subscription {
    id: u64,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new<F>(id: u64, release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            id,
            release: Some(Box::new(release)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stop delivery now.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            tracing::debug!(subscription = self.id, "unsubscribing from host notifications");
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("released", &self.release.is_none())
            .finish()
    }
}

struct Registration {
    id: u64,
    kinds: Vec<NotificationKind>,
    callback: NotificationCallback,
}

/// In-process notification bus.
///
/// Hosts that receive notifications on their own threads publish them here;
/// `publish` delivers synchronously, so per-publisher order is preserved.
#[derive(Clone, Default)]
pub struct ChannelNotificationSource {
    registrations: Arc<Mutex<Vec<Registration>>>,
    next_id: Arc<AtomicU64>,
}

impl ChannelNotificationSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Registration>> {
        self.registrations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Deliver a notification to every subscriber interested in its kind.
    ///
    /// Returns the number of subscribers reached.
    pub fn publish(&self, notification: Notification) -> usize {
        let kind = notification.kind();
        // Snapshot so callbacks may unsubscribe without deadlocking.
        let targets: Vec<NotificationCallback> = self
            .lock()
            .iter()
            .filter(|r| r.kinds.contains(&kind))
            .map(|r| Arc::clone(&r.callback))
            .collect();

        for callback in &targets {
            callback(notification);
        }
        targets.len()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }
}

impl NotificationSource for ChannelNotificationSource {
    fn subscribe(
        &self,
        kinds: &[NotificationKind],
        callback: NotificationCallback,
    ) -> Result<Subscription, DispatchError> {
        if kinds.is_empty() {
            return Err(DispatchError::SubscribeFailed(
                "no notification kinds requested".into(),
            ));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.lock().push(Registration {
            id,
            kinds: kinds.to_vec(),
            callback,
        });

        let registrations = Arc::clone(&self.registrations);
        Ok(Subscription::new(id, move || {
            registrations
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .retain(|r| r.id != id);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (NotificationCallback, Arc<Mutex<Vec<Notification>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let callback: NotificationCallback = Arc::new(move |n| {
            seen_clone.lock().unwrap().push(n);
        });
        (callback, seen)
    }

    #[test]
    fn test_publish_respects_kinds_and_order() {
        let source = ChannelNotificationSource::new();
        let (callback, seen) = recorder();
        let _sub = source
            .subscribe(&[NotificationKind::ScreenOn, NotificationKind::UserPresent], callback)
            .unwrap();

        source.publish(Notification::ScreenOn);
        source.publish(Notification::ScreenOff);
        source.publish(Notification::UserPresent);
        source.publish(Notification::ScreenOn);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                Notification::ScreenOn,
                Notification::UserPresent,
                Notification::ScreenOn
            ]
        );
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let source = ChannelNotificationSource::new();
        let (callback, seen) = recorder();
        let sub = source.subscribe(&NotificationKind::ALL, callback).unwrap();
        assert_eq!(source.subscriber_count(), 1);

        sub.unsubscribe();
        assert_eq!(source.subscriber_count(), 0);
        assert_eq!(source.publish(Notification::ScreenOff), 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let source = ChannelNotificationSource::new();
        let (callback, _seen) = recorder();
        {
            let _sub = source.subscribe(&NotificationKind::ALL, callback).unwrap();
            assert_eq!(source.subscriber_count(), 1);
        }
        assert_eq!(source.subscriber_count(), 0);
    }

    #[test]
    fn test_empty_kinds_rejected() {
        let source = ChannelNotificationSource::new();
        let (callback, _seen) = recorder();
        assert!(matches!(
            source.subscribe(&[], callback),
            Err(DispatchError::SubscribeFailed(_))
        ));
    }

    #[test]
    fn test_unsubscribe_after_poisoned_lock() {
        let source = ChannelNotificationSource::new();
        let (callback, _seen) = recorder();
        let sub = source.subscribe(&NotificationKind::ALL, callback).unwrap();

        let registrations = Arc::clone(&source.registrations);
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = registrations.lock().unwrap();
            panic!("poison the registry");
        }));
        assert!(source.registrations.is_poisoned());

        sub.unsubscribe();
        assert_eq!(source.subscriber_count(), 0);
    }
}
