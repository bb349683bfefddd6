//! Event bus abstraction for the session's outbound notifications.
//!
//! The session reports start, end, and warnings through this trait so the
//! caller (a UI layer, a daemon, a test) decides how they are delivered.

use crate::{event_names, SessionEndedEvent, SessionStartedEvent, SessionWarningEvent};
use std::sync::{Arc, Mutex, MutexGuard};

/// Outbound session notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    Started(SessionStartedEvent),
    Ended(SessionEndedEvent),
    Warning(SessionWarningEvent),
}

impl BusEvent {
    /// Topic name the event is published under.
    pub fn topic(&self) -> &'static str {
        match self {
            BusEvent::Started(_) => event_names::SESSION_STARTED,
            BusEvent::Ended(_) => event_names::SESSION_ENDED,
            BusEvent::Warning(_) => event_names::SESSION_WARNING,
        }
    }

    /// JSON payload for transports that need one.
    pub fn payload(&self) -> serde_json::Value {
        let result = match self {
            BusEvent::Started(e) => serde_json::to_value(e),
            BusEvent::Ended(e) => serde_json::to_value(e),
            BusEvent::Warning(e) => serde_json::to_value(e),
        };
        result.unwrap_or(serde_json::Value::Null)
    }
}

/// Trait for publishing session notifications to subscribers.
pub trait EventBus: Send + Sync {
    fn emit(&self, event: BusEvent);
}

/// Type alias for shared event bus reference.
pub type EventBusRef = Arc<dyn EventBus>;

/// In-memory event bus for testing.
///
/// Captures all emitted events for later inspection.
#[derive(Default)]
pub struct InMemoryEventBus {
    events: Mutex<Vec<BusEvent>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<BusEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get all captured events.
    pub fn events(&self) -> Vec<BusEvent> {
        self.lock().clone()
    }

    /// Get events for a specific topic.
    pub fn events_for(&self, topic: &str) -> Vec<BusEvent> {
        self.lock()
            .iter()
            .filter(|e| e.topic() == topic)
            .cloned()
            .collect()
    }

    /// All captured session-ended events.
    pub fn ended(&self) -> Vec<SessionEndedEvent> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                BusEvent::Ended(ended) => Some(ended.clone()),
                _ => None,
            })
            .collect()
    }

    /// All captured warnings.
    pub fn warnings(&self) -> Vec<SessionWarningEvent> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                BusEvent::Warning(w) => Some(w.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl EventBus for InMemoryEventBus {
    fn emit(&self, event: BusEvent) {
        self.lock().push(event);
    }
}

/// Event bus that only logs.
pub struct NullEventBus;

impl EventBus for NullEventBus {
    fn emit(&self, event: BusEvent) {
        tracing::trace!(topic = event.topic(), "discarding session event");
    }
}
