//! Event dispatch for quiet-unlock.
//!
//! Subscribes to the host notification bus, translates raw notifications into
//! session [`Event`](quiet_events::Event)s, and forwards them in arrival order.
//!
//! # Example
//!
//! ```ignore
//! use quiet_dispatch::{ChannelNotificationSource, EventDispatcher};
//! use std::sync::Arc;
//!
//! let source = ChannelNotificationSource::new();
//! let dispatcher = EventDispatcher::new(controller.applied_mode_handle());
//! let subscription = dispatcher.attach(&source, Arc::new(|event| {
//!     println!("event: {event}");
//! }))?;
//!
//! // ... later, when the session ends:
//! subscription.unsubscribe();
//! ```

mod dispatcher;
mod error;
mod source;

pub use dispatcher::{new_sink, EventDispatcher, EventSink};
pub use error::DispatchError;
pub use source::{
    ChannelNotificationSource, NotificationCallback, NotificationSource, NotificationSourceRef,
    Subscription,
};
