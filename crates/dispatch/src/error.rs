//! Error types for event dispatch.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The host refused the subscription.
    #[error("failed to subscribe to host notifications: {0}")]
    SubscribeFailed(String),
}
