//! Error types for device state queries.

use thiserror::Error;

/// A device state query could not be answered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The port backing the query is not accessible right now.
    #[error("{query} query unavailable: {reason}")]
    Unavailable { query: &'static str, reason: String },
}

impl QueryError {
    pub fn unavailable(query: &'static str, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            query,
            reason: reason.into(),
        }
    }
}
