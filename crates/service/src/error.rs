//! Error types for the quiet-unlock service.

use quiet_dispatch::DispatchError;
use quiet_ringer::RingerError;
use quiet_session::SessionError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Ringer(#[from] RingerError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Failed to read the config file.
    #[error("failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid.
    #[error("invalid config '{path}': {message}")]
    InvalidConfig { path: PathBuf, message: String },

    /// Sessions run on tokio; start them from inside a runtime.
    #[error("no tokio runtime available to run the session")]
    NoRuntime,

    /// The session this handle refers to has already ended.
    #[error("quiet session has ended")]
    SessionEnded,

    /// The service was shut down.
    #[error("quiet-unlock service is shut down")]
    ShutDown,
}
