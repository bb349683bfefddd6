//! Quiet-unlock service.
//!
//! Runs one [`QuietSession`](quiet_session::QuietSession) at a time as a
//! single-threaded actor: host notifications, debounce timer expiries, and
//! user actions all travel through one ordered channel, so session state is
//! only ever touched by the actor task.
//!
//! # Example
//!
//! ```ignore
//! use quiet_service::{QuietUnlockService, ServiceConfig, ServicePorts};
//!
//! let service = QuietUnlockService::new(ports, bus, ServiceConfig::load_default()?);
//! let handle = service.start_session(None)?;
//!
//! // From the dialog:
//! handle.confirm()?;
//!
//! let reason = handle.wait().await;
//! ```

mod actor;
mod config;
mod error;
mod scheduler;
mod service;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use scheduler::TokioRetryScheduler;
pub use service::{QuietUnlockService, ServicePorts, SessionHandle};
