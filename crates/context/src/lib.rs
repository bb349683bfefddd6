//! Device context ports for quiet-unlock.
//!
//! The session needs to ask the device two questions while deciding whether
//! it is safe to restore the ringer, and occasionally to lock it:
//! - Is a phone call active? ([`TelephonyProvider`])
//! - Is the keyguard still engaged? ([`KeyguardProvider`])
//! - Lock the device now ([`DeviceLock`])
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                             │
//! │  provider.rs - Traits for device state queries and locking  │
//! │  error.rs    - QueryError                                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Infrastructure Layer                        │
//! │  host adapters implement the traits; NullProvider and       │
//! │  StaticProvider cover tests and simulation                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod error;
mod provider;

pub use error::QueryError;
pub use provider::{
    DeviceLock, DeviceLockRef, KeyguardProvider, KeyguardProviderRef, NullProvider,
    StaticProvider, TelephonyProvider, TelephonyProviderRef,
};
