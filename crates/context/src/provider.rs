//! Provider traits for device state queries.
//!
//! These traits abstract platform-specific implementations,
//! allowing the session logic to remain pure and testable.

use crate::error::QueryError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Provider for telephony state.
pub trait TelephonyProvider: Send + Sync {
    /// Check whether a phone call is in progress (ringing or off-hook).
    fn is_call_active(&self) -> Result<bool, QueryError>;
}

/// Provider for lock-screen state.
pub trait KeyguardProvider: Send + Sync {
    /// Check whether the keyguard is engaged, i.e. the user has not
    /// completed authentication yet.
    fn is_device_locked(&self) -> Result<bool, QueryError>;
}

/// Privileged "lock the device now" command.
pub trait DeviceLock: Send + Sync {
    /// Whether the app holds the privilege needed to lock the device.
    fn is_lock_permitted(&self) -> bool {
        true
    }

    /// Ask the user to grant the lock privilege.
    fn request_lock_permission(&self) {}

    /// Lock the device. Fire-and-forget.
    fn request_device_lock(&self);
}

pub type TelephonyProviderRef = Arc<dyn TelephonyProvider>;
pub type KeyguardProviderRef = Arc<dyn KeyguardProvider>;
pub type DeviceLockRef = Arc<dyn DeviceLock>;

/// Null implementation for unsupported platforms.
///
/// Reports no call and an unlocked keyguard, and ignores lock requests.
pub struct NullProvider;

impl TelephonyProvider for NullProvider {
    fn is_call_active(&self) -> Result<bool, QueryError> {
        Ok(false)
    }
}

impl KeyguardProvider for NullProvider {
    fn is_device_locked(&self) -> Result<bool, QueryError> {
        Ok(false)
    }
}

impl DeviceLock for NullProvider {
    fn request_device_lock(&self) {
        tracing::debug!("lock requested on null provider, ignoring");
    }
}

/// Settable provider for tests and simulated hosts.
///
/// Every answer is backed by an atomic flag that can be flipped at any time
/// from another thread.
#[derive(Debug)]
pub struct StaticProvider {
    call_active: AtomicBool,
    device_locked: AtomicBool,
    telephony_available: AtomicBool,
    keyguard_available: AtomicBool,
    lock_permitted: AtomicBool,
    lock_requests: AtomicUsize,
    permission_requests: AtomicUsize,
}

impl Default for StaticProvider {
    fn default() -> Self {
        Self {
            call_active: AtomicBool::new(false),
            device_locked: AtomicBool::new(false),
            telephony_available: AtomicBool::new(true),
            keyguard_available: AtomicBool::new(true),
            lock_permitted: AtomicBool::new(true),
            lock_requests: AtomicUsize::new(0),
            permission_requests: AtomicUsize::new(0),
        }
    }
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_call_active(&self, active: bool) {
        self.call_active.store(active, Ordering::SeqCst);
    }

    pub fn set_device_locked(&self, locked: bool) {
        self.device_locked.store(locked, Ordering::SeqCst);
    }

    pub fn set_telephony_available(&self, available: bool) {
        self.telephony_available.store(available, Ordering::SeqCst);
    }

    pub fn set_keyguard_available(&self, available: bool) {
        self.keyguard_available.store(available, Ordering::SeqCst);
    }

    pub fn set_lock_permitted(&self, permitted: bool) {
        self.lock_permitted.store(permitted, Ordering::SeqCst);
    }

    /// Number of `request_device_lock` calls received.
    pub fn lock_requests(&self) -> usize {
        self.lock_requests.load(Ordering::SeqCst)
    }

    /// Number of `request_lock_permission` calls received.
    pub fn permission_requests(&self) -> usize {
        self.permission_requests.load(Ordering::SeqCst)
    }
}

impl TelephonyProvider for StaticProvider {
    fn is_call_active(&self) -> Result<bool, QueryError> {
        if !self.telephony_available.load(Ordering::SeqCst) {
            return Err(QueryError::unavailable("telephony", "service not bound"));
        }
        Ok(self.call_active.load(Ordering::SeqCst))
    }
}

impl KeyguardProvider for StaticProvider {
    fn is_device_locked(&self) -> Result<bool, QueryError> {
        if !self.keyguard_available.load(Ordering::SeqCst) {
            return Err(QueryError::unavailable("keyguard", "service not bound"));
        }
        Ok(self.device_locked.load(Ordering::SeqCst))
    }
}

impl DeviceLock for StaticProvider {
    fn is_lock_permitted(&self) -> bool {
        self.lock_permitted.load(Ordering::SeqCst)
    }

    fn request_lock_permission(&self) {
        self.permission_requests.fetch_add(1, Ordering::SeqCst);
    }

    fn request_device_lock(&self) {
        self.lock_requests.fetch_add(1, Ordering::SeqCst);
    }
}
