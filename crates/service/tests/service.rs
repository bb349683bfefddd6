//! End-to-end tests of the service running a session on a paused tokio clock.

use quiet_context::{QueryError, StaticProvider, TelephonyProvider};
use quiet_dispatch::ChannelNotificationSource;
use quiet_events::{InMemoryEventBus, Notification, SessionEndReason, WarningKind};
use quiet_ringer::{InMemoryAudioSettings, RingerMode};
use quiet_service::{QuietUnlockService, ServiceConfig, ServiceError, ServicePorts};
use quiet_session::{SessionConfig, SessionError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct Rig {
    service: QuietUnlockService,
    audio: Arc<InMemoryAudioSettings>,
    device: Arc<StaticProvider>,
    source: ChannelNotificationSource,
    bus: Arc<InMemoryEventBus>,
}

/// Telephony port that panics while `broken` is set.
#[derive(Default)]
struct FaultyTelephony {
    broken: AtomicBool,
}

impl TelephonyProvider for FaultyTelephony {
    fn is_call_active(&self) -> Result<bool, QueryError> {
        if self.broken.load(Ordering::SeqCst) {
            panic!("telephony service crashed");
        }
        Ok(false)
    }
}

fn rig_with(config: ServiceConfig) -> Rig {
    let device = Arc::new(StaticProvider::new());
    rig_with_telephony(config, device.clone(), device)
}

fn rig_with_telephony(
    config: ServiceConfig,
    device: Arc<StaticProvider>,
    telephony: Arc<dyn TelephonyProvider>,
) -> Rig {
    let audio = Arc::new(InMemoryAudioSettings::new(RingerMode::Normal));
    let source = ChannelNotificationSource::new();
    let bus = Arc::new(InMemoryEventBus::new());
    let ports = ServicePorts {
        audio: audio.clone(),
        telephony,
        keyguard: device.clone(),
        lock: device.clone(),
        notifications: Arc::new(source.clone()),
    };
    Rig {
        service: QuietUnlockService::new(ports, bus.clone(), config),
        audio,
        device,
        source,
        bus,
    }
}

fn rig() -> Rig {
    rig_with(ServiceConfig::default())
}

/// Let the actor drain its queue.
async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_unlock_restores_ringer() {
    let rig = rig();
    let handle = rig.service.start_session(Some(RingerMode::Silent)).unwrap();
    assert_eq!(rig.audio.current(), RingerMode::Silent);
    assert!(rig.service.is_active());

    rig.source.publish(Notification::ScreenOff);
    rig.source.publish(Notification::ScreenOn);

    assert_eq!(handle.wait().await, Some(SessionEndReason::RestoredAfterUnlock));
    assert_eq!(rig.audio.current(), RingerMode::Normal);
    assert!(!rig.service.is_active());
    assert!(handle.is_finished());
    assert_eq!(rig.source.subscriber_count(), 0);

    let ended = rig.bus.ended();
    assert_eq!(ended.len(), 1);
    assert_eq!(ended[0].session_id, handle.id());
    assert_eq!(ended[0].restored_mode, Some(RingerMode::Normal));
}

#[tokio::test(start_paused = true)]
async fn test_call_defers_restore_until_timer() {
    let rig = rig();
    let handle = rig.service.start_session(Some(RingerMode::Silent)).unwrap();

    rig.device.set_call_active(true);
    rig.source.publish(Notification::ScreenOn);
    settle().await;
    assert!(rig.service.is_active());
    assert_eq!(rig.audio.current(), RingerMode::Silent);

    let started = tokio::time::Instant::now();
    rig.device.set_call_active(false);

    assert_eq!(handle.wait().await, Some(SessionEndReason::RestoredAfterUnlock));
    assert!(started.elapsed() >= Duration::from_millis(10_000));
    assert_eq!(rig.audio.history(), vec![RingerMode::Silent, RingerMode::Normal]);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_screen_on_keeps_one_timer() {
    let rig = rig();
    let handle = rig.service.start_session(Some(RingerMode::Silent)).unwrap();

    rig.device.set_call_active(true);
    rig.source.publish(Notification::ScreenOn);
    settle().await;
    tokio::time::advance(Duration::from_millis(6_000)).await;
    rig.source.publish(Notification::ScreenOn);
    settle().await;

    // The first timer would have fired at 10s; the re-armed one fires at 16s.
    rig.device.set_call_active(false);
    tokio::time::advance(Duration::from_millis(5_000)).await;
    settle().await;
    assert!(!handle.is_finished());

    assert_eq!(handle.wait().await, Some(SessionEndReason::RestoredAfterUnlock));
    assert_eq!(rig.bus.ended().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_locked_keyguard_waits_for_user_present() {
    let rig = rig();
    let handle = rig.service.start_session(Some(RingerMode::Silent)).unwrap();

    rig.device.set_device_locked(true);
    rig.source.publish(Notification::ScreenOn);
    settle().await;
    assert!(!handle.is_finished());
    assert_eq!(rig.audio.current(), RingerMode::Silent);

    rig.device.set_device_locked(false);
    rig.source.publish(Notification::UserPresent);

    assert_eq!(handle.wait().await, Some(SessionEndReason::RestoredAfterUnlock));
    assert_eq!(rig.audio.current(), RingerMode::Normal);
}

#[tokio::test(start_paused = true)]
async fn test_second_start_is_rejected() {
    let rig = rig();
    let handle = rig.service.start_session(Some(RingerMode::Silent)).unwrap();

    let err = rig.service.start_session(Some(RingerMode::Vibrate)).unwrap_err();
    assert!(matches!(err, ServiceError::Session(SessionError::AlreadyActive)));
    assert_eq!(rig.audio.history(), vec![RingerMode::Silent]);

    handle.cancel().unwrap();
    handle.wait().await;

    // A new session may start once the first has ended.
    let next = rig.service.start_session(Some(RingerMode::Vibrate)).unwrap();
    assert_ne!(next.id(), handle.id());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_restores_and_closes_handle() {
    let rig = rig();
    let handle = rig.service.start_session(Some(RingerMode::Silent)).unwrap();

    handle.cancel().unwrap();
    assert_eq!(handle.wait().await, Some(SessionEndReason::UserCancelled));
    assert_eq!(rig.audio.current(), RingerMode::Normal);

    settle().await;
    assert!(matches!(handle.cancel(), Err(ServiceError::SessionEnded)));
}

#[tokio::test(start_paused = true)]
async fn test_external_change_is_left_alone() {
    let rig = rig();
    let handle = rig.service.start_session(Some(RingerMode::Silent)).unwrap();

    rig.audio.change_externally(RingerMode::Vibrate);
    rig.source.publish(Notification::RingerModeChanged {
        mode: Some(RingerMode::Vibrate),
    });

    assert_eq!(handle.wait().await, Some(SessionEndReason::ExternalRingerChange));
    assert_eq!(rig.audio.current(), RingerMode::Vibrate);
    assert_eq!(rig.audio.history(), vec![RingerMode::Silent]);
    assert_eq!(rig.bus.ended()[0].restored_mode, None);
}

#[tokio::test(start_paused = true)]
async fn test_echo_of_own_write_is_ignored() {
    let rig = rig();
    let handle = rig.service.start_session(Some(RingerMode::Silent)).unwrap();

    rig.source.publish(Notification::RingerModeChanged {
        mode: Some(RingerMode::Silent),
    });
    settle().await;
    assert!(!handle.is_finished());
    assert!(rig.service.is_active());

    handle.cancel().unwrap();
    assert_eq!(handle.wait().await, Some(SessionEndReason::UserCancelled));
}

#[tokio::test(start_paused = true)]
async fn test_confirm_locks_device() {
    let rig = rig();
    let handle = rig.service.start_session(Some(RingerMode::Silent)).unwrap();

    handle.confirm().unwrap();
    assert_eq!(handle.wait().await, Some(SessionEndReason::UserConfirmed));
    assert_eq!(rig.device.lock_requests(), 1);
    assert_eq!(rig.audio.current(), RingerMode::Normal);
}

#[tokio::test(start_paused = true)]
async fn test_confirm_without_lock_privilege_requests_it() {
    let rig = rig();
    rig.device.set_lock_permitted(false);
    let handle = rig.service.start_session(Some(RingerMode::Silent)).unwrap();

    handle.confirm().unwrap();
    assert_eq!(handle.wait().await, Some(SessionEndReason::LockPermissionRequired));
    assert_eq!(rig.device.lock_requests(), 0);
    assert_eq!(rig.device.permission_requests(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_select_mode_switches_quiet_mode() {
    let rig = rig();
    let handle = rig.service.start_session(Some(RingerMode::Silent)).unwrap();

    handle.select_mode(RingerMode::Vibrate).unwrap();
    settle().await;
    assert_eq!(rig.audio.current(), RingerMode::Vibrate);
    assert_eq!(handle.selected_mode(), RingerMode::Vibrate);

    let err = handle.select_mode(RingerMode::Normal).unwrap_err();
    assert!(matches!(err, ServiceError::Session(SessionError::NotQuietMode(_))));

    handle.cancel().unwrap();
    handle.wait().await;
    assert_eq!(
        rig.audio.history(),
        vec![RingerMode::Silent, RingerMode::Vibrate, RingerMode::Normal]
    );
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_ends_session_and_refuses_new_ones() {
    let rig = rig();
    let handle = rig.service.start_session(Some(RingerMode::Silent)).unwrap();

    rig.service.shutdown();
    assert_eq!(handle.wait().await, Some(SessionEndReason::UserCancelled));
    assert_eq!(rig.audio.current(), RingerMode::Normal);

    let err = rig.service.start_session(None).unwrap_err();
    assert!(matches!(err, ServiceError::ShutDown));
}

#[tokio::test(start_paused = true)]
async fn test_default_mode_from_config() {
    let rig = rig();
    let handle = rig.service.start_session(None).unwrap();
    assert_eq!(rig.audio.current(), RingerMode::Vibrate);
    assert_eq!(handle.selected_mode(), RingerMode::Vibrate);
}

#[tokio::test(start_paused = true)]
async fn test_non_quiet_mode_is_rejected_without_side_effects() {
    let rig = rig();
    let err = rig.service.start_session(Some(RingerMode::Normal)).unwrap_err();
    assert!(matches!(err, ServiceError::Session(SessionError::NotQuietMode(_))));
    assert!(!rig.service.is_active());
    assert_eq!(rig.source.subscriber_count(), 0);
    assert!(rig.audio.history().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unreadable_ringer_fails_start() {
    let rig = rig();
    rig.audio.set_fail_reads(true);
    let err = rig.service.start_session(Some(RingerMode::Silent)).unwrap_err();
    assert!(matches!(err, ServiceError::Ringer(_)));
    assert!(!rig.service.is_active());
}

#[tokio::test(start_paused = true)]
async fn test_retry_limit_ends_session() {
    let rig = rig_with(ServiceConfig {
        session: SessionConfig {
            max_retries: Some(2),
            ..SessionConfig::default()
        },
        ..ServiceConfig::default()
    });
    let handle = rig.service.start_session(Some(RingerMode::Silent)).unwrap();

    rig.device.set_call_active(true);
    rig.source.publish(Notification::ScreenOn);
    let started = tokio::time::Instant::now();

    assert_eq!(handle.wait().await, Some(SessionEndReason::RetryLimitReached));
    assert!(started.elapsed() >= Duration::from_millis(20_000));
    assert_eq!(rig.audio.current(), RingerMode::Normal);
}

#[tokio::test(start_paused = true)]
async fn test_telephony_outage_is_reported_and_retried() {
    let rig = rig();
    let handle = rig.service.start_session(Some(RingerMode::Silent)).unwrap();

    rig.device.set_call_active(true);
    rig.source.publish(Notification::ScreenOn);
    settle().await;

    rig.device.set_telephony_available(false);
    tokio::time::advance(Duration::from_millis(10_000)).await;
    settle().await;
    assert!(!handle.is_finished());
    assert_eq!(rig.bus.warnings().len(), 1);

    rig.device.set_telephony_available(true);
    rig.device.set_call_active(false);
    assert_eq!(handle.wait().await, Some(SessionEndReason::RestoredAfterUnlock));
}

#[test]
fn test_start_outside_runtime_fails() {
    let rig = rig();
    let err = rig.service.start_session(Some(RingerMode::Silent)).unwrap_err();
    assert!(matches!(err, ServiceError::NoRuntime));
    assert!(!rig.service.is_active());
}

#[tokio::test(start_paused = true)]
async fn test_late_echo_after_mode_switch_is_ignored() {
    let rig = rig();
    let handle = rig.service.start_session(Some(RingerMode::Vibrate)).unwrap();
    handle.select_mode(RingerMode::Silent).unwrap();
    settle().await;

    // The host reports the first write only after the second went out.
    rig.source.publish(Notification::RingerModeChanged {
        mode: Some(RingerMode::Vibrate),
    });
    rig.source.publish(Notification::RingerModeChanged {
        mode: Some(RingerMode::Silent),
    });
    settle().await;
    assert!(!handle.is_finished());
    assert_eq!(rig.audio.current(), RingerMode::Silent);

    rig.source.publish(Notification::UserPresent);
    assert_eq!(handle.wait().await, Some(SessionEndReason::RestoredAfterUnlock));
    assert_eq!(
        rig.audio.history(),
        vec![RingerMode::Vibrate, RingerMode::Silent, RingerMode::Normal]
    );
}

#[tokio::test(start_paused = true)]
async fn test_fault_in_port_drops_event_and_session_survives() {
    let telephony = Arc::new(FaultyTelephony::default());
    let rig = rig_with_telephony(
        ServiceConfig::default(),
        Arc::new(StaticProvider::new()),
        telephony.clone(),
    );
    let handle = rig.service.start_session(Some(RingerMode::Silent)).unwrap();

    telephony.broken.store(true, Ordering::SeqCst);
    rig.source.publish(Notification::ScreenOn);
    settle().await;

    let warnings = rig.bus.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, WarningKind::EventDropped);
    assert!(!handle.is_finished());
    assert!(rig.service.is_active());
    assert_eq!(rig.audio.current(), RingerMode::Silent);

    telephony.broken.store(false, Ordering::SeqCst);
    rig.source.publish(Notification::UserPresent);
    assert_eq!(handle.wait().await, Some(SessionEndReason::RestoredAfterUnlock));
    assert_eq!(rig.audio.current(), RingerMode::Normal);
}

#[tokio::test(start_paused = true)]
async fn test_handle_debug_shows_id_and_outcome() {
    let rig = rig();
    let handle = rig.service.start_session(Some(RingerMode::Silent)).unwrap();
    assert!(format!("{handle:?}").contains(handle.id()));

    handle.cancel().unwrap();
    handle.wait().await;
    assert!(format!("{handle:?}").contains("UserCancelled"));
}
