//! `quietd`: a console host for the quiet-unlock service.
//!
//! Reads commands from stdin, plays the part of the device (screen, keyguard,
//! phone, ringer) and prints every session event as a JSON line on stdout.
//! Logs go to stderr; tune them with `RUST_LOG`.
//!
//! Run with: cargo run -p quiet-cli -- [config.json]

mod commands;

use anyhow::Context;
use commands::Command;
use quiet_context::StaticProvider;
use quiet_dispatch::ChannelNotificationSource;
use quiet_events::{BusEvent, EventBus, Notification};
use quiet_ringer::{InMemoryAudioSettings, RingerMode};
use quiet_service::{QuietUnlockService, ServiceConfig, ServicePorts, SessionHandle};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Prints bus events as `{"topic": ..., "payload": ...}` lines.
struct StdoutEventBus;

impl EventBus for StdoutEventBus {
    fn emit(&self, event: BusEvent) {
        let line = serde_json::json!({
            "topic": event.topic(),
            "payload": event.payload(),
        });
        println!("{line}");
    }
}

/// The simulated device and the service running on it.
struct Host {
    service: QuietUnlockService,
    audio: Arc<InMemoryAudioSettings>,
    device: Arc<StaticProvider>,
    source: ChannelNotificationSource,
    session: Option<SessionHandle>,
}

impl Host {
    fn new(config: ServiceConfig) -> Self {
        let audio = Arc::new(InMemoryAudioSettings::new(RingerMode::Normal));
        let device = Arc::new(StaticProvider::new());
        let source = ChannelNotificationSource::new();
        let ports = ServicePorts {
            audio: audio.clone(),
            telephony: device.clone(),
            keyguard: device.clone(),
            lock: device.clone(),
            notifications: Arc::new(source.clone()),
        };
        Self {
            service: QuietUnlockService::new(ports, Arc::new(StdoutEventBus), config),
            audio,
            device,
            source,
            session: None,
        }
    }

    fn session(&self) -> anyhow::Result<&SessionHandle> {
        self.session
            .as_ref()
            .filter(|s| !s.is_finished())
            .context("no session running, use 'start'")
    }

    /// Apply one command. Returns `false` when the console should exit.
    fn run(&mut self, command: Command) -> anyhow::Result<bool> {
        match command {
            Command::Start(mode) => {
                let handle = self.service.start_session(mode)?;
                eprintln!("session {} started", handle.id());
                self.session = Some(handle);
            }
            Command::ScreenOff => self.publish(Notification::ScreenOff),
            Command::ScreenOn => self.publish(Notification::ScreenOn),
            Command::Unlock => self.publish(Notification::UserPresent),
            Command::Ringer(mode) => {
                if let Some(mode) = mode {
                    self.audio.change_externally(mode);
                }
                self.publish(Notification::RingerModeChanged { mode });
            }
            Command::Call(active) => self.device.set_call_active(active),
            Command::Keyguard(locked) => self.device.set_device_locked(locked),
            Command::Select(mode) => self.session()?.select_mode(mode)?,
            Command::Confirm => self.session()?.confirm()?,
            Command::Cancel => self.session()?.cancel()?,
            Command::Status => self.print_status(),
            Command::Help => eprintln!("{}", commands::HELP),
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn publish(&self, notification: Notification) {
        let delivered = self.source.publish(notification);
        tracing::debug!(?notification, delivered, "notification published");
    }

    fn print_status(&self) {
        let session = match &self.session {
            Some(handle) => match handle.end_reason() {
                Some(reason) => format!("{} ended ({reason})", handle.id()),
                None => format!("{} running, selected {}", handle.id(), handle.selected_mode()),
            },
            None => "none".to_string(),
        };
        eprintln!(
            "ringer: {} | active: {} | session: {session}",
            self.audio.current(),
            self.service.is_active()
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,quiet=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(ServiceConfig::default_path);
    let config = ServiceConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    tracing::info!(config = %config_path.display(), "starting quietd");
    eprintln!("{}", commands::HELP);

    let mut host = Host::new(config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let command = match commands::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        match host.run(command) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => eprintln!("error: {e:#}"),
        }
        // Let the session actor catch up before the next prompt.
        tokio::task::yield_now().await;
    }

    host.service.shutdown();
    if let Some(handle) = host.session.take() {
        if let Some(reason) = handle.wait().await {
            tracing::info!(%reason, "session closed");
        }
    }
    Ok(())
}
