//! Service configuration loaded from JSON.

use crate::error::ServiceError;
use quiet_ringer::RingerMode;
use quiet_session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Caller-supplied configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Quiet mode used when a session is started without an explicit one.
    pub default_quiet_mode: RingerMode,

    /// Session tunables.
    pub session: SessionConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_quiet_mode: RingerMode::Vibrate,
            session: SessionConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// `<config_dir>/quiet-unlock/config.json`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quiet-unlock")
            .join("config.json")
    }

    /// Load from the default path.
    pub fn load_default() -> Result<Self, ServiceError> {
        Self::load(Self::default_path())
    }

    /// Load a JSON config file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ServiceError::ReadConfig {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Self = serde_json::from_str(&text).map_err(|e| ServiceError::InvalidConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate().map_err(|message| ServiceError::InvalidConfig {
            path: path.to_path_buf(),
            message,
        })?;

        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.default_quiet_mode.is_quiet() {
            return Err(format!(
                "default_quiet_mode must be silent or vibrate, got {}",
                self.default_quiet_mode
            ));
        }
        self.session.validate().map_err(|e| e.to_string())
    }
}
