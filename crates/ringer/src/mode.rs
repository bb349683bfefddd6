//! Ringer mode definitions.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Ringer mode of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RingerMode {
    /// Audible ringer.
    #[default]
    Normal,
    /// No sound, no vibration.
    Silent,
    /// Vibration only.
    Vibrate,
}

impl RingerMode {
    /// Returns a human-readable label for the mode.
    pub fn label(&self) -> &'static str {
        match self {
            RingerMode::Normal => "normal",
            RingerMode::Silent => "silent",
            RingerMode::Vibrate => "vibrate",
        }
    }

    /// Whether this mode can be used as the quiet mode of a session.
    pub fn is_quiet(&self) -> bool {
        matches!(self, RingerMode::Silent | RingerMode::Vibrate)
    }
}

impl std::fmt::Display for RingerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for RingerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" | "ring" => Ok(RingerMode::Normal),
            "silent" => Ok(RingerMode::Silent),
            "vibrate" | "vibe" => Ok(RingerMode::Vibrate),
            other => Err(format!("unknown ringer mode '{other}'")),
        }
    }
}
