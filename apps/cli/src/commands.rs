//! Console command parsing.

use quiet_ringer::RingerMode;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start a session, optionally with an explicit quiet mode.
    Start(Option<RingerMode>),
    ScreenOff,
    ScreenOn,
    /// The user got past the keyguard.
    Unlock,
    /// The ringer was changed on the device. `None` when the host omits the mode.
    Ringer(Option<RingerMode>),
    Call(bool),
    Keyguard(bool),
    Select(RingerMode),
    Confirm,
    Cancel,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),

    #[error("'{command}' expects {expected}")]
    BadArgument {
        command: &'static str,
        expected: &'static str,
    },
}

pub const HELP: &str = "\
commands:
  start [silent|vibrate]   start a quiet session
  screen-off | screen-on   screen notifications
  unlock                   user passed the keyguard
  ringer [mode]            ringer changed on the device
  call on|off              phone call state
  keyguard on|off          keyguard state
  select <silent|vibrate>  pick another quiet mode
  confirm | cancel         answer the dialog
  status | help | quit";

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();

    let command = match name.to_ascii_lowercase().as_str() {
        "start" => Command::Start(optional_mode("start", arg)?),
        "screen-off" | "off" => Command::ScreenOff,
        "screen-on" | "on" => Command::ScreenOn,
        "unlock" | "present" => Command::Unlock,
        "ringer" => Command::Ringer(optional_mode("ringer", arg)?),
        "call" => Command::Call(switch("call", arg)?),
        "keyguard" | "lock" => Command::Keyguard(switch("keyguard", arg)?),
        "select" => {
            let mode = optional_mode("select", arg)?.ok_or(ParseError::BadArgument {
                command: "select",
                expected: "a ringer mode",
            })?;
            Command::Select(mode)
        }
        "confirm" | "ok" => Command::Confirm,
        "cancel" => Command::Cancel,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn optional_mode(
    command: &'static str,
    arg: Option<&str>,
) -> Result<Option<RingerMode>, ParseError> {
    arg.map(|s| {
        s.parse::<RingerMode>().map_err(|_| ParseError::BadArgument {
            command,
            expected: "normal, silent or vibrate",
        })
    })
    .transpose()
}

fn switch(command: &'static str, arg: Option<&str>) -> Result<bool, ParseError> {
    match arg.map(str::to_ascii_lowercase).as_deref() {
        Some("on" | "yes" | "true" | "1") => Ok(true),
        Some("off" | "no" | "false" | "0") => Ok(false),
        _ => Err(ParseError::BadArgument {
            command,
            expected: "on or off",
        }),
    }
}
