//! Terminal line settings.
//!
//! The line editor switches the terminal to raw mode while it waits for input
//! and only switches back when the read returns. A process that exits during
//! that read has to put the settings back itself.

use std::io::{self, IsTerminal};
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// A snapshot of the settings of the terminal on stdin.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TerminalMode {
    saved: Option<String>,
}

impl TerminalMode {
    /// Records the current settings with `stty -g`.
    ///
    /// Records nothing when stdin is not a terminal or `stty` is unavailable.
    pub fn capture() -> Self {
        if !io::stdin().is_terminal() {
            return Self::default();
        }
        let saved = Command::new("stty")
            .arg("-g")
            .stdin(Stdio::inherit())
            .stderr(Stdio::null())
            .output()
            .ok()
            .filter(|output| output.status.success())
            .and_then(|output| String::from_utf8(output.stdout).ok())
            .map(|settings| settings.trim().to_string())
            .filter(|settings| !settings.is_empty());
        Self { saved }
    }

    /// Returns true if settings were recorded.
    pub fn is_captured(&self) -> bool {
        self.saved.is_some()
    }

    /// Puts back the recorded settings. Does nothing if none were recorded.
    pub fn restore(&self) -> Result<()> {
        let Some(saved) = &self.saved else {
            return Ok(());
        };
        let status = Command::new("stty")
            .arg(saved)
            .stdin(Stdio::inherit())
            .stderr(Stdio::null())
            .status()
            .map_err(|err| Error::io("error restoring terminal", err))?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::io(
                "error restoring terminal",
                io::Error::other(format!("stty exited with {status}")),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_recorded_restores_nothing() {
        let mode = TerminalMode::default();
        assert!(!mode.is_captured());
        mode.restore().unwrap();
    }

    #[test]
    fn captured_settings_can_be_restored() {
        let mode = TerminalMode::capture();
        if !io::stdin().is_terminal() {
            assert!(!mode.is_captured());
        }
        mode.restore().unwrap();
    }
}
